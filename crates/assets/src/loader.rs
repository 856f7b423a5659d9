//! Font and texture loaders.
//!
//! Loaders hand out `Resource`s and never fail synchronously; a failed load
//! is a failed resource. `FsLoader` settles before returning, while
//! `DeferredLoader` queues requests and settles them when the host pumps it,
//! which is how a frame-callback host observes genuinely asynchronous loads.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{Font, Resolver, Resource, ResourceLoadError, Texture};

/// Asynchronous font source.
pub trait FontLoader {
    fn load_font(&self, path: &str) -> Resource<Font>;
}

/// Asynchronous texture source.
pub trait TextureLoader {
    fn load_texture(&self, path: &str) -> Resource<Texture>;
}

/// Reads assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct FsLoader {
    root: PathBuf,
}

impl FsLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a page-style path (`./fonts/x.json`, `/img/y.png`) under the root.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let relative = path.trim_start_matches("./").trim_start_matches('/');
        self.root.join(relative)
    }

    fn read_bytes(&self, path: &str) -> Result<Vec<u8>, ResourceLoadError> {
        std::fs::read(self.resolve_path(path)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ResourceLoadError::NotFound { path: path.into() },
            _ => ResourceLoadError::Io {
                path: path.into(),
                message: e.to_string(),
            },
        })
    }

    pub fn read_font(&self, path: &str) -> Result<Font, ResourceLoadError> {
        let bytes = self.read_bytes(path)?;
        let text = String::from_utf8(bytes).map_err(|e| ResourceLoadError::Parse {
            path: path.into(),
            message: e.to_string(),
        })?;
        Font::from_typeface_json(&text).map_err(|e| ResourceLoadError::Parse {
            path: path.into(),
            message: e.to_string(),
        })
    }

    pub fn read_texture(&self, path: &str) -> Result<Texture, ResourceLoadError> {
        let bytes = self.read_bytes(path)?;
        if bytes.is_empty() {
            return Err(ResourceLoadError::Parse {
                path: path.into(),
                message: "empty image".into(),
            });
        }
        Ok(Texture::from_bytes(path, bytes))
    }
}

impl FontLoader for FsLoader {
    fn load_font(&self, path: &str) -> Resource<Font> {
        let result = self.read_font(path);
        match &result {
            Ok(font) => {
                tracing::debug!(path, family = font.family(), glyphs = font.len(), "font loaded")
            }
            Err(e) => tracing::debug!(path, error = %e, "font load failed"),
        }
        Resource::from_result(result)
    }
}

impl TextureLoader for FsLoader {
    fn load_texture(&self, path: &str) -> Resource<Texture> {
        Resource::from_result(self.read_texture(path))
    }
}

/// Queues requests against an `FsLoader` and settles them on `pump`.
pub struct DeferredLoader {
    fs: FsLoader,
    fonts: RefCell<VecDeque<(String, Resolver<Font>)>>,
    textures: RefCell<VecDeque<(String, Resolver<Texture>)>>,
}

impl DeferredLoader {
    pub fn new(fs: FsLoader) -> Self {
        Self {
            fs,
            fonts: RefCell::new(VecDeque::new()),
            textures: RefCell::new(VecDeque::new()),
        }
    }

    /// Number of requests not yet settled.
    pub fn pending(&self) -> usize {
        self.fonts.borrow().len() + self.textures.borrow().len()
    }

    /// Settle every queued request. Returns how many were settled.
    pub fn pump(&self) -> usize {
        // Take the queues first: continuations may issue new loads.
        let fonts = std::mem::take(&mut *self.fonts.borrow_mut());
        let textures = std::mem::take(&mut *self.textures.borrow_mut());
        let settled = fonts.len() + textures.len();

        for (path, resolver) in fonts {
            resolver.settle(self.fs.read_font(&path));
        }
        for (path, resolver) in textures {
            let result = self.fs.read_texture(&path);
            if let Ok(texture) = &result {
                let len = texture.byte_len() as u64;
                resolver.progress(len, Some(len));
            }
            resolver.settle(result);
        }

        if settled > 0 {
            tracing::trace!(settled, "deferred loads settled");
        }
        settled
    }
}

impl FontLoader for DeferredLoader {
    fn load_font(&self, path: &str) -> Resource<Font> {
        let (resource, resolver) = Resource::pending();
        self.fonts.borrow_mut().push_back((path.to_string(), resolver));
        resource
    }
}

impl TextureLoader for DeferredLoader {
    fn load_texture(&self, path: &str) -> Resource<Texture> {
        let (resource, resolver) = Resource::pending();
        self.textures
            .borrow_mut()
            .push_back((path.to_string(), resolver));
        resource
    }
}

/// Memoizes font loads by path so each font is requested exactly once,
/// however many consumers ask for it.
pub struct FontLibrary<L> {
    loader: L,
    fonts: RefCell<HashMap<String, Resource<Font>>>,
    requests: Cell<usize>,
}

impl<L: FontLoader> FontLibrary<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            fonts: RefCell::new(HashMap::new()),
            requests: Cell::new(0),
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// Number of requests forwarded to the underlying loader.
    pub fn requests(&self) -> usize {
        self.requests.get()
    }
}

impl<L: FontLoader> FontLoader for FontLibrary<L> {
    fn load_font(&self, path: &str) -> Resource<Font> {
        if let Some(existing) = self.fonts.borrow().get(path) {
            return existing.clone();
        }
        self.requests.set(self.requests.get() + 1);
        let resource = self.loader.load_font(path);
        self.fonts
            .borrow_mut()
            .insert(path.to_string(), resource.clone());
        resource
    }
}

impl<L: TextureLoader> TextureLoader for FontLibrary<L> {
    fn load_texture(&self, path: &str) -> Resource<Texture> {
        self.loader.load_texture(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceState;

    const TYPEFACE: &str = r#"{
        "glyphs": { "a": { "ha": 500, "o": "m 0 0 l 500 0 l 500 500 l 0 500 z" } },
        "familyName": "Stub",
        "resolution": 1000
    }"#;

    fn asset_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("fonts")).unwrap();
        std::fs::create_dir_all(dir.path().join("img")).unwrap();
        std::fs::write(dir.path().join("fonts/stub.typeface.json"), TYPEFACE).unwrap();
        std::fs::write(dir.path().join("fonts/broken.typeface.json"), "{ nope").unwrap();
        std::fs::write(dir.path().join("img/avatar.png"), [0x89, b'P', b'N', b'G']).unwrap();
        dir
    }

    #[test]
    fn fs_loader_reads_page_style_paths() {
        let dir = asset_dir();
        let loader = FsLoader::new(dir.path());
        let font = loader.load_font("./fonts/stub.typeface.json");
        assert!(font.is_ready());
        assert_eq!(font.get().unwrap().family(), "Stub");

        let tex = loader.load_texture("/img/avatar.png");
        assert!(tex.is_ready());
    }

    #[test]
    fn fs_loader_reports_missing_and_malformed() {
        let dir = asset_dir();
        let loader = FsLoader::new(dir.path());
        let missing = loader.load_font("fonts/none.json");
        assert!(matches!(
            missing.error(),
            Some(ResourceLoadError::NotFound { .. })
        ));
        let broken = loader.load_font("fonts/broken.typeface.json");
        assert!(matches!(broken.error(), Some(ResourceLoadError::Parse { .. })));
    }

    #[test]
    fn deferred_loader_settles_on_pump() {
        let dir = asset_dir();
        let loader = DeferredLoader::new(FsLoader::new(dir.path()));
        let font = loader.load_font("fonts/stub.typeface.json");
        let tex = loader.load_texture("img/missing.png");
        assert!(font.is_pending());
        assert_eq!(loader.pending(), 2);

        assert_eq!(loader.pump(), 2);
        assert_eq!(font.state(), ResourceState::Ready);
        assert_eq!(tex.state(), ResourceState::Failed);
        assert_eq!(loader.pending(), 0);
        assert_eq!(loader.pump(), 0);
    }

    #[test]
    fn library_loads_each_path_once() {
        let dir = asset_dir();
        let library = FontLibrary::new(DeferredLoader::new(FsLoader::new(dir.path())));
        let handles: Vec<_> = (0..50)
            .map(|_| library.load_font("fonts/stub.typeface.json"))
            .collect();
        assert_eq!(library.requests(), 1);
        assert_eq!(library.loader().pending(), 1);

        library.loader().pump();
        assert!(handles.iter().all(|h| h.is_ready()));
        let first = handles[0].get().unwrap();
        assert!(handles.iter().all(|h| std::sync::Arc::ptr_eq(&h.get().unwrap(), &first)));
    }
}
