use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-addressed texture id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u64);

/// Container format sniffed from the leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Unknown,
}

impl ImageFormat {
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]) {
            Self::Png
        } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
            Self::Jpeg
        } else {
            Self::Unknown
        }
    }
}

/// An encoded image handed to the renderer as-is. Decoding is the renderer's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub id: TextureId,
    pub source: String,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl Texture {
    pub fn from_bytes(source: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hasher.finalize();
        let mut id = [0u8; 8];
        id.copy_from_slice(&digest[..8]);
        Self {
            id: TextureId(u64::from_le_bytes(id)),
            source: source.into(),
            format: ImageFormat::sniff(&bytes),
            bytes,
        }
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }
}
