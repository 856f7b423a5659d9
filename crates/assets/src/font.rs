//! Typeface fonts: the JSON outline format produced by facetype.js.
//!
//! Each glyph carries an advance (`ha`) and an outline command string (`o`)
//! in font units:
//!
//! ```text
//! m x y                      move to
//! l x y                      line to
//! q x y cpx cpy              quadratic to (x, y) via (cpx, cpy)
//! b x y c1x c1y c2x c2y      cubic to (x, y) via (c1x, c1y), (c2x, c2y)
//! z                          close
//! ```
//!
//! Outlines are parsed once at load time, so a `Font` that exists is valid.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-derived font identity, the font half of a glyph cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontId(pub u64);

impl std::fmt::Display for FontId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Errors from parsing typeface data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FontError {
    #[error("typeface JSON: {0}")]
    Json(String),
    #[error("glyph key {0:?} is not a single character")]
    GlyphKey(String),
    #[error("outline for {character:?}: {message}")]
    Outline { character: char, message: String },
    #[error("resolution must be positive, got {0}")]
    Resolution(f32),
}

/// One outline drawing command, in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo([f32; 2]),
    LineTo([f32; 2]),
    QuadTo { ctrl: [f32; 2], to: [f32; 2] },
    CubicTo {
        ctrl1: [f32; 2],
        ctrl2: [f32; 2],
        to: [f32; 2],
    },
    Close,
}

/// A parsed glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Horizontal advance in font units.
    pub advance: f32,
    pub x_min: f32,
    pub x_max: f32,
    pub commands: Vec<PathCommand>,
}

impl Glyph {
    /// True when the glyph draws nothing (e.g. a space).
    pub fn is_blank(&self) -> bool {
        !self
            .commands
            .iter()
            .any(|c| !matches!(c, PathCommand::MoveTo(_) | PathCommand::Close))
    }
}

#[derive(Deserialize)]
struct TypefaceFile {
    glyphs: BTreeMap<String, TypefaceGlyph>,
    #[serde(rename = "familyName", default)]
    family_name: String,
    resolution: f32,
}

#[derive(Deserialize)]
struct TypefaceGlyph {
    #[serde(default)]
    ha: f32,
    #[serde(default)]
    x_min: f32,
    #[serde(default)]
    x_max: f32,
    #[serde(default)]
    o: Option<String>,
}

/// A loaded typeface.
#[derive(Debug, Clone)]
pub struct Font {
    id: FontId,
    family: String,
    resolution: f32,
    glyphs: HashMap<char, Glyph>,
}

impl Font {
    /// Parse a typeface JSON document. The id hashes the document bytes.
    pub fn from_typeface_json(source: &str) -> Result<Self, FontError> {
        let file: TypefaceFile =
            serde_json::from_str(source).map_err(|e| FontError::Json(e.to_string()))?;
        if !(file.resolution > 0.0) {
            return Err(FontError::Resolution(file.resolution));
        }

        let mut glyphs = HashMap::with_capacity(file.glyphs.len());
        for (key, g) in file.glyphs {
            let character = single_char(&key)?;
            let commands = parse_outline(character, g.o.as_deref().unwrap_or(""))?;
            glyphs.insert(
                character,
                Glyph {
                    advance: g.ha,
                    x_min: g.x_min,
                    x_max: g.x_max,
                    commands,
                },
            );
        }

        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        Ok(Self {
            id: FontId(truncate_digest(&hasher.finalize())),
            family: file.family_name,
            resolution: file.resolution,
            glyphs,
        })
    }

    /// Build a font from in-memory outline strings `(character, advance, outline)`.
    pub fn from_outlines<'a>(
        family: &str,
        resolution: f32,
        outlines: impl IntoIterator<Item = (char, f32, &'a str)>,
    ) -> Result<Self, FontError> {
        if !(resolution > 0.0) {
            return Err(FontError::Resolution(resolution));
        }
        let mut sorted: Vec<(char, f32, &str)> = outlines.into_iter().collect();
        sorted.sort_by_key(|(c, _, _)| *c);

        let mut hasher = Sha256::new();
        hasher.update(family.as_bytes());
        hasher.update(resolution.to_le_bytes());

        let mut glyphs = HashMap::with_capacity(sorted.len());
        for (character, advance, outline) in sorted {
            let mut buf = [0u8; 4];
            hasher.update(character.encode_utf8(&mut buf).as_bytes());
            hasher.update(advance.to_le_bytes());
            hasher.update(outline.as_bytes());

            let commands = parse_outline(character, outline)?;
            let (x_min, x_max) = x_extent(&commands);
            glyphs.insert(
                character,
                Glyph {
                    advance,
                    x_min,
                    x_max,
                    commands,
                },
            );
        }

        Ok(Self {
            id: FontId(truncate_digest(&hasher.finalize())),
            family: family.to_string(),
            resolution,
            glyphs,
        })
    }

    pub fn id(&self) -> FontId {
        self.id
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Font units per em.
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn glyph(&self, character: char) -> Option<&Glyph> {
        self.glyphs.get(&character)
    }

    /// The glyph for `character`, or the font's `?` glyph when it has none.
    pub fn glyph_or_fallback(&self, character: char) -> Option<&Glyph> {
        self.glyph(character).or_else(|| self.glyph('?'))
    }

    pub fn contains(&self, character: char) -> bool {
        self.glyphs.contains_key(&character)
    }

    /// Number of glyphs.
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

fn single_char(key: &str) -> Result<char, FontError> {
    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(FontError::GlyphKey(key.to_string())),
    }
}

fn truncate_digest(digest: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

fn x_extent(commands: &[PathCommand]) -> (f32, f32) {
    let xs = commands.iter().filter_map(|c| match c {
        PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(p[0]),
        PathCommand::QuadTo { to, .. } | PathCommand::CubicTo { to, .. } => Some(to[0]),
        PathCommand::Close => None,
    });
    xs.fold(None, |acc: Option<(f32, f32)>, x| match acc {
        None => Some((x, x)),
        Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
    })
    .unwrap_or((0.0, 0.0))
}

fn operand(
    tokens: &mut std::str::SplitWhitespace<'_>,
    character: char,
    op: &str,
) -> Result<f32, FontError> {
    let token = tokens.next().ok_or_else(|| FontError::Outline {
        character,
        message: format!("'{op}' is missing an operand"),
    })?;
    token.parse::<f32>().map_err(|_| FontError::Outline {
        character,
        message: format!("'{op}' has a non-numeric operand {token:?}"),
    })
}

fn point(
    tokens: &mut std::str::SplitWhitespace<'_>,
    character: char,
    op: &str,
) -> Result<[f32; 2], FontError> {
    Ok([
        operand(tokens, character, op)?,
        operand(tokens, character, op)?,
    ])
}

/// Parse an outline command string into commands.
pub fn parse_outline(character: char, outline: &str) -> Result<Vec<PathCommand>, FontError> {
    let err = |message: String| FontError::Outline { character, message };
    let mut tokens = outline.split_whitespace();
    let mut commands = Vec::new();

    while let Some(op) = tokens.next() {
        let command = match op {
            "m" | "l" => {
                let p = point(&mut tokens, character, op)?;
                if op == "m" {
                    PathCommand::MoveTo(p)
                } else {
                    PathCommand::LineTo(p)
                }
            }
            "q" => {
                let to = point(&mut tokens, character, op)?;
                let ctrl = point(&mut tokens, character, op)?;
                PathCommand::QuadTo { ctrl, to }
            }
            "b" => {
                let to = point(&mut tokens, character, op)?;
                let ctrl1 = point(&mut tokens, character, op)?;
                let ctrl2 = point(&mut tokens, character, op)?;
                PathCommand::CubicTo { ctrl1, ctrl2, to }
            }
            "z" => PathCommand::Close,
            other => return Err(err(format!("unknown command {other:?}"))),
        };
        if commands.is_empty() && !matches!(command, PathCommand::MoveTo(_)) {
            return Err(err("outline must start with 'm'".into()));
        }
        commands.push(command);
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TYPEFACE: &str = r#"{
        "glyphs": {
            "A": { "ha": 700, "x_min": 0, "x_max": 700, "o": "m 0 0 l 350 700 l 700 0 z" },
            "o": { "ha": 600, "x_min": 0, "x_max": 600, "o": "m 300 0 q 600 300 600 0 q 300 600 600 600 q 0 300 0 600 q 300 0 0 0" },
            "?": { "ha": 500, "o": "m 0 0 l 500 0 l 500 700 l 0 700 z" },
            " ": { "ha": 300 }
        },
        "familyName": "Test Sans",
        "resolution": 1000
    }"#;

    #[test]
    fn parses_typeface_json() {
        let font = Font::from_typeface_json(TYPEFACE).unwrap();
        assert_eq!(font.family(), "Test Sans");
        assert_eq!(font.resolution(), 1000.0);
        assert_eq!(font.len(), 4);
        let a = font.glyph('A').unwrap();
        assert_eq!(a.advance, 700.0);
        assert_eq!(a.commands.len(), 4);
        assert!(font.glyph(' ').unwrap().is_blank());
    }

    #[test]
    fn quad_operands_are_end_point_first() {
        let cmds = parse_outline('o', "m 0 0 q 10 20 30 40").unwrap();
        assert_eq!(
            cmds[1],
            PathCommand::QuadTo {
                ctrl: [30.0, 40.0],
                to: [10.0, 20.0]
            }
        );
    }

    #[test]
    fn cubic_operands() {
        let cmds = parse_outline('s', "m 0 0 b 9 9 1 2 3 4").unwrap();
        assert_eq!(
            cmds[1],
            PathCommand::CubicTo {
                ctrl1: [1.0, 2.0],
                ctrl2: [3.0, 4.0],
                to: [9.0, 9.0]
            }
        );
    }

    #[test]
    fn fallback_to_question_mark() {
        let font = Font::from_typeface_json(TYPEFACE).unwrap();
        assert!(font.glyph('Z').is_none());
        let fallback = font.glyph_or_fallback('Z').unwrap();
        assert_eq!(fallback.advance, 500.0);
    }

    #[test]
    fn same_source_same_id() {
        let a = Font::from_typeface_json(TYPEFACE).unwrap();
        let b = Font::from_typeface_json(TYPEFACE).unwrap();
        assert_eq!(a.id(), b.id());

        let other = TYPEFACE.replace("Test Sans", "Other Sans");
        let c = Font::from_typeface_json(&other).unwrap();
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn from_outlines_is_order_independent() {
        let square = "m 0 0 l 1 0 l 1 1 l 0 1 z";
        let a = Font::from_outlines("Stub", 1.0, [('a', 1.0, square), ('b', 1.0, square)]).unwrap();
        let b = Font::from_outlines("Stub", 1.0, [('b', 1.0, square), ('a', 1.0, square)]).unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(a.glyph('a').unwrap().x_max, 1.0);
    }

    #[test]
    fn rejects_bad_outlines() {
        assert!(matches!(
            parse_outline('x', "m 0"),
            Err(FontError::Outline { character: 'x', .. })
        ));
        assert!(parse_outline('x', "m 0 zero").is_err());
        assert!(parse_outline('x', "k 1 2").is_err());
        assert!(parse_outline('x', "l 1 2").is_err());
    }

    #[test]
    fn rejects_multi_char_keys_and_bad_resolution() {
        let bad_key = r#"{ "glyphs": { "ab": { "ha": 1 } }, "resolution": 1000 }"#;
        assert!(matches!(
            Font::from_typeface_json(bad_key),
            Err(FontError::GlyphKey(_))
        ));
        let bad_res = r#"{ "glyphs": {}, "resolution": 0 }"#;
        assert!(matches!(
            Font::from_typeface_json(bad_res),
            Err(FontError::Resolution(_))
        ));
    }
}
