use rand::Rng;

use crate::FieldError;

/// Characters an agent may display. Duplicates are kept, so a character that
/// appears twice is picked twice as often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet {
    chars: Vec<char>,
}

impl Alphabet {
    pub fn new(source: &str) -> Result<Self, FieldError> {
        let chars: Vec<char> = source.chars().collect();
        if chars.is_empty() {
            return Err(FieldError::EmptyAlphabet);
        }
        Ok(Self { chars })
    }

    /// Uniformly random character.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> char {
        self.chars[rng.gen_range(0..self.chars.len())]
    }

    pub fn contains(&self, c: char) -> bool {
        self.chars.contains(&c)
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Number of distinct characters, the upper bound on cache entries one
    /// field can produce per font.
    pub fn distinct(&self) -> usize {
        let mut sorted = self.chars.clone();
        sorted.sort_unstable();
        sorted.dedup();
        sorted.len()
    }
}
