// Cache key derivation
// Author: kelexine (https://github.com/kelexine)

/// Default number of characters kept from each key part.
pub const DEFAULT_MAX_PART_CHARS: usize = 100;

/// Default separator placed between key parts.
pub const DEFAULT_SEPARATOR: char = '|';

/// Turns free-text inputs into a short, stable cache key.
///
/// Each part is cut to `max_part_chars` characters and the parts are joined
/// with `separator`. Keys are not hashed: two prompts sharing their first
/// `max_part_chars` characters map to the same key. That is acceptable for
/// a response cache and keeps keys readable in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheKeyDeriver {
    max_part_chars: usize,
    separator: char,
}

impl Default for CacheKeyDeriver {
    fn default() -> Self {
        Self {
            max_part_chars: DEFAULT_MAX_PART_CHARS,
            separator: DEFAULT_SEPARATOR,
        }
    }
}

impl CacheKeyDeriver {
    pub fn new(max_part_chars: usize, separator: char) -> Self {
        Self {
            max_part_chars,
            separator,
        }
    }

    pub fn with_max_part_chars(max_part_chars: usize) -> Self {
        Self {
            max_part_chars,
            ..Self::default()
        }
    }

    pub fn derive<S: AsRef<str>>(&self, parts: &[S]) -> String {
        let mut key = String::new();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                key.push(self.separator);
            }
            key.extend(part.as_ref().chars().take(self.max_part_chars));
        }
        key
    }
}

/// Derive a key with the default truncation and separator.
pub fn derive_key<S: AsRef<str>>(parts: &[S]) -> String {
    CacheKeyDeriver::default().derive(parts)
}
