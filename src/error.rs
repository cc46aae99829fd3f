use std::fmt;

/// Errors surfaced by cache and processor operations.
///
/// Lookups for missing keys are represented as `Option`, never as an error;
/// the variants here all signal a violated precondition at the call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
  /// An entry or item was keyed with an empty string.
  EmptyKey,
  /// An explicit entry id was empty.
  EmptyId,
  /// An `add` targeted a key that is already live. Two entries claiming the
  /// same identity is an ordering error in the caller, not an upsert.
  DuplicateKey(String),
  /// A `replace` targeted a key that does not exist. Replace is not upsert.
  KeyNotFound(String),
}

impl fmt::Display for CacheError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CacheError::EmptyKey => write!(f, "cache key cannot be empty"),
      CacheError::EmptyId => write!(f, "entry id cannot be empty"),
      CacheError::DuplicateKey(key) => {
        write!(f, "an entry is already cached under key '{}'", key)
      }
      CacheError::KeyNotFound(key) => {
        write!(f, "no entry exists under key '{}'", key)
      }
    }
  }
}

impl std::error::Error for CacheError {}
