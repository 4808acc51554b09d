//! Code value - a normalized, redeemable code string

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized code value (trimmed, upper-cased, 5-50 characters)
///
/// Lookups are case-insensitive because every code is stored in this form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CodeValue(String);

impl CodeValue {
    pub const MIN_LEN: usize = 5;
    pub const MAX_LEN: usize = 50;

    /// Length of codes produced by [`CodeValue::generate`]
    pub const GENERATED_LEN: usize = 12;

    /// Normalize and validate raw user or operator input
    pub fn parse(raw: &str) -> Result<Self, CodeValueError> {
        let value = raw.trim().to_uppercase();
        let len = value.chars().count();

        if len < Self::MIN_LEN {
            return Err(CodeValueError::TooShort { min: Self::MIN_LEN });
        }
        if len > Self::MAX_LEN {
            return Err(CodeValueError::TooLong { max: Self::MAX_LEN });
        }

        Ok(Self(value))
    }

    /// Generate a random upper-case alphanumeric code
    pub fn generate() -> Self {
        use rand::Rng;

        // Ambiguous glyphs (0/O, 1/I) are left out so codes survive being read aloud
        const CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

        let mut rng = rand::thread_rng();
        let value = (0..Self::GENERATED_LEN)
            .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
            .collect();
        Self(value)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Error when a raw string is not an acceptable code
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodeValueError {
    #[error("code must be at least {min} characters")]
    TooShort { min: usize },

    #[error("code must be at most {max} characters")]
    TooLong { max: usize },
}

impl fmt::Display for CodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CodeValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CodeValue {
    type Error = CodeValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CodeValue> for String {
    fn from(value: CodeValue) -> Self {
        value.0
    }
}

impl std::str::FromStr for CodeValue {
    type Err = CodeValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
