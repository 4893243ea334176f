//! Configuration for cell normalization.
//!
//! # Versioning
//!
//! Any change to normalization output (even a bug fix) must come with a
//! `version` bump. Settings files learned against one normalization are only
//! meaningful for records normalized the same way.
//!
//! # Examples
//!
//! ```rust
//! use normalize::NormalizeConfig;
//!
//! let config = NormalizeConfig::default();
//! assert_eq!(config.version, 1);
//! assert!(config.transliterate);
//! assert_eq!(config.null_tokens, vec!["nan", "none", "nat"]);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::NormalizeError;

/// Characters kept besides word characters and whitespace.
pub const RETAINED_PUNCTUATION: &[char] = &['.', '-', '(', ')', ',', ':', '/'];

/// Knobs for the text normalizer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizeConfig {
    /// Normalization behaviour version. Must be >= 1.
    pub version: u32,

    /// Transliterate non-ASCII characters to their closest ASCII form so
    /// diacritic variants (`Café` / `Cafe`) compare equal.
    pub transliterate: bool,

    /// Lower-cased tokens that mean "missing". Compared after every other
    /// text step.
    pub null_tokens: Vec<String>,

    /// Treat cells that are empty after normalization as missing.
    pub empty_as_null: bool,
}

impl NormalizeConfig {
    pub fn validate(&self) -> Result<(), NormalizeError> {
        if self.version == 0 {
            return Err(NormalizeError::InvalidConfig(
                "config version must be >= 1".into(),
            ));
        }
        if let Some(token) = self
            .null_tokens
            .iter()
            .find(|t| t.chars().any(|c| c.is_uppercase()))
        {
            return Err(NormalizeError::InvalidConfig(format!(
                "null token '{token}' must be lower-case"
            )));
        }
        Ok(())
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            transliterate: true,
            null_tokens: vec!["nan".into(), "none".into(), "nat".into()],
            empty_as_null: true,
        }
    }
}
