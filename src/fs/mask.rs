//! Wildcard masks applied to file and directory names

use crate::error::ConfigError;
use glob::{MatchOptions, Pattern};
use std::fmt;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: !cfg!(windows),
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled wildcard mask (`*`, `?`, `[...]`) matched against a bare name
#[derive(Clone)]
pub struct Mask {
    source: String,
    pattern: Option<Pattern>,
}

impl Mask {
    /// Compile a mask. `*` and `*.*` match every name.
    pub fn new(mask: &str) -> Result<Self, ConfigError> {
        let mask = mask.trim();
        if mask.is_empty() || mask == "*" || mask == "*.*" {
            return Ok(Self::all());
        }

        let pattern = Pattern::new(mask).map_err(|e| ConfigError::InvalidMask {
            mask: mask.to_string(),
            reason: e.msg.to_string(),
        })?;

        Ok(Self {
            source: mask.to_string(),
            pattern: Some(pattern),
        })
    }

    /// Mask that accepts every name
    pub fn all() -> Self {
        Self {
            source: "*".to_string(),
            pattern: None,
        }
    }

    pub fn matches_all(&self) -> bool {
        self.pattern.is_none()
    }

    pub fn is_match(&self, name: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.matches_with(name, MATCH_OPTIONS),
            None => true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for Mask {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Mask").field(&self.source).finish()
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_all_forms() {
        for source in ["*", "*.*", ""] {
            let mask = Mask::new(source).unwrap();
            assert!(mask.matches_all());
            assert!(mask.is_match("Makefile"));
        }
    }

    #[test]
    fn test_wildcards() {
        let mask = Mask::new("*.txt").unwrap();
        assert!(mask.is_match("a.txt"));
        assert!(!mask.is_match("c.log"));

        let mask = Mask::new("data_??.csv").unwrap();
        assert!(mask.is_match("data_01.csv"));
        assert!(!mask.is_match("data_1.csv"));
    }

    #[test]
    fn test_invalid_mask() {
        let err = Mask::new("[abc").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMask { .. }));
    }
}
