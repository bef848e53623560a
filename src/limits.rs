//! Limits and constraints for content model compilation
//!
//! Large `maxOccurs` values expand into large node trees and automata. These
//! limits bound that expansion so that a hostile schema cannot exhaust memory.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default value of the "max occurs node limit" security setting
pub const DEFAULT_MAX_OCCUR_NODE_LIMIT: usize = 3000;

/// Global limits configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum occurs node limit (`None` disables the node count check)
    pub max_occur_node_limit: Option<usize>,

    /// Factor applied to `max_occur_node_limit` to obtain the node budget
    pub node_limit_multiplier: usize,

    /// Maximum nesting depth of particles inside one content model
    pub max_model_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_occur_node_limit: Some(DEFAULT_MAX_OCCUR_NODE_LIMIT),
            node_limit_multiplier: 1,
            max_model_depth: 100,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_occur_node_limit: Some(500),
            node_limit_multiplier: 1,
            max_model_depth: 20,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_occur_node_limit: Some(100_000),
            node_limit_multiplier: 1,
            max_model_depth: 1000,
        }
    }

    /// Limits without a node count check, as when no security manager is set
    pub fn unlimited() -> Self {
        Self {
            max_occur_node_limit: None,
            ..Self::permissive()
        }
    }

    /// Node budget per content model, if any
    pub fn max_node_limit(&self) -> Option<usize> {
        self.max_occur_node_limit
            .map(|limit| limit.saturating_mul(self.node_limit_multiplier))
    }

    /// Check if a particle nesting depth is within limits
    pub fn check_model_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_model_depth {
            Err(Error::LimitExceeded(format!(
                "content model depth {} exceeds maximum {}",
                depth, self.max_model_depth
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert_eq!(limits.max_occur_node_limit, Some(3000));
        assert_eq!(limits.max_node_limit(), Some(3000));
        assert!(limits.check_model_depth(50).is_ok());
        assert!(limits.check_model_depth(150).is_err());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.max_node_limit() < Limits::default().max_node_limit());
        assert!(limits.check_model_depth(30).is_err());
    }

    #[test]
    fn test_unlimited() {
        let limits = Limits::unlimited();
        assert_eq!(limits.max_node_limit(), None);
        assert!(limits.check_model_depth(500).is_ok());
    }

    #[test]
    fn test_multiplier() {
        let limits = Limits {
            max_occur_node_limit: Some(1000),
            node_limit_multiplier: 3,
            ..Limits::default()
        };
        assert_eq!(limits.max_node_limit(), Some(3000));

        let huge = Limits {
            max_occur_node_limit: Some(usize::MAX),
            node_limit_multiplier: 3,
            ..Limits::default()
        };
        assert_eq!(huge.max_node_limit(), Some(usize::MAX));
    }

    #[test]
    fn test_deserialize_partial() {
        let limits: Limits = serde_json::from_str(r#"{"max_occur_node_limit": 10}"#).unwrap();
        assert_eq!(limits.max_occur_node_limit, Some(10));
        assert_eq!(limits.node_limit_multiplier, 1);

        let limits: Limits = serde_json::from_str(r#"{"max_occur_node_limit": null}"#).unwrap();
        assert_eq!(limits.max_node_limit(), None);
    }
}
