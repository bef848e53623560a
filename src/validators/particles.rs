//! XSD Particle Schema Components
//!
//! Particles pair a term with occurrence constraints (minOccurs, maxOccurs).
//! The content model builder reads these bounds to decide how a particle is
//! folded into the automaton.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#p

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ParseError, Result};

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max_occurs means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Create occurrence bounds, rejecting `min > max`
    pub fn checked(min: u32, max: Option<u32>) -> Result<Self> {
        match max {
            Some(max) if min > max => Err(ParseError::new(format!(
                "minOccurs ({}) must be lesser or equal than maxOccurs ({})",
                min, max
            ))
            .into()),
            _ => Ok(Self { min, max }),
        }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// Empty (0, 0)
    pub fn empty() -> Self {
        Self { min: 0, max: Some(0) }
    }

    /// Check if this particle is empty (maxOccurs == 0)
    pub fn is_empty(&self) -> bool {
        self.max == Some(0)
    }

    /// Check if this is exactly (1, 1)
    pub fn is_once(&self) -> bool {
        self.min == 1 && self.max == Some(1)
    }

    /// Check if occurrence count is under the minimum
    pub fn is_missing(&self, count: u32) -> bool {
        count < self.min
    }

    /// Check if occurrence count is at or over the maximum
    pub fn is_over(&self, count: u32) -> bool {
        match self.max {
            Some(max) => count >= max,
            None => false,
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{{{},{}}}", self.min, max),
            None => write!(f, "{{{},unbounded}}", self.min),
        }
    }
}

/// Trait for XSD components that have particle semantics
pub trait Particle {
    /// Get the occurrence bounds
    fn occurs(&self) -> Occurs;
}
