//! Dimension a throw was taken in

use serde::{Deserialize, Serialize};

use crate::NETHER_SCALE;

/// Home dimension or the 1:8 scaled dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    /// Home dimension, coordinates are used as-is
    Overworld,
    /// Scaled dimension, one block here is eight in the overworld
    Nether,
}

impl Dimension {
    /// Factor converting this dimension's x/z into overworld x/z
    pub fn overworld_scale(&self) -> f64 {
        match self {
            Dimension::Overworld => 1.0,
            Dimension::Nether => NETHER_SCALE,
        }
    }

    pub fn is_nether(&self) -> bool {
        matches!(self, Dimension::Nether)
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Dimension::Overworld => "overworld",
            Dimension::Nether => "nether",
        };
        write!(f, "{}", name)
    }
}
