use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Screen coordinate used as the synthetic-input fallback target.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct InputPoint {
    /// Horizontal coordinate in engine pixels.
    pub x: u32,
    /// Vertical coordinate in engine pixels.
    pub y: u32,
}

impl fmt::Display for InputPoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{},{}", self.x, self.y)
    }
}

impl FromStr for InputPoint {
    type Err = PointParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (x, y) = input
            .split_once(',')
            .ok_or_else(|| PointParseError::MissingSeparator(input.to_owned()))?;
        Ok(Self {
            x: x.trim().parse()?,
            y: y.trim().parse()?,
        })
    }
}

/// Errors encountered while parsing an [`InputPoint`] from text.
#[derive(Debug, Error)]
pub enum PointParseError {
    /// Input lacked the `x,y` separator.
    #[error("expected 'x,y' but found '{0}'")]
    MissingSeparator(String),
    /// A coordinate was not an unsigned integer.
    #[error("invalid coordinate: {0}")]
    Coordinate(#[from] std::num::ParseIntError),
}
