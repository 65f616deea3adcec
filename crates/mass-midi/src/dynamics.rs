//! Dynamics markings and their MIDI velocities.

use crate::error::ExpressionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Symbolic dynamics tag, loudest first.
///
/// The order follows the velocity table rather than concert usage: `mf` sits
/// above `f`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dynamic {
    Ff,
    Mf,
    F,
    #[default]
    Mp,
    P,
    Pp,
}

impl Dynamic {
    pub const ALL: [Dynamic; 6] = [
        Dynamic::Ff,
        Dynamic::Mf,
        Dynamic::F,
        Dynamic::Mp,
        Dynamic::P,
        Dynamic::Pp,
    ];

    pub const fn velocity(self) -> u8 {
        match self {
            Dynamic::Ff => 127,
            Dynamic::Mf => 117,
            Dynamic::F => 107,
            Dynamic::Mp => 97,
            Dynamic::P => 85,
            Dynamic::Pp => 75,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Dynamic::Ff => "ff",
            Dynamic::Mf => "mf",
            Dynamic::F => "f",
            Dynamic::Mp => "mp",
            Dynamic::P => "p",
            Dynamic::Pp => "pp",
        }
    }
}

impl FromStr for Dynamic {
    type Err = ExpressionError;

    /// Accepts `"ff"` as well as the symbol form `":ff"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.strip_prefix(':').unwrap_or(s);
        Dynamic::ALL
            .into_iter()
            .find(|d| d.as_str() == tag)
            .ok_or_else(|| ExpressionError(s.to_string()))
    }
}

impl fmt::Display for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How loud a note plays: a dynamics tag or a literal velocity.
///
/// Literal velocities pass through unchanged, no clamping is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expression {
    Dynamic(Dynamic),
    Velocity(u8),
}

impl Expression {
    pub const fn velocity(self) -> u8 {
        match self {
            Expression::Dynamic(dynamic) => dynamic.velocity(),
            Expression::Velocity(velocity) => velocity,
        }
    }
}

impl Default for Expression {
    fn default() -> Self {
        Expression::Dynamic(Dynamic::default())
    }
}

impl From<Dynamic> for Expression {
    fn from(dynamic: Dynamic) -> Self {
        Expression::Dynamic(dynamic)
    }
}

impl From<u8> for Expression {
    fn from(velocity: u8) -> Self {
        Expression::Velocity(velocity)
    }
}

impl FromStr for Expression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(dynamic) = s.parse::<Dynamic>() {
            return Ok(Expression::Dynamic(dynamic));
        }
        s.trim()
            .parse::<u8>()
            .map(Expression::Velocity)
            .map_err(|_| ExpressionError(s.to_string()))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Dynamic(dynamic) => dynamic.fmt(f),
            Expression::Velocity(velocity) => velocity.fmt(f),
        }
    }
}
