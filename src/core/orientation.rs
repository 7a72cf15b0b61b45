//! The strand sense in which a genotype or a list of variants is written.

use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// An error related to the parsing of an [`Orientation`].
#[derive(Debug, Eq, PartialEq)]
pub struct ParseOrientationError(String);

impl std::fmt::Display for ParseOrientationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid orientation: {}", self.0)
    }
}

impl std::error::Error for ParseOrientationError {}

/// The strand sense of a sequence.
///
/// Serializes as the literal strings `"plus"` and `"minus"`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// The plus strand.
    Plus,
    /// The minus strand.
    Minus,
}

impl Orientation {
    /// Returns the opposite orientation.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::core::Orientation;
    ///
    /// assert_eq!(Orientation::Plus.other(), Orientation::Minus);
    /// assert_eq!(Orientation::Minus.other().other(), Orientation::Minus);
    /// ```
    pub fn other(&self) -> Orientation {
        match self {
            Orientation::Plus => Orientation::Minus,
            Orientation::Minus => Orientation::Plus,
        }
    }
}

impl FromStr for Orientation {
    type Err = ParseOrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plus" => Ok(Orientation::Plus),
            "minus" => Ok(Orientation::Minus),
            v => Err(ParseOrientationError(v.to_string())),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Plus => write!(f, "plus"),
            Orientation::Minus => write!(f, "minus"),
        }
    }
}
