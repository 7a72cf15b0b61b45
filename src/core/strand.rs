//! The strand reported for a lifted-over coordinate.

use std::str::FromStr;

/// An error related to parsing a strand indicator.
#[derive(Debug, Eq, PartialEq)]
pub struct ParseStrandError(String);

impl std::fmt::Display for ParseStrandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid strand indicator: `{}`", self.0)
    }
}

impl std::error::Error for ParseStrandError {}

/// The strand indicator of a mapped coordinate.
///
/// A [`Strand::Negative`] indicator means the mapped segment is inverted
/// relative to the source build, so whatever is "plus" in one build is "minus"
/// in the other.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Strand {
    /// The positive strand (`+`).
    Positive,
    /// The negative strand (`-`).
    Negative,
}

impl Strand {
    /// Returns whether this indicator signals a strand flip.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::core::Strand;
    ///
    /// assert!(Strand::Negative.is_flipped());
    /// assert!(!Strand::Positive.is_flipped());
    /// ```
    pub fn is_flipped(&self) -> bool {
        matches!(self, Strand::Negative)
    }
}

impl FromStr for Strand {
    type Err = ParseStrandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Self::Positive),
            "-" => Ok(Self::Negative),
            other => Err(ParseStrandError(other.to_string())),
        }
    }
}

impl std::fmt::Display for Strand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strand::Positive => write!(f, "+"),
            Strand::Negative => write!(f, "-"),
        }
    }
}

impl From<omics::coordinate::Strand> for Strand {
    fn from(value: omics::coordinate::Strand) -> Self {
        match value {
            omics::coordinate::Strand::Positive => Strand::Positive,
            omics::coordinate::Strand::Negative => Strand::Negative,
        }
    }
}
