//! Chromosome labels and 1-based genomic locations.
//!
//! Two conventions exist for naming chromosomes: the long form (`chr1`,
//! `chrM`, ...) and the short form (`1`, `MT`, ...). Everything inside this
//! crate uses the long form; short forms are converted once, at the boundary,
//! through [`Chromosome::normalize()`].

use serde::Deserialize;
use serde::Serialize;

/// The prefix of a normalized chromosome label.
const CHR_PREFIX: &str = "chr";

/// The normalized label of the mitochondrial chromosome.
pub const CHR_M: &str = "chrM";

/// A normalized chromosome label (e.g., `chr7`, `chrX`, `chrM`).
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(from = "String", into = "String")]
pub struct Chromosome(String);

impl Chromosome {
    /// Normalizes a chromosome label in either the short or the long form.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::core::Chromosome;
    ///
    /// assert_eq!(Chromosome::normalize("7").as_str(), "chr7");
    /// assert_eq!(Chromosome::normalize("MT").as_str(), "chrM");
    /// assert_eq!(Chromosome::normalize("chrX").as_str(), "chrX");
    /// ```
    pub fn normalize(label: impl AsRef<str>) -> Self {
        let label = label.as_ref();

        if label.starts_with(CHR_PREFIX) {
            return Self(label.to_string());
        }

        match label {
            "MT" | "M" => Self(CHR_M.to_string()),
            short => Self(format!("{CHR_PREFIX}{short}")),
        }
    }

    /// Gets the label as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Chromosome {
    fn from(value: String) -> Self {
        Self::normalize(value)
    }
}

impl From<Chromosome> for String {
    fn from(value: Chromosome) -> Self {
        value.0
    }
}

impl std::fmt::Display for Chromosome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 1-based position upon a chromosome.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Location {
    /// The chromosome.
    chromosome: Chromosome,
    /// The 1-based position.
    position: u64,
}

impl Location {
    /// Creates a new [`Location`].
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::core::Chromosome;
    /// use snpmatch::core::Location;
    ///
    /// let location = Location::new(Chromosome::normalize("22"), 19963748);
    /// assert_eq!(location.to_string(), "chr22:19963748");
    /// ```
    pub fn new(chromosome: Chromosome, position: u64) -> Self {
        Self {
            chromosome,
            position,
        }
    }

    /// Gets the chromosome by reference.
    pub fn chromosome(&self) -> &Chromosome {
        &self.chromosome
    }

    /// Gets the 1-based position.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.chromosome, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_short_forms() {
        assert_eq!(Chromosome::normalize("1").as_str(), "chr1");
        assert_eq!(Chromosome::normalize("X").as_str(), "chrX");
        assert_eq!(Chromosome::normalize("M").as_str(), CHR_M);
        assert_eq!(Chromosome::normalize("MT").as_str(), CHR_M);
        assert_eq!(Chromosome::normalize("chrM").as_str(), CHR_M);
    }

    #[test]
    fn normalizes_on_deserialize() -> Result<(), Box<dyn std::error::Error>> {
        let chromosome = serde_json::from_str::<Chromosome>("\"MT\"")?;
        assert_eq!(chromosome.as_str(), "chrM");
        assert_eq!(serde_json::to_string(&chromosome)?, "\"chrM\"");
        Ok(())
    }
}
