//! Observed alleles at a locus.
//!
//! A genotype is written as `(X;Y)`: a parenthesized, `;`-separated list of
//! alleles. Most loci are diploid, so most genotypes have two alleles, but
//! haploid loci (`(A)`) and longer tuples are representable too.
//!
//! ```
//! use snpmatch::Genotype;
//!
//! let genotype = "(A;G)".parse::<Genotype>()?;
//! assert_eq!(genotype.complementary().to_string(), "(T;C)");
//! assert!(genotype.unordered_eq(&"(G;A)".parse()?));
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// The opening delimiter of a genotype.
const OPEN: char = '(';

/// The closing delimiter of a genotype.
const CLOSE: char = ')';

/// The delimiter between alleles.
const ALLELE_DELIMITER: char = ';';

/// An error related to parsing a [`Genotype`].
#[derive(Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The text is not wrapped in matching parentheses.
    MissingParentheses(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingParentheses(value) => {
                write!(f, "genotype is not wrapped in parentheses: `{}`", value)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Complements a single base, leaving anything that is not `A`, `C`, `G` or
/// `T` untouched (e.g., `-` for a deletion).
fn complement_base(base: char) -> char {
    match base {
        'A' => 'T',
        'T' => 'A',
        'C' => 'G',
        'G' => 'C',
        other => other,
    }
}

/// Complements every base of an allele, preserving order.
fn complement_allele(allele: &str) -> String {
    allele.chars().map(complement_base).collect()
}

/// The alleles observed at a locus.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct Genotype {
    /// The alleles, in the order they were reported.
    alleles: Vec<String>,
}

impl Genotype {
    /// Creates a new [`Genotype`] from its alleles.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::Genotype;
    ///
    /// let genotype = Genotype::new(["A", "G"]);
    /// assert_eq!(genotype.to_string(), "(A;G)");
    /// ```
    pub fn new<I, S>(alleles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            alleles: alleles.into_iter().map(Into::into).collect(),
        }
    }

    /// Gets the alleles.
    pub fn alleles(&self) -> &[String] {
        &self.alleles
    }

    /// Returns the genotype as read from the opposite strand.
    ///
    /// Every base is mapped through the complement table (`A`↔`T`, `C`↔`G`);
    /// the order and number of alleles are preserved.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::Genotype;
    ///
    /// let genotype = "(A;T)".parse::<Genotype>()?;
    /// assert_eq!(genotype.complementary().to_string(), "(T;A)");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn complementary(&self) -> Genotype {
        Genotype {
            alleles: self
                .alleles
                .iter()
                .map(|allele| complement_allele(allele))
                .collect(),
        }
    }

    /// Returns whether both genotypes carry the same alleles, ignoring order.
    ///
    /// Genotypes with a different number of alleles are never equal.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::Genotype;
    ///
    /// let a = "(A;T)".parse::<Genotype>()?;
    /// assert!(a.unordered_eq(&"(T;A)".parse()?));
    /// assert!(!a.unordered_eq(&"(A;A)".parse()?));
    /// assert!(!a.unordered_eq(&"(A)".parse()?));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn unordered_eq(&self, other: &Genotype) -> bool {
        let (a, b) = (&self.alleles, &other.alleles);

        if a.len() != b.len() {
            return false;
        }

        match a.len() {
            1 => a[0] == b[0],
            2 => (a[0] == b[0] && a[1] == b[1]) || (a[0] == b[1] && a[1] == b[0]),
            _ => {
                let mut a = a.iter().collect::<Vec<_>>();
                let mut b = b.iter().collect::<Vec<_>>();
                a.sort_unstable();
                b.sort_unstable();
                a == b
            }
        }
    }
}

impl FromStr for Genotype {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .strip_prefix(OPEN)
            .and_then(|rest| rest.strip_suffix(CLOSE))
            .ok_or_else(|| ParseError::MissingParentheses(s.to_string()))?;

        Ok(Genotype::new(inner.split(ALLELE_DELIMITER)))
    }
}

impl TryFrom<String> for Genotype {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Genotype> for String {
    fn from(value: Genotype) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for Genotype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}{}",
            OPEN,
            self.alleles.join(&ALLELE_DELIMITER.to_string()),
            CLOSE
        )
    }
}
