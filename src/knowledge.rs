//! Records published by the knowledge base and the collaborators that produce
//! them.
//!
//! A [`SnpediaSnpInfo`] is built once per marker by a [`DocumentParser`] from
//! the raw document a crawler fetched, stored in the [`Cache`], and never
//! modified afterwards (it is only ever replaced wholesale).

use std::num::ParseFloatError;

use serde::Deserialize;
use serde::Serialize;

use crate::core::Orientation;
use crate::core::ReferenceBuild;
use crate::core::Rsid;
use crate::genotype;
use crate::Genotype;

pub mod cache;
pub mod documents;

pub use cache::Cache;
pub use documents::DocumentDirectory;

/// The number of cells in a variant table row.
const ROW_CELLS: usize = 3;

/// An error related to turning a variant table row into a [`GenotypeSummary`].
#[derive(Debug, PartialEq)]
pub enum RowError {
    /// The row had the wrong number of cells.
    InvalidCellCount(usize),
    /// The genotype cell could not be parsed.
    InvalidGenotype(genotype::ParseError),
    /// The magnitude cell could not be parsed.
    InvalidMagnitude(ParseFloatError),
    /// The magnitude was negative or not a number.
    NegativeMagnitude(f64),
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowError::InvalidCellCount(count) => write!(
                f,
                "invalid number of cells: expected {}, found {}",
                ROW_CELLS, count
            ),
            RowError::InvalidGenotype(err) => write!(f, "invalid genotype: {}", err),
            RowError::InvalidMagnitude(err) => write!(f, "invalid magnitude: {}", err),
            RowError::NegativeMagnitude(value) => {
                write!(f, "magnitude must be a non-negative number, found {}", value)
            }
        }
    }
}

impl std::error::Error for RowError {}

/// One published variant of a marker.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GenotypeSummary {
    /// The genotype of the variant.
    #[serde(rename = "genotype_str")]
    pub genotype: Genotype,

    /// The importance score of the variant.
    ///
    /// An explicit `0` ("known to have no effect") is distinct from an absent
    /// magnitude ("unknown effect").
    #[serde(default)]
    pub magnitude: Option<f64>,

    /// A free-text summary of the variant.
    #[serde(default)]
    pub description: Option<String>,
}

impl GenotypeSummary {
    /// Builds a summary from the text cells of one variant table row:
    /// `[genotype, magnitude, description]`.
    ///
    /// An empty magnitude (or description) cell means the value is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::knowledge::GenotypeSummary;
    ///
    /// let row = ["(A;G)", "2.5", "increased risk"].map(String::from);
    /// let summary = GenotypeSummary::from_row(&row)?;
    ///
    /// assert_eq!(summary.genotype.to_string(), "(A;G)");
    /// assert_eq!(summary.magnitude, Some(2.5));
    /// assert_eq!(summary.description.as_deref(), Some("increased risk"));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_row(cells: &[String]) -> Result<Self, RowError> {
        let [genotype, magnitude, description] = cells else {
            return Err(RowError::InvalidCellCount(cells.len()));
        };

        let genotype = genotype
            .trim()
            .parse::<Genotype>()
            .map_err(RowError::InvalidGenotype)?;

        let magnitude = match magnitude.trim() {
            "" => None,
            value => {
                let value = value.parse::<f64>().map_err(RowError::InvalidMagnitude)?;

                // NOTE: `!(value >= 0.0)` also rejects NaN.
                if !(value >= 0.0) {
                    return Err(RowError::NegativeMagnitude(value));
                }

                Some(value)
            }
        };

        let description = Some(description.trim())
            .filter(|description| !description.is_empty())
            .map(String::from);

        Ok(Self {
            genotype,
            magnitude,
            description,
        })
    }
}

/// Builds the ordered variant list from a parsed variant table, skipping the
/// header row.
pub fn summaries_from_rows(rows: &[Vec<String>]) -> Result<Vec<GenotypeSummary>, RowError> {
    rows.iter()
        .skip(1)
        .map(|row| GenotypeSummary::from_row(row))
        .collect()
}

/// Everything the knowledge base publishes about one marker.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SnpediaSnpInfo {
    /// A free-text summary of the marker.
    #[serde(default)]
    pub description: Option<String>,

    /// The published variants, in the order the knowledge base lists them.
    #[serde(default)]
    pub genotype_summaries: Vec<GenotypeSummary>,

    /// The stabilized orientation of the marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stabilized_orientation: Option<Orientation>,

    /// The strand the variants are written in, relative to
    /// [`reference_build`](Self::reference_build).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,

    /// The raw reference build label (e.g., `GRCh38.p2`).
    #[serde(default)]
    pub reference_build: Option<String>,
}

impl SnpediaSnpInfo {
    /// Resolves the build the published orientation refers to, using
    /// `default` when the label is absent or unrecognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::core::ReferenceBuild;
    /// use snpmatch::knowledge::SnpediaSnpInfo;
    ///
    /// let info = SnpediaSnpInfo {
    ///     reference_build: Some(String::from("GRCh37.p13")),
    ///     ..Default::default()
    /// };
    ///
    /// assert_eq!(
    ///     info.reference_build(ReferenceBuild::DEFAULT),
    ///     ReferenceBuild::Build37
    /// );
    /// ```
    pub fn reference_build(&self, default: ReferenceBuild) -> ReferenceBuild {
        ReferenceBuild::from_knowledge_base_label(self.reference_build.as_deref(), default)
    }

    /// Returns whether the published orientation disagrees with the
    /// stabilized orientation.
    pub fn orientation_changed(&self) -> bool {
        self.orientation.is_some() && self.orientation != self.stabilized_orientation
    }
}

/// A source of previously fetched raw documents.
///
/// Implementations must never reach out to the network: the cache migration
/// path relies on re-reading what was already fetched.
pub trait DocumentFetcher {
    /// Gets the previously fetched raw document for `rsid`, if any.
    fn cached_document(&self, rsid: &Rsid) -> Option<Vec<u8>>;
}

impl<F> DocumentFetcher for F
where
    F: Fn(&Rsid) -> Option<Vec<u8>>,
{
    fn cached_document(&self, rsid: &Rsid) -> Option<Vec<u8>> {
        self(rsid)
    }
}

/// Turns a raw document into a structured record.
pub trait DocumentParser {
    /// The error returned when a document cannot be parsed.
    type Error: std::error::Error;

    /// Parses a raw document.
    fn parse(&self, document: &[u8]) -> Result<SnpediaSnpInfo, Self::Error>;
}

impl<F, E> DocumentParser for F
where
    F: Fn(&[u8]) -> Result<SnpediaSnpInfo, E>,
    E: std::error::Error,
{
    type Error = E;

    fn parse(&self, document: &[u8]) -> Result<SnpediaSnpInfo, Self::Error> {
        self(document)
    }
}
