//! The personal-genotype cache.
//!
//! An importer turns a raw genome file into [`InputRecord`]s once and stores
//! them, together with the build the genome was called against, in a small
//! JSON file:
//!
//! ```text
//! { "version": 2, "build": "BUILD37", "snps": [ { "rsid": "rs4680", ... } ] }
//! ```
//!
//! Unlike the knowledge cache, this file is never migrated: a different
//! version means the genome must be imported again.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::core::Chromosome;
use crate::core::Location;
use crate::core::ReferenceBuild;
use crate::core::Rsid;
use crate::genotype;
use crate::Genotype;

/// The schema version written by this release.
pub const FILE_VERSION: u32 = 2;

/// The genotype text of a marker that could not be called.
pub const NO_CALL: &str = "(-;-)";

/// An error related to the personal-genotype cache.
#[derive(Debug)]
pub enum Error {
    /// The file could not be read.
    Read(PathBuf, io::Error),
    /// The file could not be written.
    Write(PathBuf, io::Error),
    /// The file is not valid JSON or does not match the schema.
    Deserialize(PathBuf, serde_json::Error),
    /// The data could not be serialized.
    Serialize(serde_json::Error),
    /// The file was written with another schema version (or none).
    Version(Option<u32>),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Read(path, err) => write!(f, "could not read {}: {}", path.display(), err),
            Error::Write(path, err) => write!(f, "could not write {}: {}", path.display(), err),
            Error::Deserialize(path, err) => {
                write!(f, "could not parse {}: {}", path.display(), err)
            }
            Error::Serialize(err) => write!(f, "could not serialize personal data: {}", err),
            Error::Version(Some(version)) => write!(
                f,
                "personal data version {} does not match {}; please import the genome again",
                version, FILE_VERSION
            ),
            Error::Version(None) => write!(
                f,
                "personal data has no version; please import the genome again"
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// One marker observed in a personal genome.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct InputRecord {
    /// The marker id.
    pub rsid: Rsid,

    /// The chromosome the marker was called on.
    pub chromosome: Chromosome,

    /// The 1-based position of the marker in the personal build.
    pub position: u64,

    /// The genotype in its `(X;Y)` text form.
    ///
    /// This is kept as text and only parsed when a marker is actually
    /// resolved.
    pub genotype: String,
}

impl InputRecord {
    /// Gets the location of the marker.
    pub fn location(&self) -> Location {
        Location::new(self.chromosome.clone(), self.position)
    }

    /// Parses the genotype.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::core::Chromosome;
    /// use snpmatch::personal::InputRecord;
    ///
    /// let record = InputRecord {
    ///     rsid: "rs4680".into(),
    ///     chromosome: Chromosome::normalize("22"),
    ///     position: 19951271,
    ///     genotype: String::from("(A;G)"),
    /// };
    ///
    /// assert_eq!(record.genotype()?.alleles(), ["A", "G"]);
    /// assert_eq!(record.location().to_string(), "chr22:19951271");
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn genotype(&self) -> std::result::Result<Genotype, genotype::ParseError> {
        self.genotype.parse()
    }

    /// Returns whether the marker was actually called.
    pub fn is_called(&self) -> bool {
        self.genotype != NO_CALL
    }
}

/// The serialized form of the personal-genotype file.
#[derive(Debug, Deserialize, Serialize)]
struct Contents {
    /// The schema version.
    version: u32,

    /// The build the genome was called against.
    build: ReferenceBuild,

    /// The observed markers.
    snps: Vec<InputRecord>,
}

/// Just enough of the file to check its version.
#[derive(Deserialize)]
struct Header {
    /// The schema version.
    #[serde(default)]
    version: Option<u32>,
}

/// The markers observed in one personal genome.
#[derive(Clone, Debug)]
pub struct PersonalData {
    /// The observed markers, keyed by marker id.
    records: BTreeMap<Rsid, InputRecord>,

    /// The build the genome was called against.
    build: ReferenceBuild,
}

impl PersonalData {
    /// Creates personal data from the records of an importer.
    ///
    /// When a marker appears more than once, the last record wins.
    pub fn new(records: impl IntoIterator<Item = InputRecord>, build: ReferenceBuild) -> Self {
        let records = records
            .into_iter()
            .map(|record| (record.rsid.clone(), record))
            .collect();

        Self { records, build }
    }

    /// Loads personal data from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|err| Error::Read(path.to_path_buf(), err))?;

        let header = serde_json::from_str::<Header>(&raw)
            .map_err(|err| Error::Deserialize(path.to_path_buf(), err))?;

        if header.version != Some(FILE_VERSION) {
            return Err(Error::Version(header.version));
        }

        let contents = serde_json::from_str::<Contents>(&raw)
            .map_err(|err| Error::Deserialize(path.to_path_buf(), err))?;

        debug!(
            "loaded {} personal records ({}) from {}",
            contents.snps.len(),
            contents.build,
            path.display()
        );

        Ok(Self::new(contents.snps, contents.build))
    }

    /// Writes the personal data to `path`.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let contents = Contents {
            version: FILE_VERSION,
            build: self.build,
            snps: self.records.values().cloned().collect(),
        };

        let raw = serde_json::to_vec(&contents).map_err(Error::Serialize)?;
        fs::write(path, raw).map_err(|err| Error::Write(path.to_path_buf(), err))
    }

    /// Gets the build the genome was called against.
    pub fn reference_build(&self) -> ReferenceBuild {
        self.build
    }

    /// Gets the record for `rsid`, if observed.
    pub fn get(&self, rsid: &Rsid) -> Option<&InputRecord> {
        self.records.get(rsid)
    }

    /// Returns whether a called genotype was observed for `rsid`.
    pub fn has_genotype(&self, rsid: &Rsid) -> bool {
        self.get(rsid).is_some_and(InputRecord::is_called)
    }

    /// Iterates over all records, ordered by marker id.
    pub fn iter(&self) -> impl Iterator<Item = &InputRecord> {
        self.records.values()
    }

    /// Gets the number of observed markers.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns whether no markers were observed.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
