//! Liftover backed by UCSC chain files.
//!
//! Chain files are expected to follow the UCSC naming convention,
//! `<from>To<To>.over.chain.gz` (e.g., `hg19ToHg38.over.chain.gz`), where both
//! names are the [liftover names](crate::core::build::BuildInfo::liftover_name)
//! of the builds involved.

use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use chainfile::liftover::machine::Builder;
use chainfile::liftover::Machine;
use flate2::read::GzDecoder;
use omics::coordinate::system::Interbase;
use omics::coordinate::Coordinate;
use omics::coordinate::Interval;
use tracing::debug;
use tracing::info;

use crate::core::Chromosome;
use crate::core::Location;
use crate::core::ReferenceBuild;
use crate::core::Strand;
use crate::liftover::LiftedLocation;
use crate::liftover::Liftover;
use crate::liftover::LiftoverProvider;

/// The suffix shared by all UCSC chain files.
const CHAIN_FILE_SUFFIX: &str = ".over.chain.gz";

/// An error related to opening a chain file.
#[derive(Debug)]
pub enum Error {
    /// The chain file could not be opened.
    Open(PathBuf, io::Error),
    /// The chain file could not be turned into a liftover machine.
    Build(PathBuf, String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Open(path, err) => write!(f, "could not open {}: {}", path.display(), err),
            Error::Build(path, err) => {
                write!(f, "invalid chain file {}: {}", path.display(), err)
            }
        }
    }
}

impl std::error::Error for Error {}

/// The name of the chain file between two builds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChainName {
    /// The liftover name of the build we're converting from (lowercase).
    from: &'static str,

    /// The liftover name of the build we're converting to.
    to: &'static str,
}

impl ChainName {
    /// Creates the chain name for converting from `from` to `to`.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::core::ReferenceBuild;
    /// use snpmatch::liftover::chain::ChainName;
    ///
    /// let name = ChainName::new(ReferenceBuild::Build37, ReferenceBuild::Build38);
    ///
    /// assert_eq!(name.name(), "hg19ToHg38");
    /// assert_eq!(name.file_name(), "hg19ToHg38.over.chain.gz");
    /// ```
    pub fn new(from: ReferenceBuild, to: ReferenceBuild) -> Self {
        Self {
            from: from.info().liftover_name(),
            to: to.info().liftover_name(),
        }
    }

    /// Gets the full chain name.
    pub fn name(&self) -> String {
        // NOTE: UCSC capitalizes the first letter of the target genome.
        let mut chars = self.to.chars();
        let to = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };

        format!("{}To{}", self.from, to)
    }

    /// Gets the file name of the chain.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.name(), CHAIN_FILE_SUFFIX)
    }
}

/// Opens liftovers from gzipped chain files found in a directory.
#[derive(Clone, Debug)]
pub struct ChainFileProvider {
    /// The directory holding the chain files.
    directory: PathBuf,
}

impl ChainFileProvider {
    /// Creates a new [`ChainFileProvider`] reading from `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Gets the directory holding the chain files.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Gets the path of the chain file from `from` to `to`.
    pub fn chain_path(&self, from: ReferenceBuild, to: ReferenceBuild) -> PathBuf {
        self.directory.join(ChainName::new(from, to).file_name())
    }
}

impl LiftoverProvider for ChainFileProvider {
    type Liftover = ChainLiftover;
    type Error = Error;

    fn open(&self, from: ReferenceBuild, to: ReferenceBuild) -> Result<ChainLiftover, Error> {
        let path = self.chain_path(from, to);
        info!("building liftover from {}", path.display());

        let reader = File::open(&path)
            .map(GzDecoder::new)
            .map(BufReader::new)
            .map(chainfile::Reader::new)
            .map_err(|err| Error::Open(path.clone(), err))?;

        let machine = Builder
            .try_build_from(reader)
            .map_err(|err| Error::Build(path.clone(), err.to_string()))?;

        Ok(ChainLiftover { machine })
    }
}

/// A liftover between two fixed builds backed by a chain file.
#[derive(Debug)]
pub struct ChainLiftover {
    /// The liftover machine built from the chain file.
    machine: Machine,
}

impl Liftover for ChainLiftover {
    fn convert(&self, location: &Location) -> Option<LiftedLocation> {
        // A 1-based position `p` is the interbase interval `[p - 1, p]`.
        let start = location.position().checked_sub(1)?;
        let contig = location.chromosome().as_str();

        let interval = match Interval::try_new(
            Coordinate::<Interbase>::new(contig, omics::coordinate::Strand::Positive, start),
            Coordinate::<Interbase>::new(contig, omics::coordinate::Strand::Positive, start + 1),
        ) {
            Ok(interval) => interval,
            Err(err) => {
                debug!("cannot build an interval for {}: {}", location, err);
                return None;
            }
        };

        let pair = self.machine.liftover(interval)?.into_iter().next()?;
        let query = pair.into_query();
        let strand = query.strand();

        // NOTE: the start of a base on the positive strand is the end of that
        // same base on the negative strand, so the mapped segment is flipped
        // back onto the positive strand before reading its position.
        let query = match strand {
            omics::coordinate::Strand::Positive => query,
            omics::coordinate::Strand::Negative => query.reverse_complement(),
        };

        let (contig, _, position) = query.into_start().into_parts();

        Some(LiftedLocation::new(
            Location::new(Chromosome::normalize(contig.into_inner()), position.get() + 1),
            Strand::from(strand),
        ))
    }
}
