//! Facilities for converting coordinates between reference builds.
//!
//! The liftover algorithm itself lives outside this crate. A
//! [`LiftoverProvider`] opens a [`Liftover`] for a pair of builds, which is
//! usually expensive (reading and indexing a chain file), and the [`Liftover`]
//! then maps single locations cheaply.

use crate::core::Location;
use crate::core::ReferenceBuild;
use crate::core::Strand;

pub mod chain;

pub use chain::ChainFileProvider;

/// A location mapped into another build.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LiftedLocation {
    /// The mapped location.
    location: Location,
    /// The strand indicator of the mapped segment.
    strand: Strand,
}

impl LiftedLocation {
    /// Creates a new [`LiftedLocation`].
    pub fn new(location: Location, strand: Strand) -> Self {
        Self { location, strand }
    }

    /// Gets the mapped location.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Gets the strand indicator of the mapped segment.
    ///
    /// [`Strand::Negative`] means the segment is inverted between the two
    /// builds.
    pub fn strand(&self) -> Strand {
        self.strand
    }
}

/// Maps locations from one fixed build into another.
pub trait Liftover {
    /// Converts `location`, returning [`None`] if it has no counterpart in the
    /// target build.
    fn convert(&self, location: &Location) -> Option<LiftedLocation>;
}

impl<F> Liftover for F
where
    F: Fn(&Location) -> Option<LiftedLocation>,
{
    fn convert(&self, location: &Location) -> Option<LiftedLocation> {
        self(location)
    }
}

/// Opens [`Liftover`]s between pairs of builds.
pub trait LiftoverProvider {
    /// The liftover produced for a pair of builds.
    type Liftover: Liftover;

    /// The error returned when a liftover cannot be opened.
    type Error: std::error::Error;

    /// Opens the liftover from build `from` to build `to`.
    fn open(&self, from: ReferenceBuild, to: ReferenceBuild)
        -> Result<Self::Liftover, Self::Error>;
}
