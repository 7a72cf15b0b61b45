//! Core value types used across the crate.

pub mod build;
pub mod location;
pub mod orientation;
pub mod rsid;
pub mod strand;

pub use build::ReferenceBuild;
pub use location::Chromosome;
pub use location::Location;
pub use orientation::Orientation;
pub use rsid::Rsid;
pub use strand::Strand;
