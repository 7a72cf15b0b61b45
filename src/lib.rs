//! `snpmatch` is a crate for matching personal genotypes against the variants
//! a community knowledge base publishes for each marker (SNP).
//!
//! The hard part of this is deciding _which_ published variant a person
//! actually carries. DNA is double-stranded, so the knowledge base may write
//! its variants on either strand, and the personal genome and the knowledge
//! base may use different reference builds, across which the "plus" strand of
//! a region can invert. Getting this wrong silently reports the wrong trait.
//!
//! The crate is organized around the following pieces:
//!
//! - The genotype model ([`Genotype`]), with strand complementation and
//!   order-independent comparison.
//! - The [reference build registry](crate::core::ReferenceBuild), which maps
//!   the knowledge base's build labels and the liftover names of each build.
//! - The versioned [knowledge cache](crate::knowledge::Cache), which migrates
//!   itself from previously fetched raw documents when its schema changes.
//! - The [`Resolver`](crate::resolver::Resolver), which works out the
//!   effective orientation of a marker (lifting its location over to the
//!   knowledge base's build when needed) and finds the matching variant.
//! - The [ranking](crate::ranking) and [report](crate::report) facilities,
//!   which order resolved markers for display.
//!
//! Below is a representative example of resolving a single marker when the
//! personal genome and the knowledge base share a build.
//!
//! ```
//! use snpmatch::core::Chromosome;
//! use snpmatch::core::Location;
//! use snpmatch::core::Orientation;
//! use snpmatch::core::ReferenceBuild;
//! use snpmatch::core::Rsid;
//! use snpmatch::knowledge::GenotypeSummary;
//! use snpmatch::knowledge::SnpediaSnpInfo;
//! use snpmatch::liftover::ChainFileProvider;
//! use snpmatch::resolver::Builder;
//! use snpmatch::Genotype;
//!
//! let mut info = SnpediaSnpInfo {
//!     orientation: Some(Orientation::Plus),
//!     reference_build: Some(String::from("GRCh37.p13")),
//!     ..Default::default()
//! };
//!
//! for genotype in ["(A;A)", "(A;T)", "(T;T)"] {
//!     info.genotype_summaries.push(GenotypeSummary {
//!         genotype: genotype.parse()?,
//!         magnitude: None,
//!         description: None,
//!     });
//! }
//!
//! // No chain file is ever opened, as both sides use GRCh37.
//! let provider = ChainFileProvider::new("chains");
//! let mut resolver = Builder::default().build(ReferenceBuild::Build37, provider);
//!
//! let resolution = resolver.resolve(
//!     &Rsid::new("rs1"),
//!     &"(T;A)".parse::<Genotype>()?,
//!     &Location::new(Chromosome::normalize("1"), 1000),
//!     &info,
//! );
//!
//! assert_eq!(resolution.variant(), Some(1));
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]
#![warn(clippy::missing_docs_in_private_items)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod core;
pub mod directory;
pub mod genotype;
pub mod knowledge;
pub mod liftover;
pub mod personal;
pub mod ranking;
pub mod report;
pub mod resolver;

pub use genotype::Genotype;
