//! Matching a personal genotype to a published variant.
//!
//! The knowledge base writes each marker's variants on a particular strand
//! (its published [`Orientation`]) of a particular build. A personal genome
//! reports genotypes on the plus strand of its own build. Matching therefore
//! happens in three steps:
//!
//! 1. Work out the _effective_ orientation: the published orientation, flipped
//!    if lifting the marker's location from the personal build to the
//!    knowledge-base build lands on an inverted segment.
//! 2. Orient the personal genotype, complementing it if the effective
//!    orientation is [`Orientation::Minus`].
//! 3. Scan the published variants in order and return the first index whose
//!    genotype is equal to the oriented genotype, ignoring allele order.
//!
//! ```
//! use snpmatch::core::Chromosome;
//! use snpmatch::core::Location;
//! use snpmatch::core::Orientation;
//! use snpmatch::core::ReferenceBuild;
//! use snpmatch::core::Rsid;
//! use snpmatch::knowledge::GenotypeSummary;
//! use snpmatch::knowledge::SnpediaSnpInfo;
//! use snpmatch::liftover::LiftedLocation;
//! use snpmatch::resolver::Builder;
//! use snpmatch::Genotype;
//!
//! /// A provider for a genome that never needs converting.
//! struct Unused;
//!
//! impl snpmatch::liftover::LiftoverProvider for Unused {
//!     type Liftover = fn(&Location) -> Option<LiftedLocation>;
//!     type Error = std::io::Error;
//!
//!     fn open(&self, _: ReferenceBuild, _: ReferenceBuild) -> std::io::Result<Self::Liftover> {
//!         Err(std::io::ErrorKind::Unsupported.into())
//!     }
//! }
//!
//! let mut info = SnpediaSnpInfo {
//!     orientation: Some(Orientation::Minus),
//!     reference_build: Some(String::from("GRCh38.p7")),
//!     ..Default::default()
//! };
//!
//! for genotype in ["(A;A)", "(A;G)", "(G;G)"] {
//!     info.genotype_summaries.push(GenotypeSummary {
//!         genotype: genotype.parse()?,
//!         magnitude: None,
//!         description: None,
//!     });
//! }
//!
//! let mut resolver = Builder::default().build(ReferenceBuild::Build38, Unused);
//! let resolution = resolver.resolve(
//!     &Rsid::new("rs4680"),
//!     &"(T;C)".parse::<Genotype>()?,
//!     &Location::new(Chromosome::normalize("22"), 19963748),
//!     &info,
//! );
//!
//! assert_eq!(resolution.orientation(), Some(Orientation::Minus));
//! assert_eq!(resolution.variant(), Some(1));
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::debug;
use tracing::warn;

use crate::core::Location;
use crate::core::Orientation;
use crate::core::ReferenceBuild;
use crate::core::Rsid;
use crate::knowledge::GenotypeSummary;
use crate::knowledge::SnpediaSnpInfo;
use crate::liftover::Liftover;
use crate::liftover::LiftoverProvider;
use crate::Genotype;

/// The number of published variants that usually means every genotype of a
/// biallelic marker is listed (both homozygotes and the heterozygote).
const FULL_BIALLELIC_LIST: usize = 3;

/// How unexpected a failure to match is.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Unmatched {
    /// The published list looked complete, so a non-match points at a data or
    /// logic defect worth following up.
    Suspicious,
    /// The published list is partial; a non-match is expected.
    Expected,
}

impl Unmatched {
    /// Classifies a non-match against a list of `variants` published
    /// variants.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::resolver::Unmatched;
    ///
    /// assert_eq!(Unmatched::classify(3), Unmatched::Suspicious);
    /// assert_eq!(Unmatched::classify(1), Unmatched::Expected);
    /// ```
    pub fn classify(variants: usize) -> Self {
        match variants {
            FULL_BIALLELIC_LIST => Unmatched::Suspicious,
            _ => Unmatched::Expected,
        }
    }
}

/// The outcome of resolving one marker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Resolution {
    /// The orientation the personal genotype was compared in.
    orientation: Option<Orientation>,
    /// The index of the matched published variant.
    variant: Option<usize>,
}

impl Resolution {
    /// Gets the effective orientation, if one could be determined.
    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    /// Gets the index of the matched published variant, if any.
    pub fn variant(&self) -> Option<usize> {
        self.variant
    }
}

/// A builder for a [`Resolver`].
#[derive(Clone, Debug)]
pub struct Builder {
    /// The build assumed for records that do not name one.
    default_knowledge_base_build: ReferenceBuild,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            default_knowledge_base_build: ReferenceBuild::DEFAULT,
        }
    }
}

impl Builder {
    /// Sets the build assumed for knowledge-base records that do not name one
    /// (or name one that isn't recognized).
    pub fn default_knowledge_base_build(mut self, build: ReferenceBuild) -> Self {
        self.default_knowledge_base_build = build;
        self
    }

    /// Builds a [`Resolver`] for a personal genome in `personal_build`.
    pub fn build<P>(self, personal_build: ReferenceBuild, provider: P) -> Resolver<P>
    where
        P: LiftoverProvider,
    {
        Resolver {
            personal_build,
            default_knowledge_base_build: self.default_knowledge_base_build,
            provider,
            liftovers: HashMap::new(),
        }
    }
}

/// Resolves personal genotypes against published variants.
///
/// Liftovers are opened lazily and kept for the lifetime of the resolver, one
/// per `(from, to)` pair of builds. A pair that fails to open is remembered
/// too, so the provider is asked at most once per pair.
pub struct Resolver<P>
where
    P: LiftoverProvider,
{
    /// The build of the personal genome.
    personal_build: ReferenceBuild,

    /// The build assumed for records that do not name one.
    default_knowledge_base_build: ReferenceBuild,

    /// The source of liftovers.
    provider: P,

    /// The liftovers opened so far ([`None`] if opening failed).
    liftovers: HashMap<(ReferenceBuild, ReferenceBuild), Option<P::Liftover>>,
}

impl<P> std::fmt::Debug for Resolver<P>
where
    P: LiftoverProvider,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("personal_build", &self.personal_build)
            .field(
                "default_knowledge_base_build",
                &self.default_knowledge_base_build,
            )
            .field("liftovers", &self.liftovers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<P> Resolver<P>
where
    P: LiftoverProvider,
{
    /// Gets the build of the personal genome.
    pub fn personal_build(&self) -> ReferenceBuild {
        self.personal_build
    }

    /// Determines the orientation the personal genotype at `location` must be
    /// compared in against the variants of `info`.
    ///
    /// Returns [`None`] if the record publishes no orientation, if no liftover
    /// to the knowledge base's build could be opened, or if the location has
    /// no counterpart in that build.
    pub fn effective_orientation(
        &mut self,
        location: &Location,
        info: &SnpediaSnpInfo,
    ) -> Option<Orientation> {
        let published = info.orientation?;

        let knowledge_base_build = info.reference_build(self.default_knowledge_base_build);
        if knowledge_base_build == self.personal_build {
            return Some(published);
        }

        let liftover = self.liftover(self.personal_build, knowledge_base_build)?;
        match liftover.convert(location) {
            Some(lifted) if lifted.strand().is_flipped() => Some(published.other()),
            Some(_) => Some(published),
            None => {
                debug!(
                    "{} has no counterpart in {}; cannot orient",
                    location, knowledge_base_build
                );
                None
            }
        }
    }

    /// Finds the index of the published variant matching `genotype` when read
    /// in `orientation`.
    ///
    /// `rsid` is only used for logging.
    pub fn find_variant(
        &self,
        rsid: &Rsid,
        genotype: &Genotype,
        orientation: Option<Orientation>,
        variants: &[GenotypeSummary],
    ) -> Option<usize> {
        let oriented = match orientation {
            Some(Orientation::Plus) => genotype.clone(),
            Some(Orientation::Minus) => genotype.complementary(),
            None => {
                debug!("cannot match {}: no effective orientation", rsid);
                return None;
            }
        };

        let found = variants
            .iter()
            .position(|variant| oriented.unordered_eq(&variant.genotype));

        if found.is_none() {
            let published = variants
                .iter()
                .map(|variant| variant.genotype.to_string())
                .collect::<Vec<_>>()
                .join(", ");

            match Unmatched::classify(variants.len()) {
                Unmatched::Suspicious => warn!(
                    "could not find {} among [{}] ({}, {:?})",
                    genotype, published, rsid, orientation
                ),
                Unmatched::Expected => debug!(
                    "could not find {} among [{}] ({}, {:?})",
                    genotype, published, rsid, orientation
                ),
            }
        }

        found
    }

    /// Resolves the personal `genotype` at `location` against `info`.
    pub fn resolve(
        &mut self,
        rsid: &Rsid,
        genotype: &Genotype,
        location: &Location,
        info: &SnpediaSnpInfo,
    ) -> Resolution {
        let orientation = self.effective_orientation(location, info);
        let variant = self.find_variant(rsid, genotype, orientation, &info.genotype_summaries);

        Resolution {
            orientation,
            variant,
        }
    }

    /// Gets the liftover between two builds, opening it on first use.
    ///
    /// Returns [`None`] if the provider could not open it; the failure is
    /// logged once and remembered.
    fn liftover(&mut self, from: ReferenceBuild, to: ReferenceBuild) -> Option<&P::Liftover> {
        match self.liftovers.entry((from, to)) {
            Entry::Occupied(entry) => entry.into_mut().as_ref(),
            Entry::Vacant(entry) => {
                let liftover = match self.provider.open(from, to) {
                    Ok(liftover) => Some(liftover),
                    Err(err) => {
                        warn!(
                            "could not open liftover from {} to {}: {}; markers needing it \
                             will not be oriented",
                            from, to, err
                        );
                        None
                    }
                };

                entry.insert(liftover).as_ref()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::Arc;
    use std::sync::Mutex;

    use tracing::Event;
    use tracing::Level;
    use tracing::Subscriber;
    use tracing_subscriber::layer::Context;
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::Layer;

    use super::*;
    use crate::core::Chromosome;
    use crate::core::Strand;
    use crate::liftover::LiftedLocation;

    /// A liftover stub.
    type Stub = Box<dyn Fn(&Location) -> Option<LiftedLocation>>;

    /// The error of a provider without chain files.
    #[derive(Debug)]
    struct Unavailable;

    impl std::fmt::Display for Unavailable {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "no chain file")
        }
    }

    impl std::error::Error for Unavailable {}

    /// A provider returning the same stub for every pair, counting opens.
    struct StubProvider {
        strand: Option<Strand>,
        available: bool,
        opened: Cell<usize>,
    }

    impl StubProvider {
        fn new(strand: Option<Strand>) -> Self {
            Self {
                strand,
                available: true,
                opened: Cell::new(0),
            }
        }

        fn unavailable() -> Self {
            Self {
                available: false,
                ..Self::new(None)
            }
        }
    }

    impl LiftoverProvider for &StubProvider {
        type Liftover = Stub;
        type Error = Unavailable;

        fn open(&self, _: ReferenceBuild, _: ReferenceBuild) -> Result<Stub, Unavailable> {
            self.opened.set(self.opened.get() + 1);
            if !self.available {
                return Err(Unavailable);
            }

            let strand = self.strand;
            Ok(Box::new(move |location: &Location| {
                strand.map(|strand| LiftedLocation::new(location.clone(), strand))
            }))
        }
    }

    /// Records the level of every event.
    struct Levels(Arc<Mutex<Vec<Level>>>);

    impl<S> Layer<S> for Levels
    where
        S: Subscriber,
    {
        fn on_event(&self, event: &Event<'_>, _: Context<'_, S>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    fn levels_while(f: impl FnOnce()) -> Vec<Level> {
        let levels = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(Levels(levels.clone()));
        tracing::subscriber::with_default(subscriber, f);
        let levels = levels.lock().unwrap().clone();
        levels
    }

    fn variants(genotypes: &[&str]) -> Vec<GenotypeSummary> {
        genotypes
            .iter()
            .map(|genotype| GenotypeSummary {
                genotype: genotype.parse().unwrap(),
                magnitude: None,
                description: None,
            })
            .collect()
    }

    fn record(genotypes: &[&str], orientation: Option<Orientation>, build: &str) -> SnpediaSnpInfo {
        SnpediaSnpInfo {
            genotype_summaries: variants(genotypes),
            orientation,
            reference_build: Some(build.to_string()),
            ..Default::default()
        }
    }

    fn location() -> Location {
        Location::new(Chromosome::normalize("1"), 11856378)
    }

    fn rsid() -> Rsid {
        Rsid::new("rs1801133")
    }

    #[test]
    fn same_build_plus_orientation() -> Result<(), Box<dyn std::error::Error>> {
        let provider = StubProvider::new(None);
        let mut resolver = Builder::default().build(ReferenceBuild::Build38, &provider);

        let info = record(&["(A;T)", "(A;A)", "(T;T)"], Some(Orientation::Plus), "GRCh38");
        let resolution = resolver.resolve(&rsid(), &"(A;T)".parse()?, &location(), &info);

        assert_eq!(resolution.orientation(), Some(Orientation::Plus));
        assert_eq!(resolution.variant(), Some(0));
        assert_eq!(provider.opened.get(), 0);

        Ok(())
    }

    #[test]
    fn minus_orientation_complements_the_genotype() -> Result<(), Box<dyn std::error::Error>> {
        let provider = StubProvider::new(None);
        let mut resolver = Builder::default().build(ReferenceBuild::Build38, &provider);

        let info = record(&["(C;C)", "(T;A)"], Some(Orientation::Minus), "GRCh38.p2");
        let resolution = resolver.resolve(&rsid(), &"(A;T)".parse()?, &location(), &info);

        assert_eq!(resolution.variant(), Some(1));

        let info = record(&["(C;C)", "(C;T)", "(T;T)"], Some(Orientation::Minus), "GRCh38");
        let resolution = resolver.resolve(&rsid(), &"(A;G)".parse()?, &location(), &info);

        assert_eq!(resolution.variant(), Some(1));

        Ok(())
    }

    #[test]
    fn first_matching_variant_wins() -> Result<(), Box<dyn std::error::Error>> {
        let provider = StubProvider::new(None);
        let resolver = Builder::default().build(ReferenceBuild::Build38, &provider);

        let found = resolver.find_variant(
            &rsid(),
            &"(G;A)".parse()?,
            Some(Orientation::Plus),
            &variants(&["(G;G)", "(A;G)", "(G;A)"]),
        );
        assert_eq!(found, Some(1));

        Ok(())
    }

    #[test]
    fn missing_orientation_never_matches() -> Result<(), Box<dyn std::error::Error>> {
        let provider = StubProvider::new(Some(Strand::Positive));
        let mut resolver = Builder::default().build(ReferenceBuild::Build37, &provider);

        let info = record(&["(A;T)"], None, "GRCh38");
        let genotype = "(A;T)".parse::<Genotype>()?;

        let levels = levels_while(|| {
            let resolution = resolver.resolve(&rsid(), &genotype, &location(), &info);
            assert_eq!(resolution.orientation(), None);
            assert_eq!(resolution.variant(), None);
        });

        assert_eq!(levels, [Level::DEBUG]);
        assert_eq!(provider.opened.get(), 0);

        Ok(())
    }

    #[test]
    fn unopenable_liftovers_warn_once_and_are_not_retried(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let provider = StubProvider::unavailable();
        let mut resolver = Builder::default().build(ReferenceBuild::Build37, &provider);

        let info = record(&["(C;C)"], Some(Orientation::Plus), "GRCh38");
        let genotype = "(C;C)".parse::<Genotype>()?;

        let levels = levels_while(|| {
            for _ in 0..4 {
                let resolution = resolver.resolve(&rsid(), &genotype, &location(), &info);
                assert_eq!(resolution.orientation(), None);
                assert_eq!(resolution.variant(), None);
            }
        });

        let warnings = levels.iter().filter(|level| **level == Level::WARN).count();
        assert_eq!(warnings, 1);
        assert_eq!(provider.opened.get(), 1);

        // Markers in the personal build never need the liftover.
        let info = record(&["(C;C)"], Some(Orientation::Plus), "GRCh37");
        let resolution = resolver.resolve(&rsid(), &genotype, &location(), &info);
        assert_eq!(resolution.variant(), Some(0));
        assert_eq!(provider.opened.get(), 1);

        Ok(())
    }

    #[test]
    fn cross_build_flip_inverts_the_published_orientation(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let provider = StubProvider::new(Some(Strand::Negative));
        let mut resolver = Builder::default().build(ReferenceBuild::Build37, &provider);

        // Published as plus in GRCh38, but the segment is inverted relative
        // to GRCh37, so the personal genotype must be complemented.
        let info = record(&["(C;C)", "(C;T)", "(T;T)"], Some(Orientation::Plus), "GRCh38");
        let resolution = resolver.resolve(&rsid(), &"(G;G)".parse()?, &location(), &info);

        assert_eq!(resolution.orientation(), Some(Orientation::Minus));
        assert_eq!(resolution.variant(), Some(0));

        Ok(())
    }

    #[test]
    fn cross_build_without_flip_keeps_the_published_orientation(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let provider = StubProvider::new(Some(Strand::Positive));
        let mut resolver = Builder::default().build(ReferenceBuild::Build37, &provider);

        let info = record(&["(C;C)", "(C;T)", "(T;T)"], Some(Orientation::Plus), "GRCh38");
        let resolution = resolver.resolve(&rsid(), &"(T;C)".parse()?, &location(), &info);

        assert_eq!(resolution.orientation(), Some(Orientation::Plus));
        assert_eq!(resolution.variant(), Some(1));

        Ok(())
    }

    #[test]
    fn unmappable_locations_are_not_oriented() -> Result<(), Box<dyn std::error::Error>> {
        let provider = StubProvider::new(None);
        let mut resolver = Builder::default().build(ReferenceBuild::Build37, &provider);

        let info = record(&["(C;C)"], Some(Orientation::Plus), "GRCh38");

        let levels = levels_while(|| {
            let resolution = resolver.resolve(&rsid(), &"(C;C)".parse().unwrap(), &location(), &info);
            assert_eq!(resolution.orientation(), None);
            assert_eq!(resolution.variant(), None);
        });

        assert!(!levels.contains(&Level::WARN));
        Ok(())
    }

    #[test]
    fn liftovers_are_opened_once_per_build_pair() -> Result<(), Box<dyn std::error::Error>> {
        let provider = StubProvider::new(Some(Strand::Positive));
        let mut resolver = Builder::default().build(ReferenceBuild::Build37, &provider);

        let info = record(&["(C;C)"], Some(Orientation::Plus), "GRCh38");
        for _ in 0..5 {
            resolver.resolve(&rsid(), &"(C;C)".parse()?, &location(), &info);
        }

        assert_eq!(provider.opened.get(), 1);
        Ok(())
    }

    #[test]
    fn default_build_is_overridable() -> Result<(), Box<dyn std::error::Error>> {
        let provider = StubProvider::new(Some(Strand::Negative));
        let unlabeled = SnpediaSnpInfo {
            genotype_summaries: variants(&["(A;A)"]),
            orientation: Some(Orientation::Plus),
            ..Default::default()
        };

        // Unlabeled records are assumed to be GRCh38, which differs from the
        // personal build and goes through the (flipping) liftover.
        let mut resolver = Builder::default().build(ReferenceBuild::Build37, &provider);
        let orientation = resolver.effective_orientation(&location(), &unlabeled);
        assert_eq!(orientation, Some(Orientation::Minus));

        let mut resolver = Builder::default()
            .default_knowledge_base_build(ReferenceBuild::Build37)
            .build(ReferenceBuild::Build37, &provider);
        let orientation = resolver.effective_orientation(&location(), &unlabeled);
        assert_eq!(orientation, Some(Orientation::Plus));

        Ok(())
    }

    #[test]
    fn no_match_in_a_full_list_is_a_warning() {
        let provider = StubProvider::new(None);
        let resolver = Builder::default().build(ReferenceBuild::Build38, &provider);
        let genotype = "(A;C)".parse::<Genotype>().unwrap();

        let levels = levels_while(|| {
            let found = resolver.find_variant(
                &rsid(),
                &genotype,
                Some(Orientation::Plus),
                &variants(&["(A;A)", "(A;G)", "(G;G)"]),
            );
            assert_eq!(found, None);
        });
        assert!(levels.contains(&Level::WARN));

        let levels = levels_while(|| {
            let found = resolver.find_variant(
                &rsid(),
                &genotype,
                Some(Orientation::Plus),
                &variants(&["(A;A)"]),
            );
            assert_eq!(found, None);
        });
        assert!(!levels.contains(&Level::WARN));
        assert!(levels.contains(&Level::DEBUG));
    }
}
