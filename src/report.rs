//! The ranked list of markers shown to a person.
//!
//! Every cached marker the person has a called genotype for is resolved
//! against its published variants and scored with [`ranking::rank_key()`].
//! The entries are returned with the most notable markers first.

use crate::core::Orientation;
use crate::core::Rsid;
use crate::genotype;
use crate::knowledge::Cache;
use crate::knowledge::GenotypeSummary;
use crate::liftover::LiftoverProvider;
use crate::personal::PersonalData;
use crate::ranking;
use crate::resolver::Resolver;
use crate::Genotype;

/// The warning attached to markers whose orientation was changed between
/// releases of the reference genome.
pub const ORIENTATION_WARNING: &str = "orientation changed between versions of the reference \
                                       genome; an A<->T or C<->G mismatch is possible";

/// An error related to building a report.
#[derive(Debug)]
pub enum Error {
    /// A personal genotype could not be parsed.
    Genotype(Rsid, genotype::ParseError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Genotype(rsid, err) => write!(f, "invalid genotype for {}: {}", rsid, err),
        }
    }
}

impl std::error::Error for Error {}

/// One displayed marker.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// The marker id.
    pub rsid: Rsid,

    /// The knowledge base's summary of the marker.
    pub description: Option<String>,

    /// The person's genotype, as observed.
    pub genotype: Genotype,

    /// The published variants.
    pub variants: Vec<GenotypeSummary>,

    /// The index of the variant matching the person's genotype.
    pub matched: Option<usize>,

    /// The magnitude of the matched variant.
    pub importance: Option<f64>,

    /// The sort key (higher sorts first).
    pub rank_key: i64,

    /// The orientation the genotype was compared in.
    pub orientation: Option<Orientation>,

    /// Whether the published orientation disagrees with the stabilized one.
    pub orientation_changed: bool,
}

impl Entry {
    /// Gets the matched variant, if any.
    pub fn matched_variant(&self) -> Option<&GenotypeSummary> {
        self.matched.and_then(|index| self.variants.get(index))
    }
}

/// Formats one published variant as `<genotype> <description> (imp: <magnitude>)`.
///
/// # Examples
///
/// ```
/// use snpmatch::knowledge::GenotypeSummary;
/// use snpmatch::report::describe_variant;
///
/// let variant = GenotypeSummary {
///     genotype: "(A;G)".parse()?,
///     magnitude: Some(2.5),
///     description: Some(String::from("intermediate")),
/// };
/// assert_eq!(describe_variant(&variant), "(A;G) intermediate (imp: 2.5)");
///
/// let variant = GenotypeSummary {
///     genotype: "(G;G)".parse()?,
///     magnitude: None,
///     description: None,
/// };
/// assert_eq!(describe_variant(&variant), "(G;G)");
///
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn describe_variant(variant: &GenotypeSummary) -> String {
    let mut parts = vec![variant.genotype.to_string()];

    if let Some(description) = variant.description.as_deref().filter(|d| !d.is_empty()) {
        parts.push(description.to_string());
    }

    if let Some(magnitude) = variant.magnitude {
        parts.push(format!("(imp: {})", magnitude));
    }

    parts.join(" ")
}

/// Builds the ranked report for `personal` from the records in `cache`.
///
/// Markers without a called genotype are skipped. Markers that cannot be
/// oriented (including those whose liftover is unavailable) are kept
/// unmatched. Entries are sorted by rank key (descending), ties broken by
/// marker id.
pub fn build<P>(
    cache: &Cache,
    personal: &PersonalData,
    resolver: &mut Resolver<P>,
) -> Result<Vec<Entry>, Error>
where
    P: LiftoverProvider,
{
    let mut entries = Vec::new();

    for (rsid, info) in cache.iter() {
        let record = match personal.get(rsid) {
            Some(record) if record.is_called() => record,
            _ => continue,
        };

        let genotype = record
            .genotype()
            .map_err(|err| Error::Genotype(rsid.clone(), err))?;

        let resolution = resolver.resolve(rsid, &genotype, &record.location(), info);

        entries.push(Entry {
            rsid: rsid.clone(),
            description: info.description.clone(),
            genotype,
            variants: info.genotype_summaries.clone(),
            matched: resolution.variant(),
            importance: ranking::matched_magnitude(info, resolution.variant()),
            rank_key: ranking::rank_key(info, resolution.variant()),
            orientation: resolution.orientation(),
            orientation_changed: info.orientation_changed(),
        });
    }

    entries.sort_by(|a, b| b.rank_key.cmp(&a.rank_key).then_with(|| a.rsid.cmp(&b.rsid)));

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use tempdir::TempDir;

    use super::*;
    use crate::core::Chromosome;
    use crate::core::Location;
    use crate::core::ReferenceBuild;
    use crate::knowledge::SnpediaSnpInfo;
    use crate::liftover::LiftedLocation;
    use crate::personal::InputRecord;
    use crate::resolver::Builder;

    /// A provider without any chain files, counting how often it is asked.
    #[derive(Default)]
    struct NoChains(Cell<usize>);

    impl LiftoverProvider for &NoChains {
        type Liftover = fn(&Location) -> Option<LiftedLocation>;
        type Error = std::io::Error;

        fn open(
            &self,
            _: ReferenceBuild,
            _: ReferenceBuild,
        ) -> std::io::Result<Self::Liftover> {
            self.0.set(self.0.get() + 1);
            Err(std::io::ErrorKind::NotFound.into())
        }
    }

    fn record(
        description: Option<&str>,
        variants: &[(&str, Option<f64>)],
    ) -> Result<SnpediaSnpInfo, Box<dyn std::error::Error>> {
        let mut genotype_summaries = Vec::new();

        for (genotype, magnitude) in variants {
            genotype_summaries.push(GenotypeSummary {
                genotype: genotype.parse()?,
                magnitude: *magnitude,
                description: None,
            });
        }

        Ok(SnpediaSnpInfo {
            description: description.map(String::from),
            genotype_summaries,
            orientation: Some(Orientation::Plus),
            stabilized_orientation: Some(Orientation::Plus),
            reference_build: Some(String::from("GRCh38")),
        })
    }

    fn observed(rsid: &str, genotype: &str) -> InputRecord {
        InputRecord {
            rsid: Rsid::new(rsid),
            chromosome: Chromosome::normalize("1"),
            position: 1000,
            genotype: String::from(genotype),
        }
    }

    #[test]
    fn it_ranks_markers() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("report")?;
        let mut cache = Cache::open_current(dir.path().join("rsidDict.json"))?;

        cache.set(
            Rsid::new("rs1"),
            record(None, &[("(C;T)", Some(0.5)), ("(T;T)", Some(1.0))])?,
        );
        cache.set(
            Rsid::new("rs2"),
            record(Some("described"), &[("(C;T)", Some(0.5))])?,
        );
        cache.set(
            Rsid::new("rs3"),
            record(Some("severe"), &[("(A;A)", Some(4.0)), ("(A;G)", None)])?,
        );
        cache.set(Rsid::new("rs4"), record(None, &[("(G;G)", Some(9.0))])?);
        cache.set(Rsid::new("rs5"), record(None, &[("(G;G)", Some(9.0))])?);

        let personal = PersonalData::new(
            [
                observed("rs1", "(T;C)"),
                observed("rs2", "(C;T)"),
                observed("rs3", "(G;A)"),
                observed("rs4", "(-;-)"),
            ],
            ReferenceBuild::Build38,
        );

        let provider = NoChains::default();
        let mut resolver = Builder::default().build(ReferenceBuild::Build38, &provider);
        let entries = build(&cache, &personal, &mut resolver)?;

        let ranked = entries
            .iter()
            .map(|entry| (entry.rsid.as_str(), entry.rank_key))
            .collect::<Vec<_>>();
        assert_eq!(ranked, [("rs2", 54), ("rs1", 53), ("rs3", 2)]);

        let rs3 = &entries[2];
        assert_eq!(rs3.matched, Some(1));
        assert_eq!(rs3.importance, None);
        assert_eq!(rs3.orientation, Some(Orientation::Plus));
        assert_eq!(
            rs3.matched_variant().map(|v| v.genotype.to_string()),
            Some(String::from("(A;G)"))
        );

        Ok(())
    }

    #[test]
    fn equal_keys_are_ordered_by_marker_id() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("report")?;
        let mut cache = Cache::open_current(dir.path().join("rsidDict.json"))?;

        for rsid in ["rs9", "rs10", "rs11"] {
            cache.set(Rsid::new(rsid), record(None, &[("(A;A)", Some(1.0))])?);
        }

        let personal = PersonalData::new(
            ["rs11", "rs9", "rs10"].map(|rsid| observed(rsid, "(A;A)")),
            ReferenceBuild::Build38,
        );

        let provider = NoChains::default();
        let mut resolver = Builder::default().build(ReferenceBuild::Build38, &provider);
        let entries = build(&cache, &personal, &mut resolver)?;

        let rsids = entries
            .iter()
            .map(|entry| entry.rsid.as_str())
            .collect::<Vec<_>>();
        assert_eq!(rsids, ["rs10", "rs11", "rs9"]);

        Ok(())
    }

    #[test]
    fn orientation_changes_are_flagged() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("report")?;
        let mut cache = Cache::open_current(dir.path().join("rsidDict.json"))?;

        let mut info = record(None, &[("(T;T)", None)])?;
        info.orientation = Some(Orientation::Minus);
        cache.set(Rsid::new("rs1"), info);

        let personal = PersonalData::new([observed("rs1", "(A;A)")], ReferenceBuild::Build38);
        let provider = NoChains::default();
        let mut resolver = Builder::default().build(ReferenceBuild::Build38, &provider);
        let entries = build(&cache, &personal, &mut resolver)?;

        assert_eq!(entries.len(), 1);
        assert!(entries[0].orientation_changed);
        assert_eq!(entries[0].matched, Some(0));

        Ok(())
    }

    #[test]
    fn malformed_personal_genotypes_are_errors() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("report")?;
        let mut cache = Cache::open_current(dir.path().join("rsidDict.json"))?;
        cache.set(Rsid::new("rs1"), record(None, &[("(A;A)", None)])?);

        let personal = PersonalData::new([observed("rs1", "AA")], ReferenceBuild::Build38);
        let provider = NoChains::default();
        let mut resolver = Builder::default().build(ReferenceBuild::Build38, &provider);

        let err = build(&cache, &personal, &mut resolver).unwrap_err();
        assert!(matches!(err, Error::Genotype(_, _)));

        Ok(())
    }

    #[test]
    fn unavailable_liftovers_leave_markers_unmatched() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new("report")?;
        let mut cache = Cache::open_current(dir.path().join("rsidDict.json"))?;

        let mut same = record(None, &[("(A;A)", Some(2.0))])?;
        same.reference_build = Some(String::from("GRCh37.p13"));
        cache.set(Rsid::new("rs1"), same);

        for rsid in ["rs2", "rs3", "rs4"] {
            cache.set(Rsid::new(rsid), record(None, &[("(A;A)", Some(2.0))])?);
        }

        let personal = PersonalData::new(
            ["rs1", "rs2", "rs3", "rs4"].map(|rsid| observed(rsid, "(A;A)")),
            ReferenceBuild::Build37,
        );

        let provider = NoChains::default();
        let mut resolver = Builder::default().build(ReferenceBuild::Build37, &provider);
        let entries = build(&cache, &personal, &mut resolver)?;

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].rsid.as_str(), "rs1");
        assert_eq!(entries[0].matched, Some(0));

        for entry in &entries[1..] {
            assert_eq!(entry.orientation, None);
            assert_eq!(entry.matched, None);
        }

        assert_eq!(provider.0.get(), 1);

        Ok(())
    }
}
