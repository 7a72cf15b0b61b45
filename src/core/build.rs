//! The registry of supported reference builds.
//!
//! Each build is described by a single [`BuildInfo`] record in a static table.
//! Adding a build means adding a variant and a row; nothing else in the crate
//! branches on individual builds.

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

/// The external names of a reference build.
#[derive(Debug, Eq, PartialEq)]
pub struct BuildInfo {
    /// The name used by the knowledge base (e.g., `GRCh38`).
    ///
    /// The knowledge base sometimes appends a patch level (e.g., `GRCh38.p2`),
    /// which is why labels are matched against this name by prefix.
    knowledge_base_name: &'static str,

    /// The name used by liftover chain files (e.g., `hg38`).
    liftover_name: &'static str,
}

impl BuildInfo {
    /// Gets the name used by the knowledge base.
    pub fn knowledge_base_name(&self) -> &'static str {
        self.knowledge_base_name
    }

    /// Gets the name used by liftover chain files.
    pub fn liftover_name(&self) -> &'static str {
        self.liftover_name
    }
}

/// The build information, indexed by [`ReferenceBuild`] discriminant.
static BUILD_INFO: [BuildInfo; 2] = [
    BuildInfo {
        knowledge_base_name: "GRCh37",
        liftover_name: "hg19",
    },
    BuildInfo {
        knowledge_base_name: "GRCh38",
        liftover_name: "hg38",
    },
];

/// A genome coordinate system.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum ReferenceBuild {
    /// GRCh37 (hg19).
    #[serde(rename = "BUILD37")]
    Build37 = 0,
    /// GRCh38 (hg38).
    #[serde(rename = "BUILD38")]
    Build38 = 1,
}

impl ReferenceBuild {
    /// Every supported build, in the order labels are matched against them.
    pub const ALL: [ReferenceBuild; 2] = [ReferenceBuild::Build37, ReferenceBuild::Build38];

    /// The build assumed when the knowledge base does not say which build a
    /// record refers to.
    pub const DEFAULT: ReferenceBuild = ReferenceBuild::Build38;

    /// Gets the external names of this build.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::core::ReferenceBuild;
    ///
    /// let info = ReferenceBuild::Build37.info();
    /// assert_eq!(info.knowledge_base_name(), "GRCh37");
    /// assert_eq!(info.liftover_name(), "hg19");
    /// ```
    pub fn info(&self) -> &'static BuildInfo {
        &BUILD_INFO[*self as usize]
    }

    /// Finds the build whose knowledge-base name is a prefix of `label`.
    ///
    /// Returns [`None`] if no build matches.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::core::ReferenceBuild;
    ///
    /// assert_eq!(
    ///     ReferenceBuild::match_label("GRCh38.p2"),
    ///     Some(ReferenceBuild::Build38)
    /// );
    /// assert_eq!(ReferenceBuild::match_label("NCBI36"), None);
    /// ```
    pub fn match_label(label: &str) -> Option<ReferenceBuild> {
        Self::ALL
            .into_iter()
            .find(|build| label.starts_with(build.info().knowledge_base_name()))
    }

    /// Resolves an optional knowledge-base label to a build, falling back to
    /// `default` when the label is absent or unrecognized.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::core::ReferenceBuild;
    ///
    /// let default = ReferenceBuild::DEFAULT;
    ///
    /// assert_eq!(
    ///     ReferenceBuild::from_knowledge_base_label(Some("GRCh37.p13"), default),
    ///     ReferenceBuild::Build37
    /// );
    /// assert_eq!(
    ///     ReferenceBuild::from_knowledge_base_label(None, default),
    ///     ReferenceBuild::Build38
    /// );
    /// ```
    pub fn from_knowledge_base_label(label: Option<&str>, default: ReferenceBuild) -> Self {
        let label = match label {
            Some(label) => label,
            None => {
                debug!("no reference build label, assuming {}", default);
                return default;
            }
        };

        match Self::match_label(label) {
            Some(build) => build,
            None => {
                warn!(
                    "unrecognized reference build label `{}`, assuming {}",
                    label, default
                );
                default
            }
        }
    }
}

impl std::fmt::Display for ReferenceBuild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.info().knowledge_base_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_keyed_by_build() {
        for build in ReferenceBuild::ALL {
            let info = build.info();
            assert_eq!(
                ReferenceBuild::match_label(info.knowledge_base_name()),
                Some(build)
            );
        }

        assert_eq!(ReferenceBuild::Build38.info().liftover_name(), "hg38");
    }

    #[test]
    fn prefix_match_ignores_patch_level() {
        assert_eq!(
            ReferenceBuild::match_label("GRCh37.p13"),
            Some(ReferenceBuild::Build37)
        );
        assert_eq!(
            ReferenceBuild::match_label("GRCh38"),
            Some(ReferenceBuild::Build38)
        );
        assert_eq!(ReferenceBuild::match_label("grch38"), None);
    }

    #[test]
    fn falls_back_to_the_given_default() {
        assert_eq!(
            ReferenceBuild::from_knowledge_base_label(Some("hg18"), ReferenceBuild::Build37),
            ReferenceBuild::Build37
        );
        assert_eq!(
            ReferenceBuild::from_knowledge_base_label(None, ReferenceBuild::Build37),
            ReferenceBuild::Build37
        );
    }

    #[test]
    fn serializes_with_registry_names() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(
            serde_json::to_string(&ReferenceBuild::Build37)?,
            "\"BUILD37\""
        );
        assert_eq!(
            serde_json::from_str::<ReferenceBuild>("\"BUILD38\"")?,
            ReferenceBuild::Build38
        );
        Ok(())
    }
}
