//! The conventional layout of a data directory.

use std::fs;
use std::io;
use std::ops::Deref;
use std::path::Path;
use std::path::PathBuf;

use crate::knowledge::DocumentDirectory;
use crate::liftover::ChainFileProvider;

/// The file name of the knowledge cache.
const KNOWLEDGE_CACHE: &str = "rsidDict.json";

/// The file name of the personal-genotype cache.
const PERSONAL_CACHE: &str = "snpDict.json";

/// The directory holding previously fetched raw documents.
const DOCUMENTS: &str = "snpedia_cache";

/// The directory holding liftover chain files.
const CHAINS: &str = "chains";

/// A directory holding everything the tool persists between runs.
///
/// ```text
/// <root>/
/// ├── rsidDict.json     the knowledge cache
/// ├── snpDict.json      the personal-genotype cache
/// ├── snpedia_cache/    raw documents, one `<rsid>.html` per marker
/// └── chains/           UCSC chain files (e.g., `hg19ToHg38.over.chain.gz`)
/// ```
#[derive(Clone, Debug)]
pub struct DataDirectory(PathBuf);

impl DataDirectory {
    /// Creates a new [`DataDirectory`] rooted at `root`.
    ///
    /// Nothing is created on disk; see [`DataDirectory::create()`].
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use snpmatch::directory::DataDirectory;
    ///
    /// let dir = DataDirectory::new("data");
    /// assert_eq!(dir.knowledge_cache(), Path::new("data/rsidDict.json"));
    /// assert_eq!(dir.personal_cache(), Path::new("data/snpDict.json"));
    /// ```
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(root.into())
    }

    /// Creates the directory and its subdirectories if they don't exist yet.
    pub fn create(&self) -> io::Result<()> {
        fs::create_dir_all(self.documents_dir())?;
        fs::create_dir_all(self.chains_dir())
    }

    /// The path of the knowledge cache.
    pub fn knowledge_cache(&self) -> PathBuf {
        self.0.join(KNOWLEDGE_CACHE)
    }

    /// The path of the personal-genotype cache.
    pub fn personal_cache(&self) -> PathBuf {
        self.0.join(PERSONAL_CACHE)
    }

    /// The directory of raw documents.
    pub fn documents_dir(&self) -> PathBuf {
        self.0.join(DOCUMENTS)
    }

    /// The directory of chain files.
    pub fn chains_dir(&self) -> PathBuf {
        self.0.join(CHAINS)
    }

    /// A fetcher over the raw documents in this directory.
    pub fn documents(&self) -> DocumentDirectory {
        DocumentDirectory::new(self.documents_dir())
    }

    /// A liftover provider over the chain files in this directory.
    pub fn chains(&self) -> ChainFileProvider {
        ChainFileProvider::new(self.chains_dir())
    }
}

impl From<PathBuf> for DataDirectory {
    fn from(value: PathBuf) -> Self {
        Self(value)
    }
}

impl Deref for DataDirectory {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use tempdir::TempDir;

    use super::*;
    use crate::core::ReferenceBuild;

    #[test]
    fn it_lays_out_the_directory() -> Result<(), Box<dyn std::error::Error>> {
        let root = TempDir::new("data")?;
        let dir = DataDirectory::from(root.path().to_path_buf());
        dir.create()?;

        assert!(dir.documents_dir().is_dir());
        assert!(dir.chains_dir().is_dir());
        assert_eq!(dir.documents().root(), root.path().join("snpedia_cache"));
        assert_eq!(
            dir.chains()
                .chain_path(ReferenceBuild::Build37, ReferenceBuild::Build38),
            root.path().join("chains").join("hg19ToHg38.over.chain.gz")
        );

        // Creating twice is fine.
        dir.create()?;

        Ok(())
    }
}
