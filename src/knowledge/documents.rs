//! Previously fetched raw documents kept on disk.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use tracing::warn;

use crate::core::Rsid;
use crate::knowledge::DocumentFetcher;

/// The extension of a cached raw document.
const DOCUMENT_EXTENSION: &str = "html";

/// A directory of raw documents, one `<rsid>.html` file per marker.
///
/// This is the read side of the crawler's fetch cache. It never fetches
/// anything itself.
#[derive(Clone, Debug)]
pub struct DocumentDirectory(PathBuf);

impl DocumentDirectory {
    /// Creates a new [`DocumentDirectory`] rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self(root.into())
    }

    /// Gets the root directory.
    pub fn root(&self) -> &Path {
        &self.0
    }

    /// Gets the path of the raw document for `rsid`.
    ///
    /// Returns [`None`] if `rsid` is not safe to use as a file name.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    ///
    /// use snpmatch::core::Rsid;
    /// use snpmatch::knowledge::DocumentDirectory;
    ///
    /// let documents = DocumentDirectory::new("cache");
    ///
    /// assert_eq!(
    ///     documents.document_path(&Rsid::new("Rs4680")).as_deref(),
    ///     Some(Path::new("cache/rs4680.html"))
    /// );
    /// assert_eq!(documents.document_path(&Rsid::new("../etc")), None);
    /// ```
    pub fn document_path(&self, rsid: &Rsid) -> Option<PathBuf> {
        if !rsid.is_file_name_safe() {
            return None;
        }

        Some(
            self.0
                .join(format!("{}.{}", rsid.as_str(), DOCUMENT_EXTENSION)),
        )
    }
}

impl DocumentFetcher for DocumentDirectory {
    fn cached_document(&self, rsid: &Rsid) -> Option<Vec<u8>> {
        let path = match self.document_path(rsid) {
            Some(path) => path,
            None => {
                warn!("refusing to read a document for unsafe marker id `{}`", rsid);
                return None;
            }
        };

        match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => None,
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!("could not read {}: {}", path.display(), err);
                None
            }
        }
    }
}
