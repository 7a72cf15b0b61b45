//! The versioned, on-disk knowledge cache.
//!
//! The cache file is a JSON document of the form
//!
//! ```text
//! { "version": 3, "snps": { "rs4680": { ... }, ... } }
//! ```
//!
//! When the stored version is older than [`CURRENT_VERSION`] (a missing
//! version counts as `0`), [`Cache::load()`] rebuilds every record from the
//! raw documents that were fetched before and writes the result back before
//! handing the cache out. A version newer than [`CURRENT_VERSION`] was written
//! by a newer release and is refused.

use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;

use serde::de::IgnoredAny;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::core::Rsid;
use crate::knowledge::DocumentFetcher;
use crate::knowledge::DocumentParser;
use crate::knowledge::SnpediaSnpInfo;

/// The schema version written by this release.
///
/// Bump by one every time the serialized form of [`SnpediaSnpInfo`] changes.
pub const CURRENT_VERSION: u32 = 3;

/// The suffix of the scratch file used while exporting.
const SCRATCH_SUFFIX: &str = "tmp";

/// An error related to the knowledge cache.
#[derive(Debug)]
pub enum Error {
    /// The cache file could not be read.
    Read(PathBuf, io::Error),
    /// The cache file could not be written.
    Write(PathBuf, io::Error),
    /// The cache file is not valid JSON or does not match the schema.
    Deserialize(PathBuf, serde_json::Error),
    /// The cache could not be serialized.
    Serialize(serde_json::Error),
    /// The cache file was written by a newer release.
    UnsupportedVersion(u32),
    /// The cache file needs a migration, but no migration was requested.
    OutdatedVersion(u32),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Read(path, err) => write!(f, "could not read {}: {}", path.display(), err),
            Error::Write(path, err) => write!(f, "could not write {}: {}", path.display(), err),
            Error::Deserialize(path, err) => {
                write!(f, "could not parse {}: {}", path.display(), err)
            }
            Error::Serialize(err) => write!(f, "could not serialize cache: {}", err),
            Error::UnsupportedVersion(version) => write!(
                f,
                "unsupported cache version {} (this release understands up to {})",
                version, CURRENT_VERSION
            ),
            Error::OutdatedVersion(version) => write!(
                f,
                "cache version {} is outdated (expected {}); it must be migrated first",
                version, CURRENT_VERSION
            ),
        }
    }
}

impl std::error::Error for Error {}

/// A [`Result`](std::result::Result) with an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The serialized contents of the cache file.
#[derive(Debug, Default, Deserialize, PartialEq, Serialize)]
struct Contents {
    /// The schema version.
    version: u32,

    /// The cached records.
    snps: BTreeMap<Rsid, SnpediaSnpInfo>,
}

/// Just enough of a cache file of any version to decide what to do with it.
#[derive(Deserialize)]
struct Header {
    /// The schema version; absent in the earliest files.
    #[serde(default)]
    version: u32,
}

/// The marker ids of a cache file of any version.
#[derive(Deserialize)]
struct Keys {
    /// The cached records, whose shape is ignored.
    #[serde(default)]
    snps: BTreeMap<Rsid, IgnoredAny>,
}

/// The marker ids of a cache file as spelled on disk.
#[derive(Deserialize)]
struct Spellings {
    /// The cached records, keyed by the unnormalized id.
    #[serde(default)]
    snps: BTreeMap<String, IgnoredAny>,
}

/// What was found on disk.
enum Stored {
    /// No cache file exists yet.
    Missing,
    /// A cache file with the given version and raw text.
    Present(u32, String),
}

/// The durable mapping from marker id to knowledge-base record.
///
/// This is the single source of truth for whether a marker was already
/// retrieved. Mutations stay in memory until [`Cache::export()`] is called.
#[derive(Debug)]
pub struct Cache {
    /// The location of the cache file.
    path: PathBuf,

    /// The in-memory contents.
    contents: Contents,
}

impl Cache {
    /// Loads the cache at `path`, migrating it to [`CURRENT_VERSION`] if
    /// needed.
    ///
    /// A migration asks `fetcher` for every previously cached marker's raw
    /// document and re-parses it with `parser`. Markers whose document is gone
    /// (or no longer parses) are dropped. The migrated cache is exported
    /// before it is returned, so a file is migrated at most once.
    ///
    /// A missing file yields an empty cache at the current version.
    ///
    /// Marker ids are lower-cased as they are read. Ids that only differ by
    /// case collapse into one record (the one that appears last in the file)
    /// and each collision is logged as a warning.
    pub fn load<F, P>(path: impl Into<PathBuf>, fetcher: &F, parser: &P) -> Result<Self>
    where
        F: DocumentFetcher,
        P: DocumentParser,
    {
        let path = path.into();

        let (version, raw) = match read(&path)? {
            Stored::Missing => return Ok(Self::empty(path)),
            Stored::Present(version, raw) => (version, raw),
        };

        match version {
            CURRENT_VERSION => Self::from_current(path, &raw),
            v if v > CURRENT_VERSION => Err(Error::UnsupportedVersion(v)),
            v => {
                let keys = serde_json::from_str::<Keys>(&raw)
                    .map_err(|err| Error::Deserialize(path.clone(), err))?;
                warn_on_collisions(&path, &raw)?;
                Self::migrate(path, v, keys, fetcher, parser)
            }
        }
    }

    /// Loads the cache at `path` only if it is already at
    /// [`CURRENT_VERSION`].
    ///
    /// This is meant for read-only consumers that cannot parse raw documents;
    /// an older file results in [`Error::OutdatedVersion`].
    pub fn open_current(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        match read(&path)? {
            Stored::Missing => Ok(Self::empty(path)),
            Stored::Present(CURRENT_VERSION, raw) => Self::from_current(path, &raw),
            Stored::Present(v, _) if v > CURRENT_VERSION => Err(Error::UnsupportedVersion(v)),
            Stored::Present(v, _) => Err(Error::OutdatedVersion(v)),
        }
    }

    /// Creates an empty cache at the current version.
    fn empty(path: PathBuf) -> Self {
        Self {
            path,
            contents: Contents {
                version: CURRENT_VERSION,
                snps: BTreeMap::new(),
            },
        }
    }

    /// Deserializes a cache file that is already at the current version.
    fn from_current(path: PathBuf, raw: &str) -> Result<Self> {
        let contents = serde_json::from_str::<Contents>(raw)
            .map_err(|err| Error::Deserialize(path.clone(), err))?;
        warn_on_collisions(&path, raw)?;

        debug!(
            "loaded {} cached records from {}",
            contents.snps.len(),
            path.display()
        );

        Ok(Self { path, contents })
    }

    /// Rebuilds every record of an outdated cache from its raw document.
    fn migrate<F, P>(path: PathBuf, from: u32, keys: Keys, fetcher: &F, parser: &P) -> Result<Self>
    where
        F: DocumentFetcher,
        P: DocumentParser,
    {
        info!(
            "{} uses cache version {}, upgrading to {}",
            path.display(),
            from,
            CURRENT_VERSION
        );

        let total = keys.snps.len();
        let mut snps = BTreeMap::new();

        for rsid in keys.snps.into_keys() {
            let document = match fetcher.cached_document(&rsid) {
                Some(document) => document,
                None => {
                    warn!("dropping {}: raw document is no longer cached", rsid);
                    continue;
                }
            };

            match parser.parse(&document) {
                Ok(info) => {
                    snps.insert(rsid, info);
                }
                Err(err) => warn!("dropping {}: raw document did not parse: {}", rsid, err),
            }
        }

        let cache = Self {
            path,
            contents: Contents {
                version: CURRENT_VERSION,
                snps,
            },
        };

        cache.export()?;
        info!(
            "upgrade complete: kept {} of {} records",
            cache.len(),
            total
        );

        Ok(cache)
    }

    /// Gets the location of the cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the schema version of the in-memory contents.
    pub fn version(&self) -> u32 {
        self.contents.version
    }

    /// Gets the record for `rsid`, if cached.
    pub fn get(&self, rsid: &Rsid) -> Option<&SnpediaSnpInfo> {
        self.contents.snps.get(rsid)
    }

    /// Returns whether a record for `rsid` is cached.
    pub fn contains(&self, rsid: &Rsid) -> bool {
        self.contents.snps.contains_key(rsid)
    }

    /// Inserts or replaces the record for `rsid`. Does not persist.
    pub fn set(&mut self, rsid: Rsid, info: SnpediaSnpInfo) {
        self.contents.snps.insert(rsid, info);
    }

    /// Iterates over all cached records, ordered by marker id.
    pub fn iter(&self) -> impl Iterator<Item = (&Rsid, &SnpediaSnpInfo)> {
        self.contents.snps.iter()
    }

    /// Gets the number of cached records.
    pub fn len(&self) -> usize {
        self.contents.snps.len()
    }

    /// Returns whether the cache holds no records.
    pub fn is_empty(&self) -> bool {
        self.contents.snps.is_empty()
    }

    /// Writes the whole cache to disk.
    ///
    /// The contents are written to a scratch file next to the cache file and
    /// then renamed over it, so a concurrent or later [`Cache::load()`] never
    /// observes a partially written file.
    pub fn export(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| Error::Write(parent.to_path_buf(), err))?;
        }

        let scratch = scratch_path(&self.path);
        let write = || -> Result<()> {
            let file = File::create(&scratch).map_err(|err| Error::Write(scratch.clone(), err))?;
            let mut writer = BufWriter::new(file);

            serde_json::to_writer(&mut writer, &self.contents).map_err(Error::Serialize)?;

            writer
                .flush()
                .map_err(|err| Error::Write(scratch.clone(), err))?;
            writer
                .get_ref()
                .sync_all()
                .map_err(|err| Error::Write(scratch.clone(), err))
        };

        if let Err(err) = write() {
            let _ = fs::remove_file(&scratch);
            return Err(err);
        }

        fs::rename(&scratch, &self.path).map_err(|err| Error::Write(self.path.clone(), err))?;
        debug!("exported {} records to {}", self.len(), self.path.display());

        Ok(())
    }
}

/// Reads the raw cache file and its version tag.
fn read(path: &Path) -> Result<Stored> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Stored::Missing),
        Err(err) => return Err(Error::Read(path.to_path_buf(), err)),
    };

    let header = serde_json::from_str::<Header>(&raw)
        .map_err(|err| Error::Deserialize(path.to_path_buf(), err))?;

    Ok(Stored::Present(header.version, raw))
}

/// Warns about marker ids in `raw` that only differ by case.
fn warn_on_collisions(path: &Path, raw: &str) -> Result<()> {
    let spellings = serde_json::from_str::<Spellings>(raw)
        .map_err(|err| Error::Deserialize(path.to_path_buf(), err))?;

    let mut by_rsid = BTreeMap::<Rsid, Vec<String>>::new();
    for spelling in spellings.snps.into_keys() {
        by_rsid
            .entry(Rsid::new(&spelling))
            .or_default()
            .push(spelling);
    }

    for (rsid, spellings) in by_rsid.iter().filter(|(_, s)| s.len() > 1) {
        warn!(
            "{} holds {} records for {} ({}); keeping only the last",
            path.display(),
            spellings.len(),
            rsid,
            spellings.join(", ")
        );
    }

    Ok(())
}

/// Gets the scratch file used while exporting to `path`.
fn scratch_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(SCRATCH_SUFFIX);
    path.with_file_name(name)
}
