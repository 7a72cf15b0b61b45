//! Marker identifiers.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;

/// Identifiers that are safe to use as a file name.
static FILE_NAME_SAFE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]*$").unwrap());

/// The stable identifier of a genomic marker (e.g., `rs4680`).
///
/// The identifier is always lower-cased on construction, so `Rs53576` and
/// `rs53576` name the same marker.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(from = "String", into = "String")]
pub struct Rsid(String);

impl Rsid {
    /// Creates a new, lower-cased [`Rsid`].
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::core::Rsid;
    ///
    /// let rsid = Rsid::new("Rs53576");
    /// assert_eq!(rsid.as_str(), "rs53576");
    /// ```
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().to_lowercase())
    }

    /// Gets the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether the identifier can be used verbatim as a file name.
    ///
    /// # Examples
    ///
    /// ```
    /// use snpmatch::core::Rsid;
    ///
    /// assert!(Rsid::new("rs4680").is_file_name_safe());
    /// assert!(!Rsid::new("../rs4680").is_file_name_safe());
    /// assert!(!Rsid::new("4680").is_file_name_safe());
    /// ```
    pub fn is_file_name_safe(&self) -> bool {
        FILE_NAME_SAFE.is_match(&self.0)
    }
}

impl From<String> for Rsid {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Rsid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<Rsid> for String {
    fn from(value: Rsid) -> Self {
        value.0
    }
}

impl std::fmt::Display for Rsid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
