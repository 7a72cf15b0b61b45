//! Importance ranking of resolved markers.
//!
//! Every displayed marker gets one integer sort key. The magnitude of the
//! matched variant dominates (scaled by [`MAGNITUDE_SCALE`]), and a small
//! secondary importance breaks ties between markers sharing the same (or no)
//! magnitude.
//!
//! ```
//! use snpmatch::knowledge::GenotypeSummary;
//! use snpmatch::knowledge::SnpediaSnpInfo;
//! use snpmatch::ranking;
//!
//! let info = SnpediaSnpInfo {
//!     description: Some(String::from("a well-known marker")),
//!     genotype_summaries: vec![GenotypeSummary {
//!         genotype: "(A;G)".parse()?,
//!         magnitude: Some(2.5),
//!         description: None,
//!     }],
//!     ..Default::default()
//! };
//!
//! assert_eq!(ranking::secondary_importance(&info, Some(0)), 4);
//! assert_eq!(ranking::rank_key(&info, Some(0)), 254);
//! assert_eq!(ranking::rank_key(&info, None), 2);
//!
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::knowledge::SnpediaSnpInfo;

/// The factor applied to magnitudes so the secondary importance fits below
/// them.
pub const MAGNITUDE_SCALE: f64 = 100.0;

/// Gets the magnitude of the matched variant, if a variant matched and it
/// publishes one.
pub fn matched_magnitude(info: &SnpediaSnpInfo, variant: Option<usize>) -> Option<f64> {
    variant
        .and_then(|index| info.genotype_summaries.get(index))
        .and_then(|summary| summary.magnitude)
}

/// Computes the tie-breaking importance of a marker.
///
/// A description and a non-empty variant list are worth one point each. A
/// nonzero magnitude on the matched variant is worth two points, while an
/// explicit zero is worth one: "known to have no effect" says more than
/// "unknown effect".
pub fn secondary_importance(info: &SnpediaSnpInfo, variant: Option<usize>) -> u32 {
    let mut importance = 0;

    if info.description.is_some() {
        importance += 1;
    }

    if !info.genotype_summaries.is_empty() {
        importance += 1;
    }

    importance += match matched_magnitude(info, variant) {
        Some(magnitude) if magnitude != 0.0 => 2,
        Some(_) => 1,
        None => 0,
    };

    importance
}

/// Computes the sort key of a marker (higher sorts first).
///
/// Halfway values round to the nearest even integer.
pub fn rank_key(info: &SnpediaSnpInfo, variant: Option<usize>) -> i64 {
    let magnitude = matched_magnitude(info, variant).unwrap_or_default();
    let secondary = f64::from(secondary_importance(info, variant));

    // NOTE: magnitudes are validated as finite and non-negative when parsed,
    // so the cast never saturates in practice.
    (magnitude * MAGNITUDE_SCALE + secondary).round_ties_even() as i64
}
