use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::algorithm::extraction::{extract_features, ExtractionConfig};
use crate::data::feature::{CalibrationObservation, Feature};
use crate::data::spectrum::ScanSource;
use crate::error::{MsWaveletError, Result};

/// Configuration for lock-mass calibration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LockmassConfig {
    /// Expected m/z of the internal standard (default: 785.8426)
    pub lockmass_mz: f64,
    /// Expected charge of the internal standard (default: 2)
    pub lockmass_charge: i32,
    /// Maximum |observed - expected| m/z distance in Da (default: 0.05)
    pub mass_window: f64,
    /// Scale the correction to parts-per-million of each feature's own m/z
    /// instead of applying it as a constant Da offset (default: false)
    pub use_ppm: bool,
}

impl Default for LockmassConfig {
    fn default() -> Self {
        LockmassConfig {
            lockmass_mz: 785.8426,
            lockmass_charge: 2,
            mass_window: 0.05,
            use_ppm: false,
        }
    }
}

/// Searches one calibration scan for the internal-standard feature.
///
/// Feature extraction runs restricted to a narrow window around the
/// expected lock-mass m/z; among the resulting features with the expected
/// charge, the one closest to `lockmass_mz` is kept if it falls inside the
/// configured mass window. Returns `None` (with a warning event) when no
/// feature qualifies, so a sparse calibration scan never aborts the run.
pub fn find_lockmass_observation<S: ScanSource>(
    scan: &S,
    extraction: &ExtractionConfig,
    config: &LockmassConfig,
) -> Result<Option<CalibrationObservation>> {
    let mut window = extraction.clone();
    window.mz_min = config.lockmass_mz - 5.0 * config.mass_window.max(0.5);
    window.mz_max = config.lockmass_mz + 5.0 * config.mass_window.max(0.5);

    let features = extract_features(scan, &window)?;
    let closest = features
        .iter()
        .filter(|f| f.charge == config.lockmass_charge)
        .min_by_key(|f| OrderedFloat((f.mz - config.lockmass_mz).abs()));

    match closest {
        Some(feature) if (feature.mz - config.lockmass_mz).abs() < config.mass_window => {
            debug!(
                scan = scan.scan_number(),
                observed_mz = feature.mz,
                "lockmass feature found"
            );
            Ok(Some(CalibrationObservation {
                scan_index: scan.scan_number(),
                retention_time: scan.retention_time(),
                observed_mz: feature.mz,
            }))
        }
        _ => {
            warn!(scan = scan.scan_number(), "no qualifying lockmass feature in calibration scan");
            Ok(None)
        }
    }
}

/// Applies the piecewise lock-mass correction to a feature list, returning
/// corrected copies; the input is left untouched.
///
/// Features are visited in ascending scan order while a `(before, after)`
/// pair of bracketing non-null observations advances with them. A feature
/// ahead of the first anchor uses that anchor for both bracket ends; past
/// the last anchor the final pair keeps being reused, so tail corrections
/// are extrapolated rather than clamped. The correction is
/// `lockmass_mz - (before.mz + after.mz) / 2`, optionally rescaled to ppm
/// of the feature's own m/z, and each corrected feature's derived mass is
/// recomputed.
///
/// # Errors
///
/// Returns `NoCalibrationData` when every observation is `None`; the
/// uncorrected input remains valid in that case.
///
/// # Example
///
/// ```rust
/// # use mswavelet::algorithm::lockmass::{correct_features, LockmassConfig};
/// # use mswavelet::data::feature::{CalibrationObservation, Feature};
/// let config = LockmassConfig { lockmass_mz: 785.8426, ..LockmassConfig::default() };
/// let observations = vec![
///     Some(CalibrationObservation { scan_index: 10, retention_time: 30.0, observed_mz: 785.840 }),
///     None,
///     Some(CalibrationObservation { scan_index: 30, retention_time: 90.0, observed_mz: 785.848 }),
/// ];
/// let features = vec![Feature::new(600.0, 1, 10.0, 25, 75.0, 2, 2.0)];
/// let corrected = correct_features(&features, &observations, &config).unwrap();
/// assert!((corrected[0].mz - (600.0 - 0.0014)).abs() < 1e-9);
/// ```
pub fn correct_features(
    features: &[Feature],
    observations: &[Option<CalibrationObservation>],
    config: &LockmassConfig,
) -> Result<Vec<Feature>> {
    let anchors: Vec<&CalibrationObservation> = observations.iter().flatten().collect();
    if anchors.is_empty() {
        return Err(MsWaveletError::NoCalibrationData);
    }

    let mut scan_order: Vec<usize> = (0..features.len()).collect();
    scan_order.sort_by_key(|&i| features[i].scan_first);

    let mut corrected: Vec<Feature> = features.to_vec();
    let mut before = 0usize;
    let mut after = 0usize;
    for &i in &scan_order {
        let feature = &features[i];
        while feature.scan_first > anchors[after].scan_index && after + 1 < anchors.len() {
            before = after;
            after += 1;
        }
        let bracket_mz = (anchors[before].observed_mz + anchors[after].observed_mz) / 2.0;
        let mut correction = config.lockmass_mz - bracket_mz;
        if config.use_ppm {
            correction = correction / config.lockmass_mz * feature.mz;
        }
        corrected[i] = feature.with_mz(feature.mz + correction);
    }
    debug!(
        features = corrected.len(),
        anchors = anchors.len(),
        "lockmass correction applied"
    );
    Ok(corrected)
}
