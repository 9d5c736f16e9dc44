use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

// Unified atomic mass units
pub const MASS_PROTON: f64 = 1.007276466621;
pub const MASS_NEUTRON: f64 = 1.00866491595;

/// A detected, charge-resolved isotopic peak cluster: one peptide/ion
/// species at a point in retention time.
///
/// `mass` is derived from `mz` and `charge` and must be recomputed whenever
/// the m/z changes; use [`Feature::with_mz`] instead of assigning to `mz`
/// directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Feature {
    /// Monoisotopic m/z of the cluster.
    pub mz: f64,
    /// Assigned charge state.
    pub charge: i32,
    /// Summed intensity over the matched isotopic peaks.
    pub intensity: f64,
    /// First scan the feature was observed in.
    pub scan_first: i32,
    /// Last scan the feature was observed in.
    pub scan_last: i32,
    /// Retention time in seconds.
    pub retention_time: f64,
    /// Neutral monoisotopic mass, `(mz - MASS_PROTON) * charge`.
    pub mass: f64,
    /// Number of isotopic peaks in the cluster, monoisotopic included.
    pub isotope_count: usize,
    /// Ridge persistence of the seeding wavelet peak.
    pub quality: f64,
}

impl Feature {
    /// Constructs a single-scan feature, deriving the neutral mass.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mswavelet::data::feature::{Feature, MASS_PROTON};
    /// let feature = Feature::new(500.0, 2, 1000.0, 42, 360.0, 3, 4.0);
    /// assert_eq!(feature.scan_first, 42);
    /// assert_eq!(feature.scan_last, 42);
    /// assert!((feature.mass - (500.0 - MASS_PROTON) * 2.0).abs() < 1e-12);
    /// ```
    pub fn new(
        mz: f64,
        charge: i32,
        intensity: f64,
        scan: i32,
        retention_time: f64,
        isotope_count: usize,
        quality: f64,
    ) -> Self {
        Feature {
            mz,
            charge,
            intensity,
            scan_first: scan,
            scan_last: scan,
            retention_time,
            mass: Feature::mass_from_mz(mz, charge),
            isotope_count,
            quality,
        }
    }

    /// Neutral monoisotopic mass for a given m/z and charge.
    pub fn mass_from_mz(mz: f64, charge: i32) -> f64 {
        (mz - MASS_PROTON) * charge as f64
    }

    /// A copy of this feature at a new m/z, with the derived mass recomputed.
    pub fn with_mz(&self, mz: f64) -> Feature {
        let mut feature = self.clone();
        feature.mz = mz;
        feature.mass = Feature::mass_from_mz(mz, self.charge);
        feature
    }
}

/// One lock-mass sighting in a calibration scan.
///
/// Created once per run during calibration-scan processing, consumed
/// immediately to interpolate corrections, then discarded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationObservation {
    pub scan_index: i32,
    pub retention_time: f64,
    pub observed_mz: f64,
}
