use std::fmt;
use std::fmt::{Display, Formatter};

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::data::feature::Feature;
use crate::error::{MsWaveletError, Result};

/// Represents a raw profile spectrum: m/z sample positions and their
/// intensities, sorted by m/z in ascending order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct ProfileSpectrum {
    pub mz: Vec<f64>,
    pub intensity: Vec<f64>,
}

impl ProfileSpectrum {
    /// Constructs a new `ProfileSpectrum`.
    ///
    /// # Arguments
    ///
    /// * `mz` - A vector of m/z values, ascending.
    /// * `intensity` - A vector of intensity values corresponding to the m/z values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the two vectors differ in length.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mswavelet::data::spectrum::ProfileSpectrum;
    /// let spectrum = ProfileSpectrum::new(vec![100.0, 200.0], vec![10.0, 20.0]).unwrap();
    /// assert_eq!(spectrum.mz, vec![100.0, 200.0]);
    /// assert_eq!(spectrum.intensity, vec![10.0, 20.0]);
    /// ```
    pub fn new(mz: Vec<f64>, intensity: Vec<f64>) -> Result<Self> {
        if mz.len() != intensity.len() {
            return Err(MsWaveletError::InvalidArgument(format!(
                "spectrum arrays differ in length: {} m/z values, {} intensities",
                mz.len(),
                intensity.len()
            )));
        }
        Ok(ProfileSpectrum { mz, intensity })
    }

    pub fn len(&self) -> usize {
        self.mz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Keep only the samples inside the given m/z and intensity bounds.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mswavelet::data::spectrum::ProfileSpectrum;
    /// let spectrum = ProfileSpectrum::new(vec![100.0, 200.0, 300.0], vec![10.0, 20.0, 30.0]).unwrap();
    /// let filtered = spectrum.filter_ranged(150.0, 350.0, 25.0, 1e9);
    /// assert_eq!(filtered.mz, vec![300.0]);
    /// ```
    pub fn filter_ranged(&self, mz_min: f64, mz_max: f64, intensity_min: f64, intensity_max: f64) -> Self {
        let mut mz_vec: Vec<f64> = Vec::new();
        let mut intensity_vec: Vec<f64> = Vec::new();

        for (mz, intensity) in self.mz.iter().zip(self.intensity.iter()) {
            if mz_min <= *mz && *mz <= mz_max && *intensity >= intensity_min && *intensity <= intensity_max {
                mz_vec.push(*mz);
                intensity_vec.push(*intensity);
            }
        }
        ProfileSpectrum { mz: mz_vec, intensity: intensity_vec }
    }
}

impl Display for ProfileSpectrum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let max = self
            .mz
            .iter()
            .zip(self.intensity.iter())
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal));

        match max {
            Some((mz, i)) => write!(
                f,
                "ProfileSpectrum(data points: {}, max by intensity: ({:.3}, {}))",
                self.mz.len(),
                mz,
                i
            ),
            None => write!(f, "ProfileSpectrum(empty)"),
        }
    }
}

/// Anything that can hand the pipeline one scan's worth of raw data.
///
/// File readers, database rows and in-memory test fixtures all enter the
/// pipeline through this trait; the extraction code never sees anything else.
pub trait ScanSource {
    /// The raw (m/z, intensity) sample arrays, equal length, ascending m/z.
    fn spectrum(&self) -> (&[f64], &[f64]);
    /// Retention time of the scan in seconds.
    fn retention_time(&self) -> f64;
    /// The scan number within the run.
    fn scan_number(&self) -> i32;
}

/// An owned scan: one profile spectrum plus its run coordinates.
#[derive(Clone, Debug, Serialize, Deserialize, Encode, Decode)]
pub struct Scan {
    pub spectrum: ProfileSpectrum,
    pub retention_time: f64,
    pub scan_number: i32,
}

impl Scan {
    pub fn new(spectrum: ProfileSpectrum, retention_time: f64, scan_number: i32) -> Self {
        Scan { spectrum, retention_time, scan_number }
    }
}

impl ScanSource for Scan {
    fn spectrum(&self) -> (&[f64], &[f64]) {
        (&self.spectrum.mz, &self.spectrum.intensity)
    }

    fn retention_time(&self) -> f64 {
        self.retention_time
    }

    fn scan_number(&self) -> i32 {
        self.scan_number
    }
}

/// A destination for detected features: file writers, database inserters,
/// or an in-memory collector for tests.
pub trait FeatureSink {
    fn write(&mut self, feature: &Feature) -> Result<()>;

    fn write_all(&mut self, features: &[Feature]) -> Result<()> {
        for feature in features {
            self.write(feature)?;
        }
        Ok(())
    }
}

/// Collects written features into a plain vector.
#[derive(Clone, Debug, Default)]
pub struct VecSink {
    pub features: Vec<Feature>,
}

impl VecSink {
    pub fn new() -> Self {
        VecSink { features: Vec::new() }
    }
}

impl FeatureSink for VecSink {
    fn write(&mut self, feature: &Feature) -> Result<()> {
        self.features.push(feature.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::feature::Feature;

    #[test]
    fn test_new_rejects_mismatched_lengths() {
        let result = ProfileSpectrum::new(vec![100.0, 200.0], vec![10.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_filter_ranged() {
        let spectrum =
            ProfileSpectrum::new(vec![100.0, 200.0, 300.0], vec![5.0, 50.0, 500.0]).unwrap();
        let filtered = spectrum.filter_ranged(100.0, 250.0, 10.0, 1e9);
        assert_eq!(filtered.mz, vec![200.0]);
        assert_eq!(filtered.intensity, vec![50.0]);
    }

    #[test]
    fn test_vec_sink_collects() {
        let mut sink = VecSink::new();
        let features = vec![
            Feature::new(500.0, 2, 100.0, 1, 12.5, 2, 3.0),
            Feature::new(600.0, 1, 50.0, 1, 12.5, 2, 2.0),
        ];
        sink.write_all(&features).unwrap();
        assert_eq!(sink.features.len(), 2);
        assert_eq!(sink.features[0].mz, 500.0);
    }
}
