use itertools::Itertools;
use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal};
use tracing::debug;

use crate::data::feature::{Feature, MASS_NEUTRON};
use crate::data::spectrum::{Scan, ScanSource};
use crate::error::{MsWaveletError, Result};
use crate::wavelet::transform::{decompose, multiresolution, TransformConfig, TransformMethod};

/// Configuration for the per-scan feature extraction pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Lower edge of the processed m/z window (default: 400.0)
    pub mz_min: f64,
    /// Upper edge of the processed m/z window (default: 1600.0)
    pub mz_max: f64,
    /// Grid points per Thomson for resampling (default: 100.0)
    pub resolution: f64,
    /// Moving-minimum window for baseline estimation, in grid points (default: 72)
    pub background_window: usize,
    /// Gaussian smoothing sigma in grid points; 0 disables smoothing (default: 2.0)
    pub smoothing_factor: f64,
    /// Wavelet decomposition settings for ridge-peak detection
    pub transform: TransformConfig,
    /// Detail level used for peak picking (default: 3)
    pub peak_scale: usize,
    /// Index tolerance when matching maxima across scales (default: 8)
    pub ridge_tolerance: usize,
    /// Minimum ridge persistence for a peak to survive (default: 2.0)
    pub min_quality: f64,
    /// Noise threshold = this multiple of the MAD noise estimate (default: 3.0)
    pub noise_multiplier: f64,
    /// Highest charge state searched when combining peaks (default: 6)
    pub max_charge: i32,
    /// PPM tolerance for isotope spacing matches (default: 20.0)
    pub isotope_ppm: f64,
    /// Minimum number of isotopic peaks, monoisotopic included (default: 2)
    pub min_isotopes: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            mz_min: 400.0,
            mz_max: 1600.0,
            resolution: 100.0,
            background_window: 72,
            smoothing_factor: 2.0,
            transform: TransformConfig::default(),
            peak_scale: 3,
            ridge_tolerance: 8,
            min_quality: 2.0,
            noise_multiplier: 3.0,
            max_charge: 6,
            isotope_ppm: 20.0,
            min_isotopes: 2,
        }
    }
}

/// A candidate peak localized by the wavelet ridge detector.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RidgePeak {
    /// Index on the resampled grid.
    pub index: usize,
    /// Interpolated m/z position of the grid index.
    pub mz: f64,
    /// Signal intensity at the peak apex (baseline-subtracted, smoothed).
    pub intensity: f64,
    /// Detail scale the peak was picked at.
    pub scale: usize,
    /// Number of scales whose maxima align with this one.
    pub quality: f64,
}

/// Resamples a raw profile spectrum onto a uniform m/z grid.
///
/// The grid starts at `mz_min` with spacing `1 / resolution`; values are
/// linearly interpolated from the raw piecewise-linear profile and zero
/// outside the range the raw samples cover. Raw m/z values must be sorted
/// ascending.
///
/// # Errors
///
/// Returns `InvalidArgument` for mismatched array lengths, a non-positive
/// resolution or an empty window.
///
/// # Example
///
/// ```rust
/// # use mswavelet::algorithm::extraction::resample;
/// let grid = resample(&[100.0, 101.0], &[0.0, 10.0], 100.0, 101.0, 2.0).unwrap();
/// assert_eq!(grid, vec![0.0, 5.0, 10.0]);
/// ```
pub fn resample(
    mz: &[f64],
    intensity: &[f64],
    mz_min: f64,
    mz_max: f64,
    resolution: f64,
) -> Result<Vec<f64>> {
    if mz.len() != intensity.len() {
        return Err(MsWaveletError::InvalidArgument(format!(
            "spectrum arrays differ in length: {} m/z values, {} intensities",
            mz.len(),
            intensity.len()
        )));
    }
    if !(resolution > 0.0) {
        return Err(MsWaveletError::InvalidArgument(format!(
            "resampling resolution must be positive, got {}",
            resolution
        )));
    }
    if mz_max <= mz_min {
        return Err(MsWaveletError::InvalidArgument(format!(
            "empty m/z window [{}, {}]",
            mz_min, mz_max
        )));
    }

    let len = ((mz_max - mz_min) * resolution).floor() as usize + 1;
    let mut grid = vec![0.0; len];
    if mz.is_empty() {
        return Ok(grid);
    }

    let last = mz.len() - 1;
    let mut segment = 0usize;
    for (i, value) in grid.iter_mut().enumerate() {
        let x = mz_min + i as f64 / resolution;
        if x < mz[0] || x > mz[last] {
            continue;
        }
        while segment < last && mz[segment + 1] < x {
            segment += 1;
        }
        if segment == last {
            *value = intensity[last];
            continue;
        }
        let width = mz[segment + 1] - mz[segment];
        *value = if width <= 0.0 {
            intensity[segment]
        } else {
            let fraction = (x - mz[segment]) / width;
            intensity[segment] * (1.0 - fraction) + intensity[segment + 1] * fraction
        };
    }
    Ok(grid)
}

/// Subtracts a moving-minimum baseline from a signal, clamping negative
/// results to zero. `window` is the full width of the minimum filter in
/// grid points; 0 leaves the signal unchanged.
pub fn subtract_background(signal: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || signal.is_empty() {
        return signal.to_vec();
    }
    let half = window / 2;
    let mut out = Vec::with_capacity(signal.len());
    for i in 0..signal.len() {
        let lo = i.saturating_sub(half);
        let hi = (i + half + 1).min(signal.len());
        let minimum = signal[lo..hi]
            .iter()
            .cloned()
            .fold(f64::INFINITY, f64::min);
        out.push((signal[i] - minimum).max(0.0));
    }
    out
}

/// Smooths a signal with a Gaussian kernel of the given sigma (in grid
/// points), truncated at three sigma and renormalized at the edges. A
/// non-positive smoothing factor returns the signal unchanged.
pub fn smooth(signal: &[f64], smoothing_factor: f64) -> Result<Vec<f64>> {
    if smoothing_factor <= 0.0 || signal.is_empty() {
        return Ok(signal.to_vec());
    }
    let normal = Normal::new(0.0, smoothing_factor).map_err(|_| {
        MsWaveletError::InvalidArgument(format!(
            "invalid smoothing factor {}",
            smoothing_factor
        ))
    })?;
    let radius = (3.0 * smoothing_factor).ceil() as usize;
    let kernel: Vec<f64> = (0..=2 * radius)
        .map(|offset| normal.pdf(offset as f64 - radius as f64))
        .collect();

    let mut out = Vec::with_capacity(signal.len());
    for i in 0..signal.len() {
        let mut weighted = 0.0;
        let mut weight = 0.0;
        for (k, &kernel_value) in kernel.iter().enumerate() {
            let offset = k as isize - radius as isize;
            let j = i as isize + offset;
            if j < 0 || j >= signal.len() as isize {
                continue;
            }
            weighted += kernel_value * signal[j as usize];
            weight += kernel_value;
        }
        out.push(weighted / weight);
    }
    Ok(out)
}

/// Median-absolute-deviation noise estimate of a coefficient vector,
/// scaled to be consistent with a Gaussian standard deviation.
pub fn estimate_noise(coefficients: &[f64]) -> f64 {
    if coefficients.is_empty() {
        return 0.0;
    }
    let mut magnitudes: Vec<f64> = coefficients.iter().map(|c| c.abs()).collect();
    magnitudes.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = magnitudes.len() / 2;
    let median = if magnitudes.len() % 2 == 0 {
        (magnitudes[mid - 1] + magnitudes[mid]) / 2.0
    } else {
        magnitudes[mid]
    };
    median / 0.6745
}

// Strict-on-the-right local maxima above a threshold; plateaus report
// their left edge.
fn local_maxima(row: &[f64], threshold: f64) -> Vec<usize> {
    let mut maxima = Vec::new();
    for i in 1..row.len().saturating_sub(1) {
        if row[i] > threshold && row[i] >= row[i - 1] && row[i] > row[i + 1] {
            maxima.push(i);
        }
    }
    maxima
}

fn has_aligned_maximum(maxima: &[usize], index: usize, tolerance: usize) -> bool {
    let start = maxima.partition_point(|&m| m + tolerance < index);
    maxima.get(start).is_some_and(|&m| m <= index + tolerance)
}

/// Localizes candidate peaks in a preprocessed (resampled, baseline-free,
/// smoothed) signal with the MODWT ridge detector.
///
/// The signal is decomposed with the configured filter and depth, the
/// multiresolution detail at `peak_scale` is scanned for local maxima above
/// the noise floor, and each candidate's quality is the number of detail
/// scales whose own maxima align with it within `ridge_tolerance` grid
/// points. Candidates below `min_quality` are dropped.
pub fn detect_peaks(signal: &[f64], mz_min: f64, config: &ExtractionConfig) -> Result<Vec<RidgePeak>> {
    if signal.is_empty() {
        return Ok(Vec::new());
    }
    let levels = config.transform.levels;
    if config.peak_scale == 0 || config.peak_scale > levels {
        return Err(MsWaveletError::InvalidArgument(format!(
            "peak scale {} outside decomposition depth {}",
            config.peak_scale, levels
        )));
    }
    let filter = config.transform.filter()?;
    // Ridge detection always runs on the shift-invariant transform; the
    // critically-sampled DWT would alias peak positions between scales.
    let decomp = decompose(
        signal,
        levels,
        &filter,
        TransformMethod::Modwt,
        config.transform.boundary,
    )?;
    let mra = multiresolution(&decomp, &filter)?;

    let noise = estimate_noise(&mra.detail(1)[..signal.len()]);
    let threshold = config.noise_multiplier * noise;

    let maxima_per_scale: Vec<Vec<usize>> = (1..=levels)
        .map(|scale| local_maxima(&mra.detail(scale)[..signal.len()], threshold))
        .collect();

    let mut peaks = Vec::new();
    for &index in &maxima_per_scale[config.peak_scale - 1] {
        let quality = (1..=levels)
            .filter(|&scale| {
                scale != config.peak_scale
                    && has_aligned_maximum(&maxima_per_scale[scale - 1], index, config.ridge_tolerance)
            })
            .count() as f64
            + 1.0;
        if quality < config.min_quality {
            continue;
        }
        peaks.push(RidgePeak {
            index,
            mz: mz_min + index as f64 / config.resolution,
            intensity: signal[index],
            scale: config.peak_scale,
            quality,
        });
    }
    debug!(
        candidates = maxima_per_scale[config.peak_scale - 1].len(),
        peaks = peaks.len(),
        noise,
        "ridge detection finished"
    );
    Ok(peaks)
}

// Nearest unused detected peak to an expected m/z, within tolerance.
// `peaks` are sorted by m/z ascending.
fn nearest_peak(
    peaks: &[RidgePeak],
    used: &[bool],
    expected: f64,
    tolerance: f64,
) -> Option<usize> {
    let start = peaks.partition_point(|p| p.mz < expected - tolerance);
    let mut best: Option<usize> = None;
    for (offset, peak) in peaks[start..].iter().enumerate() {
        if peak.mz > expected + tolerance {
            break;
        }
        let j = start + offset;
        if used[j] {
            continue;
        }
        let better = match best {
            Some(current) => (peak.mz - expected).abs() < (peaks[current].mz - expected).abs(),
            None => true,
        };
        if better {
            best = Some(j);
        }
    }
    best
}

/// Groups ridge peaks into charge-resolved isotopic features.
///
/// Seeds are visited in descending intensity order. For each seed every
/// charge in `1..=max_charge` is tried by walking the isotope ladder
/// (`MASS_NEUTRON / z` spacings) upward through the unconsumed peaks; the
/// charge matching the most isotopes wins, ties broken by the smaller mean
/// spacing error. Consumed peaks cannot seed or join further features.
pub fn combine_peaks(
    peaks: &[RidgePeak],
    scan_number: i32,
    retention_time: f64,
    config: &ExtractionConfig,
) -> Vec<Feature> {
    let seed_order: Vec<usize> = (0..peaks.len())
        .sorted_by_key(|&i| std::cmp::Reverse(OrderedFloat(peaks[i].intensity)))
        .collect();
    let mut used = vec![false; peaks.len()];
    let mut features: Vec<Feature> = Vec::new();

    for &seed in &seed_order {
        if used[seed] {
            continue;
        }
        let mut best: Option<(i32, Vec<usize>, f64)> = None;
        for charge in 1..=config.max_charge {
            let spacing = MASS_NEUTRON / charge as f64;
            let mut members = vec![seed];
            let mut spacing_error = 0.0;
            let mut expected = peaks[seed].mz + spacing;
            loop {
                // ppm tolerance plus one grid step of quantization slack
                let tolerance = expected * config.isotope_ppm / 1e6 + 1.0 / config.resolution;
                match nearest_peak(peaks, &used, expected, tolerance) {
                    Some(j) if !members.contains(&j) => {
                        spacing_error += (peaks[j].mz - expected).abs();
                        expected = peaks[j].mz + spacing;
                        members.push(j);
                    }
                    _ => break,
                }
            }
            if members.len() < config.min_isotopes {
                continue;
            }
            let mean_error = spacing_error / (members.len() - 1) as f64;
            let better = match &best {
                Some((_, best_members, best_error)) => {
                    members.len() > best_members.len()
                        || (members.len() == best_members.len() && mean_error < *best_error)
                }
                None => true,
            };
            if better {
                best = Some((charge, members, mean_error));
            }
        }

        if let Some((charge, members, _)) = best {
            let intensity: f64 = members.iter().map(|&j| peaks[j].intensity).sum();
            for &j in &members {
                used[j] = true;
            }
            features.push(Feature::new(
                peaks[seed].mz,
                charge,
                intensity,
                scan_number,
                retention_time,
                members.len(),
                peaks[seed].quality,
            ));
        }
    }

    features.sort_by(|a, b| a.mz.partial_cmp(&b.mz).unwrap());
    features
}

/// Runs the full per-scan pipeline: resample, baseline subtraction,
/// smoothing, ridge detection and isotopic combination.
pub fn extract_features<S: ScanSource>(scan: &S, config: &ExtractionConfig) -> Result<Vec<Feature>> {
    let (mz, intensity) = scan.spectrum();
    let resampled = resample(mz, intensity, config.mz_min, config.mz_max, config.resolution)?;
    let cleaned = subtract_background(&resampled, config.background_window);
    let smoothed = smooth(&cleaned, config.smoothing_factor)?;
    let peaks = detect_peaks(&smoothed, config.mz_min, config)?;
    let features = combine_peaks(&peaks, scan.scan_number(), scan.retention_time(), config);
    debug!(
        scan = scan.scan_number(),
        peaks = peaks.len(),
        features = features.len(),
        "scan extraction finished"
    );
    Ok(features)
}

/// Extracts features from many scans in parallel. Scans are independent,
/// so the work is distributed over the rayon pool; results come back in
/// scan order.
pub fn extract_features_batch(scans: &[Scan], config: &ExtractionConfig) -> Result<Vec<Vec<Feature>>> {
    scans
        .par_iter()
        .map(|scan| extract_features(scan, config))
        .collect()
}
