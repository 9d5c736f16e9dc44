use crate::error::{MsWaveletError, Result};
use crate::wavelet::transform::Decomposition;

/// Hard-thresholds the detail rows of a decomposition in place.
///
/// `thresholds` supplies one value per detail level (the smooth row is
/// never touched). Per level:
///
/// * `f64::MAX` is a sentinel that zeroes the entire level,
/// * `0.0` short-circuits as a no-op,
/// * any other value zeroes every coefficient with `|c| <= t`.
///
/// Applying the same thresholds twice yields the same result as applying
/// them once.
///
/// # Errors
///
/// Returns `InvalidArgument` when the threshold count does not match the
/// number of detail levels.
pub fn threshold_hard(decomp: &mut Decomposition, thresholds: &[f64]) -> Result<()> {
    if thresholds.len() != decomp.levels {
        return Err(MsWaveletError::InvalidArgument(format!(
            "expected {} thresholds, got {}",
            decomp.levels,
            thresholds.len()
        )));
    }
    for (row, &threshold) in decomp.rows.iter_mut().zip(thresholds.iter()) {
        if threshold == 0.0 {
            continue;
        }
        if threshold == f64::MAX {
            for coefficient in row.iter_mut() {
                *coefficient = 0.0;
            }
            continue;
        }
        for coefficient in row.iter_mut() {
            if coefficient.abs() <= threshold {
                *coefficient = 0.0;
            }
        }
    }
    Ok(())
}

/// Soft-thresholds a signal in place with a single threshold: shrinks every
/// sample toward zero by `threshold`, clamping to zero inside the band
/// `|s| <= threshold`.
pub fn threshold_soft(signal: &mut [f64], threshold: f64) {
    for sample in signal.iter_mut() {
        *sample = if sample.abs() <= threshold {
            0.0
        } else {
            sample.signum() * (sample.abs() - threshold)
        };
    }
}

/// Per-element soft thresholding; `thresholds` must match the signal length.
pub fn threshold_soft_elems(signal: &mut [f64], thresholds: &[f64]) -> Result<()> {
    if thresholds.len() != signal.len() {
        return Err(MsWaveletError::InvalidArgument(format!(
            "expected {} thresholds, got {}",
            signal.len(),
            thresholds.len()
        )));
    }
    for (sample, &threshold) in signal.iter_mut().zip(thresholds.iter()) {
        *sample = if sample.abs() <= threshold {
            0.0
        } else {
            sample.signum() * (sample.abs() - threshold)
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavelet::filter::WaveletFilter;
    use crate::wavelet::transform::{decompose, TransformMethod};

    fn small_decomposition() -> Decomposition {
        let filter = WaveletFilter::lookup("haar").unwrap();
        let x: Vec<f64> = (0..32).map(|t| ((t as f64) * 0.7).sin() * 5.0).collect();
        decompose(&x, 2, &filter, TransformMethod::Modwt, None).unwrap()
    }

    #[test]
    fn test_hard_threshold_zeroes_small_coefficients() {
        let mut decomp = small_decomposition();
        threshold_hard(&mut decomp, &[1.0, 1.0]).unwrap();
        for level in 1..=2 {
            for &coefficient in decomp.detail(level) {
                assert!(coefficient == 0.0 || coefficient.abs() > 1.0);
            }
        }
    }

    #[test]
    fn test_hard_threshold_idempotent() {
        let mut once = small_decomposition();
        threshold_hard(&mut once, &[0.5, 2.0]).unwrap();
        let mut twice = once.clone();
        threshold_hard(&mut twice, &[0.5, 2.0]).unwrap();
        assert_eq!(once.rows, twice.rows);
    }

    #[test]
    fn test_hard_threshold_sentinel_zeroes_level() {
        let mut decomp = small_decomposition();
        threshold_hard(&mut decomp, &[f64::MAX, 0.0]).unwrap();
        assert!(decomp.detail(1).iter().all(|&c| c == 0.0));
        assert!(decomp.detail(2).iter().any(|&c| c != 0.0));
    }

    #[test]
    fn test_hard_threshold_zero_is_noop() {
        let original = small_decomposition();
        let mut thresholded = original.clone();
        threshold_hard(&mut thresholded, &[0.0, 0.0]).unwrap();
        assert_eq!(original.rows, thresholded.rows);
    }

    #[test]
    fn test_hard_threshold_never_touches_smooth() {
        let original = small_decomposition();
        let mut thresholded = original.clone();
        threshold_hard(&mut thresholded, &[f64::MAX, f64::MAX]).unwrap();
        assert_eq!(original.smooth(), thresholded.smooth());
    }

    #[test]
    fn test_hard_threshold_count_mismatch() {
        let mut decomp = small_decomposition();
        assert!(threshold_hard(&mut decomp, &[1.0]).is_err());
    }

    #[test]
    fn test_soft_threshold_shrinks() {
        let mut signal = vec![-3.0, -1.0, 0.0, 0.5, 2.5];
        threshold_soft(&mut signal, 1.0);
        assert_eq!(signal, vec![-2.0, 0.0, 0.0, 0.0, 1.5]);
    }

    #[test]
    fn test_soft_threshold_per_element() {
        let mut signal = vec![4.0, 4.0, -4.0];
        threshold_soft_elems(&mut signal, &[1.0, 5.0, 3.0]).unwrap();
        assert_eq!(signal, vec![3.0, 0.0, -1.0]);
        assert!(threshold_soft_elems(&mut signal, &[1.0]).is_err());
    }
}
