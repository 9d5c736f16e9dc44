use serde::{Deserialize, Serialize};

use crate::error::{MsWaveletError, Result};

// Scaling (low-pass) coefficients for the supported wavelet families,
// WMTSA conventions. The wavelet (high-pass) side is derived through the
// quadrature-mirror relationship at lookup time.
const HAAR_G: [f64; 2] = [0.7071067811865476, 0.7071067811865476];

const D4_G: [f64; 4] = [
    0.48296291314469025,
    0.8365163037378079,
    0.22414386804185735,
    -0.12940952255092145,
];

const D6_G: [f64; 6] = [
    0.3326705529509569,
    0.8068915093133388,
    0.4598775021193313,
    -0.13501102001039084,
    -0.08544127388224149,
    0.035226291882100656,
];

const D8_G: [f64; 8] = [
    0.23037781330885523,
    0.7148465705525415,
    0.6308807679295904,
    -0.02798376941698385,
    -0.18703481171888114,
    0.030841381835986965,
    0.032883011666982945,
    -0.010597401784997278,
];

const LA8_G: [f64; 8] = [
    -0.07576571478927333,
    -0.02963552764599851,
    0.49761866763201545,
    0.8037387518059161,
    0.29785779560527736,
    -0.09921954357684722,
    -0.012603967262037833,
    0.03222310060404270,
];

const LA16_G: [f64; 16] = [
    -0.0033824159510061256,
    -0.0005421323317911481,
    0.03169508781149298,
    0.007607487324917605,
    -0.1432942383508097,
    -0.061273359067658524,
    0.4813596512583722,
    0.7771857517005235,
    0.3644418948353314,
    -0.05194583810770904,
    -0.027219029917056003,
    0.049137179673607506,
    0.003808752013890615,
    -0.01495225833704823,
    -0.0003029205147213668,
    0.0018899503327594609,
];

/// A paired high-pass/low-pass coefficient set defining one wavelet family.
///
/// `h` holds the wavelet (high-pass) coefficients, `g` the scaling
/// (low-pass) coefficients; both have length `len`. For the built-in
/// families the pair satisfies the standard quadrature-mirror relationship
/// `h[l] = (-1)^l * g[len - 1 - l]`. Caller-supplied pairs passed to
/// [`WaveletFilter::new`] are not validated; the transform engine assumes a
/// matched pair of even length.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveletFilter {
    pub name: String,
    pub len: usize,
    pub h: Vec<f64>,
    pub g: Vec<f64>,
}

impl WaveletFilter {
    /// Wraps an explicit coefficient pair. No quadrature-mirror validation
    /// is performed.
    pub fn new(name: &str, h: Vec<f64>, g: Vec<f64>) -> Self {
        let len = g.len();
        WaveletFilter { name: name.to_string(), len, h, g }
    }

    /// Looks up one of the known wavelet families by name.
    ///
    /// The known set is fixed: `haar`, `d4`, `d6`, `d8`, `la8`, `la16`.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFilter` for any other name.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mswavelet::wavelet::filter::WaveletFilter;
    /// let filter = WaveletFilter::lookup("d4").unwrap();
    /// assert_eq!(filter.len, 4);
    /// assert!(WaveletFilter::lookup("bogus").is_err());
    /// ```
    pub fn lookup(name: &str) -> Result<WaveletFilter> {
        match name {
            "haar" => Ok(WaveletFilter::from_scaling(name, &HAAR_G)),
            "d4" => Ok(WaveletFilter::from_scaling(name, &D4_G)),
            "d6" => Ok(WaveletFilter::from_scaling(name, &D6_G)),
            "d8" => Ok(WaveletFilter::from_scaling(name, &D8_G)),
            "la8" => Ok(WaveletFilter::from_scaling(name, &LA8_G)),
            "la16" => Ok(WaveletFilter::from_scaling(name, &LA16_G)),
            _ => Err(MsWaveletError::UnsupportedFilter(name.to_string())),
        }
    }

    /// Block-averaging/block-differencing generalization of the Haar pair.
    ///
    /// Produces a filter of length `2 * scale` where the first `scale`
    /// entries replicate the first Haar coefficient and the next `scale`
    /// entries the second, each divided by `sqrt(scale)` so the sum of
    /// squares stays 1. This derivation applies to the Haar filter only.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `scale` is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use mswavelet::wavelet::filter::WaveletFilter;
    /// let filter = WaveletFilter::scaled_haar(4).unwrap();
    /// assert_eq!(filter.len, 8);
    /// let energy: f64 = filter.g.iter().map(|c| c * c).sum();
    /// assert!((energy - 1.0).abs() < 1e-12);
    /// ```
    pub fn scaled_haar(scale: usize) -> Result<WaveletFilter> {
        if scale == 0 {
            return Err(MsWaveletError::InvalidArgument(
                "haar block scale must be >= 1".to_string(),
            ));
        }
        let base = WaveletFilter::from_scaling("haar", &HAAR_G);
        let norm = (scale as f64).sqrt();
        let mut h = Vec::with_capacity(2 * scale);
        let mut g = Vec::with_capacity(2 * scale);
        for coefficient in 0..2 {
            for _ in 0..scale {
                h.push(base.h[coefficient] / norm);
                g.push(base.g[coefficient] / norm);
            }
        }
        Ok(WaveletFilter { name: format!("haar{}", scale), len: 2 * scale, h, g })
    }

    fn from_scaling(name: &str, g: &[f64]) -> WaveletFilter {
        let len = g.len();
        let h: Vec<f64> = (0..len)
            .map(|l| if l % 2 == 0 { g[len - 1 - l] } else { -g[len - 1 - l] })
            .collect();
        WaveletFilter { name: name.to_string(), len, h, g: g.to_vec() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_lengths() {
        for (name, len) in [("haar", 2), ("d4", 4), ("d6", 6), ("d8", 8), ("la8", 8), ("la16", 16)]
        {
            let filter = WaveletFilter::lookup(name).unwrap();
            assert_eq!(filter.len, len, "wrong length for {}", name);
            assert_eq!(filter.h.len(), len);
            assert_eq!(filter.g.len(), len);
        }
    }

    #[test]
    fn test_lookup_unknown_name() {
        let result = WaveletFilter::lookup("bogus");
        assert!(matches!(result, Err(MsWaveletError::UnsupportedFilter(_))));
    }

    #[test]
    fn test_coefficients_are_orthonormal() {
        for name in ["haar", "d4", "d6", "d8", "la8", "la16"] {
            let filter = WaveletFilter::lookup(name).unwrap();
            let g_energy: f64 = filter.g.iter().map(|c| c * c).sum();
            let h_energy: f64 = filter.h.iter().map(|c| c * c).sum();
            let cross: f64 = filter.h.iter().zip(filter.g.iter()).map(|(a, b)| a * b).sum();
            assert!((g_energy - 1.0).abs() < 1e-9, "{} g energy {}", name, g_energy);
            assert!((h_energy - 1.0).abs() < 1e-9, "{} h energy {}", name, h_energy);
            assert!(cross.abs() < 1e-9, "{} h/g not orthogonal: {}", name, cross);
        }
    }

    #[test]
    fn test_haar_quadrature_mirror() {
        let filter = WaveletFilter::lookup("haar").unwrap();
        assert!((filter.h[0] - 0.7071067811865476).abs() < 1e-15);
        assert!((filter.h[1] + 0.7071067811865476).abs() < 1e-15);
    }

    #[test]
    fn test_scaled_haar_block_structure() {
        let filter = WaveletFilter::scaled_haar(2).unwrap();
        assert_eq!(filter.len, 4);
        let expected = 0.7071067811865476 / 2f64.sqrt();
        assert!((filter.g[0] - expected).abs() < 1e-12);
        assert!((filter.g[1] - expected).abs() < 1e-12);
        assert!((filter.g[2] - expected).abs() < 1e-12);
        assert!((filter.g[3] - expected).abs() < 1e-12);
        assert!((filter.h[0] - expected).abs() < 1e-12);
        assert!((filter.h[2] + expected).abs() < 1e-12);
    }

    #[test]
    fn test_scaled_haar_rejects_zero_scale() {
        assert!(WaveletFilter::scaled_haar(0).is_err());
    }
}
