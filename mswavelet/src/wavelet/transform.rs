use std::str::FromStr;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{MsWaveletError, Result};
use crate::wavelet::filter::WaveletFilter;

/// Which pyramid algorithm a decomposition uses.
///
/// The DWT is critically sampled and needs a dyadic signal length; the
/// MODWT is redundant, shift-invariant and works at any length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformMethod {
    Dwt,
    Modwt,
}

impl FromStr for TransformMethod {
    type Err = MsWaveletError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dwt" => Ok(TransformMethod::Dwt),
            "modwt" => Ok(TransformMethod::Modwt),
            _ => Err(MsWaveletError::InvalidArgument(format!(
                "unknown transform method '{}', expected 'dwt' or 'modwt'",
                s
            ))),
        }
    }
}

/// Boundary handling for a decomposition.
///
/// All transform steps are periodic internally; `Reflection` mirror-extends
/// the signal to twice its length before the first level, and consumers
/// discard the mirrored half after inversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Boundary {
    Periodic,
    Reflection,
}

impl FromStr for Boundary {
    type Err = MsWaveletError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "periodic" => Ok(Boundary::Periodic),
            "reflection" => Ok(Boundary::Reflection),
            _ => Err(MsWaveletError::InvalidArgument(format!(
                "unknown boundary '{}', expected 'periodic' or 'reflection'",
                s
            ))),
        }
    }
}

/// Filter, depth, method and boundary for a multi-level decomposition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Name of the wavelet family, one of the filter bank's known set.
    pub filter_name: String,
    /// Number of decomposition levels K, >= 1.
    pub levels: usize,
    pub method: TransformMethod,
    /// `None` means periodic.
    pub boundary: Option<Boundary>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        TransformConfig {
            filter_name: "haar".to_string(),
            levels: 4,
            method: TransformMethod::Modwt,
            boundary: Some(Boundary::Reflection),
        }
    }
}

impl TransformConfig {
    pub fn filter(&self) -> Result<WaveletFilter> {
        WaveletFilter::lookup(&self.filter_name)
    }
}

/// The output of [`decompose`]: `levels` detail vectors at successive
/// scales followed by one final smooth vector.
///
/// For the DWT the row length halves at each level; for the MODWT every
/// row has the working length (`2 * n` when reflection was used).
#[derive(Clone, Debug)]
pub struct Decomposition {
    /// `rows[0..levels]` are detail coefficients, `rows[levels]` the smooth.
    pub rows: Vec<Vec<f64>>,
    /// Original signal length, before any reflection extension.
    pub n: usize,
    pub levels: usize,
    pub method: TransformMethod,
    pub boundary: Boundary,
}

impl Decomposition {
    /// Detail coefficients at `level` (1-based, 1 = finest scale).
    pub fn detail(&self, level: usize) -> &[f64] {
        &self.rows[level - 1]
    }

    /// The final smooth vector.
    pub fn smooth(&self) -> &[f64] {
        &self.rows[self.levels]
    }

    /// Dense `(levels + 1) x len` matrix of the rows. Only defined when all
    /// rows share one length, i.e. for MODWT output.
    pub fn to_dense(&self) -> Result<DMatrix<f64>> {
        let len = self.rows[0].len();
        if self.rows.iter().any(|row| row.len() != len) {
            return Err(MsWaveletError::InvalidArgument(
                "dense export requires equal-length rows (MODWT output)".to_string(),
            ));
        }
        Ok(DMatrix::from_fn(self.rows.len(), len, |i, j| self.rows[i][j]))
    }
}

// Shared circular index arithmetic. Every transform direction walks its
// input through these two helpers so the wrap conventions cannot drift
// apart between forward and inverse paths. `step` must already be reduced
// modulo `n`.
#[inline]
fn wrap_back(k: usize, step: usize, n: usize) -> usize {
    if k >= step {
        k - step
    } else {
        k + n - step
    }
}

#[inline]
fn wrap_forward(k: usize, step: usize, n: usize) -> usize {
    let j = k + step;
    if j >= n {
        j - n
    } else {
        j
    }
}

// MODWT circular shift step at a given level, reduced modulo the working
// length so the wrap helpers stay in range.
fn level_step(level: usize, n: usize) -> Result<usize> {
    if level == 0 {
        return Err(MsWaveletError::InvalidArgument(
            "decomposition level must be >= 1".to_string(),
        ));
    }
    if level > 63 {
        return Err(MsWaveletError::InvalidArgument(format!(
            "decomposition level {} out of range",
            level
        )));
    }
    Ok((1usize << (level - 1)) % n)
}

/// One pyramid step of the critically-sampled discrete wavelet transform.
///
/// Splits `v_in` (length `M`, even) into detail coefficients `W` and the
/// smooth `V`, each of length `M / 2`, under periodic boundary conditions.
///
/// # Errors
///
/// Returns `InvalidArgument` when the input is empty or of odd length.
pub fn dwt(v_in: &[f64], filter: &WaveletFilter) -> Result<(Vec<f64>, Vec<f64>)> {
    let m = v_in.len();
    if m == 0 || m % 2 != 0 {
        return Err(MsWaveletError::InvalidArgument(format!(
            "dwt input length must be even and non-zero, got {}",
            m
        )));
    }
    let half = m / 2;
    let mut w = vec![0.0; half];
    let mut v = vec![0.0; half];
    for t in 0..half {
        let mut k = 2 * t + 1;
        let mut w_sum = 0.0;
        let mut v_sum = 0.0;
        for l in 0..filter.len {
            w_sum += filter.h[l] * v_in[k];
            v_sum += filter.g[l] * v_in[k];
            k = wrap_back(k, 1, m);
        }
        w[t] = w_sum;
        v[t] = v_sum;
    }
    Ok((w, v))
}

/// Inverse pyramid step: reconstructs `2 * M` samples from `M`
/// detail/smooth coefficient pairs.
///
/// The even output sample at each position uses the odd-indexed filter
/// taps, the odd output sample the even-indexed taps, both walking the
/// coefficient index forward circularly.
///
/// # Errors
///
/// Returns `InvalidArgument` when the two inputs differ in length or are
/// empty.
pub fn idwt(w_in: &[f64], v_in: &[f64], filter: &WaveletFilter) -> Result<Vec<f64>> {
    let m = w_in.len();
    if m == 0 || v_in.len() != m {
        return Err(MsWaveletError::InvalidArgument(format!(
            "idwt inputs must be equal-length and non-empty, got {} and {}",
            w_in.len(),
            v_in.len()
        )));
    }
    let mut x = vec![0.0; 2 * m];
    for t in 0..m {
        let mut u = t;
        let mut i = 1;
        let mut j = 0;
        let mut even = 0.0;
        let mut odd = 0.0;
        for _ in 0..filter.len / 2 {
            even += filter.h[i] * w_in[u] + filter.g[i] * v_in[u];
            odd += filter.h[j] * w_in[u] + filter.g[j] * v_in[u];
            i += 2;
            j += 2;
            u = wrap_forward(u, 1, m);
        }
        x[2 * t] = even;
        x[2 * t + 1] = odd;
    }
    Ok(x)
}

/// Maximal-overlap transform step at decomposition `level` (>= 1).
///
/// Output length equals input length at every level, which is what makes
/// the MODWT shift-invariant and usable on non-dyadic-length signals. The
/// filter taps are scaled by `1 / sqrt(2)` and the circular shift step is
/// `2^(level - 1)`, walked backward.
pub fn modwt(v_in: &[f64], level: usize, filter: &WaveletFilter) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = v_in.len();
    if n == 0 {
        return Err(MsWaveletError::InvalidArgument(
            "modwt input must be non-empty".to_string(),
        ));
    }
    let step = level_step(level, n)?;
    let ht: Vec<f64> = filter.h.iter().map(|c| c / std::f64::consts::SQRT_2).collect();
    let gt: Vec<f64> = filter.g.iter().map(|c| c / std::f64::consts::SQRT_2).collect();
    let mut w = vec![0.0; n];
    let mut v = vec![0.0; n];
    for t in 0..n {
        let mut k = t;
        let mut w_sum = 0.0;
        let mut v_sum = 0.0;
        for l in 0..filter.len {
            w_sum += ht[l] * v_in[k];
            v_sum += gt[l] * v_in[k];
            k = wrap_back(k, step, n);
        }
        w[t] = w_sum;
        v[t] = v_sum;
    }
    Ok((w, v))
}

/// Inverse MODWT step at `level`; walks the coefficient index forward by
/// `2^(level - 1)`, mirroring the sign convention of the forward transform.
pub fn imodwt(w_in: &[f64], v_in: &[f64], level: usize, filter: &WaveletFilter) -> Result<Vec<f64>> {
    let n = w_in.len();
    if n == 0 || v_in.len() != n {
        return Err(MsWaveletError::InvalidArgument(format!(
            "imodwt inputs must be equal-length and non-empty, got {} and {}",
            w_in.len(),
            v_in.len()
        )));
    }
    let step = level_step(level, n)?;
    let ht: Vec<f64> = filter.h.iter().map(|c| c / std::f64::consts::SQRT_2).collect();
    let gt: Vec<f64> = filter.g.iter().map(|c| c / std::f64::consts::SQRT_2).collect();
    let mut x = vec![0.0; n];
    for t in 0..n {
        let mut k = t;
        let mut sum = 0.0;
        for l in 0..filter.len {
            sum += ht[l] * w_in[k] + gt[l] * v_in[k];
            k = wrap_forward(k, step, n);
        }
        x[t] = sum;
    }
    Ok(x)
}

/// Mirror-extends a signal to length `2 * N` by appending its reversal.
pub fn reflect_extend(x: &[f64]) -> Vec<f64> {
    let mut extended = Vec::with_capacity(2 * x.len());
    extended.extend_from_slice(x);
    extended.extend(x.iter().rev());
    extended
}

/// Multi-level decomposition driver: applies one transform step per level,
/// feeding each step's smooth output into the next.
///
/// For the DWT the working length halves each level and the input length
/// must be a power of two with at least `2^levels` samples; the MODWT has
/// no length restriction. Under `Reflection` the input is mirror-extended
/// to `2 * N` before the first level. `boundary = None` means periodic.
///
/// # Example
///
/// ```rust
/// # use mswavelet::wavelet::filter::WaveletFilter;
/// # use mswavelet::wavelet::transform::{decompose, TransformMethod};
/// let filter = WaveletFilter::lookup("haar").unwrap();
/// let x = vec![1.0, 3.0, 5.0, 7.0, 9.0, 7.0, 5.0, 3.0];
/// let decomp = decompose(&x, 2, &filter, TransformMethod::Dwt, None).unwrap();
/// assert_eq!(decomp.detail(1).len(), 4);
/// assert_eq!(decomp.detail(2).len(), 2);
/// assert_eq!(decomp.smooth().len(), 2);
/// ```
pub fn decompose(
    x: &[f64],
    levels: usize,
    filter: &WaveletFilter,
    method: TransformMethod,
    boundary: Option<Boundary>,
) -> Result<Decomposition> {
    if x.is_empty() {
        return Err(MsWaveletError::InvalidArgument(
            "cannot decompose an empty signal".to_string(),
        ));
    }
    if levels == 0 || levels > 63 {
        return Err(MsWaveletError::InvalidArgument(format!(
            "decomposition depth must be in 1..=63, got {}",
            levels
        )));
    }
    let boundary = boundary.unwrap_or(Boundary::Periodic);
    if method == TransformMethod::Dwt {
        if !x.len().is_power_of_two() {
            return Err(MsWaveletError::InvalidArgument(format!(
                "dwt requires a power-of-two signal length, got {}",
                x.len()
            )));
        }
        let working_len = match boundary {
            Boundary::Periodic => x.len(),
            Boundary::Reflection => 2 * x.len(),
        };
        if working_len >> levels == 0 {
            return Err(MsWaveletError::InvalidArgument(format!(
                "signal of length {} cannot support {} dwt levels",
                x.len(),
                levels
            )));
        }
    }

    let mut working = match boundary {
        Boundary::Periodic => x.to_vec(),
        Boundary::Reflection => reflect_extend(x),
    };

    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(levels + 1);
    for level in 1..=levels {
        let (w, v) = match method {
            TransformMethod::Dwt => dwt(&working, filter)?,
            TransformMethod::Modwt => modwt(&working, level, filter)?,
        };
        rows.push(w);
        working = v;
    }
    rows.push(working);

    Ok(Decomposition { rows, n: x.len(), levels, method, boundary })
}

/// Reconstructs each level's contribution to the original signal domain.
///
/// Row `k` of the result is the detail at scale `k + 1` inverse-transformed
/// down through all remaining levels against all-zero smooths; the final
/// row is the overall smooth contribution. Summing all rows reproduces the
/// decomposed signal within floating-point error (restricted to the first
/// `n` samples when reflection was used).
pub fn multiresolution(decomp: &Decomposition, filter: &WaveletFilter) -> Result<Decomposition> {
    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(decomp.levels + 1);

    for level in 1..=decomp.levels {
        let w = decomp.detail(level);
        let zero_smooth = vec![0.0; w.len()];
        let mut x = match decomp.method {
            TransformMethod::Dwt => idwt(w, &zero_smooth, filter)?,
            TransformMethod::Modwt => imodwt(w, &zero_smooth, level, filter)?,
        };
        for lower in (1..level).rev() {
            let zero_detail = vec![0.0; x.len()];
            x = match decomp.method {
                TransformMethod::Dwt => idwt(&zero_detail, &x, filter)?,
                TransformMethod::Modwt => imodwt(&zero_detail, &x, lower, filter)?,
            };
        }
        rows.push(x);
    }

    let mut smooth = decomp.smooth().to_vec();
    for lower in (1..=decomp.levels).rev() {
        let zero_detail = vec![0.0; smooth.len()];
        smooth = match decomp.method {
            TransformMethod::Dwt => idwt(&zero_detail, &smooth, filter)?,
            TransformMethod::Modwt => imodwt(&zero_detail, &smooth, lower, filter)?,
        };
    }
    rows.push(smooth);

    Ok(Decomposition {
        rows,
        n: decomp.n,
        levels: decomp.levels,
        method: decomp.method,
        boundary: decomp.boundary,
    })
}
