use thiserror::Error;

/// Errors produced by the wavelet engine and the feature pipeline.
///
/// All operations in this crate are deterministic pure functions of their
/// inputs, so none of these conditions is ever retried internally.
#[derive(Debug, Error)]
pub enum MsWaveletError {
    /// An unknown wavelet family name was passed to the filter bank.
    #[error("unsupported wavelet filter: {0}")]
    UnsupportedFilter(String),

    /// Structurally invalid input: mismatched array lengths, unknown
    /// method/boundary strings, non-dyadic signal length for the DWT.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No usable lock-mass feature was found in any calibration scan.
    /// The uncorrected feature set remains valid when this is raised.
    #[error("no lockmass features found")]
    NoCalibrationData,
}

pub type Result<T> = std::result::Result<T, MsWaveletError>;
