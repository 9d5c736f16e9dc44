// data module
pub mod data {
    pub mod spectrum;
    pub mod feature;
}

// wavelet module
pub mod wavelet {
    pub mod filter;
    pub mod transform;
    pub mod threshold;
}

// algorithm module
pub mod algorithm {
    pub mod extraction;
    pub mod lockmass;
}

pub mod error;
