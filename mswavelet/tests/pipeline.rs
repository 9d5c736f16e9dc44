use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use mswavelet::algorithm::extraction::{extract_features_batch, ExtractionConfig};
use mswavelet::algorithm::lockmass::{correct_features, find_lockmass_observation, LockmassConfig};
use mswavelet::data::feature::MASS_NEUTRON;
use mswavelet::data::spectrum::{FeatureSink, ProfileSpectrum, Scan, VecSink};
use mswavelet::wavelet::filter::WaveletFilter;
use mswavelet::wavelet::transform::{
    decompose, dwt, idwt, multiresolution, Boundary, TransformMethod,
};

fn gaussian_bump(x: f64, center: f64, sigma: f64, amplitude: f64) -> f64 {
    let z = (x - center) / sigma;
    amplitude * (-0.5 * z * z).exp()
}

// A profile scan with charge-1 isotope pairs at the given monoisotopic
// positions, on top of a flat chemical background.
fn synthetic_scan(mono_peaks: &[(f64, f64)], mz_lo: f64, mz_hi: f64, scan_number: i32) -> Scan {
    let step = 0.005;
    let count = ((mz_hi - mz_lo) / step) as usize + 1;
    let mut mz = Vec::with_capacity(count);
    let mut intensity = Vec::with_capacity(count);
    for i in 0..count {
        let x = mz_lo + i as f64 * step;
        let mut y = 1.0;
        for &(center, amplitude) in mono_peaks {
            y += gaussian_bump(x, center, 0.03, amplitude);
            y += gaussian_bump(x, center + MASS_NEUTRON, 0.03, amplitude * 0.45);
        }
        mz.push(x);
        intensity.push(y);
    }
    Scan::new(
        ProfileSpectrum::new(mz, intensity).unwrap(),
        scan_number as f64 * 3.0,
        scan_number,
    )
}

fn pipeline_config() -> ExtractionConfig {
    ExtractionConfig {
        mz_min: 498.0,
        mz_max: 503.0,
        resolution: 100.0,
        background_window: 120,
        smoothing_factor: 1.5,
        isotope_ppm: 30.0,
        ..ExtractionConfig::default()
    }
}

#[test]
fn scans_to_corrected_features() {
    let lockmass = LockmassConfig {
        lockmass_mz: 785.0,
        lockmass_charge: 1,
        mass_window: 0.2,
        use_ppm: false,
    };
    let extraction = pipeline_config();

    // instrument drifting +0.05 Th across the run
    let calibration_scans = vec![
        synthetic_scan(&[(785.05, 80.0)], 782.0, 788.0, 0),
        synthetic_scan(&[(785.05, 80.0)], 782.0, 788.0, 10),
    ];
    let analyte_scans = vec![synthetic_scan(&[(500.0, 100.0)], 498.0, 503.0, 5)];

    // feature extraction over the analyte scans
    let per_scan = extract_features_batch(&analyte_scans, &extraction).unwrap();
    let features = &per_scan[0];
    let target = features
        .iter()
        .find(|f| f.charge == 1 && (f.mz - 500.0).abs() < 0.1)
        .expect("analyte feature not detected");

    // lock-mass sightings in the calibration scans
    let observations: Vec<_> = calibration_scans
        .iter()
        .map(|scan| find_lockmass_observation(scan, &extraction, &lockmass).unwrap())
        .collect();
    assert!(observations.iter().all(|o| o.is_some()), "missing lockmass observation");
    for observation in observations.iter().flatten() {
        assert!(
            (observation.observed_mz - 785.05).abs() < 0.05,
            "observed lockmass at {}",
            observation.observed_mz
        );
    }

    // correction pushes the drifted m/z back down
    let corrected = correct_features(features, &observations, &lockmass).unwrap();
    let corrected_target = corrected
        .iter()
        .find(|f| f.charge == target.charge && f.scan_first == target.scan_first)
        .unwrap();
    let applied = corrected_target.mz - target.mz;
    assert!(
        (applied + 0.05).abs() < 0.05,
        "expected a correction near -0.05, got {}",
        applied
    );

    // corrected features flow into a sink unchanged
    let mut sink = VecSink::new();
    sink.write_all(&corrected).unwrap();
    assert_eq!(sink.features.len(), corrected.len());
}

#[test]
fn random_signals_round_trip() {
    let mut rng = StdRng::seed_from_u64(42);
    for name in ["haar", "d4", "d6", "d8", "la8"] {
        let filter = WaveletFilter::lookup(name).unwrap();
        let x: Vec<f64> = (0..128).map(|_| rng.gen_range(-10.0..10.0)).collect();
        let (w, v) = dwt(&x, &filter).unwrap();
        let back = idwt(&w, &v, &filter).unwrap();
        for (a, b) in x.iter().zip(back.iter()) {
            assert!((a - b).abs() < 1e-9, "{}: {} vs {}", name, a, b);
        }
    }
}

#[test]
fn random_signals_decompose_additively() {
    let mut rng = StdRng::seed_from_u64(7);
    let filter = WaveletFilter::lookup("la8").unwrap();
    for &(method, boundary, n) in &[
        (TransformMethod::Dwt, Some(Boundary::Reflection), 64usize),
        (TransformMethod::Modwt, None, 100),
        (TransformMethod::Modwt, Some(Boundary::Reflection), 100),
    ] {
        let x: Vec<f64> = (0..n).map(|_| rng.gen_range(-5.0..5.0)).collect();
        let decomp = decompose(&x, 4, &filter, method, boundary).unwrap();
        let mra = multiresolution(&decomp, &filter).unwrap();
        for t in 0..n {
            let sum: f64 = mra.rows.iter().map(|row| row[t]).sum();
            assert!(
                (sum - x[t]).abs() < 1e-8,
                "{:?}/{:?} index {}: {} vs {}",
                method,
                boundary,
                t,
                sum,
                x[t]
            );
        }
    }
}
