//! Benchmark for feature extraction and reconstruction
//!
//! Times the forward and inverse passes of an STFT followed by each spectral
//! representation over a range of clip lengths.

use audio_transforms::{
    AudioTransform, ComposedTransform, IfMethod, NormalizationMode, SpectralRepresentation, Stft,
    StftConfig, TransformData,
};
use ndarray::Array1;
use std::time::Instant;

const HOP_LENGTH: usize = 512;

/// Generate sine wave test data, trimmed to whole hops so the centred
/// inverse returns every sample
fn generate_test_audio(duration_seconds: f64, sample_rate: usize) -> TransformData {
    let num_samples = (duration_seconds * sample_rate as f64) as usize / HOP_LENGTH * HOP_LENGTH;
    let frequency = 440.0; // A4

    TransformData::from(Array1::from_iter((0..num_samples).map(|i| {
        let t = i as f64 / sample_rate as f64;
        (2.0 * std::f64::consts::PI * frequency * t).sin() * 0.5
    })))
}

fn pipelines() -> Vec<(&'static str, ComposedTransform)> {
    let stft = || Stft::new(StftConfig::new().with_sizes(2048, HOP_LENGTH)).expect("valid STFT config");
    let polar_if = |method| {
        SpectralRepresentation::polar_if(
            NormalizationMode::Unipolar,
            NormalizationMode::Gaussian,
            Some(-2),
        )
        .with_if_method(method)
        .expect("PolarIF has an IF channel")
    };
    vec![
        (
            "Cartesian",
            stft()
                + SpectralRepresentation::cartesian(
                    NormalizationMode::Bipolar,
                    NormalizationMode::Bipolar,
                    Some(-2),
                ),
        ),
        (
            "Polar",
            stft()
                + SpectralRepresentation::polar(
                    NormalizationMode::Unipolar,
                    NormalizationMode::Gaussian,
                    Some(-2),
                ),
        ),
        ("PolarIF (forward)", stft() + polar_if(IfMethod::Forward)),
        ("PolarIF (central)", stft() + polar_if(IfMethod::Central)),
    ]
}

/// Mean and spread of `runs` timings of `f`, in milliseconds.
fn time_ms<F: FnMut()>(runs: usize, mut f: F) -> (f64, f64) {
    // Warm up
    for _ in 0..2 {
        f();
    }
    let times: Vec<f64> = (0..runs)
        .map(|_| {
            let start = Instant::now();
            f();
            start.elapsed().as_secs_f64() * 1000.0
        })
        .collect();
    let mean = times.iter().sum::<f64>() / times.len() as f64;
    let std = (times.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / times.len() as f64).sqrt();
    (mean, std)
}

fn benchmark_pipeline(label: &str, mut pipeline: ComposedTransform, audio: &TransformData) {
    pipeline.scale_data(audio).expect("fitting failed");
    let features = pipeline.forward(audio).expect("forward pass failed");

    let (forward_mean, forward_std) = time_ms(10, || {
        assert!(pipeline.forward(audio).is_ok(), "forward pass failed");
    });
    let (invert_mean, invert_std) = time_ms(10, || {
        assert!(pipeline.invert(&features).is_ok(), "inverse pass failed");
    });
    let error = pipeline
        .invert(&features)
        .ok()
        .and_then(|rebuilt| rebuilt.max_abs_difference(audio))
        .unwrap_or(f64::NAN);

    println!(
        "  {label:<20} forward {forward_mean:>8.2}ms ± {forward_std:.2}ms   invert {invert_mean:>8.2}ms ± {invert_std:.2}ms   max error {error:.2e}"
    );
}

fn main() {
    println!("Audio Transforms Round-Trip Benchmark");
    println!("=====================================");
    println!(
        "Parallel list helpers: {}",
        if cfg!(feature = "parallel-processing") { "enabled" } else { "disabled" }
    );
    println!();

    let sample_rate = 44100;
    for duration in [0.5, 2.0, 10.0] {
        let audio = generate_test_audio(duration, sample_rate);
        println!("{duration:.1}s audio, {} samples", audio.shape()[0]);
        for (label, pipeline) in pipelines() {
            benchmark_pipeline(label, pipeline, &audio);
        }
        println!();
    }
}
