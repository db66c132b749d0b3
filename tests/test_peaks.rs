mod common;

use common::fixtures::{banded_image, flat_image};
use stacktally::{BandConfig, DetectionParams, DetectorConfig, Features, PeakParams};

const BAND_CENTERS: [u32; 5] = [50, 100, 150, 200, 250];

fn peak_params(distance: usize, prominence: f32, width: f32, bands: BandConfig) -> DetectionParams {
    DetectionParams {
        roi: None,
        normalize: stacktally::NormalizeConfig::default(),
        detector: DetectorConfig::Peaks(PeakParams {
            gradient: false,
            bands,
            min_distance: distance,
            min_prominence: prominence,
            min_width: width,
        }),
    }
}

fn one_band() -> BandConfig {
    BandConfig { count: 1, width: 21, offset: 0 }
}

#[test]
fn five_even_bands_give_five_peaks_at_known_rows() {
    // 100x300 canvas, background 200, five bands of depth 50, separation 20,
    // prominence 10
    let img = banded_image(100, 300, &BAND_CENTERS, 4, 200, 50);
    let result = stacktally::detect(&img, &peak_params(20, 10.0, 0.0, one_band())).unwrap();
    assert_eq!(result.count, 5);

    let Features::Peaks { peaks, raw, search } = &result.features else {
        panic!("peak mode must report peaks");
    };
    for (peak, center) in peaks.iter().zip(BAND_CENTERS) {
        assert!(
            peak.index.abs_diff(center as usize) <= 1,
            "peak at {} expected near {center}",
            peak.index
        );
    }
    // profiles cover every row and are exposed for charting
    assert_eq!(raw.len(), 300);
    assert_eq!(search.len(), 300);
    assert!((raw.samples[150] - 150.0).abs() < 1.0);
    assert!((search.samples[150] - 105.0).abs() < 1.0);
}

#[test]
fn raising_prominence_never_raises_the_count() {
    let img = banded_image(100, 300, &BAND_CENTERS, 4, 200, 50);
    let mut last = u32::MAX;
    for prominence in [10.0, 30.0, 49.0, 60.0] {
        let count = stacktally::detect(&img, &peak_params(20, prominence, 0.0, one_band()))
            .unwrap()
            .count;
        assert!(count <= last, "count grew from {last} to {count}");
        last = count;
    }
    // bands are only 50 deep, nothing survives a 60 prominence gate
    assert_eq!(last, 0);
}

#[test]
fn raising_distance_never_raises_the_count() {
    let img = banded_image(100, 300, &BAND_CENTERS, 4, 200, 50);
    let counts: Vec<u32> = [20usize, 60, 120, 300]
        .iter()
        .map(|&d| {
            stacktally::detect(&img, &peak_params(d, 10.0, 0.0, one_band()))
                .unwrap()
                .count
        })
        .collect();
    assert_eq!(counts[0], 5);
    // 50-row spacing under a 60-row gate keeps every other band
    assert_eq!(counts[1], 3);
    assert!(counts.windows(2).all(|w| w[1] <= w[0]));
}

#[test]
fn width_gate_drops_thin_bands() {
    let img = banded_image(100, 300, &BAND_CENTERS, 4, 200, 50);
    let result = stacktally::detect(&img, &peak_params(20, 10.0, 20.0, one_band())).unwrap();
    assert_eq!(result.count, 0);
}

#[test]
fn two_band_sampling_matches_single_band_on_uniform_bands() {
    // bands span the full width, so off-center sampling sees the same profile
    let img = banded_image(100, 300, &BAND_CENTERS, 4, 200, 50);
    let two = BandConfig { count: 2, width: 11, offset: 30 };
    let result = stacktally::detect(&img, &peak_params(20, 10.0, 0.0, two)).unwrap();
    assert_eq!(result.count, 5);
}

#[test]
fn featureless_image_counts_zero_bands() {
    let img = flat_image(100, 300, 200);
    let result = stacktally::detect(&img, &peak_params(20, 10.0, 0.0, one_band())).unwrap();
    assert_eq!(result.count, 0);
    assert!(!result.found);
}

#[test]
fn peak_annotation_preserves_dimensions() {
    let img = banded_image(100, 300, &BAND_CENTERS, 4, 200, 50);
    let result = stacktally::detect(&img, &peak_params(20, 10.0, 0.0, one_band())).unwrap();
    assert_eq!(result.annotated.dimensions(), (100, 300));
}
