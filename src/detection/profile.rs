use image::{GrayImage, Luma};
use imageproc::gradients::vertical_sobel;

use crate::models::{Peak, Profile};
use crate::params::{BandConfig, PeakParams};

/// Intermediate profiles and retained peaks of one peak-detection pass.
#[derive(Debug)]
pub struct ProfileStages {
    /// Band-averaged intensity per row, before inversion.
    pub raw: Profile,
    /// The profile the peak search ran over.
    pub search: Profile,
    pub peaks: Vec<Peak>,
}

/// Absolute vertical-derivative magnitude, emphasising the boundaries of
/// horizontal bands over flat textured regions.
pub fn vertical_gradient(gray: &GrayImage) -> GrayImage {
    let grad = vertical_sobel(gray);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        Luma([grad.get_pixel(x, y)[0].unsigned_abs().min(255) as u8])
    })
}

/// Average one or two narrow column bands into a per-row intensity profile.
/// Bands sit on the image midline, or straddle it by `offset` when two are
/// requested to avoid a central illumination hot-spot. Band extents are
/// clamped to the image like any other geometry.
pub fn band_profile(gray: &GrayImage, bands: &BandConfig) -> Profile {
    let (w, _) = gray.dimensions();
    if w == 0 {
        return Profile { samples: Vec::new() };
    }
    let center = w / 2;
    let samples = if bands.count == 2 {
        let left = column_band(gray, center.saturating_sub(bands.offset), bands.width);
        let right = column_band(gray, (center + bands.offset).min(w - 1), bands.width);
        left.iter().zip(&right).map(|(a, b)| (a + b) / 2.0).collect()
    } else {
        column_band(gray, center, bands.width)
    };
    Profile { samples }
}

/// Mean intensity per row over a band of columns centered on `center`.
fn column_band(gray: &GrayImage, center: u32, width: u32) -> Vec<f32> {
    let (w, h) = gray.dimensions();
    let half = width / 2;
    let x1 = (center + half + 1).min(w);
    let x0 = center.saturating_sub(half).min(x1 - 1);
    let columns = (x1 - x0) as f32;
    (0..h)
        .map(|y| {
            let sum: u32 = (x0..x1).map(|x| gray.get_pixel(x, y)[0] as u32).sum();
            sum as f32 / columns
        })
        .collect()
}

/// Build the search profile and find the retained peaks.
///
/// Intensity profiles are inverted so dark shadow bands become maxima; a
/// gradient profile already peaks at band boundaries and is searched as-is.
pub fn detect(gray: &GrayImage, params: &PeakParams) -> ProfileStages {
    let raw = band_profile(gray, &params.bands);
    let search = if params.gradient {
        band_profile(&vertical_gradient(gray), &params.bands)
    } else {
        raw.inverted()
    };
    let peaks = find_peaks(&search, params);
    ProfileStages { raw, search, peaks }
}

/// Local maxima satisfying all three rejection criteria: minimum separation,
/// minimum prominence, and minimum width at half prominence.
pub fn find_peaks(profile: &Profile, params: &PeakParams) -> Vec<Peak> {
    let v = &profile.samples;
    let mut candidates = Vec::new();
    for (index, value) in local_maxima(v) {
        let (prominence, left_base, right_base) = prominence_at(v, index);
        if prominence < params.min_prominence {
            continue;
        }
        let width = width_at_half_prominence(v, index, prominence, left_base, right_base);
        if width < params.min_width {
            continue;
        }
        candidates.push(Peak { index, value, prominence, width });
    }
    suppress_by_distance(candidates, params.min_distance)
}

/// Strict local maxima; a flat summit reports its middle sample.
fn local_maxima(v: &[f32]) -> Vec<(usize, f32)> {
    let n = v.len();
    let mut out = Vec::new();
    let mut i = 1;
    while n >= 3 && i < n - 1 {
        if v[i] > v[i - 1] {
            let start = i;
            let mut end = i;
            while end + 1 < n && v[end + 1] == v[start] {
                end += 1;
            }
            if end + 1 < n && v[end + 1] < v[start] {
                out.push(((start + end) / 2, v[start]));
            }
            i = end + 1;
        } else {
            i += 1;
        }
    }
    out
}

/// Prominence of the peak at `index` and its base interval: walk each way to
/// the previous strictly-higher sample (or the boundary); the lowest point
/// passed on the way is that side's base.
fn prominence_at(v: &[f32], index: usize) -> (f32, usize, usize) {
    let height = v[index];

    let mut left_base = index;
    let mut left_min = height;
    let mut i = index;
    while i > 0 {
        i -= 1;
        if v[i] > height {
            break;
        }
        if v[i] < left_min {
            left_min = v[i];
            left_base = i;
        }
    }

    let mut right_base = index;
    let mut right_min = height;
    let mut i = index;
    while i + 1 < v.len() {
        i += 1;
        if v[i] > height {
            break;
        }
        if v[i] < right_min {
            right_min = v[i];
            right_base = i;
        }
    }

    (height - left_min.max(right_min), left_base, right_base)
}

/// Horizontal extent of the peak where the profile crosses half prominence,
/// with linear interpolation between samples.
fn width_at_half_prominence(
    v: &[f32],
    index: usize,
    prominence: f32,
    left_base: usize,
    right_base: usize,
) -> f32 {
    let level = v[index] - 0.5 * prominence;

    let mut i = index;
    while i > left_base && v[i] > level {
        i -= 1;
    }
    let left_ip = if v[i] < level {
        i as f32 + (level - v[i]) / (v[i + 1] - v[i])
    } else {
        i as f32
    };

    let mut j = index;
    while j < right_base && v[j] > level {
        j += 1;
    }
    let right_ip = if v[j] < level {
        j as f32 - (level - v[j]) / (v[j - 1] - v[j])
    } else {
        j as f32
    };

    right_ip - left_ip
}

/// Greedy suppression in descending prominence order: a candidate closer
/// than `distance` to any already-kept peak is dropped.
fn suppress_by_distance(mut candidates: Vec<Peak>, distance: usize) -> Vec<Peak> {
    candidates.sort_by(|a, b| b.prominence.total_cmp(&a.prominence));
    let mut kept: Vec<Peak> = Vec::new();
    for peak in candidates {
        if kept.iter().all(|k| peak.index.abs_diff(k.index) >= distance) {
            kept.push(peak);
        }
    }
    kept.sort_by_key(|p| p.index);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(distance: usize, prominence: f32, width: f32) -> PeakParams {
        PeakParams {
            gradient: false,
            bands: BandConfig { count: 1, width: 1, offset: 0 },
            min_distance: distance,
            min_prominence: prominence,
            min_width: width,
        }
    }

    #[test]
    fn isolated_spike_is_found() {
        let profile = Profile { samples: vec![10.0, 10.0, 80.0, 10.0, 10.0] };
        let peaks = find_peaks(&profile, &params(1, 5.0, 0.0));
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 2);
        assert_eq!(peaks[0].prominence, 70.0);
    }

    #[test]
    fn flat_summit_reports_middle_sample() {
        let profile = Profile {
            samples: vec![0.0, 50.0, 50.0, 50.0, 0.0],
        };
        let peaks = find_peaks(&profile, &params(1, 5.0, 0.0));
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 2);
    }

    #[test]
    fn monotone_profile_has_no_peaks() {
        let profile = Profile { samples: (0..20).map(|i| i as f32).collect() };
        assert!(find_peaks(&profile, &params(1, 0.1, 0.0)).is_empty());
    }

    #[test]
    fn prominence_measured_against_higher_terrain() {
        // small bump beside a taller peak: its prominence is only its own dip
        let profile = Profile {
            samples: vec![0.0, 100.0, 40.0, 60.0, 0.0],
        };
        let peaks = find_peaks(&profile, &params(1, 1.0, 0.0));
        assert_eq!(peaks.len(), 2);
        assert_eq!(peaks[0].prominence, 100.0);
        assert_eq!(peaks[1].prominence, 20.0);
    }

    #[test]
    fn distance_suppression_prefers_greater_prominence() {
        let profile = Profile {
            samples: vec![0.0, 60.0, 30.0, 90.0, 0.0],
        };
        let peaks = find_peaks(&profile, &params(4, 5.0, 0.0));
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 3);
    }

    #[test]
    fn width_gate_drops_narrow_spikes() {
        let narrow = Profile { samples: vec![0.0, 0.0, 100.0, 0.0, 0.0] };
        assert!(find_peaks(&narrow, &params(1, 5.0, 3.0)).is_empty());
        let wide = Profile {
            samples: vec![0.0, 90.0, 100.0, 100.0, 100.0, 90.0, 0.0],
        };
        assert_eq!(find_peaks(&wide, &params(1, 5.0, 3.0)).len(), 1);
    }

    #[test]
    fn band_profile_averages_the_requested_columns() {
        // left half black, right half white; a centered 3-wide band on a
        // 6-wide image covers columns 2..=4
        let gray = GrayImage::from_fn(6, 2, |x, _| Luma([if x >= 3 { 255 } else { 0 }]));
        let profile = band_profile(&gray, &BandConfig { count: 1, width: 3, offset: 0 });
        assert_eq!(profile.samples, vec![170.0, 170.0]);
    }

    #[test]
    fn two_band_profile_averages_both_bands() {
        // bands at columns 2 and 8 of a 11-wide image
        let gray = GrayImage::from_fn(11, 3, |x, _| Luma([if x < 5 { 40 } else { 80 }]));
        let profile = band_profile(&gray, &BandConfig { count: 2, width: 1, offset: 3 });
        assert_eq!(profile.samples, vec![60.0, 60.0, 60.0]);
    }

    #[test]
    fn gradient_profile_peaks_at_band_boundaries() {
        let gray = GrayImage::from_fn(20, 40, |_, y| {
            Luma([if (18..=22).contains(&y) { 100 } else { 200 }])
        });
        let p = PeakParams {
            gradient: true,
            bands: BandConfig { count: 1, width: 5, offset: 0 },
            min_distance: 2,
            min_prominence: 50.0,
            min_width: 0.0,
        };
        let stages = detect(&gray, &p);
        assert_eq!(stages.peaks.len(), 2);
        assert!(stages.peaks[0].index.abs_diff(18) <= 1);
        assert!(stages.peaks[1].index.abs_diff(22) <= 1);
    }
}
