//! Column gutter detector (§4.6).
//!
//! Builds a Gaussian-smoothed horizontal projection of glyph-box coverage and searches the
//! central band of the page for a valley deep and wide enough, with balanced density on both
//! sides, to be trusted as a two-column separator. Deliberately conservative per §4.6: a false
//! acceptance on a single-column page is worse than a missed detection on a two-column page.

use crate::config::Config;
use crate::types::Rect;

/// Builds a per-pixel-column coverage histogram: for each X, the number of glyph boxes whose
/// horizontal span includes it.
fn horizontal_coverage(glyph_boxes: &[Rect], page_width: usize) -> Vec<f64> {
    let mut coverage = vec![0.0f64; page_width];
    for b in glyph_boxes {
        let x1 = b.x1.max(0) as usize;
        let x2 = (b.x2.max(0) as usize).min(page_width.saturating_sub(1));
        for x in x1..=x2.min(page_width.saturating_sub(1)) {
            coverage[x] += 1.0;
        }
    }
    coverage
}

/// Applies a 1-D Gaussian blur to `values`, truncating the kernel at 3 sigma.
fn gaussian_smooth(values: &[f64], sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 || values.is_empty() {
        return values.to_vec();
    }
    let radius = (3.0 * sigma).ceil() as isize;
    let mut kernel = Vec::with_capacity((2 * radius + 1) as usize);
    let mut kernel_sum = 0.0;
    for i in -radius..=radius {
        let w = (-((i * i) as f64) / (2.0 * sigma * sigma)).exp();
        kernel.push(w);
        kernel_sum += w;
    }
    let n = values.len() as isize;
    let mut out = vec![0.0; values.len()];
    for (x, slot) in out.iter_mut().enumerate() {
        let mut acc = 0.0;
        for (k, &w) in kernel.iter().enumerate() {
            let offset = k as isize - radius;
            let src = x as isize + offset;
            if src >= 0 && src < n {
                acc += values[src as usize] * w;
            }
        }
        *slot = acc / kernel_sum;
    }
    out
}

/// Attempts to find a page-wide column gutter among `glyph_boxes`. Returns the gutter's centre X
/// coordinate if one satisfies all three acceptance criteria in §4.6.
pub fn detect_gutter(glyph_boxes: &[Rect], page_width: i32, config: &Config) -> Option<i32> {
    if glyph_boxes.is_empty() || page_width <= 0 {
        return None;
    }
    let width = page_width as usize;
    let coverage = horizontal_coverage(glyph_boxes, width);
    let smoothed = gaussian_smooth(&coverage, config.gutter_smoothing_sigma);

    let mean_height = smoothed.iter().sum::<f64>() / smoothed.len() as f64;
    if mean_height <= 0.0 {
        return None;
    }

    let (band_lo_frac, band_hi_frac) = config.gutter_search_band;
    let band_lo = ((band_lo_frac * width as f64).floor() as usize).min(width.saturating_sub(1));
    let band_hi = ((band_hi_frac * width as f64).ceil() as usize).min(width.saturating_sub(1));
    if band_lo >= band_hi {
        return None;
    }

    let (min_idx, min_val) = (band_lo..=band_hi)
        .map(|x| (x, smoothed[x]))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())?;

    if min_val > mean_height * config.gutter_max_relative_depth {
        return None; // valley is not deep enough
    }

    // Near-minimum tolerance band used to measure valley width.
    let tolerance = min_val + (mean_height - min_val) * 0.25;
    let mut left = min_idx;
    while left > 0 && smoothed[left - 1] <= tolerance {
        left -= 1;
    }
    let mut right = min_idx;
    while right + 1 < smoothed.len() && smoothed[right + 1] <= tolerance {
        right += 1;
    }
    let valley_width = (right - left + 1) as i32;
    if valley_width < config.gutter_min_valley_width {
        return None;
    }

    let gutter_centre = ((left + right) / 2) as i32;

    let left_sum: f64 = coverage[..gutter_centre.max(0) as usize].iter().sum();
    let right_sum: f64 = coverage[gutter_centre.max(0) as usize..].iter().sum();
    if left_sum <= 0.0 || right_sum <= 0.0 {
        return None;
    }
    let balance = left_sum.min(right_sum) / left_sum.max(right_sum);
    if balance < config.gutter_min_density_balance {
        return None;
    }

    Some(gutter_centre)
}
