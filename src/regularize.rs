//! Geometric regularizer (§4.9).
//!
//! Reconciles a page's rectangle count with its `expected_button_count` using Tukey-fence (IQR)
//! outlier rules, then normalizes inlier heights. Every step preserves the rectangles' original
//! relative order so the result stays a stable, idempotent function of its input (§8).

use crate::config::Config;
use crate::types::Rect;

fn percentile(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let idx = p * (n as f64 - 1.0);
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = idx - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

struct Fence {
    low: f64,
    high: f64,
}

fn tukey_fence(values: &[f64], multiplier: f64) -> Fence {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;
    Fence {
        low: q1 - multiplier * iqr,
        high: q3 + multiplier * iqr,
    }
}

/// Reconciles `rects` with `expected_button_count` and normalizes inlier heights (§4.9).
pub fn regularize(rects: &[Rect], expected_button_count: usize, config: &Config) -> Vec<Rect> {
    let mut kept: Vec<Rect> = rects.to_vec();

    // Low-size-outlier filter: both width and height must be low outliers.
    if kept.len() > expected_button_count {
        let widths: Vec<f64> = kept.iter().map(|r| r.width() as f64).collect();
        let heights: Vec<f64> = kept.iter().map(|r| r.height() as f64).collect();
        let wf = tukey_fence(&widths, config.iqr_multiplier);
        let hf = tukey_fence(&heights, config.iqr_multiplier);
        let filtered: Vec<Rect> = kept
            .iter()
            .copied()
            .filter(|r| !((r.width() as f64) < wf.low && (r.height() as f64) < hf.low))
            .collect();
        if filtered.len() >= 1 {
            kept = filtered;
        }
    }

    // Low-height-outlier filter: drop while remaining count stays >= expected.
    if kept.len() > expected_button_count {
        let heights: Vec<f64> = kept.iter().map(|r| r.height() as f64).collect();
        let hf = tukey_fence(&heights, config.iqr_multiplier);
        let mut candidate = kept.clone();
        let without_low: Vec<Rect> = kept
            .iter()
            .copied()
            .filter(|r| (r.height() as f64) >= hf.low)
            .collect();
        if without_low.len() >= expected_button_count {
            candidate = without_low;
        }
        kept = candidate;
    }

    // Width ranking: keep the `expected` widest, preserving original relative order.
    if kept.len() > expected_button_count && expected_button_count > 0 {
        let mut indexed: Vec<(usize, Rect)> = kept.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.width().cmp(&a.1.width()));
        indexed.truncate(expected_button_count);
        indexed.sort_by_key(|(i, _)| *i);
        kept = indexed.into_iter().map(|(_, r)| r).collect();
    }

    // Height normalization: resize inliers to the median inlier height, keep Y-centre.
    if !kept.is_empty() {
        let heights: Vec<f64> = kept.iter().map(|r| r.height() as f64).collect();
        let hf = tukey_fence(&heights, config.iqr_multiplier);
        let mut inlier_heights: Vec<f64> = heights
            .iter()
            .copied()
            .filter(|&h| h >= hf.low && h <= hf.high)
            .collect();
        if !inlier_heights.is_empty() {
            inlier_heights.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let new_height = percentile(&inlier_heights, 0.5).round() as i32;
            kept = kept
                .iter()
                .map(|r| {
                    let h = r.height() as f64;
                    if h >= hf.low && h <= hf.high && new_height > 0 {
                        let centre = r.y_centre();
                        let y1 = (centre - (new_height as f64 - 1.0) / 2.0).round() as i32;
                        Rect::new(r.x1, y1, r.x2, y1 + new_height - 1)
                    } else {
                        *r
                    }
                })
                .collect();
        }
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_ranking_keeps_expected_widest_in_original_order() {
        let config = Config::default();
        let rects = vec![
            Rect::new(0, 0, 99, 20),  // width 100
            Rect::new(0, 30, 49, 50), // width 50
            Rect::new(0, 60, 89, 80), // width 90
        ];
        let out = regularize(&rects, 2, &config);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], rects[0]);
        assert_eq!(out[1], rects[2]);
    }

    #[test]
    fn regularizing_twice_is_idempotent() {
        let config = Config::default();
        let rects = vec![
            Rect::new(0, 0, 99, 20),
            Rect::new(0, 30, 98, 49),
            Rect::new(0, 60, 97, 78),
            Rect::new(0, 90, 96, 108),
        ];
        let once = regularize(&rects, 4, &config);
        let twice = regularize(&once, 4, &config);
        assert_eq!(once, twice);
    }

    #[test]
    fn height_normalization_preserves_y_centre() {
        let config = Config::default();
        let rects = vec![
            Rect::new(0, 0, 50, 20),
            Rect::new(0, 30, 50, 48),
            Rect::new(0, 60, 50, 78),
        ];
        let out = regularize(&rects, 3, &config);
        for (r, o) in rects.iter().zip(out.iter()) {
            assert!((r.y_centre() - o.y_centre()).abs() < 1.0);
        }
    }
}
