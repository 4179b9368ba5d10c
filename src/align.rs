//! SPU-to-frame vertical alignment (§4.8).
//!
//! Corrects a systematic vertical offset between SPU display-rectangle coordinates and the
//! rendered frame's coordinate system, using OCR-reported text-line boxes as ground truth.

use crate::config::Config;
use crate::error::Result;
use crate::types::Rect;
use std::path::Path;

/// External capability: OCRs a rendered frame, returning recognized text plus per-line bounding
/// boxes in the frame's coordinate system (§6).
pub trait OcrCapability {
    fn recognize(&self, menu_id: &str, image_path: &Path) -> Result<OcrResult>;
}

#[derive(Debug, Clone)]
pub struct OcrResult {
    pub text: String,
    pub line_boxes: Vec<Rect>,
}

fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Computes the page's vertical shift, if one can be trusted, per §4.8's three-part test: enough
/// pairs, sufficient overlap to count a pair, and plausible shift magnitude.
pub fn compute_page_shift(spu_rects: &[Rect], ocr_lines: &[Rect], frame_height: i32, config: &Config) -> Option<i32> {
    if ocr_lines.is_empty() {
        return None;
    }

    let mut deltas = Vec::new();
    for r in spu_rects {
        let best = ocr_lines
            .iter()
            .map(|l| (l, r.horizontal_overlap(l)))
            .max_by_key(|(_, overlap)| *overlap);
        if let Some((line, overlap)) = best {
            if overlap as f64 >= r.width() as f64 * config.align_min_overlap_fraction {
                deltas.push(line.y_centre() - r.y_centre());
            }
        }
    }

    if deltas.len() < config.align_min_pairs {
        return None;
    }

    let shift = median(deltas);
    if shift.abs() > frame_height as f64 * config.align_max_shift_fraction {
        return None;
    }
    Some(shift.round() as i32)
}

/// Applies a previously computed shift to every rectangle on a page.
pub fn apply_shift(rects: &[Rect], shift: i32) -> Vec<Rect> {
    rects.iter().map(|r| r.shifted_y(shift)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_is_applied_when_pairs_and_plausibility_hold() {
        let config = Config::default();
        let spu_rects = vec![
            Rect::new(100, 176, 200, 196),
            Rect::new(100, 276, 200, 296),
            Rect::new(100, 376, 200, 396),
        ];
        // Each matching OCR line is +20px lower.
        let ocr_lines: Vec<Rect> = spu_rects.iter().map(|r| r.shifted_y(20)).collect();
        let shift = compute_page_shift(&spu_rects, &ocr_lines, 576, &config);
        assert_eq!(shift, Some(20));

        let shifted = apply_shift(&spu_rects, shift.unwrap());
        assert_eq!(shifted[0].y1, 196);
    }

    #[test]
    fn too_few_pairs_skips_alignment() {
        let config = Config::default();
        let spu_rects = vec![Rect::new(100, 176, 200, 196), Rect::new(100, 276, 200, 296)];
        let ocr_lines: Vec<Rect> = spu_rects.iter().map(|r| r.shifted_y(20)).collect();
        assert_eq!(compute_page_shift(&spu_rects, &ocr_lines, 576, &config), None);
    }

    #[test]
    fn implausible_shift_is_rejected() {
        let config = Config::default();
        let spu_rects = vec![
            Rect::new(100, 10, 200, 30),
            Rect::new(100, 60, 200, 80),
            Rect::new(100, 110, 200, 130),
        ];
        // A shift of 400px on a 576px frame (~70%) exceeds the 20% plausibility bound.
        let ocr_lines: Vec<Rect> = spu_rects.iter().map(|r| r.shifted_y(400)).collect();
        assert_eq!(compute_page_shift(&spu_rects, &ocr_lines, 576, &config), None);
    }

    #[test]
    fn no_ocr_lines_yields_no_shift() {
        let config = Config::default();
        let spu_rects = vec![Rect::new(100, 176, 200, 196)];
        assert_eq!(compute_page_shift(&spu_rects, &[], 576, &config), None);
    }
}
