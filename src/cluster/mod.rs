//! Clustering selector (§4.5): decides between large-highlight and character-glyph mode for a
//! packet's regions, and produces the final ordered button rectangles for each mode.

pub mod gutter;

use crate::config::Config;
use crate::types::{ConnectedRegion, Rect};

/// Which algorithm produced a packet's button rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterMode {
    LargeHighlight,
    CharacterGlyph,
    /// Neither mode's threshold was met; no buttons found on the SPU path for this packet.
    None,
}

fn is_large(rect: &Rect, config: &Config) -> bool {
    rect.width() >= config.large_component_min_width && rect.height() >= config.large_component_min_height
}

/// Decides the clustering mode for one packet's regions and produces its button rectangles, in
/// the final emission order required by §4.5.
pub fn cluster_regions(regions: &[ConnectedRegion], config: &Config, page_width: i32) -> (ClusterMode, Vec<Rect>) {
    let large_count = regions.iter().filter(|r| is_large(&r.rect, config)).count();
    let small_count = regions
        .iter()
        .filter(|r| {
            r.rect.width() < config.large_component_min_width
                && r.rect.height() < config.large_component_min_height
        })
        .count();

    if large_count >= 1 {
        let buttons = regions
            .iter()
            .filter(|r| is_large(&r.rect, config))
            .map(|r| r.rect)
            .collect();
        return (ClusterMode::LargeHighlight, buttons);
    }

    if small_count > config.character_glyph_min_small_regions {
        let glyph_boxes: Vec<Rect> = regions.iter().map(|r| r.rect).collect();
        let buttons = cluster_character_glyphs(&glyph_boxes, config, page_width);
        return (ClusterMode::CharacterGlyph, buttons);
    }

    (ClusterMode::None, Vec::new())
}

/// Groups glyph boxes into text lines within one partition, sorted top-to-bottom, merging
/// adjacent glyphs on a line whose horizontal gap is within `merge_gap`. `max_x2`, if given, caps
/// the padded box's right edge (used to keep a column group from padding across the gutter).
fn lines_to_button_boxes(mut boxes: Vec<Rect>, config: &Config, max_x2: Option<i32>) -> Vec<Rect> {
    boxes.sort_by(|a, b| a.y_centre().partial_cmp(&b.y_centre()).unwrap());

    let mut lines: Vec<Vec<Rect>> = Vec::new();
    for b in boxes {
        match lines.last_mut() {
            Some(line) if (b.y_centre() - line.last().unwrap().y_centre()).abs() <= config.glyph_line_y_tolerance as f64 => {
                line.push(b);
            }
            _ => lines.push(vec![b]),
        }
    }

    let mut result = Vec::new();
    for mut line in lines {
        line.sort_by_key(|r| r.x1);
        let mut merged: Option<Rect> = None;
        for b in line {
            merged = Some(match merged {
                Some(current) if b.x1 - current.x2 <= config.glyph_merge_gap => Rect::new(
                    current.x1.min(b.x1),
                    current.y1.min(b.y1),
                    current.x2.max(b.x2),
                    current.y2.max(b.y2),
                ),
                Some(current) => {
                    result.push(current);
                    b
                }
                None => b,
            });
        }
        if let Some(last) = merged {
            result.push(last);
        }
    }

    result
        .into_iter()
        .map(|r| {
            let padded_x2 = r.x2 + config.glyph_right_padding;
            let x2 = match max_x2 {
                Some(limit) => padded_x2.min(limit).max(r.x1),
                None => padded_x2,
            };
            Rect::new(r.x1, r.y1, x2, r.y2)
        })
        .filter(|r| r.width() >= config.glyph_box_min_width && r.height() >= config.glyph_box_min_height)
        .collect()
}

/// Character-glyph clustering (§4.5): gutter-aware partition into header/left/right groups,
/// text-line grouping, and glyph merging within each group.
fn cluster_character_glyphs(glyph_boxes: &[Rect], config: &Config, page_width: i32) -> Vec<Rect> {
    let gutter = gutter::detect_gutter(glyph_boxes, page_width, config);

    let Some(gutter_x) = gutter else {
        return lines_to_button_boxes(glyph_boxes.to_vec(), config, None);
    };

    let min_y = glyph_boxes.iter().map(|r| r.y1).min().unwrap_or(0);
    let max_y = glyph_boxes.iter().map(|r| r.y2).max().unwrap_or(0);
    let header_cutoff = min_y as f64 + (max_y - min_y) as f64 * config.header_band_fraction;

    let mut header = Vec::new();
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &b in glyph_boxes {
        if b.y_centre() <= header_cutoff {
            header.push(b);
        } else if b.x_centre() < gutter_x as f64 {
            left.push(b);
        } else {
            right.push(b);
        }
    }

    // The header spans both columns by definition, so its merged box is never clamped to the
    // gutter. The left column's padding grows rightward and must not cross it; the right column's
    // padding grows further rightward still, away from the gutter, so it needs no clamp.
    let mut buttons = lines_to_button_boxes(header, config, None);
    buttons.extend(lines_to_button_boxes(left, config, Some(gutter_x - 1)));
    buttons.extend(lines_to_button_boxes(right, config, None));
    buttons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x1: i32, y1: i32, x2: i32, y2: i32) -> ConnectedRegion {
        ConnectedRegion {
            rect: Rect::new(x1, y1, x2, y2),
            pixel_count: ((x2 - x1 + 1) * (y2 - y1 + 1)) as u32,
        }
    }

    #[test]
    fn large_highlight_mode_keeps_only_large_regions() {
        let config = Config::default();
        let regions = vec![
            region(150, 176, 262, 265), // large: 113x90
            region(10, 10, 20, 20),     // small arrow
            region(30, 10, 40, 20),
            region(50, 10, 60, 20),
        ];
        let (mode, buttons) = cluster_regions(&regions, &config, 720);
        assert_eq!(mode, ClusterMode::LargeHighlight);
        assert_eq!(buttons, vec![Rect::new(150, 176, 262, 265)]);
    }

    #[test]
    fn sparse_small_regions_produce_no_buttons() {
        let config = Config::default();
        let regions = vec![region(10, 10, 20, 20), region(30, 10, 40, 20)];
        let (mode, buttons) = cluster_regions(&regions, &config, 720);
        assert_eq!(mode, ClusterMode::None);
        assert!(buttons.is_empty());
    }

    #[test]
    fn character_glyph_mode_merges_line_into_one_box() {
        let config = Config::default();
        let mut regions = Vec::new();
        // One text line of 25 glyphs, tightly spaced, to exceed the small-region threshold.
        for i in 0..25 {
            let x = 100 + i * 10;
            regions.push(region(x, 200, x + 8, 212));
        }
        let (mode, buttons) = cluster_regions(&regions, &config, 720);
        assert_eq!(mode, ClusterMode::CharacterGlyph);
        assert_eq!(buttons.len(), 1);
        assert!(buttons[0].width() >= config.glyph_box_min_width);
    }

    #[test]
    fn large_gap_within_glyph_line_splits_into_two_boxes() {
        let config = Config::default();
        let mut regions = Vec::new();
        for i in 0..22 {
            let x = 50 + i * 10;
            regions.push(region(x, 200, x + 8, 212));
        }
        // Second cluster far enough away (gap > 30px) to be its own button.
        for i in 0..5 {
            let x = 600 + i * 10;
            regions.push(region(x, 200, x + 8, 212));
        }
        let (mode, buttons) = cluster_regions(&regions, &config, 720);
        assert_eq!(mode, ClusterMode::CharacterGlyph);
        assert_eq!(buttons.len(), 2);
    }
}
