//! Static dark-region fallback detector (§4.11).
//!
//! Activates when the SPU path yields fewer rectangles than `expected_button_count` for a page.
//! Operates purely on the representative frame: tiles it into blocks, flags dark ones, groups
//! them into 4-connected regions, and rejects frame-edge and duplicate detections.

use crate::config::Config;
use crate::types::Rect;
use image::GrayImage;

fn block_is_dark(frame: &GrayImage, bx: u32, by: u32, block_size: u32, threshold: u8) -> bool {
    let (w, h) = frame.dimensions();
    let x0 = bx * block_size;
    let y0 = by * block_size;
    let x1 = (x0 + block_size).min(w);
    let y1 = (y0 + block_size).min(h);
    if x0 >= x1 || y0 >= y1 {
        return false;
    }
    let mut sum: u64 = 0;
    let mut count: u64 = 0;
    for y in y0..y1 {
        for x in x0..x1 {
            sum += frame.get_pixel(x, y).0[0] as u64;
            count += 1;
        }
    }
    count > 0 && (sum / count) < threshold as u64
}

/// Finds 4-connected dark-block regions in `frame`, in the frame's pixel coordinates.
pub fn detect_dark_regions(frame: &GrayImage, config: &Config) -> Vec<Rect> {
    let (w, h) = frame.dimensions();
    let block_size = config.fallback_block_size.max(1);
    let grid_w = w.div_ceil(block_size) as usize;
    let grid_h = h.div_ceil(block_size) as usize;

    let mut dark = vec![false; grid_w * grid_h];
    for by in 0..grid_h {
        for bx in 0..grid_w {
            dark[by * grid_w + bx] = block_is_dark(frame, bx as u32, by as u32, block_size, config.fallback_dark_threshold);
        }
    }

    let mut visited = vec![false; grid_w * grid_h];
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for by0 in 0..grid_h {
        for bx0 in 0..grid_w {
            let idx0 = by0 * grid_w + bx0;
            if visited[idx0] || !dark[idx0] {
                continue;
            }
            visited[idx0] = true;
            stack.push((bx0, by0));
            let mut min_bx = bx0;
            let mut max_bx = bx0;
            let mut min_by = by0;
            let mut max_by = by0;

            while let Some((bx, by)) = stack.pop() {
                min_bx = min_bx.min(bx);
                max_bx = max_bx.max(bx);
                min_by = min_by.min(by);
                max_by = max_by.max(by);

                let neighbours = [
                    (bx.checked_sub(1), Some(by)),
                    (Some(bx + 1).filter(|&v| v < grid_w), Some(by)),
                    (Some(bx), by.checked_sub(1)),
                    (Some(bx), Some(by + 1).filter(|&v| v < grid_h)),
                ];
                for (nx, ny) in neighbours {
                    if let (Some(nx), Some(ny)) = (nx, ny) {
                        let nidx = ny * grid_w + nx;
                        if !visited[nidx] && dark[nidx] {
                            visited[nidx] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            let x1 = (min_bx as u32) * block_size;
            let y1 = (min_by as u32) * block_size;
            let x2 = (((max_bx as u32) + 1) * block_size).min(w).saturating_sub(1);
            let y2 = (((max_by as u32) + 1) * block_size).min(h).saturating_sub(1);

            let touches_edge = min_bx == 0 || min_by == 0 || max_bx + 1 == grid_w || max_by + 1 == grid_h;
            if touches_edge {
                continue;
            }

            regions.push(Rect::new(x1 as i32, y1 as i32, x2 as i32, y2 as i32));
        }
    }

    dedup_vertical_overlaps(regions)
}

/// Drops regions that vertically overlap an already-accepted, larger region (largest-area-first),
/// per §4.11's "deduplication of vertically overlapping regions".
fn dedup_vertical_overlaps(mut regions: Vec<Rect>) -> Vec<Rect> {
    regions.sort_by_key(|r| std::cmp::Reverse(r.width() as i64 * r.height() as i64));
    let mut accepted: Vec<Rect> = Vec::new();
    for r in regions {
        let overlaps_existing = accepted.iter().any(|a| a.y1 <= r.y2 && r.y1 <= a.y2);
        if !overlaps_existing {
            accepted.push(r);
        }
    }
    accepted.sort_by_key(|r| (r.y1, r.x1));
    accepted
}
