//! Connected-component region extraction (§4.4).
//!
//! Finds maximal 4-connected regions of non-zero pixels in a decoded [`SpuBitmap`] and returns
//! their bounding rectangles in the bitmap's display-rectangle coordinate system, in deterministic
//! scanline order of first pixel discovered.

use crate::spu::SpuBitmap;
use crate::types::{ConnectedRegion, Rect};

/// Extracts every 4-connected region of non-zero pixels from `bitmap`.
///
/// Colour index is ignored beyond zero/non-zero: the specification does not distinguish
/// highlight states at this stage.
pub fn extract_regions(bitmap: &SpuBitmap) -> Vec<ConnectedRegion> {
    let w = bitmap.width;
    let h = bitmap.height;
    let mut visited = vec![false; w * h];
    let mut regions = Vec::new();
    let mut stack = Vec::new();

    for y0 in 0..h {
        for x0 in 0..w {
            let idx0 = y0 * w + x0;
            if visited[idx0] || bitmap.pixels[idx0] == 0 {
                continue;
            }

            let mut min_x = x0;
            let mut max_x = x0;
            let mut min_y = y0;
            let mut max_y = y0;
            let mut pixel_count = 0u32;

            visited[idx0] = true;
            stack.push((x0, y0));

            while let Some((x, y)) = stack.pop() {
                pixel_count += 1;
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_y = min_y.min(y);
                max_y = max_y.max(y);

                let neighbours = [
                    (x.checked_sub(1), Some(y)),
                    (Some(x + 1).filter(|&v| v < w), Some(y)),
                    (Some(x), y.checked_sub(1)),
                    (Some(x), Some(y + 1).filter(|&v| v < h)),
                ];
                for (nx, ny) in neighbours {
                    if let (Some(nx), Some(ny)) = (nx, ny) {
                        let nidx = ny * w + nx;
                        if !visited[nidx] && bitmap.pixels[nidx] != 0 {
                            visited[nidx] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            let rect = Rect::new(
                bitmap.origin_x + min_x as i32,
                bitmap.origin_y + min_y as i32,
                bitmap.origin_x + max_x as i32,
                bitmap.origin_y + max_y as i32,
            );
            regions.push(ConnectedRegion { rect, pixel_count });
        }
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bitmap(origin_x: i32, origin_y: i32, width: usize, height: usize, pixels: Vec<u8>) -> SpuBitmap {
        assert_eq!(pixels.len(), width * height);
        SpuBitmap {
            origin_x,
            origin_y,
            width,
            height,
            pixels,
        }
    }

    #[test]
    fn single_pixel_region() {
        #[rustfmt::skip]
        let pixels = vec![
            0, 0, 0,
            0, 1, 0,
            0, 0, 0,
        ];
        let bitmap = make_bitmap(0, 0, 3, 3, pixels);
        let regions = extract_regions(&bitmap);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].pixel_count, 1);
        assert_eq!(regions[0].rect, Rect::new(1, 1, 1, 1));
    }

    #[test]
    fn diagonal_pixels_are_separate_regions_under_4_connectivity() {
        #[rustfmt::skip]
        let pixels = vec![
            1, 0,
            0, 1,
        ];
        let bitmap = make_bitmap(0, 0, 2, 2, pixels);
        let regions = extract_regions(&bitmap);
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn l_shape_is_one_region() {
        #[rustfmt::skip]
        let pixels = vec![
            1, 0, 0,
            1, 0, 0,
            1, 1, 1,
        ];
        let bitmap = make_bitmap(0, 0, 3, 3, pixels);
        let regions = extract_regions(&bitmap);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].pixel_count, 5);
        assert_eq!(regions[0].rect, Rect::new(0, 0, 2, 2));
    }

    #[test]
    fn regions_translate_by_bitmap_origin() {
        let pixels = vec![1u8];
        let bitmap = make_bitmap(150, 176, 1, 1, pixels);
        let regions = extract_regions(&bitmap);
        assert_eq!(regions[0].rect, Rect::new(150, 176, 150, 176));
    }

    #[test]
    fn scanline_order_is_deterministic() {
        #[rustfmt::skip]
        let pixels = vec![
            0, 0, 1,
            1, 0, 0,
        ];
        let bitmap = make_bitmap(0, 0, 3, 2, pixels);
        let regions = extract_regions(&bitmap);
        assert_eq!(regions.len(), 2);
        // The region at (2,0) is discovered before the region at (0,1) in scanline order.
        assert_eq!(regions[0].rect, Rect::new(2, 0, 2, 0));
        assert_eq!(regions[1].rect, Rect::new(0, 1, 0, 1));
    }
}
