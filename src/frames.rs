//! Frame sampling and page classification (§4.7).
//!
//! Frame extraction itself is an external collaborator (§6: "a handle to a frame-sampling
//! capability"); this module defines that capability's trait boundary and implements the
//! classifier that groups sampled frames into [`PageGroup`]s by inter-frame difference.

use crate::config::Config;
use crate::error::{Error, ErrorDetails, Result};
use crate::types::PageIndex;
use image::GrayImage;
use log::warn;
use std::path::{Path, PathBuf};

/// External capability: extracts representative frames from a menu VOB. Implementations wrap
/// whatever media tool is available to the pipeline (ffmpeg, a disc-aware decoder, ...).
pub trait FrameSampler {
    /// Extracts frames from `vob_path` into `out_dir`, returning their paths in file order.
    ///
    /// For menu VOBs of sub-second declared duration, implementations should extract all decoded
    /// frames rather than sampling by timestamp (§4.7: declared durations are unreliable for
    /// menus).
    fn sample_frames(&self, menu_id: &str, vob_path: &Path, out_dir: &Path) -> Result<Vec<PathBuf>>;
}

/// A group of frames judged to depict the same menu page, with its first frame as representative.
#[derive(Debug, Clone)]
pub struct PageGroup {
    pub page_index: PageIndex,
    pub representative_frame: PathBuf,
    pub frames: Vec<PathBuf>,
}

fn mean_abs_diff(a: &GrayImage, b: &GrayImage) -> f64 {
    if a.dimensions() != b.dimensions() {
        return f64::MAX; // forces a page boundary on a resolution change
    }
    let n = a.as_raw().len();
    if n == 0 {
        return 0.0;
    }
    let sum: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw().iter())
        .map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs() as u64)
        .sum();
    sum as f64 / n as f64
}

/// Groups sampled frames into [`PageGroup`]s by consecutive mean-pixel-difference (§4.7).
///
/// A frame that fails to load is logged and skipped entirely (treated as if never sampled); a
/// menu with zero loadable frames yields zero groups.
pub fn classify_pages(menu_id: &str, frame_paths: &[PathBuf], config: &Config) -> Vec<PageGroup> {
    let mut groups: Vec<PageGroup> = Vec::new();
    let mut prev_gray: Option<GrayImage> = None;

    for path in frame_paths {
        let img = match image::open(path) {
            Ok(img) => img.to_luma8(),
            Err(e) => {
                warn!("menu {menu_id}: failed to load sampled frame {}: {e}", path.display());
                continue;
            }
        };

        let starts_new_group = match &prev_gray {
            None => true,
            Some(prev) => mean_abs_diff(prev, &img) > config.page_boundary_threshold,
        };

        if starts_new_group || groups.is_empty() {
            groups.push(PageGroup {
                page_index: groups.len(),
                representative_frame: path.clone(),
                frames: vec![path.clone()],
            });
        } else {
            groups.last_mut().unwrap().frames.push(path.clone());
        }

        prev_gray = Some(img);
    }

    groups
}

/// Matches decoded SPU packets to page groups positionally: the *n*-th complete menu-flagged
/// packet corresponds to the *n*-th page group (§2, §4.7). Surplus on either side is logged, not
/// an error.
pub fn match_packets_to_pages<'a, T>(packets: &'a [T], pages: &'a [PageGroup], menu_id: &str) -> Vec<(&'a T, &'a PageGroup)> {
    let n = packets.len().min(pages.len());
    if packets.len() != pages.len() {
        warn!(
            "menu {menu_id}: {} decoded packets but {} page groups, matching first {n}",
            packets.len(),
            pages.len()
        );
    }
    packets.iter().zip(pages.iter()).take(n).collect()
}

/// Surfaces a frame-sampler failure as a menu-level [`Error`] (§7: `ToolFailure`).
pub fn tool_failure(menu_id: &str, message: impl Into<String>) -> Error {
    Error::new(ErrorDetails::ToolFailure {
        menu_id: menu_id.to_string(),
        message: message.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_abs_diff_of_identical_images_is_zero() {
        let img = GrayImage::from_pixel(4, 4, image::Luma([100]));
        assert_eq!(mean_abs_diff(&img, &img), 0.0);
    }

    #[test]
    fn mean_abs_diff_detects_full_contrast() {
        let a = GrayImage::from_pixel(4, 4, image::Luma([0]));
        let b = GrayImage::from_pixel(4, 4, image::Luma([255]));
        assert_eq!(mean_abs_diff(&a, &b), 255.0);
    }

    #[test]
    fn match_packets_to_pages_truncates_to_shorter_side() {
        let packets = vec![1, 2, 3];
        let pages = vec![
            PageGroup {
                page_index: 0,
                representative_frame: PathBuf::from("a.png"),
                frames: vec![],
            },
            PageGroup {
                page_index: 1,
                representative_frame: PathBuf::from("b.png"),
                frames: vec![],
            },
        ];
        let matched = match_packets_to_pages(&packets, &pages, "menu1");
        assert_eq!(matched.len(), 2);
    }
}
