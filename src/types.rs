//! Core data model entities shared across pipeline stages (§3).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// An axis-aligned, inclusive pixel rectangle.
///
/// Invariant: `x1 <= x2` and `y1 <= y2`. Construction through [`Rect::new`] enforces this by
/// swapping out-of-order coordinates rather than panicking, since every producer in this crate
/// derives rectangles from already-validated geometry and a panic here would turn a single bad
/// disc into a crash instead of a skipped packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    /// Build a rectangle from two inclusive corners, normalizing coordinate order.
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1 + 1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1 + 1
    }

    pub fn x_centre(&self) -> f64 {
        (self.x1 + self.x2) as f64 / 2.0
    }

    pub fn y_centre(&self) -> f64 {
        (self.y1 + self.y2) as f64 / 2.0
    }

    /// Returns the rectangle shifted vertically by `dy` pixels.
    pub fn shifted_y(&self, dy: i32) -> Self {
        Self {
            x1: self.x1,
            x2: self.x2,
            y1: self.y1 + dy,
            y2: self.y2 + dy,
        }
    }

    /// Length of the horizontal overlap between `self` and `other`, in pixels (0 if disjoint).
    pub fn horizontal_overlap(&self, other: &Rect) -> i32 {
        (self.x2.min(other.x2) - self.x1.max(other.x1) + 1).max(0)
    }

    /// True if `self` and `other` share any pixel.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x1 <= other.x2 && other.x1 <= self.x2 && self.y1 <= other.y2 && other.y1 <= self.y2
    }

    /// True if `self` lies entirely within `bounds` (both inclusive rectangles).
    pub fn is_within(&self, bounds: &Rect) -> bool {
        self.x1 >= bounds.x1 && self.y1 >= bounds.y1 && self.x2 <= bounds.x2 && self.y2 <= bounds.y2
    }

    /// Returns `self` padded by `h_frac`/`v_frac` of its own width/height on each side, clamped
    /// to stay within `bounds`.
    pub fn padded_clamped(&self, h_frac: f64, v_frac: f64, bounds: &Rect) -> Rect {
        let pad_x = (self.width() as f64 * h_frac).round() as i32;
        let pad_y = (self.height() as f64 * v_frac).round() as i32;
        Rect {
            x1: (self.x1 - pad_x).max(bounds.x1),
            y1: (self.y1 - pad_y).max(bounds.y1),
            x2: (self.x2 + pad_x).min(bounds.x2),
            y2: (self.y2 + pad_y).min(bounds.y2),
        }
    }
}

/// A maximal 4-connected region of non-zero pixels found by the region extractor (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedRegion {
    pub rect: Rect,
    /// Number of non-zero pixels belonging to the region (not just its bounding box area).
    pub pixel_count: u32,
}

/// 0-based index of a menu page, identical to the index of the page's originating SPU packet.
pub type PageIndex = usize;

/// Where a [`ButtonEntry`]'s rectangle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RectSource {
    /// Derived from the SPU bitmap via connected-component clustering.
    Spu,
    /// Synthesized by the static dark-region fallback detector (§4.11).
    Fallback,
}

/// One emitted button, the sole output artifact crossing the stage boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonEntry {
    pub entry_id: String,
    pub menu_id: String,
    pub page_index: PageIndex,
    pub rect: Rect,
    pub image_path: PathBuf,
    pub source: RectSource,
}

/// Per-menu nav-stage input: `{menu_id -> (menu_vob_path, expected_button_count)}`.
///
/// §9: "explicit schema... unknown keys are rejected on load." `deny_unknown_fields` enforces
/// that at deserialize time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuVobEntry {
    pub menu_vob_path: PathBuf,
    pub expected_button_count: u32,
}

/// Top-level validated nav-stage artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavMapping {
    pub menus: std::collections::BTreeMap<String, MenuVobEntry>,
}

impl NavMapping {
    /// Parse and validate a nav-stage mapping artifact from JSON bytes.
    ///
    /// Rejects unknown keys (serde's `deny_unknown_fields`) and out-of-range numeric values, per
    /// §9's "No runtime-typed mapping" design note.
    pub fn from_json(bytes: &[u8]) -> crate::error::Result<Self> {
        let mapping: NavMapping = serde_json::from_slice(bytes).map_err(|e| {
            crate::error::Error::new(crate::error::ErrorDetails::SchemaViolation(e.to_string()))
        })?;
        for (menu_id, entry) in &mapping.menus {
            if entry.expected_button_count == 0 {
                return Err(crate::error::Error::new(
                    crate::error::ErrorDetails::SchemaViolation(format!(
                        "menu {menu_id} has expected_button_count == 0"
                    )),
                ));
            }
        }
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_normalizes_order() {
        let r = Rect::new(10, 10, 5, 5);
        assert_eq!(r, Rect::new(5, 5, 10, 10));
    }

    #[test]
    fn rect_dimensions_are_inclusive() {
        let r = Rect::new(0, 0, 9, 19);
        assert_eq!(r.width(), 10);
        assert_eq!(r.height(), 20);
    }

    #[test]
    fn overlap_detects_disjoint_rects() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(20, 20, 30, 30);
        assert!(!a.overlaps(&b));
        assert_eq!(a.horizontal_overlap(&b), 0);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let json = r#"{"menus": {"m1": {"menu_vob_path": "a.vob", "expected_button_count": 2, "bogus": 1}}}"#;
        assert!(NavMapping::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn zero_expected_count_is_rejected() {
        let json = r#"{"menus": {"m1": {"menu_vob_path": "a.vob", "expected_button_count": 0}}}"#;
        assert!(NavMapping::from_json(json.as_bytes()).is_err());
    }

    #[test]
    fn valid_mapping_parses() {
        let json = r#"{"menus": {"m1": {"menu_vob_path": "a.vob", "expected_button_count": 4}}}"#;
        let mapping = NavMapping::from_json(json.as_bytes()).unwrap();
        assert_eq!(mapping.menus["m1"].expected_button_count, 4);
    }
}
