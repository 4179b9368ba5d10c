//! Tunable thresholds for every heuristic stage (§4), collected so they can be overridden from a
//! TOML file without recompiling. Every field defaults to the value the specification names;
//! `Config::default()` alone reproduces the spec's behaviour exactly.

use serde::Deserialize;

/// Disc-standard frame bounds; SPU display rectangles must fit within these (§3).
pub const PAL_WIDTH: i32 = 720;
pub const PAL_HEIGHT: i32 = 576;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Minimum width/height (px) for a connected region to count as a "large" highlight (§4.5).
    pub large_component_min_width: i32,
    pub large_component_min_height: i32,
    /// Minimum count of small regions to enter character-glyph mode (§4.5).
    pub character_glyph_min_small_regions: usize,
    /// Max Y-centre delta (px) for two glyphs to belong to the same text line (§4.5).
    pub glyph_line_y_tolerance: i32,
    /// Max horizontal gap (px) for two glyphs in a line to merge into one button box (§4.5).
    pub glyph_merge_gap: i32,
    /// Extra padding (px) appended to the right of a merged glyph button box (§4.5).
    pub glyph_right_padding: i32,
    /// Minimum width/height (px) for a character-glyph button box to survive filtering (§4.5).
    pub glyph_box_min_width: i32,
    pub glyph_box_min_height: i32,
    /// Fraction of the Y range (from the top) considered the header band (§4.5).
    pub header_band_fraction: f64,

    /// Gutter valley must be searched within this central fraction of page width (§4.6).
    pub gutter_search_band: (f64, f64),
    /// Valley depth must be <= this fraction of mean projection height (§4.6).
    pub gutter_max_relative_depth: f64,
    /// Minimum contiguous valley width (px) (§4.6).
    pub gutter_min_valley_width: i32,
    /// Minimum density-balance ratio between the two sides of an accepted gutter (§4.6).
    pub gutter_min_density_balance: f64,
    /// Gaussian smoothing sigma (px) applied to the horizontal glyph-coverage projection (§4.6).
    pub gutter_smoothing_sigma: f64,

    /// Mean absolute pixel difference (0-255 grayscale) above which two consecutive frames are
    /// considered different pages (§4.7).
    pub page_boundary_threshold: f64,

    /// Minimum pairs required before the aligner trusts a page's median y-shift (§4.8).
    pub align_min_pairs: usize,
    /// Minimum horizontal overlap fraction (of the SPU rect's width) for an OCR line to be
    /// considered a match candidate (§4.8).
    pub align_min_overlap_fraction: f64,
    /// Maximum plausible |y-shift| as a fraction of frame height (§4.8).
    pub align_max_shift_fraction: f64,

    /// IQR outlier multiplier used throughout the regularizer (§4.9). Standard Tukey fence.
    pub iqr_multiplier: f64,

    /// Horizontal/vertical crop padding fractions (§4.10).
    pub crop_h_padding: f64,
    pub crop_v_padding: f64,

    /// Mean pixel value (0-255 grayscale) below which an 8px block counts as "dark" for the
    /// fallback detector (§4.11).
    pub fallback_dark_threshold: u8,
    /// Block size (px) used to tile the frame for the fallback detector (§4.11).
    pub fallback_block_size: u32,

    /// External tool timeout, in seconds (§5).
    pub tool_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            large_component_min_width: 80,
            large_component_min_height: 60,
            character_glyph_min_small_regions: 20,
            glyph_line_y_tolerance: 10,
            glyph_merge_gap: 30,
            glyph_right_padding: 30,
            glyph_box_min_width: 80,
            glyph_box_min_height: 10,
            header_band_fraction: 0.15,

            gutter_search_band: (0.40, 0.60),
            gutter_max_relative_depth: 0.40,
            gutter_min_valley_width: 20,
            gutter_min_density_balance: 0.25,
            gutter_smoothing_sigma: 6.0,

            page_boundary_threshold: 4.0,

            align_min_pairs: 3,
            align_min_overlap_fraction: 0.50,
            align_max_shift_fraction: 0.20,

            iqr_multiplier: 1.5,

            crop_h_padding: 0.05,
            crop_v_padding: 0.10,

            fallback_dark_threshold: 65,
            fallback_block_size: 8,

            tool_timeout_secs: 60,
        }
    }
}

impl Config {
    /// Load a `Config` from a TOML file, falling back to spec defaults for any field the file
    /// omits (`#[serde(default)]` on the struct).
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
