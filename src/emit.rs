//! Cropper/Emitter (§4.10).
//!
//! Crops each final rectangle from its page's representative frame, saves it as a PNG under the
//! stage output directory, and emits the matching [`ButtonEntry`]. Validates that every written
//! path stays under the output directory (§5: "the emitter validates that all written paths
//! remain under the stage's output directory").

use crate::config::Config;
use crate::error::{path_escape, Error, ErrorDetails, Result};
use crate::types::{ButtonEntry, PageIndex, Rect, RectSource};
use image::DynamicImage;
use std::path::{Path, PathBuf};

/// Builds `<out_dir>/<menu_id>/<entry_id>.png`, rejecting any `menu_id`/`entry_id` that would
/// escape `out_dir` via path traversal.
fn button_image_path(out_dir: &Path, menu_id: &str, entry_id: &str) -> Result<PathBuf> {
    let path = out_dir.join(menu_id).join(format!("{entry_id}.png"));
    let has_traversal = path
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir));
    if has_traversal || !path.starts_with(out_dir) {
        return Err(path_escape(&path, &out_dir.to_path_buf()));
    }
    Ok(path)
}

/// Crops `rect` (padded per §4.10) from `frame`, writes it as a PNG, and returns the emitted
/// [`ButtonEntry`]. `rect` in the returned entry is the unpadded button geometry; the padding
/// only affects the saved crop's margins.
pub fn emit_button(
    frame: &DynamicImage,
    rect: &Rect,
    menu_id: &str,
    entry_id: &str,
    page_index: PageIndex,
    source: RectSource,
    out_dir: &Path,
    config: &Config,
) -> Result<ButtonEntry> {
    let bounds = Rect::new(0, 0, frame.width() as i32 - 1, frame.height() as i32 - 1);
    let padded = rect.padded_clamped(config.crop_h_padding, config.crop_v_padding, &bounds);

    let crop_x = padded.x1.max(0) as u32;
    let crop_y = padded.y1.max(0) as u32;
    let crop_w = padded.width().max(1) as u32;
    let crop_h = padded.height().max(1) as u32;
    let cropped = frame.crop_imm(crop_x, crop_y, crop_w, crop_h);

    let image_path = button_image_path(out_dir, menu_id, entry_id)?;
    if let Some(parent) = image_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    cropped.save(&image_path).map_err(|e| {
        Error::new(ErrorDetails::Io(format!(
            "failed writing {}: {e}",
            image_path.display()
        )))
    })?;

    Ok(ButtonEntry {
        entry_id: entry_id.to_string(),
        menu_id: menu_id.to_string(),
        page_index,
        rect: *rect,
        image_path,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_entry_id_with_parent_dir_traversal() {
        let out_dir = PathBuf::from("/tmp/discmenu_out");
        let err = button_image_path(&out_dir, "menu1", "../../etc/passwd").unwrap_err();
        assert!(matches!(err.details, ErrorDetails::InvariantViolation(_)));
    }

    #[test]
    fn builds_expected_path_for_well_formed_ids() {
        let out_dir = PathBuf::from("/tmp/discmenu_out");
        let path = button_image_path(&out_dir, "menu1", "btn_0").unwrap();
        assert_eq!(path, out_dir.join("menu1").join("btn_0.png"));
    }
}
