//! Format adapter capability set (§9: "No inheritance / no mixins... modelled as a capability
//! set"). The core never sees DVD- or VCD/SVCD-specific structures; it depends only on this
//! trait, implemented once per disc format.

use crate::error::{Error, ErrorDetails, Result};
use crate::frames::FrameSampler;
use crate::types::NavMapping;
use std::path::{Path, PathBuf};

/// The capability set a disc-format adapter must provide. DVD is the only implementation in this
/// repository; VCD/SVCD would implement the same trait without the core changing at all.
pub trait FormatAdapter {
    fn list_menus(&self) -> Vec<String>;
    fn open_menu_bytes(&self, menu_id: &str) -> Result<Vec<u8>>;
    fn expected_button_count(&self, menu_id: &str) -> Option<u32>;
    fn frame_sample(&self, menu_id: &str, out_dir: &Path) -> Result<Vec<PathBuf>>;
}

fn unknown_menu(menu_id: &str) -> Error {
    Error::new(ErrorDetails::SchemaViolation(format!("unknown menu_id {menu_id}")))
}

/// DVD format adapter: menu VOBs are read directly from disk per the nav-stage mapping, and frame
/// sampling is delegated to whatever [`FrameSampler`] the caller supplies.
pub struct DvdFormatAdapter<S: FrameSampler> {
    mapping: NavMapping,
    sampler: S,
}

impl<S: FrameSampler> DvdFormatAdapter<S> {
    pub fn new(mapping: NavMapping, sampler: S) -> Self {
        Self { mapping, sampler }
    }
}

impl<S: FrameSampler> FormatAdapter for DvdFormatAdapter<S> {
    fn list_menus(&self) -> Vec<String> {
        self.mapping.menus.keys().cloned().collect()
    }

    fn open_menu_bytes(&self, menu_id: &str) -> Result<Vec<u8>> {
        let entry = self.mapping.menus.get(menu_id).ok_or_else(|| unknown_menu(menu_id))?;
        Ok(std::fs::read(&entry.menu_vob_path)?)
    }

    fn expected_button_count(&self, menu_id: &str) -> Option<u32> {
        self.mapping.menus.get(menu_id).map(|e| e.expected_button_count)
    }

    fn frame_sample(&self, menu_id: &str, out_dir: &Path) -> Result<Vec<PathBuf>> {
        let entry = self.mapping.menus.get(menu_id).ok_or_else(|| unknown_menu(menu_id))?;
        self.sampler.sample_frames(menu_id, &entry.menu_vob_path, out_dir)
    }
}
