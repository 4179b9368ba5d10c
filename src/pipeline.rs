//! Per-menu pipeline orchestration (§4's state machine) and the worker pool that runs it across
//! menus (§5, §10.8).

use crate::align::{self, OcrCapability};
use crate::cluster::{self, ClusterMode};
use crate::config::{Config, PAL_WIDTH};
use crate::emit;
use crate::error::{Error, ErrorDetails, Result};
use crate::fallback;
use crate::frames;
use crate::nav::FormatAdapter;
use crate::ps_demux;
use crate::regions;
use crate::regularize;
use crate::spu::{self, DecodedSpu};
use crate::types::{ButtonEntry, RectSource};
use log::{debug, warn};
use std::path::Path;

/// Pipeline state for one menu VOB (§4, "State Machine (per menu VOB)").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    Demuxing,
    Reassembling,
    Decoding,
    Clustering,
    FrameSampling,
    PageMatching,
    Aligning,
    Regularizing,
    Emitting,
    Done,
    /// All SPU packets failed and the fallback also failed; zero rectangles, not an error.
    DoneNoButtons,
}

#[derive(Debug, Clone)]
pub struct MenuResult {
    pub menu_id: String,
    pub state: PipelineState,
    pub buttons: Vec<ButtonEntry>,
}

/// Runs one menu VOB through the full pipeline.
pub fn process_menu<A, O>(menu_id: &str, adapter: &A, ocr: &O, out_dir: &Path, config: &Config) -> Result<MenuResult>
where
    A: FormatAdapter,
    O: OcrCapability,
{
    let expected = adapter.expected_button_count(menu_id);

    debug!("menu {menu_id}: {:?}", PipelineState::Demuxing);
    let vob_bytes = adapter.open_menu_bytes(menu_id)?;
    let fragments = ps_demux::demux_spu_fragments(&vob_bytes);

    debug!("menu {menu_id}: {:?}", PipelineState::Reassembling);
    let packets = spu::reassemble_spu_packets(&fragments);

    debug!("menu {menu_id}: {:?}", PipelineState::Decoding);
    let decoded = spu::decode_all(&packets);

    debug!("menu {menu_id}: {:?}", PipelineState::Clustering);
    // Only successfully decoded packets count as "complete menu-flagged SpuPacket"s for the
    // positional page mapping (§2, §4.7).
    let per_packet_rects: Vec<Vec<crate::types::Rect>> = decoded
        .iter()
        .filter_map(|d| d.as_ref())
        .map(|d: &DecodedSpu| {
            let regions = regions::extract_regions(&d.bitmap);
            let (_mode, buttons) = cluster::cluster_regions(&regions, config, PAL_WIDTH);
            buttons
        })
        .collect();

    debug!("menu {menu_id}: {:?}", PipelineState::FrameSampling);
    let frame_paths = adapter.frame_sample(menu_id, out_dir).map_err(|_| {
        Error::new(ErrorDetails::ToolFailure {
            menu_id: menu_id.to_string(),
            message: "frame sampler unavailable".to_string(),
        })
    })?;
    let pages = frames::classify_pages(menu_id, &frame_paths, config);

    debug!("menu {menu_id}: {:?}", PipelineState::PageMatching);
    let matched = frames::match_packets_to_pages(&per_packet_rects, &pages, menu_id);

    debug!("menu {menu_id}: {:?} / {:?}", PipelineState::Aligning, PipelineState::Regularizing);
    let mut entries = Vec::new();
    for (page_index, (spu_rects, page)) in matched.iter().enumerate() {
        let frame_img = match image::open(&page.representative_frame) {
            Ok(img) => img,
            Err(e) => {
                warn!("menu {menu_id} page {page_index}: failed to load representative frame: {e}");
                continue;
            }
        };

        let mut rects: Vec<(crate::types::Rect, RectSource)> = Vec::new();
        if !spu_rects.is_empty() {
            let gray = frame_img.to_luma8();
            let ocr_result = ocr.recognize(menu_id, &page.representative_frame).ok();
            let aligned = match &ocr_result {
                Some(ocr) => match align::compute_page_shift(spu_rects, &ocr.line_boxes, gray.height() as i32, config) {
                    Some(shift) => align::apply_shift(spu_rects, shift),
                    None => spu_rects.clone(),
                },
                None => spu_rects.clone(),
            };
            let expected_count = expected.map(|e| e as usize).unwrap_or(aligned.len());
            let regularized = regularize::regularize(&aligned, expected_count, config);
            rects.extend(regularized.into_iter().map(|r| (r, RectSource::Spu)));
        }

        if rects.is_empty() {
            let gray = frame_img.to_luma8();
            let fallback_rects = fallback::detect_dark_regions(&gray, config);
            rects.extend(fallback_rects.into_iter().map(|r| (r, RectSource::Fallback)));
        }

        debug!("menu {menu_id} page {page_index}: {:?}", PipelineState::Emitting);
        for (i, (rect, source)) in rects.iter().enumerate() {
            let entry_id = format!("{menu_id}_p{page_index}_b{i}");
            match emit::emit_button(&frame_img, rect, menu_id, &entry_id, *page_index, *source, out_dir, config) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("menu {menu_id}: failed to emit button {entry_id}: {e}"),
            }
        }
    }

    let final_state = if entries.is_empty() {
        PipelineState::DoneNoButtons
    } else {
        PipelineState::Done
    };

    Ok(MenuResult {
        menu_id: menu_id.to_string(),
        state: final_state,
        buttons: entries,
    })
}

/// Per-menu mismatch between `ClusterMode::None` and an explicit fallback decision is logged, not
/// an error; `detect_mode` exposed for pipeline-level diagnostics/tests.
pub fn detect_mode(regions: &[crate::types::ConnectedRegion], config: &Config) -> ClusterMode {
    cluster::cluster_regions(regions, config, PAL_WIDTH).0
}

/// Runs every menu in `menu_ids` across a fixed-size worker pool (§5, §10.8): plain OS threads
/// and a channel-backed queue, no async runtime. Each worker owns its menu's state exclusively.
pub fn run_pool<A, O>(adapter: &A, ocr: &O, menu_ids: &[String], out_dir: &Path, config: &Config, jobs: usize) -> Vec<MenuResult>
where
    A: FormatAdapter + Sync,
    O: OcrCapability + Sync,
{
    let jobs = jobs.max(1).min(menu_ids.len().max(1));
    std::thread::scope(|scope| {
        let (tx, rx) = std::sync::mpsc::channel::<String>();
        for id in menu_ids {
            tx.send(id.clone()).expect("channel receiver dropped before send");
        }
        drop(tx);

        let rx = std::sync::Mutex::new(rx);
        let results = std::sync::Mutex::new(Vec::new());

        let mut handles = Vec::new();
        for _ in 0..jobs {
            let rx = &rx;
            let results = &results;
            handles.push(scope.spawn(move || loop {
                let menu_id = {
                    let guard = rx.lock().unwrap();
                    guard.recv()
                };
                let Ok(menu_id) = menu_id else { break };
                let result = match process_menu(&menu_id, adapter, ocr, out_dir, config) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!("menu {menu_id}: pipeline error: {e}");
                        MenuResult {
                            menu_id: menu_id.clone(),
                            state: PipelineState::DoneNoButtons,
                            buttons: Vec::new(),
                        }
                    }
                };
                results.lock().unwrap().push(result);
            }));
        }
        for h in handles {
            let _ = h.join();
        }
        results.into_inner().unwrap()
    })
}
