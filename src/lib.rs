//! Recovers DVD menu button geometry and page structure from SPU navigation data.
//!
//! Given a menu VOB and an expected button count, this crate demuxes its MPEG-PS stream,
//! decodes the sub-picture units that encode the menu's highlight/text overlay, clusters the
//! decoded bitmap into button rectangles, aligns them against OCR'd frame text, and emits one
//! cropped PNG plus a structured record per button.
//!
//! # Usage
//! Add this crate as a dependency in your `Cargo.toml`.
//!
//! ```toml
//! [dependencies]
//! discmenu = "0.1.0"
//! ```

#![deny(unsafe_code, unsafe_op_in_unsafe_fn)]

mod slice_reader;
pub use slice_reader::SliceReader;

pub mod error;
pub use error::{Error, ErrorDetails, Result};

pub mod types;
pub use types::{ButtonEntry, ConnectedRegion, MenuVobEntry, NavMapping, PageIndex, Rect, RectSource};

pub mod config;
pub use config::Config;

mod ps_demux;
pub use ps_demux::{demux_spu_fragments, SubstreamFragment};

pub mod spu;
pub use spu::{decode_all, decode_packet, reassemble_spu_packets, DecodedSpu, SpuBitmap, SpuControl, SpuPacket};

mod regions;
pub use regions::extract_regions;

pub mod cluster;
pub use cluster::{cluster_regions, ClusterMode};

pub mod frames;
pub use frames::{classify_pages, match_packets_to_pages, FrameSampler, PageGroup};

pub mod align;
pub use align::{compute_page_shift, OcrCapability, OcrResult};

mod regularize;
pub use regularize::regularize;

mod fallback;
pub use fallback::detect_dark_regions;

mod emit;
pub use emit::emit_button;

pub mod nav;
pub use nav::{DvdFormatAdapter, FormatAdapter};

pub mod pipeline;
pub use pipeline::{process_menu, run_pool, MenuResult, PipelineState};
