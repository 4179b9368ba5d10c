//! SPU packet reassembler (§4.2).
//!
//! Concatenates per-substream fragments from the demuxer into complete, size-prefixed SPU
//! packets, in disc order across all substreams. Packet-to-page mapping downstream depends on
//! this order being preserved exactly.

use crate::ps_demux::SubstreamFragment;
use log::debug;
use std::collections::HashMap;

/// A complete, size-prefixed SPU unit, as it appeared on disc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpuPacket {
    pub substream_id: u8,
    pub raw_bytes: Vec<u8>,
    pub total_size: usize,
    pub control_offset: usize,
}

impl SpuPacket {
    /// Parses the fixed 4-byte packet header into `(total_size, control_offset)`, or `None` if
    /// not enough bytes are present yet.
    fn try_header(buf: &[u8]) -> Option<(usize, usize)> {
        if buf.len() < 4 {
            return None;
        }
        let total_size = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        let control_offset = u16::from_be_bytes([buf[2], buf[3]]) as usize;
        Some((total_size, control_offset))
    }
}

#[derive(Default)]
struct SubstreamBuffer {
    bytes: Vec<u8>,
}

/// Reassembles the demuxer's fragment stream into complete [`SpuPacket`]s, in disc order.
///
/// A per-substream buffer whose trailing bytes never reach their declared `total_size` before
/// input ends is silently dropped (logged at debug), per §4.2.
pub fn reassemble_spu_packets(fragments: &[SubstreamFragment<'_>]) -> Vec<SpuPacket> {
    let mut buffers: HashMap<u8, SubstreamBuffer> = HashMap::new();
    let mut packets = Vec::new();

    for fragment in fragments {
        let buffer = buffers.entry(fragment.substream_id).or_default();
        buffer.bytes.extend_from_slice(fragment.bytes);

        // A single fragment may finish, and then start, multiple packets.
        loop {
            let (total_size, control_offset) = match SpuPacket::try_header(&buffer.bytes) {
                Some(h) => h,
                None => break,
            };
            if total_size < 4 || control_offset < 4 || control_offset >= total_size {
                // Malformed header; this substream's stream is corrupt from here on. Drop the
                // whole buffer rather than looping forever on a bad size field.
                debug!(
                    "substream {:#x}: invalid packet header (total_size={total_size}, control_offset={control_offset}), dropping buffer",
                    fragment.substream_id
                );
                buffer.bytes.clear();
                break;
            }
            if buffer.bytes.len() < total_size {
                break;
            }
            let raw_bytes = buffer.bytes[..total_size].to_vec();
            buffer.bytes.drain(..total_size);
            packets.push(SpuPacket {
                substream_id: fragment.substream_id,
                raw_bytes,
                total_size,
                control_offset,
            });
        }
    }

    for (substream_id, buffer) in &buffers {
        if !buffer.bytes.is_empty() {
            debug!(
                "substream {:#x}: {} trailing bytes never reached declared packet size, dropping",
                substream_id,
                buffer.bytes.len()
            );
        }
    }

    packets
}
