//! MPEG-2 Program Stream demuxer (§4.1).
//!
//! Scans an entire menu VOB buffer and yields every private-stream-1 payload fragment whose
//! substream ID falls in the SPU range `0x20..=0x3F`. Never fatal: truncated packs and unknown
//! stream IDs are skipped, and a desynced scan resumes at the next start code.

use log::{debug, warn};

/// Lowest substream ID considered a sub-picture unit.
pub const SPU_SUBSTREAM_MIN: u8 = 0x20;
/// Highest substream ID considered a sub-picture unit.
pub const SPU_SUBSTREAM_MAX: u8 = 0x3F;

const PACK_START_CODE: [u8; 4] = [0x00, 0x00, 0x01, 0xBA];
const STREAM_ID_PRIVATE_1: u8 = 0xBD;
const STREAM_ID_PADDING: u8 = 0xBE;

fn is_start_code(b: &[u8]) -> bool {
    b.len() >= 3 && b[0] == 0x00 && b[1] == 0x00 && b[2] == 0x01
}

/// One SPU-range fragment extracted from a private-stream-1 PES payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstreamFragment<'a> {
    pub substream_id: u8,
    pub bytes: &'a [u8],
}

/// Scans `vob_bytes` for private-stream-1 payloads and returns every SPU-range fragment found,
/// in file order. Lazy in spirit (single linear scan, no intermediate copies); materialized into
/// a `Vec` here because the reassembler needs to look ahead across multiple fragments per
/// substream and a `Vec` is simpler to reason about than a hand-rolled iterator for a buffer
/// that's already bounded to a few MB.
pub fn demux_spu_fragments(vob_bytes: &[u8]) -> Vec<SubstreamFragment<'_>> {
    let mut fragments = Vec::new();
    let mut offset = 0usize;
    let len = vob_bytes.len();

    // Resync to the first pack start code.
    while offset + 4 <= len && vob_bytes[offset..offset + 4] != PACK_START_CODE {
        offset += 1;
    }
    if offset + 4 > len {
        warn!("no pack start code found in {len} byte buffer");
        return fragments;
    }

    while offset < len {
        if offset + 4 > len {
            debug!("truncated tail at offset {offset}, stopping cleanly");
            break;
        }
        if vob_bytes[offset..offset + 4] == PACK_START_CODE {
            match skip_pack_header(vob_bytes, offset) {
                Some(next) => {
                    offset = next;
                    continue;
                }
                None => {
                    debug!("truncated pack header at offset {offset}, stopping cleanly");
                    break;
                }
            }
        }

        if !is_start_code(&vob_bytes[offset..]) {
            // Misaligned; resync by scanning forward for the next start code.
            let resync_from = offset;
            offset += 1;
            while offset + 3 <= len && !is_start_code(&vob_bytes[offset..]) {
                offset += 1;
            }
            if offset + 3 > len {
                break;
            }
            debug!("resynchronized at offset {offset} (lost sync at {resync_from})");
            continue;
        }

        let stream_id = vob_bytes[offset + 3];
        offset += 4;

        if stream_id == PACK_START_CODE[3] {
            // A pack start code re-detected mid-loop; handled at top of next iteration.
            offset -= 4;
            continue;
        }

        if offset + 2 > len {
            break;
        }
        let packet_length = u16::from_be_bytes([vob_bytes[offset], vob_bytes[offset + 1]]) as usize;
        offset += 2;
        if offset + packet_length > len {
            debug!("PES packet length {packet_length} overruns buffer, stopping cleanly");
            break;
        }
        let payload = &vob_bytes[offset..offset + packet_length];

        if stream_id == STREAM_ID_PRIVATE_1 {
            if let Some(fragment) = parse_private_stream_1(payload) {
                fragments.push(fragment);
            }
        } else if stream_id == STREAM_ID_PADDING {
            // Nothing to extract; already skipped by packet_length advance below.
        }
        // Video (0xE0-0xEF), audio (0xC0-0xDF), system headers, and anything else are skipped
        // wholesale: we've already advanced past their declared length.

        offset += packet_length;
    }

    fragments
}

/// Returns the offset just past the pack header (and any stuffing bytes), or `None` if the
/// buffer is truncated before the header ends.
fn skip_pack_header(data: &[u8], start: usize) -> Option<usize> {
    let mut offset = start + 4;
    // MPEG-2 pack header: 10 bytes of clock/mux-rate fields after the start code, marked by the
    // top two bits of the first byte being `01`.
    if offset >= data.len() {
        return None;
    }
    if (data[offset] & 0xC0) == 0x40 {
        offset += 10; // pack header proper (bytes 5..14 of the 14-byte header total)
        if offset >= data.len() {
            return None;
        }
        let stuffing_len = (data[offset] & 0x07) as usize;
        offset += 1 + stuffing_len;
    } else {
        // MPEG-1 pack header is fixed at 8 bytes following the start code.
        offset += 8;
    }
    if offset > data.len() {
        return None;
    }
    Some(offset)
}

/// Parses a private-stream-1 PES payload, returning its SPU fragment if the substream ID is in
/// range. Returns `None` for unparseable or non-SPU payloads (never an error: §4.1 is never
/// fatal).
fn parse_private_stream_1(payload: &[u8]) -> Option<SubstreamFragment<'_>> {
    if payload.len() < 3 {
        return None;
    }
    let flags = payload[1];
    let header_data_length = payload[2] as usize;
    let rest = payload.get(3..)?;
    let rest = rest.get(header_data_length..)?;
    let _has_pts = flags & 0x80 != 0;

    let substream_id = *rest.first()?;
    if (SPU_SUBSTREAM_MIN..=SPU_SUBSTREAM_MAX).contains(&substream_id) {
        Some(SubstreamFragment {
            substream_id,
            bytes: &rest[1..],
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack_header() -> Vec<u8> {
        let mut v = PACK_START_CODE.to_vec();
        v.push(0x44); // top bits 01 => MPEG-2 pack header
        v.extend_from_slice(&[0u8; 9]); // remaining 9 bytes of the 10-byte mux-rate/clock fields
        v.push(0x00); // stuffing length = 0
        v
    }

    fn private_stream_1_packet(substream_id: u8, body: &[u8]) -> Vec<u8> {
        let mut payload = vec![0x80, 0x00]; // flags (no PTS), header_data_length = 0
        payload.push(substream_id);
        payload.extend_from_slice(body);

        let mut packet = vec![0x00, 0x00, 0x01, 0xBD];
        packet.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        packet.extend_from_slice(&payload);
        packet
    }

    #[test]
    fn extracts_single_spu_fragment() {
        let mut vob = pack_header();
        vob.extend_from_slice(&private_stream_1_packet(0x20, b"hello"));
        let fragments = demux_spu_fragments(&vob);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].substream_id, 0x20);
        assert_eq!(fragments[0].bytes, b"hello");
    }

    #[test]
    fn ignores_substream_outside_spu_range() {
        let mut vob = pack_header();
        vob.extend_from_slice(&private_stream_1_packet(0x80, b"audio track"));
        assert!(demux_spu_fragments(&vob).is_empty());
    }

    #[test]
    fn skips_video_packets_by_declared_length() {
        let mut vob = pack_header();
        let mut video_packet = vec![0x00, 0x00, 0x01, 0xE0];
        video_packet.extend_from_slice(&10u16.to_be_bytes());
        video_packet.extend_from_slice(&[0xAA; 10]);
        vob.extend_from_slice(&video_packet);
        vob.extend_from_slice(&private_stream_1_packet(0x21, b"after video"));

        let fragments = demux_spu_fragments(&vob);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].bytes, b"after video");
    }

    #[test]
    fn truncated_tail_stops_cleanly() {
        let mut vob = pack_header();
        vob.extend_from_slice(&[0x00, 0x00, 0x01, 0xBD, 0xFF]); // declares a huge length, truncated
        assert!(demux_spu_fragments(&vob).is_empty());
    }

    #[test]
    fn empty_buffer_yields_no_fragments() {
        assert!(demux_spu_fragments(&[]).is_empty());
    }

    #[test]
    fn idempotent_on_repeated_parse() {
        let mut vob = pack_header();
        vob.extend_from_slice(&private_stream_1_packet(0x20, b"abc"));
        vob.extend_from_slice(&private_stream_1_packet(0x21, b"def"));
        let first: Vec<_> = demux_spu_fragments(&vob)
            .iter()
            .map(|f| (f.substream_id, f.bytes.to_vec()))
            .collect();
        let second: Vec<_> = demux_spu_fragments(&vob)
            .iter()
            .map(|f| (f.substream_id, f.bytes.to_vec()))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn resyncs_past_garbage_bytes() {
        let mut vob = pack_header();
        vob.extend_from_slice(&[0x12, 0x34, 0x56]); // garbage, not a start code
        vob.extend_from_slice(&private_stream_1_packet(0x22, b"resynced"));
        let fragments = demux_spu_fragments(&vob);
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].bytes, b"resynced");
    }
}
