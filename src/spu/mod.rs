//! SPU decoding (§4.3): wires control-sequence parsing and RLE bitmap decoding together over a
//! reassembled packet stream, dropping any packet that fails either half rather than aborting
//! the menu.

pub mod control;
pub mod reassemble;
pub mod rle;

pub use control::SpuControl;
pub use reassemble::{reassemble_spu_packets, SpuPacket};
pub use rle::SpuBitmap;

use crate::error::Result;
use log::warn;

/// One fully decoded menu-flagged SPU packet: its control metadata and expanded bitmap.
#[derive(Debug, Clone)]
pub struct DecodedSpu {
    pub control: SpuControl,
    pub bitmap: SpuBitmap,
}

/// Parses and decodes a single reassembled packet end to end.
pub fn decode_packet(packet: &SpuPacket) -> Result<DecodedSpu> {
    let control = control::parse_control(&packet.raw_bytes, packet.control_offset)?;
    let bitmap = rle::decode_bitmap(&packet.raw_bytes, &control, packet.control_offset)?;
    Ok(DecodedSpu { control, bitmap })
}

/// Decodes every packet in disc order, keeping positional alignment with `packets` by emitting
/// `None` for any packet that fails control parsing or RLE decoding (§4.3, §7: packet dropped,
/// processing continues).
pub fn decode_all(packets: &[SpuPacket]) -> Vec<Option<DecodedSpu>> {
    packets
        .iter()
        .enumerate()
        .map(|(i, packet)| match decode_packet(packet) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(
                    "dropping SPU packet {i} (substream {:#x}): {e}",
                    packet.substream_id
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ps_demux::SubstreamFragment;

    fn build_menu_packet() -> Vec<u8> {
        // control_offset placed after 4 bytes of bitmap data.
        let control_offset = 8usize;
        let mut commands = vec![0x00u8]; // force display
        commands.push(0x05); // display area: x1=0 x2=1 y1=0 y2=1
        commands.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x10, 0x01]);
        commands.push(0x06); // field offsets
        commands.extend_from_slice(&[0x00, 0x04, 0x00, 0x06]);
        commands.push(0xFF);

        let mut seq = vec![0x00, 0x00]; // delay
        seq.extend_from_slice(&(control_offset as u16).to_be_bytes()); // self-referencing end
        seq.extend_from_slice(&commands);

        let mut body = vec![0u8; control_offset];
        // field1 at offset 4: single fill token (4-bit code, run=0 invalid for 4-bit; use 16-bit
        // form nibbles 0,0,0,1 at bytes [4,5])
        body[4] = 0x00;
        body[5] = 0x01;
        // field2 at offset 6: nibbles 0,0,0,2 at bytes [6,7]
        body[6] = 0x00;
        body[7] = 0x02;
        body.extend_from_slice(&seq);

        let total_size = body.len();
        let mut packet = vec![0u8; 4];
        packet[0..2].copy_from_slice(&(total_size as u16).to_be_bytes());
        packet[2..4].copy_from_slice(&(control_offset as u16).to_be_bytes());
        packet.truncate(0);
        packet.extend_from_slice(&(total_size as u16).to_be_bytes());
        packet.extend_from_slice(&(control_offset as u16).to_be_bytes());
        packet.extend_from_slice(&body[4..]);
        packet
    }

    #[test]
    fn decodes_well_formed_packet_end_to_end() {
        let raw = build_menu_packet();
        let fragments = vec![SubstreamFragment {
            substream_id: 0x20,
            bytes: &raw,
        }];
        let packets = reassemble_spu_packets(&fragments);
        assert_eq!(packets.len(), 1);
        let decoded = decode_packet(&packets[0]).unwrap();
        assert!(decoded.control.is_menu);
        assert_eq!(decoded.bitmap.width, 2);
        assert_eq!(decoded.bitmap.height, 2);
    }

    #[test]
    fn malformed_control_drops_packet_but_keeps_position() {
        // A packet with a bogus control_offset (no menu flag reachable) should yield `None`.
        let total_size = 10u16;
        let control_offset = 8u16;
        let mut raw = vec![0u8; total_size as usize];
        raw[0..2].copy_from_slice(&total_size.to_be_bytes());
        raw[2..4].copy_from_slice(&control_offset.to_be_bytes());
        // no valid commands at all; sequence just terminates immediately without force-display
        raw[8] = 0x00;
        raw[9] = 0x00;
        let packet = SpuPacket {
            substream_id: 0x20,
            raw_bytes: raw,
            total_size: total_size as usize,
            control_offset: control_offset as usize,
        };
        let results = decode_all(&[packet]);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_none());
    }
}
