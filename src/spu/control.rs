//! SPU control-sequence parsing (§4.3, control half).
//!
//! Walks the date-delayed control sub-sequences starting at a packet's `control_offset`,
//! recovering the menu flag, display rectangle, and bitmap field offsets. Grounded in the
//! control-command layout also implemented by `libbitsub`'s VobSub parser (commands `0x00`
//! through `0x06`, `0xFF` terminator), adapted to stop per §4.3 on any unknown command rather
//! than skipping it.

use crate::error::{Error, ErrorDetails, Result};
use crate::types::Rect;
use log::debug;

/// Parsed control sequence of one SPU packet: menu flag, display rectangle, and field offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpuControl {
    pub display_rect: Rect,
    pub field1_offset: usize,
    pub field2_offset: usize,
    pub is_menu: bool,
}

const CMD_FORCE_DISPLAY: u8 = 0x00;
const CMD_START_DISPLAY: u8 = 0x01;
const CMD_STOP_DISPLAY: u8 = 0x02;
const CMD_SET_PALETTE: u8 = 0x03;
const CMD_SET_ALPHA: u8 = 0x04;
const CMD_SET_DISPLAY_AREA: u8 = 0x05;
const CMD_SET_FIELD_OFFSETS: u8 = 0x06;
const CMD_END: u8 = 0xFF;

/// Parses the control sequence of a raw SPU packet.
///
/// `raw_bytes` is the packet's full byte range (header included); `control_offset` is the
/// packet's declared control-sequence start, already validated by the reassembler to be within
/// bounds.
pub fn parse_control(raw_bytes: &[u8], control_offset: usize) -> Result<SpuControl> {
    let mut is_menu = false;
    let mut display_rect: Option<Rect> = None;
    let mut field1_offset: Option<usize> = None;
    let mut field2_offset: Option<usize> = None;

    let mut seq_offset = control_offset;
    let mut visited = std::collections::HashSet::new();

    loop {
        if !visited.insert(seq_offset) {
            break; // guards against a malformed next-offset cycle
        }
        if seq_offset + 4 > raw_bytes.len() {
            break;
        }
        let _delay = u16::from_be_bytes([raw_bytes[seq_offset], raw_bytes[seq_offset + 1]]);
        let next_offset = u16::from_be_bytes([
            raw_bytes[seq_offset + 2],
            raw_bytes[seq_offset + 3],
        ]) as usize;

        let mut cursor = seq_offset + 4;
        loop {
            if cursor >= raw_bytes.len() {
                break;
            }
            let cmd = raw_bytes[cursor];
            cursor += 1;
            match cmd {
                CMD_FORCE_DISPLAY => {
                    is_menu = true;
                }
                CMD_START_DISPLAY | CMD_STOP_DISPLAY => {
                    // Ignored for menus: the bitmap is treated as static (§4.3).
                }
                CMD_SET_PALETTE => {
                    if cursor + 2 > raw_bytes.len() {
                        break;
                    }
                    cursor += 2;
                }
                CMD_SET_ALPHA => {
                    if cursor + 2 > raw_bytes.len() {
                        break;
                    }
                    cursor += 2;
                }
                CMD_SET_DISPLAY_AREA => {
                    if cursor + 6 > raw_bytes.len() {
                        break;
                    }
                    let b = &raw_bytes[cursor..cursor + 6];
                    let x1 = ((b[0] as i32) << 4) | ((b[1] >> 4) as i32);
                    let x2 = (((b[1] & 0x0F) as i32) << 8) | (b[2] as i32);
                    let y1 = ((b[3] as i32) << 4) | ((b[4] >> 4) as i32);
                    let y2 = (((b[4] & 0x0F) as i32) << 8) | (b[5] as i32);
                    display_rect = Some(Rect::new(x1, y1, x2, y2));
                    cursor += 6;
                }
                CMD_SET_FIELD_OFFSETS => {
                    if cursor + 4 > raw_bytes.len() {
                        break;
                    }
                    let b = &raw_bytes[cursor..cursor + 4];
                    field1_offset = Some(u16::from_be_bytes([b[0], b[1]]) as usize);
                    field2_offset = Some(u16::from_be_bytes([b[2], b[3]]) as usize);
                    cursor += 4;
                }
                CMD_END => break,
                unknown => {
                    debug!("unknown SPU control command {unknown:#x} at offset {cursor}, stopping sub-sequence");
                    break;
                }
            }
            if cmd == CMD_END {
                break;
            }
        }

        if next_offset <= seq_offset || next_offset >= raw_bytes.len() {
            break;
        }
        seq_offset = next_offset;
    }

    if !is_menu {
        return Err(Error::at(
            control_offset,
            ErrorDetails::UnsupportedPacket("missing force-display (menu) flag".into()),
        ));
    }
    let display_rect = display_rect.ok_or_else(|| {
        Error::at(
            control_offset,
            ErrorDetails::UnsupportedPacket("missing display rectangle (command 0x05)".into()),
        )
    })?;
    let (field1_offset, field2_offset) = match (field1_offset, field2_offset) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            return Err(Error::at(
                control_offset,
                ErrorDetails::UnsupportedPacket("missing bitmap field offsets (command 0x06)".into()),
            ))
        }
    };
    if display_rect.width() <= 0 || display_rect.height() <= 0 {
        return Err(Error::at(
            control_offset,
            ErrorDetails::UnsupportedPacket("empty display rectangle".into()),
        ));
    }
    if field1_offset >= control_offset || field2_offset >= control_offset {
        return Err(Error::at(
            control_offset,
            ErrorDetails::UnsupportedPacket("field offset does not precede control offset".into()),
        ));
    }

    Ok(SpuControl {
        display_rect,
        field1_offset,
        field2_offset,
        is_menu,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_packet(control_offset: usize, commands: &[u8]) -> Vec<u8> {
        let mut v = vec![0u8; control_offset];
        v.extend_from_slice(&[0x00, 0x00]); // delay
        let next_offset = control_offset as u16; // self-reference => end of chain
        v.extend_from_slice(&next_offset.to_be_bytes());
        v.extend_from_slice(commands);
        v
    }

    #[test]
    fn parses_menu_flag_rect_and_offsets() {
        let mut commands = vec![CMD_FORCE_DISPLAY];
        // display area: x1=10 x2=20 y1=30 y2=40 packed as 12-bit fields
        commands.push(CMD_SET_DISPLAY_AREA);
        commands.extend_from_slice(&[0x00, 0xA1, 0x40, 0x02, 0xE0, 0x28]);
        commands.push(CMD_SET_FIELD_OFFSETS);
        commands.extend_from_slice(&[0x00, 0x04, 0x00, 0x08]);
        commands.push(CMD_END);

        let packet = build_packet(20, &commands);
        let ctrl = parse_control(&packet, 20).unwrap();
        assert!(ctrl.is_menu);
        assert_eq!(ctrl.field1_offset, 4);
        assert_eq!(ctrl.field2_offset, 8);
        assert_eq!(ctrl.display_rect.x1, 10);
        assert_eq!(ctrl.display_rect.x2, 20);
        assert_eq!(ctrl.display_rect.y1, 30);
        assert_eq!(ctrl.display_rect.y2, 40);
    }

    #[test]
    fn missing_menu_flag_is_rejected() {
        let mut commands = vec![CMD_SET_DISPLAY_AREA];
        commands.extend_from_slice(&[0x00, 0xA1, 0x40, 0x02, 0xE0, 0x28]);
        commands.push(CMD_SET_FIELD_OFFSETS);
        commands.extend_from_slice(&[0x00, 0x04, 0x00, 0x08]);
        commands.push(CMD_END);
        let packet = build_packet(20, &commands);
        assert!(parse_control(&packet, 20).is_err());
    }

    #[test]
    fn missing_rect_is_rejected() {
        let commands = vec![CMD_FORCE_DISPLAY, CMD_END];
        let packet = build_packet(20, &commands);
        assert!(parse_control(&packet, 20).is_err());
    }

    #[test]
    fn unknown_command_stops_subsequence_without_panicking() {
        let mut commands = vec![CMD_FORCE_DISPLAY];
        commands.push(CMD_SET_DISPLAY_AREA);
        commands.extend_from_slice(&[0x00, 0xA1, 0x40, 0x02, 0xE0, 0x28]);
        commands.push(0x07); // unknown command
        commands.push(CMD_SET_FIELD_OFFSETS);
        commands.extend_from_slice(&[0x00, 0x04, 0x00, 0x08]);
        let packet = build_packet(20, &commands);
        // Field offsets never get parsed because the unknown command halted the subsequence.
        assert!(parse_control(&packet, 20).is_err());
    }
}
