//! Command bytes, config field offsets and fixed command frames.

use crate::frame::Frame;

/// Report id carried in byte 0 of every frame
pub const REPORT_ID: u8 = 0x13;

/// Command identifiers (byte 1)
pub mod cmd {
    /// Request / response of the config message
    pub const READ: u8 = 0x44;
    /// Config message write
    pub const WRITE: u8 = 0x04;
    /// Color palette write
    pub const COLOR: u8 = 0x09;
    /// Per-key color map write
    pub const PERKEY: u8 = 0x02;
    /// Commit to flash
    pub const SAVE: u8 = 0x0A;
}

/// Sub-command identifiers (byte 2)
pub mod subcmd {
    pub const CONFIG: u8 = 0x0A;
    pub const PALETTE: u8 = 0x25;
    pub const PERKEY: u8 = 0x1C;
    pub const CONFIRM: u8 = 0x01;
}

/// Absolute frame offsets of the known config fields
pub mod field {
    /// Fragment 0: write/confirm flag
    pub const WRITE_FLAG: usize = 8;
    /// Fragment 0: cleared when selecting an effect
    pub const EFFECT_AUX: usize = 14;
    /// Fragment 0: active effect number
    pub const EFFECT: usize = 15;
    /// Fragment 0: color mode
    pub const COLOR_MODE: usize = 17;
    /// Fragment 1: sleep timer (minutes * 2)
    pub const SLEEP: usize = 15;

    /// Fragment holding the effect selection
    pub const EFFECT_SEQ: usize = 0;
    /// Fragment holding the sleep timer
    pub const SLEEP_SEQ: usize = 1;
}

/// Values written to [`field::COLOR_MODE`]
pub mod color_mode {
    /// Custom color or colorful mode requested
    pub const CUSTOM: u8 = 0x01;
    /// Effect's built-in colors
    pub const DEFAULT: u8 = 0x03;
}

/// Fragments in each logical message
pub mod arity {
    pub const CONFIG: usize = 10;
    pub const PALETTE: usize = 37;
    pub const PERKEY: usize = 28;
}

/// Effect number of the per-key "self-define" mode
pub const SELF_DEFINE_EFFECT: u8 = 21;

/// Request the 10 config fragments
pub fn read_config() -> Frame {
    Frame::build(cmd::READ, subcmd::CONFIRM, 0, &[0; 15])
}

/// Commit the written state
pub fn save() -> Frame {
    Frame::build(cmd::SAVE, subcmd::CONFIRM, 0, &[0x04, 0x07])
}

/// Config fragment built from a 15-byte payload
pub fn config(seq: u8, payload: &[u8]) -> Frame {
    Frame::build(cmd::WRITE, subcmd::CONFIG, seq, payload)
}

/// Palette fragment built from a 15-byte payload
pub fn palette(seq: u8, payload: &[u8]) -> Frame {
    Frame::build(cmd::COLOR, subcmd::PALETTE, seq, payload)
}

/// Per-key color map fragment built from a 15-byte payload
pub fn perkey(seq: u8, payload: &[u8]) -> Frame {
    Frame::build(cmd::PERKEY, subcmd::PERKEY, seq, payload)
}

/// True for a config fragment returned by the keyboard after [`read_config`]
pub fn is_config_response(frame: &Frame) -> bool {
    frame.report_id() == REPORT_ID && frame.cmd() == cmd::READ && frame.subcmd() == subcmd::CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_frame_bytes() {
        let frame = save();
        assert_eq!(
            frame.as_bytes(),
            &[0x13, 0x0A, 0x01, 0x00, 0x04, 0x07, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x29]
        );
    }

    #[test]
    fn read_request_bytes() {
        let frame = read_config();
        assert_eq!(frame.cmd(), cmd::READ);
        assert_eq!(frame.subcmd(), subcmd::CONFIRM);
        assert_eq!(frame.payload(), &[0; 15]);
        assert_eq!(frame.checksum(), 0x13 + 0x44 + 0x01);
    }

    #[test]
    fn config_response_filter() {
        let response = Frame::build(cmd::READ, subcmd::CONFIG, 4, &[]);
        assert!(is_config_response(&response));
        assert!(!is_config_response(&read_config()));
        assert!(!is_config_response(&config(4, &[])));
    }
}
