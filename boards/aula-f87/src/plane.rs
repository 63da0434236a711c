//! Palette and per-key color map encoders.

use crate::abi::{self, arity};
use crate::frame::Frame;
use crate::templates::{self, Payload};
use crate::types::Rgb;

/// Palette payloads for all 37 fragments.
///
/// With a custom color, fragment 1 carries it at payload offsets 8-10 and
/// sets the enable flag at offset 12. Everything else is the factory palette.
pub fn build_palette(custom: Option<Rgb>) -> Vec<Payload> {
    (0..arity::PALETTE)
        .map(|seq| {
            let mut payload = templates::palette(seq);
            if let (1, Some(Rgb { r, g, b })) = (seq, custom) {
                payload[8] = r;
                payload[9] = g;
                payload[10] = b;
                payload[12] = 0xFF;
            }
            payload
        })
        .collect()
}

/// Palette payloads wrapped in COLOR/PALETTE frames
pub fn palette_frames(custom: Option<Rgb>) -> Vec<Frame> {
    build_palette(custom)
        .iter()
        .enumerate()
        .map(|(seq, payload)| abi::palette(seq as u8, payload))
        .collect()
}

/// Entries per color plane
pub const PLANE_LEN: usize = 126;
/// Plane entries carried by one fragment
const ENTRIES_PER_FRAGMENT: usize = 14;
/// Marker in payload byte 0 of every plane fragment
const PLANE_MARKER: u8 = 0x0E;

/// Three planes of per-LED channel values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorPlane {
    pub r: [u8; PLANE_LEN],
    pub g: [u8; PLANE_LEN],
    pub b: [u8; PLANE_LEN],
}

impl Default for ColorPlane {
    fn default() -> Self {
        Self {
            r: [0; PLANE_LEN],
            g: [0; PLANE_LEN],
            b: [0; PLANE_LEN],
        }
    }
}

impl ColorPlane {
    /// Scatter `(led_index, color)` pairs; indices beyond the planes are ignored
    pub fn from_colors<'a>(colors: impl IntoIterator<Item = (&'a u8, &'a Rgb)>) -> Self {
        let mut plane = Self::default();
        for (&idx, &color) in colors {
            plane.set(idx as usize, color);
        }
        plane
    }

    pub fn set(&mut self, idx: usize, color: Rgb) {
        if idx < PLANE_LEN {
            self.r[idx] = color.r;
            self.g[idx] = color.g;
            self.b[idx] = color.b;
        }
    }

    /// Serialize as R (seq 0-8), G (9-17), B (18-26) and the trailer (27)
    pub fn to_frames(&self) -> Vec<Frame> {
        let mut frames: Vec<Frame> = [&self.r, &self.g, &self.b]
            .into_iter()
            .flat_map(|channel| channel.chunks(ENTRIES_PER_FRAGMENT))
            .enumerate()
            .map(|(seq, chunk)| {
                let mut payload = [0u8; 15];
                payload[0] = PLANE_MARKER;
                payload[1..=ENTRIES_PER_FRAGMENT].copy_from_slice(chunk);
                abi::perkey(seq as u8, &payload)
            })
            .collect();
        frames.push(abi::perkey(frames.len() as u8, &TRAILER));
        debug_assert_eq!(frames.len(), arity::PERKEY);
        frames
    }
}

/// Closing per-key payload
const TRAILER: [u8; 5] = [0x06, 0x00, 0x00, 0x5A, 0xA5];

/// Per-key color map frames for `key_colors` (LED index to color)
pub fn build_perkey<'a>(key_colors: impl IntoIterator<Item = (&'a u8, &'a Rgb)>) -> Vec<Frame> {
    ColorPlane::from_colors(key_colors).to_frames()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn default_palette_is_factory() {
        let palette = build_palette(None);
        assert_eq!(palette.len(), 37);
        for (seq, payload) in palette.iter().enumerate() {
            assert_eq!(*payload, templates::palette(seq));
        }
    }

    #[test]
    fn custom_palette_touches_only_slot() {
        let factory = build_palette(None);
        let custom = build_palette(Some(Rgb::new(255, 0, 0)));
        for seq in 0..37 {
            for offset in 0..15 {
                let touched = seq == 1 && [8, 9, 10, 12].contains(&offset);
                if !touched {
                    assert_eq!(custom[seq][offset], factory[seq][offset], "{seq}:{offset}");
                }
            }
        }
        assert_eq!(&custom[1][8..11], &[255, 0, 0]);
        assert_eq!(custom[1][12], 0xFF);
    }

    #[test]
    fn palette_frames_are_sequenced() {
        let frames = palette_frames(None);
        assert_eq!(frames.len(), 37);
        for (seq, frame) in frames.iter().enumerate() {
            assert_eq!(frame.seq() as usize, seq);
            assert_eq!(frame.cmd(), abi::cmd::COLOR);
            assert_eq!(frame.subcmd(), abi::subcmd::PALETTE);
        }
    }

    #[test]
    fn perkey_single_key() {
        let colors = BTreeMap::from([(5u8, Rgb::new(10, 20, 30))]);
        let frames = build_perkey(&colors);
        assert_eq!(frames.len(), 28);
        assert_eq!(frames[0].payload()[1 + 5], 10);
        assert_eq!(frames[9].payload()[1 + 5], 20);
        assert_eq!(frames[18].payload()[1 + 5], 30);

        for (seq, frame) in frames.iter().enumerate().take(27) {
            assert_eq!(frame.seq() as usize, seq);
            assert_eq!(frame.cmd(), abi::cmd::PERKEY);
            assert_eq!(frame.subcmd(), abi::subcmd::PERKEY);
            assert_eq!(frame.payload()[0], 0x0E);
            for (i, value) in frame.payload()[1..].iter().enumerate() {
                if !(seq % 9 == 0 && i == 5) {
                    assert_eq!(*value, 0, "seq {seq} entry {i}");
                }
            }
        }

        let trailer = frames[27];
        assert_eq!(trailer.seq(), 27);
        assert_eq!(
            trailer.payload(),
            &[0x06, 0x00, 0x00, 0x5A, 0xA5, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn perkey_ignores_out_of_range() {
        let colors = BTreeMap::from([(200u8, Rgb::new(1, 2, 3)), (125, Rgb::new(4, 5, 6))]);
        let frames = build_perkey(&colors);
        // index 125 is the last entry of the last fragment of each plane
        assert_eq!(frames[8].payload()[14], 4);
        assert_eq!(frames[17].payload()[14], 5);
        assert_eq!(frames[26].payload()[14], 6);
        let plane = ColorPlane::from_colors(&colors);
        assert_eq!(plane.r.iter().filter(|v| **v != 0).count(), 1);
    }
}
