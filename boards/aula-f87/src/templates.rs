//! Factory default payloads, as written by the vendor software on reset.

use crate::abi::arity;

pub type Payload = [u8; 15];

/// Config payloads, fragments 0-9.
///
/// Fragment 0 selects effect 3 (rainbow) with the built-in colors, fragment 1
/// carries a 5 minute sleep timer and fragments 4-6 hold the brightness/speed
/// pair of every effect (brightness 4, speed 3, colorful).
pub static CONFIG: [Payload; arity::CONFIG] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x00, 0x03, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x04, 0x37, 0x04, 0x37, 0x04, 0x37, 0x04, 0x37, 0x04, 0x37, 0x04, 0x37],
    [0x00, 0x04, 0x37, 0x04, 0x37, 0x04, 0x37, 0x04, 0x37, 0x04, 0x37, 0x04, 0x37, 0x04, 0x37],
    [0x00, 0x04, 0x37, 0x04, 0x37, 0x04, 0x37, 0x04, 0x37, 0x04, 0x37, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
];

/// Leading palette payloads: the preset color list and the custom color slot.
///
/// Fragment 1 offsets 8-10 hold the custom RGB and offset 12 its enable flag.
pub static PALETTE_HEAD: [Payload; 2] = [
    [0x06, 0xFF, 0x00, 0x00, 0xFF, 0x80, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00],
    [0x00, 0xFF, 0xFF, 0x00, 0x00, 0xFF, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00],
];

/// Filler for palette fragments 2-35
pub static PALETTE_ZEROS: Payload = [0; 15];

/// Closing palette payload, fragment 36
pub static PALETTE_LAST: Payload =
    [0x06, 0x00, 0x00, 0x5A, 0xA5, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

/// Factory palette payload for fragment `seq`
pub fn palette(seq: usize) -> Payload {
    match seq {
        s if s < PALETTE_HEAD.len() => PALETTE_HEAD[s],
        s if s == arity::PALETTE - 1 => PALETTE_LAST,
        _ => PALETTE_ZEROS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{decode_speed, effect_slot};

    #[test]
    fn config_effect_table_defaults() {
        for n in 1..=18 {
            let slot = effect_slot(n);
            let payload = &CONFIG[slot.seq];
            assert_eq!(payload[slot.brightness() - 4], 4, "effect {n}");
            assert_eq!(decode_speed(payload[slot.speed() - 4]), (3, true), "effect {n}");
        }
    }

    #[test]
    fn palette_layout() {
        assert_eq!(palette(0), PALETTE_HEAD[0]);
        assert_eq!(palette(1), PALETTE_HEAD[1]);
        assert_eq!(palette(2), PALETTE_ZEROS);
        assert_eq!(palette(35), PALETTE_ZEROS);
        assert_eq!(palette(36), PALETTE_LAST);
        // custom slot disabled by default
        assert_eq!(palette(1)[12], 0x00);
    }
}
