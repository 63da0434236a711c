//! Static address map: effect table locations, speed byte encoding, key names.

use aula_ctl_core::{Error, Result};

/// Location of an effect's brightness/speed byte pair inside the config message.
///
/// `offset` is an absolute frame offset; the brightness byte sits at `offset`
/// and the speed byte at `offset + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectSlot {
    pub seq: usize,
    pub offset: usize,
}

impl EffectSlot {
    #[inline]
    pub fn brightness(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn speed(&self) -> usize {
        self.offset + 1
    }
}

/// Locate the brightness/speed pair for effect `n`.
///
/// Effects 1-6 live in fragment 4, 7-13 in fragment 5 and 14-18 in fragment 6.
/// Any other number, self-define (21) included, yields `(4, 7)`; callers that
/// handle self-define must not write through this slot.
pub fn effect_slot(n: u8) -> EffectSlot {
    let (seq, offset) = match n {
        1..=6 => (4, 7 + (n as usize - 1) * 2),
        7..=13 => (5, 5 + (n as usize - 7) * 2),
        14..=18 => (6, 5 + (n as usize - 14) * 2),
        _ => (4, 7),
    };
    EffectSlot { seq, offset }
}

const COLORFUL: u8 = 0x07;

/// High nibble = speed, low nibble = 0x7 (colorful) or 0x0 (single color)
#[inline]
pub fn encode_speed(speed: u8, colorful: bool) -> u8 {
    (speed << 4) | if colorful { COLORFUL } else { 0x00 }
}

/// Split a speed byte into `(speed, colorful)`
#[inline]
pub fn decode_speed(byte: u8) -> (u8, bool) {
    ((byte >> 4) & 0x0F, byte & 0x0F == COLORFUL)
}

/// Built-in lighting effect description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectInfo {
    pub name: &'static str,
    /// Accepts a speed setting
    pub speed: bool,
    /// Accepts a single custom color, otherwise colorful only
    pub color: bool,
}

const fn effect(name: &'static str, speed: bool, color: bool) -> EffectInfo {
    EffectInfo { name, speed, color }
}

/// Built-in effects, indexed by effect number - 1
pub static EFFECTS: [EffectInfo; 18] = [
    effect("Fixed on", false, true),
    effect("Respire", true, true),
    effect("Rainbow", true, false),
    effect("Flash away", true, true),
    effect("Raindrops", true, true),
    effect("Rainbow wheel", true, false),
    effect("Ripples shining", true, true),
    effect("Stars twinkle", true, true),
    effect("Shadow disappear", true, true),
    effect("Retro snake", true, true),
    effect("Neon stream", true, false),
    effect("Reaction", true, true),
    effect("Sine wave", true, true),
    effect("Retinue scanning", true, true),
    effect("Rotating windmill", true, false),
    effect("Colorful waterfall", true, false),
    effect("Blossoming", true, true),
    effect("Rotating storm", true, false),
];

/// Name of effect `n`, if it is a known mode
pub fn effect_name(n: u8) -> Option<&'static str> {
    match n {
        1..=18 => Some(EFFECTS[n as usize - 1].name),
        crate::abi::SELF_DEFINE_EFFECT => Some("Self-define"),
        _ => None,
    }
}

/// Number of LED zones addressed by the per-key map
pub const LED_COUNT: usize = 102;

/// Key name to LED index, in physical row order
pub static KEY_NAMES: &[(&str, u8)] = &[
    // function row
    ("esc", 0),
    ("f1", 12),
    ("f2", 18),
    ("f3", 24),
    ("f4", 30),
    ("f5", 36),
    ("f6", 42),
    ("f7", 48),
    ("f8", 54),
    ("f9", 60),
    ("f10", 66),
    ("f11", 72),
    ("f12", 78),
    ("prtsc", 84),
    ("scrlk", 90),
    ("pause", 96),
    // number row
    ("`", 1),
    ("1", 7),
    ("2", 13),
    ("3", 19),
    ("4", 25),
    ("5", 31),
    ("6", 37),
    ("7", 43),
    ("8", 49),
    ("9", 55),
    ("0", 61),
    ("-", 67),
    ("=", 73),
    ("bksp", 79),
    ("ins", 85),
    ("home", 91),
    ("pgup", 97),
    // qwerty row
    ("tab", 2),
    ("q", 8),
    ("w", 14),
    ("e", 20),
    ("r", 26),
    ("t", 32),
    ("y", 38),
    ("u", 44),
    ("i", 50),
    ("o", 56),
    ("p", 62),
    ("[", 68),
    ("]", 74),
    ("\\", 80),
    ("del", 86),
    ("end", 92),
    ("pgdn", 98),
    // home row
    ("caps", 3),
    ("a", 9),
    ("s", 15),
    ("d", 21),
    ("f", 27),
    ("g", 33),
    ("h", 39),
    ("j", 45),
    ("k", 51),
    ("l", 57),
    (";", 63),
    ("'", 69),
    ("enter", 81),
    // shift row
    ("lshift", 4),
    ("z", 10),
    ("x", 16),
    ("c", 22),
    ("v", 28),
    ("b", 34),
    ("n", 40),
    ("m", 46),
    (",", 52),
    (".", 58),
    ("/", 64),
    ("rshift", 82),
    ("up", 94),
    // bottom row
    ("lctrl", 5),
    ("lwin", 11),
    ("lalt", 17),
    ("space", 35),
    ("ralt", 53),
    ("fn", 59),
    ("app", 65),
    ("rctrl", 83),
    ("left", 89),
    ("down", 95),
    ("right", 101),
];

/// Named key groups, each expanding to key names in order
pub static KEY_GROUPS: &[(&str, &[&str])] = &[
    ("wasd", &["w", "a", "s", "d"]),
    ("arrows", &["up", "down", "left", "right"]),
    (
        "fkeys",
        &["f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12"],
    ),
    ("numrow", &["1", "2", "3", "4", "5", "6", "7", "8", "9", "0"]),
];

/// LED index of a single key name (case-insensitive)
pub fn key_index(name: &str) -> Result<u8> {
    let name = name.trim().to_lowercase();
    KEY_NAMES
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, idx)| *idx)
        .ok_or(Error::UnknownKey(name))
}

/// Key names of a group (case-insensitive)
pub fn group_expand(name: &str) -> Result<&'static [&'static str]> {
    let name = name.trim().to_lowercase();
    KEY_GROUPS
        .iter()
        .find(|(group, _)| *group == name)
        .map(|(_, keys)| *keys)
        .ok_or(Error::UnknownKey(name))
}

/// Resolve a group or key name into LED indices. Groups take precedence.
pub fn resolve_keys(name: &str) -> Result<Vec<u8>> {
    match group_expand(name) {
        Ok(keys) => keys.iter().map(|key| key_index(key)).collect(),
        Err(_) => key_index(name).map(|idx| vec![idx]),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn effect_slot_table() {
        assert_eq!(effect_slot(1), EffectSlot { seq: 4, offset: 7 });
        assert_eq!(effect_slot(6), EffectSlot { seq: 4, offset: 17 });
        assert_eq!(effect_slot(7), EffectSlot { seq: 5, offset: 5 });
        assert_eq!(effect_slot(13), EffectSlot { seq: 5, offset: 17 });
        assert_eq!(effect_slot(14), EffectSlot { seq: 6, offset: 5 });
        assert_eq!(effect_slot(18), EffectSlot { seq: 6, offset: 13 });
    }

    #[test]
    fn effect_slot_is_injective() {
        let slots: HashSet<_> = (1..=18).map(|n| (effect_slot(n).seq, effect_slot(n).offset)).collect();
        assert_eq!(slots.len(), 18);
        for n in 1..=18 {
            let slot = effect_slot(n);
            // both bytes of the pair fit inside the payload region
            assert!(slot.brightness() >= 4 && slot.speed() <= 18, "effect {n}");
        }
    }

    #[test]
    fn effect_slot_fallback() {
        assert_eq!(effect_slot(21), EffectSlot { seq: 4, offset: 7 });
        assert_eq!(effect_slot(0), EffectSlot { seq: 4, offset: 7 });
        assert_eq!(effect_slot(19), effect_slot(1));
    }

    #[test]
    fn speed_roundtrip() {
        for speed in 0..=4 {
            for colorful in [true, false] {
                assert_eq!(decode_speed(encode_speed(speed, colorful)), (speed, colorful));
            }
        }
        assert_eq!(encode_speed(3, true), 0x37);
        assert_eq!(encode_speed(2, false), 0x20);
    }

    #[test]
    fn key_map_is_unique_and_in_range() {
        let names: HashSet<_> = KEY_NAMES.iter().map(|(n, _)| *n).collect();
        let indices: HashSet<_> = KEY_NAMES.iter().map(|(_, i)| *i).collect();
        assert_eq!(names.len(), KEY_NAMES.len());
        assert_eq!(indices.len(), KEY_NAMES.len());
        assert!(indices.iter().all(|i| (*i as usize) < LED_COUNT));
    }

    #[test]
    fn keys_and_groups() {
        assert_eq!(key_index("esc").unwrap(), 0);
        assert_eq!(key_index("RIGHT").unwrap(), 101);
        assert!(matches!(key_index("hyper"), Err(Error::UnknownKey(k)) if k == "hyper"));
        assert_eq!(group_expand("wasd").unwrap(), &["w", "a", "s", "d"]);
        assert_eq!(resolve_keys("arrows").unwrap(), vec![94, 95, 89, 101]);
        assert_eq!(resolve_keys("q").unwrap(), vec![8]);
        assert!(resolve_keys("nope").is_err());
        // every group member is a known key
        for (_, keys) in KEY_GROUPS {
            for key in *keys {
                assert!(key_index(key).is_ok(), "{key}");
            }
        }
    }

    #[test]
    fn effect_names() {
        assert_eq!(effect_name(3), Some("Rainbow"));
        assert_eq!(effect_name(21), Some("Self-define"));
        assert_eq!(effect_name(19), None);
    }
}
