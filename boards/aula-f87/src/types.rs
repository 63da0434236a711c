//! Validated parameter types.

use std::fmt;
use std::str::FromStr;

use aula_ctl_core::{Error, Result};

use crate::layout::EFFECTS;

/// 24-bit color
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = Error;

    /// Parse `#RRGGBB` or `RRGGBB`
    fn from_str(code: &str) -> Result<Self> {
        let hex = code.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(code.to_string()));
        }
        let channel_bytes =
            u32::from_str_radix(hex, 16).map_err(|_| Error::InvalidColor(code.to_string()))?;
        Ok(Self {
            r: ((channel_bytes >> 16) & 0xFF) as u8,
            g: ((channel_bytes >> 8) & 0xFF) as u8,
            b: (channel_bytes & 0xFF) as u8,
        })
    }
}

/// Built-in effect number, 1-18
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EffectId(u8);

impl EffectId {
    pub fn new(n: u8) -> Result<Self> {
        if (1..=EFFECTS.len() as u8).contains(&n) {
            Ok(Self(n))
        } else {
            Err(Error::InvalidEffect(n))
        }
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Catalogue entry for this effect
    pub fn info(self) -> &'static crate::layout::EffectInfo {
        &EFFECTS[self.0 as usize - 1]
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.0, self.info().name)
    }
}

/// Highest brightness or speed step
pub const MAX_LEVEL: u8 = 4;

/// Brightness or speed step, 0-4
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u8);

impl Level {
    pub fn new(field: &'static str, value: u8) -> Result<Self> {
        if value <= MAX_LEVEL {
            Ok(Self(value))
        } else {
            Err(Error::OutOfRange {
                field,
                value,
                max: MAX_LEVEL,
            })
        }
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }
}

/// Auto-off delay after inactivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SleepTimer {
    Off = 0,
    Min5 = 5,
    Min10 = 10,
    Min15 = 15,
}

impl SleepTimer {
    pub fn from_minutes(minutes: u8) -> Result<Self> {
        match minutes {
            0 => Ok(Self::Off),
            5 => Ok(Self::Min5),
            10 => Ok(Self::Min10),
            15 => Ok(Self::Min15),
            m => Err(Error::InvalidSleep(m)),
        }
    }

    #[inline]
    pub fn minutes(self) -> u8 {
        self as u8
    }

    /// Value stored in the config byte
    #[inline]
    pub fn to_byte(self) -> u8 {
        self.minutes() * 2
    }

    /// Minutes represented by a stored config byte
    #[inline]
    pub fn minutes_from_byte(byte: u8) -> u8 {
        byte / 2
    }
}

impl fmt::Display for SleepTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SleepTimer::Off => f.write_str("off"),
            t => write!(f, "{} min", t.minutes()),
        }
    }
}
