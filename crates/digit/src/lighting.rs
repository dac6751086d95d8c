//! LED illumination encoding and range policy.
//!
//! The firmware takes a single composite control value holding one nibble
//! per channel, red most significant. The uniform setter clamps silently;
//! the per-channel setter rejects out-of-range values.

use crate::sensor::DigitError;

pub const LIGHTING_MIN: u8 = 0;
pub const LIGHTING_MAX: u8 = 15;

/// Firmware revisions below this lack independent RGB control.
pub const LEGACY_REVISION: u16 = 200;

/// Divisor applied to uniform levels on legacy firmware, which uses a
/// coarser intensity scale.
pub const LEGACY_SCALER: u8 = 17;

/// Pack per-channel levels into the composite control value.
/// Any channel outside [0, 15] is rejected.
pub fn pack_rgb(r: u8, g: u8, b: u8) -> Result<u16, DigitError> {
    for (channel, level) in [("red", r), ("green", g), ("blue", b)] {
        if level > LIGHTING_MAX {
            return Err(DigitError::InvalidParameter(format!(
                "{channel} level {level} outside [{LIGHTING_MIN}, {LIGHTING_MAX}]"
            )));
        }
    }
    Ok(((r as u16) << 8) | ((g as u16) << 4) | b as u16)
}

/// Inverse of [`pack_rgb`] for legal composites.
pub fn unpack(composite: u16) -> (u8, u8, u8) {
    (
        ((composite >> 8) & 0xF) as u8,
        ((composite >> 4) & 0xF) as u8,
        (composite & 0xF) as u8,
    )
}

/// Clamp an arbitrary level to the legal range. Uniform-setter policy:
/// out-of-range values snap to the nearest bound, no error.
pub fn clamp_level(level: i32) -> u8 {
    level.clamp(LIGHTING_MIN as i32, LIGHTING_MAX as i32) as u8
}
