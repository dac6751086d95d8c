//! Supported stream presets.
//!
//! The DIGIT streams two fixed modes; each resolution carries its own
//! pair of legal frame rates, higher rate first.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPreset {
    /// 640×480 at 30 or 15 fps.
    Vga,
    /// 320×240 at 60 or 30 fps. Applied as the connect default.
    Qvga,
}

impl StreamPreset {
    pub const fn resolution(self) -> (u32, u32) {
        match self {
            StreamPreset::Vga => (640, 480),
            StreamPreset::Qvga => (320, 240),
        }
    }

    /// Legal frame rates for this preset, default (higher) first.
    pub const fn frame_rates(self) -> [u32; 2] {
        match self {
            StreamPreset::Vga => [30, 15],
            StreamPreset::Qvga => [60, 30],
        }
    }

    pub const fn default_fps(self) -> u32 {
        self.frame_rates()[0]
    }

    pub fn supports_fps(self, fps: u32) -> bool {
        self.frame_rates().contains(&fps)
    }
}

impl fmt::Display for StreamPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamPreset::Vga => write!(f, "VGA"),
            StreamPreset::Qvga => write!(f, "QVGA"),
        }
    }
}

impl FromStr for StreamPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vga" => Ok(StreamPreset::Vga),
            "qvga" => Ok(StreamPreset::Qvga),
            other => Err(format!("unknown stream preset: {other} (expected vga or qvga)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_table() {
        assert_eq!(StreamPreset::Vga.resolution(), (640, 480));
        assert_eq!(StreamPreset::Vga.frame_rates(), [30, 15]);
        assert_eq!(StreamPreset::Qvga.resolution(), (320, 240));
        assert_eq!(StreamPreset::Qvga.frame_rates(), [60, 30]);
        assert_eq!(StreamPreset::Qvga.default_fps(), 60);
    }

    #[test]
    fn fps_membership() {
        assert!(StreamPreset::Vga.supports_fps(15));
        assert!(!StreamPreset::Vga.supports_fps(60));
        assert!(StreamPreset::Qvga.supports_fps(60));
        assert!(!StreamPreset::Qvga.supports_fps(15));
    }

    #[test]
    fn parses_from_str() {
        assert_eq!("vga".parse::<StreamPreset>().unwrap(), StreamPreset::Vga);
        assert_eq!("QVGA".parse::<StreamPreset>().unwrap(), StreamPreset::Qvga);
        assert!("svga".parse::<StreamPreset>().is_err());
    }
}
