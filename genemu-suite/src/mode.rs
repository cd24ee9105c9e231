use core::fmt;
use serde::{Deserialize, Serialize};

/// Video timing standard the engine emulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "PAL")]
    Pal,
    #[serde(rename = "NTSC")]
    Ntsc,
}

impl Mode {
    /// Name passed to the engine's `--mode` flag and used in snapshot names.
    #[must_use]
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pal => "PAL",
            Self::Ntsc => "NTSC",
        }
    }

    /// Frames per second of emulated time.
    #[must_use]
    #[inline]
    pub const fn frame_rate(self) -> u32 {
        match self {
            Self::Pal => 50,
            Self::Ntsc => 60,
        }
    }

    /// Frame reached after `secs` seconds of emulated time.
    #[must_use]
    #[inline]
    pub const fn secs_to_frames(self, secs: u32) -> u32 {
        secs * self.frame_rate()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
