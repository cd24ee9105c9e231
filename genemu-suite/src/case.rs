use crate::{Error, Mode};
use serde::{Deserialize, Serialize};

/// Name of the screenshot the engine writes for `frame` of `rom_path`.
///
/// Comparison tools locate the images by this exact name, so it is never
/// normalized: the ROM path is used verbatim, directories included.
#[must_use]
#[inline]
pub fn snapshot_name(rom_path: &str, frame: u32, mode: Mode) -> String {
    format!("{rom_path}.{frame}.{mode}.bmp")
}

/// Frames at which a case takes screenshots, as written in a suite file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameSpec {
    /// Explicit frame indices.
    List(Vec<u32>),
    /// Every `step` frames from `start` up to, but excluding, `end`.
    Range { start: u32, end: u32, step: u32 },
}

impl FrameSpec {
    /// Expands into frame indices. `case` names the owning case in errors.
    pub fn into_frames(self, case: &str) -> Result<Vec<u32>, Error> {
        match self {
            Self::List(frames) => Ok(frames),
            Self::Range { start, end, step } => {
                if step == 0 {
                    return Err(Error::ZeroStep { case: case.into() });
                }

                Ok((start..end).step_by(step as usize).collect())
            }
        }
    }
}

/// One run of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    frames: Vec<u32>,
    mode: Mode,
    name: String,
    rom_path: String,
}

impl TestCase {
    /// Creates a test case, rejecting empty or unordered frame lists.
    pub fn new(
        name: impl Into<String>,
        rom_path: impl Into<String>,
        mode: Mode,
        frames: Vec<u32>,
    ) -> Result<Self, Error> {
        let name = name.into();
        validate_frames(&name, &frames)?;

        Ok(Self {
            frames,
            mode,
            name,
            rom_path: rom_path.into(),
        })
    }

    #[must_use]
    #[inline]
    pub fn frames(&self) -> &[u32] {
        &self.frames
    }

    #[must_use]
    #[inline]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    #[inline]
    pub fn rom_path(&self) -> &str {
        &self.rom_path
    }

    /// Value of the engine's `--screenshots` flag, e.g. `1500,1750`.
    #[must_use]
    pub fn screenshots_arg(&self) -> String {
        self.frames
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Files the engine is expected to write, in frame order.
    pub fn snapshot_names(&self) -> impl Iterator<Item = String> + '_ {
        self.frames
            .iter()
            .map(|&frame| snapshot_name(&self.rom_path, frame, self.mode))
    }
}

fn validate_frames(case: &str, frames: &[u32]) -> Result<(), Error> {
    if frames.is_empty() {
        return Err(Error::EmptyFrames { case: case.into() });
    }

    for (index, pair) in frames.windows(2).enumerate() {
        if let &[previous, current] = pair
            && current <= previous
        {
            return Err(Error::FramesNotIncreasing {
                case: case.into(),
                index: index + 1,
                previous,
                current,
            });
        }
    }

    Ok(())
}
