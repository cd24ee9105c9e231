use crate::{Error, FrameSpec, Mode, TestCase};
use serde::Deserialize;
use std::{collections::HashMap, path::Path};

/// ROM exercised by the built-in suite.
pub const TITAN_ROM: &str = "../debugroms/titan-overdrivemegademo-v1.bin";

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SuiteFile {
    cases: Vec<CaseEntry>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CaseEntry {
    frames: FrameSpec,
    mode: Mode,
    name: String,
    rom: String,
}

impl TryFrom<CaseEntry> for TestCase {
    type Error = Error;

    fn try_from(entry: CaseEntry) -> Result<Self, Self::Error> {
        let frames = entry.frames.into_frames(&entry.name)?;
        Self::new(entry.name, entry.rom, entry.mode, frames)
    }
}

/// The ordered set of cases run by one invocation of the harness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suite {
    cases: Vec<TestCase>,
}

impl Suite {
    /// Creates a suite from already validated cases.
    ///
    /// Fails if `cases` is empty or if two cases would write the same
    /// screenshot file.
    pub fn new(cases: Vec<TestCase>) -> Result<Self, Error> {
        if cases.is_empty() {
            return Err(Error::EmptySuite);
        }

        let mut owners: HashMap<String, &str> = HashMap::new();
        for case in &cases {
            for file in case.snapshot_names() {
                if let Some(first) = owners.get(&file) {
                    return Err(Error::DuplicateSnapshot {
                        second: case.name().into(),
                        first: (*first).into(),
                        file,
                    });
                }
                owners.insert(file, case.name());
            }
        }

        Ok(Self { cases })
    }

    /// The suite the harness runs when no suite file is given: the Titan
    /// Overdrive megademo from 30 seconds to 6 minutes, one screenshot every
    /// 5 seconds, in both regions.
    pub fn builtin() -> Result<Self, Error> {
        fn titan(mode: Mode) -> Result<TestCase, Error> {
            let name = format!("Titan Overdrive MegaDemo ({mode})");
            let frames = FrameSpec::Range {
                start: mode.secs_to_frames(30),
                end: mode.secs_to_frames(6 * 60),
                step: mode.secs_to_frames(5),
            }
            .into_frames(&name)?;

            TestCase::new(name, TITAN_ROM, mode, frames)
        }

        Self::new(vec![titan(Mode::Pal)?, titan(Mode::Ntsc)?])
    }

    /// Parses a JSON suite description.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let file: SuiteFile = serde_json::from_str(json)?;
        let cases = file
            .cases
            .into_iter()
            .map(TestCase::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(cases)
    }

    /// Reads and parses the JSON suite file at `path`.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path)?;
        let suite = Self::from_json(&json)?;

        tracing::debug!(path = %path.display(), cases = suite.len(), "loaded suite");

        Ok(suite)
    }

    #[must_use]
    #[inline]
    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, TestCase> {
        self.cases.iter()
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.cases.len()
    }
}

impl<'a> IntoIterator for &'a Suite {
    type IntoIter = core::slice::Iter<'a, TestCase>;
    type Item = &'a TestCase;

    fn into_iter(self) -> Self::IntoIter {
        self.cases.iter()
    }
}
