//! Expected screenshot manifest
//!
//! The manifest is written before any engine process starts. It predicts the
//! files each case will produce, it never records whether they were produced.

use crate::{Error, Suite, TestCase};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write as _},
    path::Path,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub sshots: Vec<String>,
}

impl From<&TestCase> for ManifestEntry {
    fn from(case: &TestCase) -> Self {
        Self {
            name: case.name().into(),
            sshots: case.snapshot_names().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    games: Vec<ManifestEntry>,
}

impl Manifest {
    /// Builds one entry per case, in suite order.
    #[must_use]
    pub fn build(suite: &Suite) -> Self {
        Self {
            games: suite.iter().map(ManifestEntry::from).collect(),
        }
    }

    #[must_use]
    #[inline]
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.games
    }

    /// Reads a manifest previously written by [`Manifest::write`].
    pub fn read(path: &Path) -> Result<Self, Error> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the manifest to `path`, replacing any existing file.
    ///
    /// The JSON is written and synced to a temporary file next to `path`
    /// which is then renamed over it. If anything fails the temporary file is
    /// removed and `path` keeps its previous contents.
    pub fn write(&self, path: &Path) -> Result<(), Error> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp = tempfile::Builder::new()
            .prefix(".manifest")
            .suffix(".tmp")
            .tempfile_in(dir)?;

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|err| Error::Io(err.error))?;

        tracing::info!(
            path = %path.display(),
            games = self.games.len(),
            "wrote screenshot manifest"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Mode;

    fn demo_suite() -> Suite {
        Suite::new(vec![
            TestCase::new("DemoA", "demo.bin", Mode::Pal, vec![1500, 1750]).unwrap(),
            TestCase::new("DemoB", "other.bin", Mode::Ntsc, vec![60]).unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn entries_follow_suite_order() {
        let suite = demo_suite();
        let manifest = Manifest::build(&suite);

        assert_eq!(manifest.entries().len(), suite.len());
        for (entry, case) in manifest.entries().iter().zip(&suite) {
            assert_eq!(entry.name, case.name());
            assert_eq!(entry.sshots.len(), case.frames().len());
        }
    }

    #[test]
    fn json_layout_matches_downstream_format() {
        let suite = Suite::new(vec![
            TestCase::new("DemoA", "demo.bin", Mode::Pal, vec![1500, 1750]).unwrap(),
        ])
        .unwrap();

        let json = serde_json::to_string(&Manifest::build(&suite)).unwrap();
        assert_eq!(
            json,
            r#"{"games":[{"name":"DemoA","sshots":["demo.bin.1500.PAL.bmp","demo.bin.1750.PAL.bmp"]}]}"#
        );
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testout.json");
        let manifest = Manifest::build(&demo_suite());

        manifest.write(&path).unwrap();
        assert_eq!(Manifest::read(&path).unwrap(), manifest);
    }

    #[test]
    fn write_replaces_existing_file_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("testout.json");
        std::fs::write(&path, "stale contents that are longer than the new manifest").unwrap();

        let suite = Suite::new(vec![
            TestCase::new("x", "x.bin", Mode::Pal, vec![1]).unwrap(),
        ])
        .unwrap();
        Manifest::build(&suite).write(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            r#"{"games":[{"name":"x","sshots":["x.bin.1.PAL.bmp"]}]}"#
        );

        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("testout.json");

        let result = Manifest::build(&demo_suite()).write(&path);
        assert!(matches!(result, Err(Error::Io(_))));
        assert!(!path.exists());
    }
}
