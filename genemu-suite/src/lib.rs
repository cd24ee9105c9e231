//! Test suite model for the genemu screenshot regression harness
//!
//! A [`Suite`] is the ordered list of engine runs to perform. Each
//! [`TestCase`] names a ROM, a region [`Mode`] and the frames at which the
//! engine must dump a screenshot. The [`Manifest`] predicts the files those
//! runs produce so that comparison tools can start before the engine is done.

mod case;
mod error;
mod manifest;
mod mode;
mod suite;

pub use case::{FrameSpec, TestCase, snapshot_name};
pub use error::Error;
pub use manifest::{Manifest, ManifestEntry};
pub use mode::Mode;
pub use suite::{Suite, TITAN_ROM};

/// Default manifest path, relative to the working directory of the run.
pub const DEFAULT_MANIFEST: &str = "testout.json";
