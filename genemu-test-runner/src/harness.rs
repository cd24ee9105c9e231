use crate::{
    invoker::Invoker,
    pool::{ExecutionPool, Report},
};
use anyhow::{Context as _, Result};
use genemu_suite::{Manifest, Suite};
use std::path::Path;

/// Writes the manifest for `suite` to `manifest_path`, then runs every case.
///
/// No engine is started unless the manifest is on disk. Case failures are
/// returned in the [`Report`], only a manifest write failure is an `Err`.
pub fn run_suite<I>(
    suite: &Suite,
    manifest_path: &Path,
    pool: &ExecutionPool,
    invoker: &I,
) -> Result<Report>
where
    I: Invoker + ?Sized,
{
    Manifest::build(suite)
        .write(manifest_path)
        .with_context(|| format!("Failed to write manifest: {}", manifest_path.display()))?;

    Ok(pool.run_all(suite.cases(), invoker))
}
