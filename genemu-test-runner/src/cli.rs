pub use clap;
use genemu_suite::DEFAULT_MANIFEST;
use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

pub const RUNNER_BIN: &str = "genemu-test-runner";
pub const DEFAULT_ENGINE: &str = "../build/genemu";
const ABOUT: &str = "Runs the genemu screenshot regression suite.";
const AFTER_HELP: &str = "Every case is run as:

    <engine> --mode <PAL|NTSC> --screenshots <f1,f2,...> <rom>

The manifest of expected screenshots is written before the first engine
starts. Screenshots are named <rom>.<frame>.<mode>.bmp.

Suite file format:

    { \"cases\": [
        { \"name\": \"Demo\", \"rom\": \"demo.bin\", \"mode\": \"PAL\",
          \"frames\": [1500, 1750] },
        { \"name\": \"Demo\", \"rom\": \"demo.bin\", \"mode\": \"NTSC\",
          \"frames\": { \"start\": 1800, \"end\": 21600, \"step\": 300 } }
    ] }
";

#[derive(clap::Parser)]
#[command(name = RUNNER_BIN, about = ABOUT, after_help = AFTER_HELP)]
pub struct Cli {
    #[arg(
        short,
        long,
        help = "Engine executable",
        default_value = DEFAULT_ENGINE
    )]
    engine: PathBuf,
    #[arg(
        short,
        long,
        help = "JSON suite file",
        long_help = "JSON suite file. When omitted the built-in suite is run: the Titan \
           Overdrive megademo in PAL and NTSC, one screenshot every 5 seconds."
    )]
    suite: Option<PathBuf>,
    #[arg(
        short = 'o',
        long,
        help = "Where to write the manifest of expected screenshots",
        default_value = DEFAULT_MANIFEST
    )]
    manifest: PathBuf,
    #[arg(
        short,
        long,
        help = "Number of engines run in parallel [default: available parallelism]"
    )]
    jobs: Option<NonZeroUsize>,
    #[arg(
        long,
        value_name = "SECS",
        help = "Kill and fail cases running longer than this many seconds"
    )]
    timeout: Option<u64>,
    #[arg(long, help = "Do not discard the engine's standard output")]
    show_engine_output: bool,
    #[arg(long, help = "Print the manifest to standard output and exit")]
    list: bool,
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase log verbosity (RUST_LOG takes precedence)"
    )]
    verbose: u8,
}

impl Cli {
    #[must_use]
    #[inline]
    pub fn engine(&self) -> &Path {
        &self.engine
    }

    #[must_use]
    #[inline]
    pub const fn jobs(&self) -> Option<NonZeroUsize> {
        self.jobs
    }

    #[must_use]
    #[inline]
    pub const fn list(&self) -> bool {
        self.list
    }

    #[must_use]
    #[inline]
    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    #[must_use]
    #[inline]
    pub const fn suppress_engine_output(&self) -> bool {
        !self.show_engine_output
    }

    #[must_use]
    #[inline]
    pub fn suite(&self) -> Option<&Path> {
        self.suite.as_deref()
    }

    #[must_use]
    #[inline]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    #[must_use]
    #[inline]
    pub const fn verbosity(&self) -> u8 {
        self.verbose
    }
}
