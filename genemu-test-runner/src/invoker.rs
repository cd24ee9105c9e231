//! Launching the engine for a single test case

use genemu_suite::TestCase;
use std::{
    io,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs one test case to completion.
///
/// The pool only talks to the engine through this trait, so tests can swap
/// the real process launch for an instrumented one.
pub trait Invoker: Sync {
    fn run(&self, case: &TestCase) -> Result<(), ExecutionError>;
}

/// Why an engine run failed.
#[derive(Debug)]
pub enum Failure {
    /// The engine exited unsuccessfully.
    Exit(ExitStatus),
    /// The engine could not be started.
    Launch(io::Error),
    /// The engine was killed after running longer than the configured timeout.
    TimedOut(Duration),
    /// Waiting on the engine failed.
    Wait(io::Error),
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exit(status) => write!(f, "engine failed with {status}"),
            Self::Launch(err) => write!(f, "failed to launch engine: {err}"),
            Self::TimedOut(timeout) => {
                write!(f, "engine killed after {}s timeout", timeout.as_secs_f32())
            }
            Self::Wait(err) => write!(f, "failed to wait for engine: {err}"),
        }
    }
}

#[derive(Debug)]
pub struct ExecutionError {
    case: String,
    failure: Failure,
}

impl ExecutionError {
    #[must_use]
    pub fn new(case: &TestCase, failure: Failure) -> Self {
        Self {
            case: case.name().into(),
            failure,
        }
    }

    /// Name of the failed case.
    #[must_use]
    #[inline]
    pub fn case(&self) -> &str {
        &self.case
    }

    /// Exit code of the engine, if it ran and exited normally.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self.failure {
            Failure::Exit(status) => status.code(),
            _ => None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn failure(&self) -> &Failure {
        &self.failure
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.failure {
            Failure::Launch(err) | Failure::Wait(err) => Some(err),
            Failure::Exit(_) | Failure::TimedOut(_) => None,
        }
    }
}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "case '{}': {}", self.case, self.failure)
    }
}

/// Starts the external engine as a child process.
///
/// The command line is
/// `<engine> --mode <PAL|NTSC> --screenshots <f1,f2,...> <rom>`.
#[derive(Debug, Clone)]
pub struct EngineInvoker {
    engine: PathBuf,
    suppress_stdout: bool,
    timeout: Option<Duration>,
}

impl EngineInvoker {
    /// Invoker for the engine at `engine`, discarding its standard output and
    /// waiting on it without a time limit.
    #[must_use]
    pub fn new(engine: impl Into<PathBuf>) -> Self {
        Self {
            engine: engine.into(),
            suppress_stdout: true,
            timeout: None,
        }
    }

    #[must_use]
    pub const fn with_suppress_stdout(mut self, suppress_stdout: bool) -> Self {
        self.suppress_stdout = suppress_stdout;
        self
    }

    /// Kills runs that take longer than `timeout`. `None` waits forever.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    #[inline]
    pub fn engine(&self) -> &Path {
        &self.engine
    }

    /// Builds the engine command for `case` without starting it.
    #[must_use]
    pub fn command(&self, case: &TestCase) -> Command {
        let mut command = Command::new(&self.engine);
        command
            .arg("--mode")
            .arg(case.mode().as_str())
            .arg("--screenshots")
            .arg(case.screenshots_arg())
            .arg(case.rom_path());

        if self.suppress_stdout {
            command.stdout(Stdio::null());
        }

        command
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, Failure> {
        // A timeout too large to represent as an instant never expires.
        let Some((timeout, deadline)) = self
            .timeout
            .and_then(|timeout| Some((timeout, Instant::now().checked_add(timeout)?)))
        else {
            return child.wait().map_err(Failure::Wait);
        };

        loop {
            if let Some(status) = child.try_wait().map_err(Failure::Wait)? {
                return Ok(status);
            }

            if Instant::now() >= deadline {
                let killed = child.kill();
                if let Err(err) = &killed {
                    tracing::warn!(pid = child.id(), "failed to kill engine: {err}");
                }
                let status = child.wait().map_err(Failure::Wait)?;
                return settle_overdue(&killed, status, timeout);
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Outcome of a run that passed its deadline. If the kill did not land the
/// engine exited on its own and its status stands.
fn settle_overdue(
    killed: &io::Result<()>,
    status: ExitStatus,
    timeout: Duration,
) -> Result<ExitStatus, Failure> {
    match killed {
        Ok(()) => Err(Failure::TimedOut(timeout)),
        Err(_) => Ok(status),
    }
}

impl Invoker for EngineInvoker {
    fn run(&self, case: &TestCase) -> Result<(), ExecutionError> {
        let mut command = self.command(case);
        let mut child = command
            .spawn()
            .map_err(|err| ExecutionError::new(case, Failure::Launch(err)))?;

        tracing::debug!(
            case = case.name(),
            pid = child.id(),
            mode = %case.mode(),
            screenshots = %case.screenshots_arg(),
            "engine started"
        );

        let status = self
            .wait(&mut child)
            .map_err(|failure| ExecutionError::new(case, failure))?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecutionError::new(case, Failure::Exit(status)))
        }
    }
}
