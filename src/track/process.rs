use std::{
    io::Read,
    path::PathBuf,
    process::{Child, Command as StdCommand, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use crate::track::error::TrackError;
use crate::track::types::PropagationQuery;
use crate::track::PropagationPort;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs the external ground track generator as a child process.
pub struct ProcessPropagator {
    program: PathBuf,
    /// Passed before the query arguments, e.g. a script path for an interpreter.
    leading_args: Vec<String>,
    timeout: Duration,
}

impl ProcessPropagator {
    pub fn new(program: impl Into<PathBuf>, leading_args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            leading_args,
            timeout,
        }
    }
}

impl PropagationPort for ProcessPropagator {
    fn run(&self, query: &PropagationQuery<'_>) -> Result<String, TrackError> {
        let args = query.to_args();
        log::debug!("Running {} {:?}", self.program.display(), args);

        let mut child = StdCommand::new(&self.program)
            .args(&self.leading_args)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TrackError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = wait_with_timeout(&mut child, self.timeout)?;

        let output = stdout
            .join()
            .map_err(|_| std::io::Error::other("stdout reader panicked"))??;
        if !status.success() {
            let stderr = stderr
                .join()
                .ok()
                .and_then(Result::ok)
                .unwrap_or_default();
            return Err(TrackError::ExitStatus {
                code: status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(output)
    }
}

/// Read a pipe to completion on its own thread so the child never blocks on a
/// full pipe while we poll it.
fn drain<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> thread::JoinHandle<std::io::Result<String>> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_string(&mut buf)?;
        }
        Ok(buf)
    })
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<ExitStatus, TrackError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait()? {
            Some(status) => return Ok(status),
            None if Instant::now() >= deadline => {
                log::error!(
                    "Propagator (PID {}) exceeded {:?}, killing it",
                    child.id(),
                    timeout
                );
                let _ = child.kill();
                let _ = child.wait();
                return Err(TrackError::Timeout(timeout));
            }
            None => thread::sleep(POLL_INTERVAL),
        }
    }
}
