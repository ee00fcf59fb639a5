use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use crate::budget::error::BudgetError;

const LOCK_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Exclusive claim on the budget file for one run. Released on drop.
#[derive(Debug)]
pub struct BudgetLock {
    path: PathBuf,
}

impl Drop for BudgetLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

impl BudgetLock {
    /// Lock file guarding `state_path`, waiting up to `wait` for another run.
    pub fn acquire(state_path: &Path, wait: Duration) -> Result<Self, BudgetError> {
        let lock_path = with_suffix(state_path, ".lock");
        let started = Instant::now();

        loop {
            match try_acquire(&lock_path) {
                Ok(lock) => return Ok(lock),
                Err(LockState::Stale(pid)) => {
                    if reclaim(&lock_path, pid) {
                        log::warn!(
                            "Removed stale budget lock {} left by PID {}",
                            lock_path.display(),
                            pid
                        );
                        continue;
                    }
                }
                Err(LockState::HeldBy(pid)) if started.elapsed() >= wait => {
                    return Err(BudgetError::Locked {
                        path: lock_path.display().to_string(),
                        pid,
                    });
                }
                Err(LockState::Unknown) if started.elapsed() >= wait => {
                    return Err(BudgetError::LockUnavailable(
                        lock_path.display().to_string(),
                    ));
                }
                Err(_) => {}
            }
            if started.elapsed() >= wait {
                return Err(BudgetError::LockUnavailable(lock_path.display().to_string()));
            }
            thread::sleep(LOCK_RETRY_DELAY);
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

#[derive(Debug, PartialEq)]
enum LockState {
    HeldBy(u32),
    /// Owner PID is no longer running.
    Stale(u32),
    Unknown,
}

fn try_acquire(lock_path: &Path) -> Result<BudgetLock, LockState> {
    if let Some(parent) = lock_path.parent() {
        if !parent.as_os_str().is_empty() {
            let _ = fs::create_dir_all(parent);
        }
    }

    match OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(lock_path)
    {
        Ok(mut file) => {
            let _ = writeln!(file, "{}", std::process::id());
            Ok(BudgetLock {
                path: lock_path.to_path_buf(),
            })
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => match lock_owner(lock_path) {
            Some(pid) if is_process_running(pid) => Err(LockState::HeldBy(pid)),
            Some(pid) => Err(LockState::Stale(pid)),
            None => Err(LockState::Unknown),
        },
        Err(_) => Err(LockState::Unknown),
    }
}

fn lock_owner(lock_path: &Path) -> Option<u32> {
    fs::read_to_string(lock_path).ok()?.trim().parse().ok()
}

/// Remove the lock file if it still names `stale_pid`.
///
/// Runs under a `<lock>.reclaim` marker created with `create_new`, so two runs
/// that both saw the same dead owner cannot both delete: the second one finds
/// the winner's PID in the file and leaves it alone. A marker left behind by a
/// crashed run makes later runs report the lock as unavailable.
fn reclaim(lock_path: &Path, stale_pid: u32) -> bool {
    let marker = with_suffix(lock_path, ".reclaim");
    if OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&marker)
        .is_err()
    {
        return false;
    }

    let still_stale = lock_owner(lock_path) == Some(stale_pid);
    if still_stale {
        let _ = fs::remove_file(lock_path);
    }
    let _ = fs::remove_file(&marker);
    still_stale
}

fn is_process_running(pid: u32) -> bool {
    if cfg!(target_os = "linux") {
        return Path::new("/proc").join(pid.to_string()).exists();
    }
    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
