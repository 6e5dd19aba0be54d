//! Single-instance lock using PID files
//!
//! Prevents two Arkive processes from running schedulers against the same
//! database file.

use std::fs;
use std::path::{Path, PathBuf};

use arkive_domain::{ArkiveError, Result};

const PID_FILE_NAME: &str = "arkive.pid";

/// Single-instance lock manager
pub struct InstanceLock {
    pid_file: PathBuf,
}

impl InstanceLock {
    /// Create a new instance lock
    ///
    /// Returns an error if another instance is already running. A PID file
    /// left behind by a dead process is replaced.
    pub fn acquire<P: AsRef<Path>>(lock_dir: P) -> Result<Self> {
        let pid_file = lock_dir.as_ref().join(PID_FILE_NAME);

        if pid_file.exists() {
            if let Ok(content) = fs::read_to_string(&pid_file) {
                if let Ok(pid) = content.trim().parse::<u32>() {
                    if Self::is_process_running(pid) {
                        tracing::warn!(existing_pid = pid, "instance_lock.process_active");
                        return Err(ArkiveError::AlreadyRunning(format!(
                            "another Arkive instance is running (PID: {pid})"
                        )));
                    }
                    tracing::warn!(stale_pid = pid, "instance_lock.stale_pid_file_detected");
                }
            }
            if let Err(err) = fs::remove_file(&pid_file) {
                tracing::warn!(error = %err, path = %pid_file.display(), "instance_lock.remove_stale_pid_failed");
            }
        }

        let current_pid = std::process::id();
        fs::write(&pid_file, current_pid.to_string())
            .map_err(|e| ArkiveError::Io(format!("failed to create PID file: {e}")))?;

        tracing::info!(pid = current_pid, path = %pid_file.display(), "instance_lock.acquired");

        Ok(Self { pid_file })
    }

    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    #[cfg(unix)]
    fn is_process_running(pid: u32) -> bool {
        #[cfg(target_os = "linux")]
        {
            Path::new("/proc").join(pid.to_string()).exists()
        }

        #[cfg(not(target_os = "linux"))]
        {
            use std::process::Command;

            // `kill -0` probes for the process without signalling it
            Command::new("kill")
                .arg("-0")
                .arg(pid.to_string())
                .output()
                .map(|output| output.status.success())
                .unwrap_or(false)
        }
    }

    #[cfg(not(unix))]
    fn is_process_running(pid: u32) -> bool {
        // Only our own PID can be confirmed without platform APIs
        pid == std::process::id()
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.pid_file) {
            tracing::warn!(error = %e, path = %self.pid_file.display(), "instance_lock.remove_pid_failed");
        } else {
            tracing::info!(path = %self.pid_file.display(), "instance_lock.released");
        }
    }
}
