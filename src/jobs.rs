use std::io::Write;
use std::process::Child;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Result, ShellError};
use crate::job_control;
use crate::status::Termination;

const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Fixed-capacity table of running background children.
///
/// Reaped slots are cleared in place and reused; reporting always walks the
/// slots in table order.
pub struct JobTable {
    slots: Vec<Option<Child>>,
    capacity: usize,
}

impl JobTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of children still tracked.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Track a freshly spawned background child. Returns its pid.
    ///
    /// A child that does not fit is killed and reaped before the error is
    /// returned, so it never lingers untracked.
    pub fn insert(&mut self, mut child: Child) -> Result<u32> {
        let pid = child.id();

        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.is_none()) {
            *slot = Some(child);
        } else if self.slots.len() < self.capacity {
            self.slots.push(Some(child));
        } else {
            tracing::warn!(pid, capacity = self.capacity, "job table full, killing untracked child");
            let _ = child.kill();
            let _ = child.wait();
            return Err(ShellError::JobTableFull { capacity: self.capacity });
        }

        tracing::debug!(pid, tracked = self.len(), "background job tracked");
        Ok(pid)
    }

    /// Process ids of every tracked child, in table order.
    pub fn pids(&self) -> Vec<u32> {
        self.slots.iter().flatten().map(Child::id).collect()
    }

    /// Non-blocking poll of every tracked child. Prints a line for each one
    /// that has finished, clears its slot and returns what was reaped.
    pub fn reap(&mut self, stdout: &mut dyn Write) -> Vec<(u32, Termination)> {
        let mut reaped = Vec::new();

        for slot in self.slots.iter_mut() {
            let Some(child) = slot else {
                continue;
            };

            match child.try_wait() {
                Ok(Some(status)) => {
                    let pid = child.id();
                    let termination = Termination::from(status);
                    let _ = writeln!(stdout, "background pid {pid} is done. {termination}");
                    tracing::debug!(pid, %termination, "background job reaped");
                    reaped.push((pid, termination));
                    *slot = None;
                }
                Ok(None) => {} // still running
                Err(e) => {
                    // The child can no longer be waited on; stop tracking it.
                    tracing::warn!(pid = child.id(), error = %e, "polling background job failed");
                    *slot = None;
                }
            }
        }

        let _ = stdout.flush();
        reaped
    }

    /// Terminate every tracked child, give them `grace` to exit, then kill
    /// and reap whatever is left.
    pub fn terminate_all(&mut self, grace: Duration) {
        for child in self.slots.iter().flatten() {
            if let Err(e) = job_control::terminate(child.id()) {
                tracing::warn!(pid = child.id(), error = %e, "failed to signal background job");
            }
        }

        let deadline = Instant::now() + grace;
        while !self.is_empty() && Instant::now() < deadline {
            self.collect_exited();
            if !self.is_empty() {
                thread::sleep(SHUTDOWN_POLL_INTERVAL);
            }
        }

        for slot in self.slots.iter_mut() {
            if let Some(mut child) = slot.take() {
                tracing::debug!(pid = child.id(), "background job outlived grace period");
                let _ = child.kill();
                let _ = child.wait();
            }
        }
    }

    /// Clear slots of children that have exited, without reporting them.
    fn collect_exited(&mut self) {
        for slot in self.slots.iter_mut() {
            if let Some(child) = slot {
                if !matches!(child.try_wait(), Ok(None)) {
                    *slot = None;
                }
            }
        }
    }
}
