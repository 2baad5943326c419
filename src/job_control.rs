use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, ShellError};

/// Process-wide foreground-only flag. Flipped only by the toggle handler.
static FOREGROUND_ONLY: AtomicBool = AtomicBool::new(false);

const ENTER_FOREGROUND_ONLY: &[u8] = b"\nEntering foreground-only mode (& is now ignored)\n: ";
const EXIT_FOREGROUND_ONLY: &[u8] = b"\nExiting foreground-only mode\n: ";

/// Signal that interrupts the foreground command (Ctrl-C).
pub const INTERRUPT: libc::c_int = libc::SIGINT;
/// Signal that toggles foreground-only mode (Ctrl-Z).
pub const TOGGLE: libc::c_int = libc::SIGTSTP;

/// Disposition to install for one signal.
#[derive(Clone, Copy)]
pub enum SignalPolicy {
    Ignore,
    Default,
    Handler(extern "C" fn(libc::c_int)),
}

/// Interrupt and toggle dispositions for one side of a dispatch.
#[derive(Clone, Copy)]
pub struct Dispositions {
    pub interrupt: SignalPolicy,
    pub toggle: SignalPolicy,
}

impl Dispositions {
    /// The shell survives Ctrl-C and treats Ctrl-Z as the mode toggle.
    pub const SHELL: Self = Self {
        interrupt: SignalPolicy::Ignore,
        toggle: SignalPolicy::Handler(on_toggle),
    };

    /// A foreground child can be interrupted but never stopped.
    pub const FOREGROUND_CHILD: Self = Self {
        interrupt: SignalPolicy::Default,
        toggle: SignalPolicy::Ignore,
    };

    /// A background child ignores both keyboard signals.
    pub const BACKGROUND_CHILD: Self = Self {
        interrupt: SignalPolicy::Ignore,
        toggle: SignalPolicy::Ignore,
    };

    pub fn for_child(background: bool) -> Self {
        if background {
            Self::BACKGROUND_CHILD
        } else {
            Self::FOREGROUND_CHILD
        }
    }

    /// Install both dispositions in the calling process.
    ///
    /// Only async-signal-safe calls are made, so this may run in a forked child
    /// before exec.
    pub fn apply(&self) -> io::Result<()> {
        set_disposition(INTERRUPT, self.interrupt)?;
        set_disposition(TOGGLE, self.toggle)
    }
}

/// Install the shell's own dispositions. Called once at startup.
pub fn install_shell_dispositions() -> Result<()> {
    set_disposition(INTERRUPT, Dispositions::SHELL.interrupt)
        .map_err(|source| ShellError::Signal { signal: "SIGINT", source })?;
    set_disposition(TOGGLE, Dispositions::SHELL.toggle)
        .map_err(|source| ShellError::Signal { signal: "SIGTSTP", source })?;
    tracing::debug!("shell signal dispositions installed");
    Ok(())
}

fn set_disposition(signal: libc::c_int, policy: SignalPolicy) -> io::Result<()> {
    // SAFETY: an all-zero sigaction is a valid starting value; every field we
    // rely on is set below.
    let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
    match policy {
        SignalPolicy::Ignore => action.sa_sigaction = libc::SIG_IGN,
        SignalPolicy::Default => action.sa_sigaction = libc::SIG_DFL,
        SignalPolicy::Handler(handler) => {
            action.sa_sigaction = handler as libc::sighandler_t;
            // Reads interrupted by the handler resume instead of failing.
            action.sa_flags = libc::SA_RESTART;
        }
    }

    // SAFETY: `action` is a valid sigaction; the old action is not requested.
    let rc = unsafe {
        libc::sigfillset(&mut action.sa_mask);
        libc::sigaction(signal, &action, std::ptr::null_mut())
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Ctrl-Z handler: flip the mode and announce it.
///
/// Runs in signal context, so it touches only the atomic and raw `write(2)`.
extern "C" fn on_toggle(_signal: libc::c_int) {
    let was_active = FOREGROUND_ONLY.fetch_xor(true, Ordering::SeqCst);
    let message = if was_active {
        EXIT_FOREGROUND_ONLY
    } else {
        ENTER_FOREGROUND_ONLY
    };
    // SAFETY: write(2) is async-signal-safe and the buffer is a static.
    unsafe {
        libc::write(libc::STDOUT_FILENO, message.as_ptr().cast(), message.len());
    }
}

/// Read handle on foreground-only mode, held by the shell session.
#[derive(Clone, Copy)]
pub struct ForegroundMode {
    flag: &'static AtomicBool,
}

impl ForegroundMode {
    /// The flag the installed Ctrl-Z handler flips.
    pub fn process() -> Self {
        Self { flag: &FOREGROUND_ONLY }
    }

    #[cfg(test)]
    pub fn detached(active: bool) -> Self {
        Self {
            flag: Box::leak(Box::new(AtomicBool::new(active))),
        }
    }

    pub fn is_active(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Ask a process to terminate.
pub fn terminate(pid: u32) -> io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid process id"))?;

    loop {
        // SAFETY: kill(2) has no memory-safety preconditions.
        let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(code) if code == libc::EINTR => continue,
            // Already gone; the reaper will pick up its status.
            Some(code) if code == libc::ESRCH => return Ok(()),
            _ => return Err(err),
        }
    }
}
