//! Process-wide fault reporting for crashes inside the native core.
//!
//! A contract violation in a core call (an undersized output buffer, a call
//! before `initialize`) can fault the whole process. The handler installed
//! here cannot prevent that; it writes one diagnostic line to stderr, then
//! restores the default disposition and re-raises so the process still dies
//! with the original signal (and core dump, where enabled).

use std::sync::Once;

static ENABLE: Once = Once::new();

/// Install the fault handler for this process. Idempotent; calls after the
/// first are no-ops.
pub fn enable() {
    ENABLE.call_once(install);
}

#[cfg(unix)]
fn install() {
    use nix::sys::signal::{self, SigHandler, Signal};

    extern "C" fn handle_fault(signum: i32) {
        // Only async-signal-safe operations from here on.
        let message = b"vvcore-rs: fatal signal raised inside the native core\n";
        let stderr = unsafe { std::os::fd::BorrowedFd::borrow_raw(2) };
        let _ = nix::unistd::write(stderr, message);

        let signal = Signal::try_from(signum).unwrap_or(Signal::SIGSEGV);
        unsafe {
            let _ = signal::signal(signal, SigHandler::SigDfl);
        }
        let _ = signal::raise(signal);
    }

    for signal in [
        Signal::SIGSEGV,
        Signal::SIGBUS,
        Signal::SIGILL,
        Signal::SIGFPE,
    ] {
        if let Err(errno) = unsafe { signal::signal(signal, SigHandler::Handler(handle_fault)) } {
            log::warn!("Could not install {signal} handler: {errno}");
        }
    }
    log::debug!("Fault handler installed");
}

#[cfg(not(unix))]
fn install() {
    log::warn!("Fault reporting is not supported on this platform");
}
