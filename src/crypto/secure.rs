use std::io;

/// Keep secrets out of core files and away from other processes of the same
/// user. Failures are logged and otherwise ignored.
pub fn harden_process() {
    #[cfg(unix)]
    {
        let no_core = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        if unsafe { libc::setrlimit(libc::RLIMIT_CORE, &no_core) } != 0 {
            tracing::debug!(error = %io::Error::last_os_error(), "could not disable core dumps");
        }
    }

    #[cfg(target_os = "linux")]
    {
        if unsafe { libc::prctl(libc::PR_SET_DUMPABLE, 0) } != 0 {
            tracing::debug!(error = %io::Error::last_os_error(), "could not clear dumpable flag");
        }
    }
}

/// Pin a memory region so it is never written to swap.
/// Safety: ptr must be valid for len bytes.
pub fn mlock(ptr: *const u8, len: usize) -> bool {
    if len == 0 {
        return false;
    }
    unsafe { libc::mlock(ptr as *const libc::c_void, len) == 0 }
}

/// Release a region pinned with [`mlock`].
/// Safety: ptr must be valid for len bytes and previously locked.
pub fn munlock(ptr: *const u8, len: usize) -> bool {
    unsafe { libc::munlock(ptr as *const libc::c_void, len) == 0 }
}
