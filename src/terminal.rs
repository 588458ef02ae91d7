use std::io;
use std::mem::MaybeUninit;
use std::os::unix::io::RawFd;

/// What standard input is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Terminal,
    NotTerminal,
}

/// Classify `fd`. Anything other than "is a tty" or `ENOTTY` is an error.
pub fn probe(fd: RawFd) -> io::Result<InputKind> {
    if unsafe { libc::isatty(fd) } == 1 {
        return Ok(InputKind::Terminal);
    }
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ENOTTY) => Ok(InputKind::NotTerminal),
        _ => Err(err),
    }
}

/// Local-mode flags with character echo off but the newline still echoed.
pub fn quiet_lflag(lflag: libc::tcflag_t) -> libc::tcflag_t {
    (lflag & !(libc::ECHO | libc::ECHOE | libc::ECHOK)) | libc::ECHONL
}

/// Echo suppression on a terminal, held for the guard's lifetime.
///
/// Call [`EchoSuppressed::restore`] to put the saved settings back and learn
/// whether that worked. Dropping the guard without it restores best-effort.
pub struct EchoSuppressed {
    fd: RawFd,
    saved: Option<libc::termios>,
}

impl EchoSuppressed {
    pub fn engage(fd: RawFd) -> io::Result<Self> {
        let saved = get_attributes(fd)?;
        let mut quiet = saved;
        quiet.c_lflag = quiet_lflag(saved.c_lflag);
        set_attributes(fd, &quiet)?;
        tracing::trace!(fd, "terminal echo suppressed");
        Ok(Self {
            fd,
            saved: Some(saved),
        })
    }

    pub fn restore(mut self) -> io::Result<()> {
        match self.saved.take() {
            Some(saved) => set_attributes(self.fd, &saved),
            None => Ok(()),
        }
    }
}

impl Drop for EchoSuppressed {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            if let Err(e) = set_attributes(self.fd, &saved) {
                tracing::warn!(error = %e, "could not restore terminal settings");
            }
        }
    }
}

fn get_attributes(fd: RawFd) -> io::Result<libc::termios> {
    let mut attrs = MaybeUninit::<libc::termios>::uninit();
    if unsafe { libc::tcgetattr(fd, attrs.as_mut_ptr()) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(unsafe { attrs.assume_init() })
}

fn set_attributes(fd: RawFd, attrs: &libc::termios) -> io::Result<()> {
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, attrs) } != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_flags_drop_echo_and_keep_newline() {
        let lflag = libc::ECHO | libc::ECHOE | libc::ECHOK | libc::ICANON | libc::ISIG;
        let quiet = quiet_lflag(lflag);
        assert_eq!(quiet & libc::ECHO, 0);
        assert_eq!(quiet & libc::ECHOE, 0);
        assert_eq!(quiet & libc::ECHOK, 0);
        assert_ne!(quiet & libc::ECHONL, 0);
        assert_ne!(quiet & libc::ICANON, 0);
        assert_ne!(quiet & libc::ISIG, 0);
    }

    #[test]
    fn pipe_is_not_a_terminal() {
        let mut fds = [0 as libc::c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        assert_eq!(probe(fds[0]).unwrap(), InputKind::NotTerminal);
        assert!(EchoSuppressed::engage(fds[0]).is_err());
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }

    #[test]
    fn invalid_descriptor_is_an_error() {
        let err = probe(-1).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EBADF));
    }
}
