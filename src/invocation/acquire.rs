use std::io::{self, BufRead, Write};
use std::os::unix::io::RawFd;

use crate::crypto::passphrase::read_bounded_line;
use crate::crypto::{KdfHardness, Passphrase};
use crate::error::{KeysmithError, Result};
use crate::terminal::{self, EchoSuppressed, InputKind};

const PROMPT: &str = "Passphrase: ";

/// Read the passphrase from standard input.
///
/// On a terminal the user is prompted on stderr with echo turned off; from
/// a pipe or file one line is read silently.
pub fn acquire_passphrase(tier: Option<KdfHardness>) -> Result<Passphrase> {
    let fd = libc::STDIN_FILENO;
    let kind = terminal::probe(fd).map_err(KeysmithError::PassphraseUnavailable)?;
    tracing::debug!(?kind, tier = ?tier, "acquiring passphrase");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    match kind {
        InputKind::Terminal => prompt_hidden(fd, &mut input, &mut io::stderr()),
        InputKind::NotTerminal => read_unprompted(&mut input),
    }
}

/// Prompt with echo suppressed on `fd`, reading the reply from `input`.
///
/// Terminal settings are put back before returning on every path.
pub fn prompt_hidden<R: BufRead, W: Write>(
    fd: RawFd,
    input: &mut R,
    prompt: &mut W,
) -> Result<Passphrase> {
    let guard = EchoSuppressed::engage(fd).map_err(KeysmithError::PassphraseUnavailable)?;

    let read = write_prompt(prompt).and_then(|()| read_bounded_line(input));
    let restored = guard.restore();

    let passphrase = read.map_err(KeysmithError::PassphraseUnavailable)?;
    restored.map_err(KeysmithError::TerminalReset)?;
    Ok(passphrase)
}

pub fn read_unprompted<R: BufRead>(input: &mut R) -> Result<Passphrase> {
    read_bounded_line(input).map_err(KeysmithError::PassphraseUnavailable)
}

fn write_prompt<W: Write>(out: &mut W) -> io::Result<()> {
    out.write_all(PROMPT.as_bytes())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExitStatus;
    use std::io::{Cursor, Read};
    use std::mem::MaybeUninit;
    use std::ptr;

    struct Pty {
        master: libc::c_int,
        slave: libc::c_int,
    }

    impl Pty {
        fn open() -> Self {
            let (mut master, mut slave): (libc::c_int, libc::c_int) = (-1, -1);
            let rc = unsafe {
                libc::openpty(
                    &mut master,
                    &mut slave,
                    ptr::null_mut(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                )
            };
            assert_eq!(rc, 0, "openpty: {}", io::Error::last_os_error());
            Self { master, slave }
        }
    }

    impl Drop for Pty {
        fn drop(&mut self) {
            unsafe {
                libc::close(self.slave);
                libc::close(self.master);
            }
        }
    }

    fn lflag(fd: RawFd) -> libc::tcflag_t {
        let mut attrs = MaybeUninit::<libc::termios>::uninit();
        assert_eq!(unsafe { libc::tcgetattr(fd, attrs.as_mut_ptr()) }, 0);
        unsafe { attrs.assume_init() }.c_lflag
    }

    /// Input that records the terminal's local flags when it is first read.
    struct Watched {
        fd: RawFd,
        seen: Option<libc::tcflag_t>,
        inner: Cursor<Vec<u8>>,
    }

    impl Watched {
        fn new(fd: RawFd, bytes: &[u8]) -> Self {
            Self {
                fd,
                seen: None,
                inner: Cursor::new(bytes.to_vec()),
            }
        }
    }

    impl Read for Watched {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl BufRead for Watched {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            if self.seen.is_none() {
                self.seen = Some(lflag(self.fd));
            }
            self.inner.fill_buf()
        }

        fn consume(&mut self, amt: usize) {
            self.inner.consume(amt)
        }
    }

    #[test]
    fn unprompted_read_strips_newline() {
        let mut input = Cursor::new(b"piped secret\n".to_vec());
        let passphrase = read_unprompted(&mut input).unwrap();
        assert_eq!(passphrase.as_bytes(), b"piped secret");
    }

    #[test]
    fn unprompted_read_of_empty_input_fails() {
        let mut input = Cursor::new(Vec::new());
        let err = read_unprompted(&mut input).unwrap_err();
        assert!(matches!(err, KeysmithError::PassphraseUnavailable(_)));
        assert_eq!(err.exit_status(), ExitStatus::UnableToGetPassphrase);
    }

    #[test]
    fn hidden_prompt_needs_a_terminal() {
        let mut fds = [0 as libc::c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);

        let mut input = Cursor::new(b"secret\n".to_vec());
        let mut prompt = Vec::new();
        let err = prompt_hidden(fds[0], &mut input, &mut prompt).unwrap_err();

        assert!(matches!(err, KeysmithError::PassphraseUnavailable(_)));
        // Nothing is prompted or read until echo is off.
        assert!(prompt.is_empty());
        assert_eq!(input.position(), 0);

        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }

    #[test]
    fn hidden_prompt_restores_terminal_after_failed_read() {
        let pty = Pty::open();
        let before = lflag(pty.slave);

        let mut input = Watched::new(pty.slave, b"");
        let mut prompt = Vec::new();
        let err = prompt_hidden(pty.slave, &mut input, &mut prompt).unwrap_err();

        assert!(matches!(err, KeysmithError::PassphraseUnavailable(_)));
        assert_eq!(prompt, PROMPT.as_bytes());
        assert_eq!(input.seen, Some(terminal::quiet_lflag(before)));
        assert_eq!(lflag(pty.slave), before);
    }

    #[test]
    fn hidden_prompt_reads_with_echo_off_then_restores() {
        let pty = Pty::open();
        let before = lflag(pty.slave);

        let mut input = Watched::new(pty.slave, b"pw\n");
        let passphrase = prompt_hidden(pty.slave, &mut input, &mut Vec::new()).unwrap();

        assert_eq!(passphrase.as_bytes(), b"pw");
        let during = input.seen.unwrap();
        assert_eq!(during & (libc::ECHO | libc::ECHOE | libc::ECHOK), 0);
        assert_ne!(during & libc::ECHONL, 0);
        assert_eq!(lflag(pty.slave), before);

        let second = prompt_hidden(pty.slave, &mut Cursor::new(b"again\n".to_vec()), &mut Vec::new())
            .unwrap();
        assert_eq!(second.as_bytes(), b"again");
        assert_eq!(lflag(pty.slave), before);
    }

    #[test]
    fn terminal_input_is_detected() {
        let pty = Pty::open();
        assert_eq!(terminal::probe(pty.slave).unwrap(), InputKind::Terminal);
    }
}
