use std::fmt;
use std::io::{self, BufRead};

use zeroize::{Zeroize, Zeroizing};

use super::secure;

/// Longest passphrase accepted, in bytes. Longer input is truncated.
pub const LONGEST_VALID_PASSPHRASE: usize = 1024;

/// A passphrase held in a single fixed allocation.
///
/// The buffer is sized once for the longest valid passphrase plus a
/// terminator slot and never grows, so no stale copies are left behind by
/// reallocation. Contents are zeroed on [`Passphrase::wipe`] and on drop.
pub struct Passphrase {
    buf: Zeroizing<Vec<u8>>,
    locked: bool,
}

impl Passphrase {
    pub fn new() -> Self {
        let buf = Zeroizing::new(Vec::with_capacity(LONGEST_VALID_PASSPHRASE + 1));
        let locked = secure::mlock(buf.as_ptr(), buf.capacity());
        Self { buf, locked }
    }

    /// Copy at most [`LONGEST_VALID_PASSPHRASE`] bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut passphrase = Self::new();
        passphrase.append(bytes);
        passphrase
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn remaining(&self) -> usize {
        LONGEST_VALID_PASSPHRASE - self.buf.len()
    }

    /// Append within the bound; returns how many bytes were taken.
    fn append(&mut self, bytes: &[u8]) -> usize {
        let take = bytes.len().min(self.remaining());
        self.buf.extend_from_slice(&bytes[..take]);
        take
    }

    /// Zero the whole allocation and empty the passphrase. Safe to repeat.
    pub fn wipe(&mut self) {
        self.buf.zeroize();
    }
}

impl Default for Passphrase {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Passphrase {
    fn drop(&mut self) {
        self.wipe();
        if self.locked {
            secure::munlock(self.buf.as_ptr(), self.buf.capacity());
        }
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}

/// Read one line into a fresh passphrase.
///
/// At most [`LONGEST_VALID_PASSPHRASE`] bytes are stored; the rest of an
/// over-long line stays in the reader. A newline terminator is consumed but
/// not stored. End of input before any byte is an error.
pub fn read_bounded_line<R: BufRead>(reader: &mut R) -> io::Result<Passphrase> {
    let mut passphrase = Passphrase::new();
    let mut saw_input = false;

    while passphrase.remaining() > 0 {
        let (consumed, done) = {
            let available = match reader.fill_buf() {
                Ok(available) => available,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }
            saw_input = true;

            let window = &available[..available.len().min(passphrase.remaining())];
            match window.iter().position(|&b| b == b'\n') {
                Some(newline) => {
                    passphrase.append(&window[..newline]);
                    (newline + 1, true)
                }
                None => (passphrase.append(window), false),
            }
        };
        reader.consume(consumed);
        if done {
            break;
        }
    }

    if !saw_input {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "end of input before a passphrase was read",
        ));
    }
    Ok(passphrase)
}
