use std::fmt;

use argon2::Params;

/// Memory costs of the Argon2id presets, in bytes.
pub const MEMLIMIT_INTERACTIVE: u64 = 64 * 1024 * 1024;
pub const MEMLIMIT_MODERATE: u64 = 256 * 1024 * 1024;
pub const MEMLIMIT_SENSITIVE: u64 = 1024 * 1024 * 1024;

pub const OPSLIMIT_INTERACTIVE: u32 = 2;
pub const OPSLIMIT_MODERATE: u32 = 3;
pub const OPSLIMIT_SENSITIVE: u32 = 4;

pub const DERIVED_KEY_LEN: usize = 32;

/// How expensive the downstream key derivation should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KdfHardness {
    Low,
    Medium,
    High,
}

impl KdfHardness {
    /// Parse a user-supplied tier. Only the first character counts.
    pub fn from_letter(value: &str) -> Option<Self> {
        match value.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('l') => Some(KdfHardness::Low),
            Some('m') => Some(KdfHardness::Medium),
            Some('h') => Some(KdfHardness::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            KdfHardness::Low => "low",
            KdfHardness::Medium => "medium",
            KdfHardness::High => "high",
        }
    }

    /// Memory cost of this tier in bytes.
    pub fn memory_cost(self) -> u64 {
        match self {
            KdfHardness::Low => MEMLIMIT_INTERACTIVE,
            KdfHardness::Medium => MEMLIMIT_MODERATE,
            KdfHardness::High => MEMLIMIT_SENSITIVE,
        }
    }

    pub fn passes(self) -> u32 {
        match self {
            KdfHardness::Low => OPSLIMIT_INTERACTIVE,
            KdfHardness::Medium => OPSLIMIT_MODERATE,
            KdfHardness::High => OPSLIMIT_SENSITIVE,
        }
    }

    /// Argon2id parameters the key derivation step uses for this tier.
    pub fn params(self) -> Result<Params, argon2::Error> {
        let m_cost_kib = (self.memory_cost() / 1024) as u32;
        Params::new(m_cost_kib, self.passes(), 1, Some(DERIVED_KEY_LEN))
    }
}

impl fmt::Display for KdfHardness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick a tier from the amount of physical memory on the host.
pub fn resolve_hardness(physical_memory: u64) -> KdfHardness {
    if physical_memory > MEMLIMIT_SENSITIVE * 2 {
        KdfHardness::High
    } else if physical_memory > MEMLIMIT_MODERATE * 2 {
        KdfHardness::Medium
    } else {
        KdfHardness::Low
    }
}

/// Total physical memory in bytes, or 0 when the host will not say.
pub fn host_physical_memory() -> u64 {
    let pages = unsafe { libc::sysconf(libc::_SC_PHYS_PAGES) };
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGE_SIZE) };
    if pages <= 0 || page_size <= 0 {
        return 0;
    }
    (pages as u64).saturating_mul(page_size as u64)
}
