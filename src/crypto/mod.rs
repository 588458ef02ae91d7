pub mod kdf;
pub mod passphrase;
pub mod secure;

pub use kdf::KdfHardness;
pub use passphrase::{Passphrase, LONGEST_VALID_PASSPHRASE};
