//! Common utilities shared by the Maya Ledger harness crates.
//!
//! * [`Bip44Path`] the 5 components derivation path understood by the device app
//! * [`verify_signature`] and [`verify_address`] to check device answers independently
//! * [`sign_doc`] canonical form validation of the JSON transactions the app signs

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![warn(missing_docs)]

mod error;
mod path;
pub mod sign_doc;
mod verify;

pub use error::Error;
pub use path::{Bip44Path, HARDENED};
pub use verify::{cosmos_address, verify_address, verify_signature, COMPRESSED_PK_LEN};

/// Result type for the fallible functions of this crate
pub type Result<T> = std::result::Result<T, Error>;
