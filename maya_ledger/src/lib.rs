#![cfg_attr(not(test), deny(clippy::unwrap_used))]

//! Client of the MAYAChain Ledger app.
//!
//! [`MayaApp`] builds the app commands and decodes its answers, exchanging
//! APDUs through a [`Transport`], usually a [`TransportTcp`] connected to
//! the speculos emulator.

mod apdu;
mod client;
mod command;
mod error;
mod response;
mod transport_tcp;

pub use apdu::{APDUCmdVec, ChunkPayloadType, Ins, StatusWord, CHUNK_SIZE, CLA};
pub use client::{MayaApp, Transport};
pub use command::Request;
pub use error::{Error, TransportError};
pub use maya_common::Bip44Path;
pub use response::{AddressInfo, SignatureInfo, VersionInfo};
pub use transport_tcp::{TransportTcp, CONNECT_TIMEOUT};

pub type Result<T> = std::result::Result<T, Error>;
