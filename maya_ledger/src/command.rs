//! APDU commands of the MAYAChain app.

use core::fmt;

use maya_common::Bip44Path;

use crate::apdu::{apdu, APDUCmdVec, ChunkPayloadType, Ins, CHUNK_SIZE};
use crate::Error;

/// Longest human readable part accepted by the app
const MAX_HRP_LEN: usize = 83;

/// A request to the app, serialized to one or more APDUs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    GetVersion,
    GetAddress {
        path: Bip44Path,
        hrp: String,
        /// Ask the user to confirm the address on the device
        display: bool,
    },
    Sign {
        path: Bip44Path,
        tx: Vec<u8>,
    },
}

impl Request {
    pub fn ins(&self) -> Ins {
        match self {
            Request::GetVersion => Ins::GetVersion,
            Request::GetAddress { .. } => Ins::GetAddrSecp256k1,
            Request::Sign { .. } => Ins::SignSecp256k1,
        }
    }

    /// Whether the device waits for the user before answering
    pub fn is_interactive(&self) -> bool {
        match self {
            Request::GetVersion => false,
            Request::GetAddress { display, .. } => *display,
            Request::Sign { .. } => true,
        }
    }

    /// The APDUs to exchange in order, never empty
    pub fn apdus(&self) -> Result<Vec<APDUCmdVec>, Error> {
        match self {
            Request::GetVersion => Ok(vec![apdu(Ins::GetVersion, 0x00, vec![])]),
            Request::GetAddress { path, hrp, display } => {
                if hrp.is_empty()
                    || hrp.len() > MAX_HRP_LEN
                    || !hrp.bytes().all(|b| (33..=126).contains(&b))
                {
                    return Err(Error::InvalidHrp(hrp.clone()));
                }
                let mut data = Vec::with_capacity(1 + hrp.len() + Bip44Path::SERIALIZED_LEN);
                data.push(hrp.len() as u8);
                data.extend_from_slice(hrp.as_bytes());
                data.extend_from_slice(&path.serialize());
                Ok(vec![apdu(Ins::GetAddrSecp256k1, *display as u8, data)])
            }
            Request::Sign { path, tx } => {
                if tx.is_empty() {
                    return Err(Error::EmptyMessage);
                }
                let mut apdus = vec![apdu(
                    Ins::SignSecp256k1,
                    ChunkPayloadType::Init as u8,
                    path.serialize(),
                )];
                let chunks = tx.chunks(CHUNK_SIZE);
                let last = chunks.len() - 1;
                for (i, chunk) in chunks.enumerate() {
                    let p1 = if i == last {
                        ChunkPayloadType::Last
                    } else {
                        ChunkPayloadType::Add
                    };
                    apdus.push(apdu(Ins::SignSecp256k1, p1 as u8, chunk.to_vec()));
                }
                Ok(apdus)
            }
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::GetVersion => write!(f, "get version"),
            Request::GetAddress { path, hrp, display } => {
                let verb = if *display { "show" } else { "get" };
                write!(f, "{verb} {hrp} address {path}")
            }
            Request::Sign { path, tx } => write!(f, "sign {} bytes with {path}", tx.len()),
        }
    }
}
