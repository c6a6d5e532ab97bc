use core::fmt;

use maya_common::COMPRESSED_PK_LEN;

use crate::apdu::Ins;
use crate::Error;

/// Answer of the get version command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub test_mode: bool,
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    /// Only reported by recent app versions
    pub device_locked: Option<bool>,
    pub target_id: Option<[u8; 4]>,
}

impl VersionInfo {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, Error> {
        let (extended, target_id) = match data.len() {
            4 => (None, None),
            9 => {
                let mut target_id = [0u8; 4];
                target_id.copy_from_slice(&data[5..9]);
                (Some(data[4] != 0), Some(target_id))
            }
            _ => {
                return Err(Error::UnexpectedResult {
                    command: Ins::GetVersion as u8,
                    reason: "expected 4 or 9 bytes",
                    data: data.to_vec(),
                })
            }
        };
        Ok(VersionInfo {
            test_mode: data[0] != 0,
            major: data[1],
            minor: data[2],
            patch: data[3],
            device_locked: extended,
            target_id,
        })
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Answer of the get address command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressInfo {
    pub compressed_pk: [u8; COMPRESSED_PK_LEN],
    pub bech32_address: String,
}

impl AddressInfo {
    pub(crate) fn decode(data: &[u8]) -> Result<Self, Error> {
        let unexpected = |reason| Error::UnexpectedResult {
            command: Ins::GetAddrSecp256k1 as u8,
            reason,
            data: data.to_vec(),
        };
        if data.len() <= COMPRESSED_PK_LEN {
            return Err(unexpected("missing address"));
        }
        let mut compressed_pk = [0u8; COMPRESSED_PK_LEN];
        compressed_pk.copy_from_slice(&data[..COMPRESSED_PK_LEN]);
        if !matches!(compressed_pk[0], 0x02 | 0x03) {
            return Err(unexpected("public key is not compressed"));
        }
        let bech32_address = std::str::from_utf8(&data[COMPRESSED_PK_LEN..])
            .map_err(|_| unexpected("address is not ascii"))?
            .to_string();
        Ok(AddressInfo {
            compressed_pk,
            bech32_address,
        })
    }
}

/// Answer of the sign command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    /// DER encoded secp256k1 signature
    pub signature: Vec<u8>,
}

impl SignatureInfo {
    pub(crate) fn decode(data: Vec<u8>) -> Result<Self, Error> {
        if data.is_empty() {
            return Err(Error::NoSignature);
        }
        Ok(SignatureInfo { signature: data })
    }
}
