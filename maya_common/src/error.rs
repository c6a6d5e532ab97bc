use bitcoin::secp256k1;

#[allow(missing_docs)]
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Path component #{index} ({value}) already has the hardened bit set")]
    HardenedComponent { index: usize, value: u32 },

    #[error("Invalid derivation path '{0}', expected m/purpose'/coin'/account'/change/index")]
    InvalidPath(String),

    #[error("Malformed DER signature: {0}")]
    MalformedSignature(secp256k1::Error),

    #[error("Malformed public key: {0}")]
    MalformedPublicKey(secp256k1::Error),

    #[error("Invalid bech32 address: {0}")]
    InvalidAddress(#[from] bech32::Error),
}
