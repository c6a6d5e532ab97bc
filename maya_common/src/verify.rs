use bech32::{FromBase32, ToBase32, Variant};
use bitcoin::hashes::{hash160, sha256, Hash};
use bitcoin::secp256k1::{self, ecdsa::Signature, Message, PublicKey, Secp256k1};

use crate::{Error, Result};

/// Length of a SEC1 compressed secp256k1 public key
pub const COMPRESSED_PK_LEN: usize = 33;

fn parse_compressed_pk(compressed_pk: &[u8]) -> Result<PublicKey> {
    if compressed_pk.len() != COMPRESSED_PK_LEN {
        return Err(Error::MalformedPublicKey(
            secp256k1::Error::InvalidPublicKey,
        ));
    }
    PublicKey::from_slice(compressed_pk).map_err(Error::MalformedPublicKey)
}

/// Verify a DER encoded ECDSA secp256k1 signature over `SHA256(message)`.
///
/// Returns `Ok(false)` when the signature is well formed but does not verify,
/// and an error when the signature or the public key cannot be parsed.
/// High-S signatures do not verify.
pub fn verify_signature(signature_der: &[u8], message: &[u8], compressed_pk: &[u8]) -> Result<bool> {
    let signature = Signature::from_der(signature_der).map_err(Error::MalformedSignature)?;
    let public_key = parse_compressed_pk(compressed_pk)?;

    let digest = sha256::Hash::hash(message);
    let message = Message::from_digest(digest.to_byte_array());

    let secp = Secp256k1::verification_only();
    Ok(secp
        .verify_ecdsa(&message, &signature, &public_key)
        .is_ok())
}

/// The account address for `compressed_pk`: `bech32(hrp, RIPEMD160(SHA256(pk)))`
pub fn cosmos_address(hrp: &str, compressed_pk: &[u8]) -> Result<String> {
    let public_key = parse_compressed_pk(compressed_pk)?;
    let hash = hash160::Hash::hash(&public_key.serialize());
    Ok(bech32::encode(
        hrp,
        hash.to_byte_array().to_base32(),
        Variant::Bech32,
    )?)
}

/// Check that `address` is the account address of `compressed_pk` for the given `hrp`
pub fn verify_address(address: &str, hrp: &str, compressed_pk: &[u8]) -> Result<bool> {
    let public_key = parse_compressed_pk(compressed_pk)?;
    let (found_hrp, data, variant) = bech32::decode(address)?;
    if variant != Variant::Bech32 || found_hrp != hrp {
        return Ok(false);
    }
    let program = Vec::<u8>::from_base32(&data)?;
    let hash = hash160::Hash::hash(&public_key.serialize());
    Ok(program == hash.to_byte_array())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::secp256k1::SecretKey;

    fn key_pair() -> (SecretKey, [u8; 33]) {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&[0xcd; 32]).unwrap();
        let pk = PublicKey::from_secret_key(&secp, &sk).serialize();
        (sk, pk)
    }

    fn sign(sk: &SecretKey, message: &[u8]) -> Vec<u8> {
        let secp = Secp256k1::new();
        let digest = sha256::Hash::hash(message);
        let msg = Message::from_digest(digest.to_byte_array());
        secp.sign_ecdsa(&msg, sk).serialize_der().to_vec()
    }

    #[test]
    fn valid_signature() {
        let (sk, pk) = key_pair();
        let tx = br#"{"account_number":"588","chain_id":"mayachain"}"#;
        let der = sign(&sk, tx);
        assert!(verify_signature(&der, tx, &pk).unwrap());
    }

    #[test]
    fn signature_over_other_message() {
        let (sk, pk) = key_pair();
        let der = sign(&sk, b"message");
        assert!(!verify_signature(&der, b"other message", &pk).unwrap());
    }

    #[test]
    fn signature_with_other_key() {
        let (sk, _) = key_pair();
        let secp = Secp256k1::new();
        let other = SecretKey::from_slice(&[0x11; 32]).unwrap();
        let other_pk = PublicKey::from_secret_key(&secp, &other).serialize();
        let der = sign(&sk, b"message");
        assert!(!verify_signature(&der, b"message", &other_pk).unwrap());
    }

    #[test]
    fn malformed_signature_is_an_error() {
        let (_, pk) = key_pair();
        let err = verify_signature(&[0x30, 0x02, 0x00], b"message", &pk).unwrap_err();
        assert!(matches!(err, Error::MalformedSignature(_)));

        let err = verify_signature(&[], b"message", &pk).unwrap_err();
        assert!(matches!(err, Error::MalformedSignature(_)));
    }

    #[test]
    fn malformed_public_key_is_an_error() {
        let (sk, pk) = key_pair();
        let der = sign(&sk, b"message");
        let err = verify_signature(&der, b"message", &pk[..32]).unwrap_err();
        assert!(matches!(err, Error::MalformedPublicKey(_)));

        let mut bad = pk;
        bad[0] = 0x05;
        let err = verify_signature(&der, b"message", &bad).unwrap_err();
        assert!(matches!(err, Error::MalformedPublicKey(_)));
    }

    #[test]
    fn address_matches_public_key() {
        let (_, pk) = key_pair();
        let address = cosmos_address("maya", &pk).unwrap();
        assert!(address.starts_with("maya1"));
        // hrp + separator + 32 chars of data + 6 chars of checksum
        assert_eq!(address.len(), 4 + 1 + 32 + 6);
        assert!(verify_address(&address, "maya", &pk).unwrap());
        assert!(!verify_address(&address, "tmaya", &pk).unwrap());

        let secp = Secp256k1::new();
        let other = SecretKey::from_slice(&[0x11; 32]).unwrap();
        let other_pk = PublicKey::from_secret_key(&secp, &other).serialize();
        assert!(!verify_address(&address, "maya", &other_pk).unwrap());
    }

    #[test]
    fn invalid_address_is_an_error() {
        let (_, pk) = key_pair();
        let err = verify_address("maya1notanaddress", "maya", &pk).unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
    }
}
