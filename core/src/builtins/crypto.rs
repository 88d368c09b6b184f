//! Hash functions and signature verification backing the crypto builtins.
//!
//! Malformed keys or signatures are errors; a well-formed signature that
//! does not verify is `false`.

use blake2::{
    Blake2b, Digest,
    digest::consts::{U28, U32},
};
use sha2::Sha256;

pub fn sha2_256(bytes: &[u8]) -> Vec<u8> {
    Sha256::digest(bytes).to_vec()
}

pub fn blake2b_256(bytes: &[u8]) -> Vec<u8> {
    Blake2b::<U32>::digest(bytes).to_vec()
}

pub fn blake2b_224(bytes: &[u8]) -> Vec<u8> {
    Blake2b::<U28>::digest(bytes).to_vec()
}

fn fixed<const N: usize>(bytes: &[u8], what: &str) -> Result<[u8; N], String> {
    bytes
        .try_into()
        .map_err(|_| format!("{what} must be {N} bytes, got {}", bytes.len()))
}

pub fn verify_ed25519(key: &[u8], message: &[u8], signature: &[u8]) -> Result<bool, String> {
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};

    let key = VerifyingKey::from_bytes(&fixed::<32>(key, "public key")?)
        .map_err(|_| "invalid Ed25519 public key".to_string())?;
    let signature = Signature::from_bytes(&fixed::<64>(signature, "signature")?);
    Ok(key.verify(message, &signature).is_ok())
}

/// ECDSA over secp256k1. The message is a 32-byte hash, the key is
/// SEC1-compressed, and the signature is 64 bytes of `r || s`.
pub fn verify_ecdsa_secp256k1(
    key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<bool, String> {
    use k256::ecdsa::{Signature, VerifyingKey, signature::hazmat::PrehashVerifier};

    let key = fixed::<33>(key, "public key")?;
    let message = fixed::<32>(message, "message hash")?;
    let signature = fixed::<64>(signature, "signature")?;
    let key = VerifyingKey::from_sec1_bytes(&key)
        .map_err(|_| "invalid secp256k1 public key".to_string())?;
    // A well-sized signature whose scalars are out of range simply fails.
    let Ok(signature) = Signature::from_slice(&signature) else {
        return Ok(false);
    };
    Ok(key.verify_prehash(&message, &signature).is_ok())
}

/// BIP-340 Schnorr over secp256k1 with an x-only 32-byte key and a message
/// of any length.
pub fn verify_schnorr_secp256k1(
    key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<bool, String> {
    use k256::schnorr::{Signature, VerifyingKey};

    let key = fixed::<32>(key, "public key")?;
    let signature = fixed::<64>(signature, "signature")?;
    let key =
        VerifyingKey::from_bytes(&key).map_err(|_| "invalid Schnorr public key".to_string())?;
    let Ok(signature) = Signature::try_from(&signature[..]) else {
        return Ok(false);
    };
    Ok(key.verify_raw(message, &signature).is_ok())
}
