//! Signer recovery for user operations.
//!
//! Signatures are 65-byte `r || s || v` over the EIP-191 personal-message digest of the user
//! operation hash. `v` may be given as `0/1` or `27/28`; high-`s` signatures are rejected so
//! each signed operation has exactly one valid encoding.

use alloy_primitives::{keccak256, Address, FixedBytes};
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

use crate::errors::SignatureError;

/// Recover the signer of `digest` (already prefixed / hashed by the caller).
pub fn recover_signer(digest: FixedBytes<32>, signature: &[u8]) -> Result<Address, SignatureError> {
    if signature.len() != 65 {
        return Err(SignatureError::InvalidLength(signature.len()));
    }
    let v = signature[64];
    let recovery_byte = match v {
        27 | 28 => v - 27,
        0 | 1 => v,
        _ => return Err(SignatureError::InvalidRecoveryId(v)),
    };
    let recovery_id = RecoveryId::from_byte(recovery_byte).ok_or(SignatureError::InvalidRecoveryId(v))?;

    let sig = Signature::from_slice(&signature[..64]).map_err(|_| SignatureError::Malformed)?;
    if sig.normalize_s().is_some() {
        return Err(SignatureError::HighS);
    }

    let key = VerifyingKey::recover_from_prehash(digest.as_slice(), &sig, recovery_id)
        .map_err(|_| SignatureError::RecoveryFailed)?;
    Ok(address_of(&key))
}

/// Ethereum address of a public key: low 20 bytes of `keccak256(x || y)`.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
