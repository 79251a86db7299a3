use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use k256::ecdsa::{SigningKey, VerifyingKey};
use role_account::abi::IRoleAccount;
use role_account_types::{Call, PackedUserOperation};
use sha3::{Digest, Keccak256};

fn keccak256_bytes(bytes: &[u8]) -> FixedBytes<32> {
    let mut h = Keccak256::new();
    h.update(bytes);
    let out = h.finalize();
    let mut b = [0u8; 32];
    b.copy_from_slice(out.as_slice());
    FixedBytes(b)
}

/// Compute the user-operation hash (must match the relay's `getUserOpHash`).
///
/// Built from `abi.encode` tuples rather than by hand, so it cross-checks the on-chain
/// word-by-word encoding.
pub fn user_op_hash(op: &PackedUserOperation, entry_point: Address, chain_id: u64) -> FixedBytes<32> {
    let packed = (
        op.sender,
        op.nonce,
        keccak256_bytes(&op.init_code),
        keccak256_bytes(&op.call_data),
        op.account_gas_limits,
        op.pre_verification_gas,
        op.gas_fees,
        keccak256_bytes(&op.paymaster_and_data),
    )
        .abi_encode_params();
    let outer = (keccak256_bytes(&packed), entry_point, U256::from(chain_id)).abi_encode_params();
    keccak256_bytes(&outer)
}

/// EIP-191 digest the account recovers the signer from.
pub fn eth_signed_message_digest(hash: FixedBytes<32>) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(28 + 32);
    buf.extend_from_slice(b"\x19Ethereum Signed Message:\n32");
    buf.extend_from_slice(hash.as_slice());
    keccak256_bytes(&buf)
}

/// Sign a user-operation hash the way `signMessage(userOpHash)` does: `r || s || v`,
/// `v` in {27, 28}.
pub fn sign_user_op_hash(op_hash: FixedBytes<32>, signing_key: &SigningKey) -> Result<Bytes, k256::ecdsa::Error> {
    let digest = eth_signed_message_digest(op_hash);
    let (signature, recovery_id) = signing_key.sign_prehash_recoverable(digest.as_slice())?;
    let mut sig_bytes = Vec::with_capacity(65);
    sig_bytes.extend_from_slice(&signature.to_bytes());
    sig_bytes.push(27 + recovery_id.to_byte());
    Ok(sig_bytes.into())
}

/// Hash `op` for `(entry_point, chain_id)`, sign it and write the signature into `op`.
/// Returns the signed hash.
pub fn sign_user_op(
    op: &mut PackedUserOperation,
    entry_point: Address,
    chain_id: u64,
    signing_key: &SigningKey,
) -> Result<FixedBytes<32>, k256::ecdsa::Error> {
    let op_hash = user_op_hash(op, entry_point, chain_id);
    op.signature = sign_user_op_hash(op_hash, signing_key)?;
    Ok(op_hash)
}

/// Ethereum address of a public key.
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256_bytes(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// `execute(target, value, data)` calldata.
pub fn encode_execute(target: Address, value: U256, data: Bytes) -> Vec<u8> {
    IRoleAccount::executeCall { target, value, data }.abi_encode()
}

/// `executeBatch(targets, values, datas)` calldata. The values array is left empty when no
/// call carries value.
pub fn encode_execute_batch(calls: &[Call]) -> Vec<u8> {
    let values = if calls.iter().all(|call| call.value.is_zero()) {
        Vec::new()
    } else {
        calls.iter().map(|call| call.value).collect()
    };
    IRoleAccount::executeBatchCall {
        targets: calls.iter().map(|call| call.target).collect(),
        values,
        datas: calls.iter().map(|call| call.data.clone()).collect(),
    }
    .abi_encode()
}

/// `schedule(target, data, when)` calldata.
pub fn encode_schedule(target: Address, data: Bytes, when: u64) -> Vec<u8> {
    IRoleAccount::scheduleCall { target, data, when }.abi_encode()
}

/// Id of the scheduled operation `(caller, target, data)`: `keccak256(abi.encode(...))`.
pub fn operation_id(caller: Address, target: Address, data: &[u8]) -> FixedBytes<32> {
    keccak256_bytes(&(caller, target, Bytes::copy_from_slice(data)).abi_encode_params())
}

/// Earliest time a call scheduled at `now` for `when` can run under `delay`.
pub fn ready_at(now: u64, delay: u32, when: u64) -> u64 {
    when.max(now.saturating_add(u64::from(delay)))
}
