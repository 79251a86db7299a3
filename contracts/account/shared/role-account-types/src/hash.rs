//! Canonical digests: user-operation hash (what signers sign) and scheduled-operation ids.
//!
//! Encodings are built word by word to match Solidity `abi.encode` exactly.

use alloc::vec::Vec;

use alloy_primitives::{keccak256, Address, FixedBytes, U256};

use crate::operation::PackedUserOperation;

/// Hash of the signed fields of `op`, domain-separated by relay address and chain id.
///
/// Matches EntryPoint v0.7 `getUserOpHash`: byte-string fields enter as their keccak256,
/// gas words enter as packed, and the result is bound to `(entry_point, chain_id)`.
pub fn user_op_hash(op: &PackedUserOperation, entry_point: Address, chain_id: u64) -> FixedBytes<32> {
    let mut packed = Vec::with_capacity(32 * 8);
    packed.extend_from_slice(&address_word(op.sender));
    packed.extend_from_slice(&op.nonce.to_be_bytes::<32>());
    packed.extend_from_slice(keccak256(&op.init_code).as_slice());
    packed.extend_from_slice(keccak256(&op.call_data).as_slice());
    packed.extend_from_slice(op.account_gas_limits.as_slice());
    packed.extend_from_slice(&op.pre_verification_gas.to_be_bytes::<32>());
    packed.extend_from_slice(op.gas_fees.as_slice());
    packed.extend_from_slice(keccak256(&op.paymaster_and_data).as_slice());
    let inner = keccak256(packed);

    let mut outer = Vec::with_capacity(32 * 3);
    outer.extend_from_slice(inner.as_slice());
    outer.extend_from_slice(&address_word(entry_point));
    outer.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
    keccak256(outer)
}

/// EIP-191 personal-message digest of a 32-byte hash (`"\x19Ethereum Signed Message:\n32" || hash`).
pub fn to_eth_signed_message_hash(hash: FixedBytes<32>) -> FixedBytes<32> {
    let mut buf = Vec::with_capacity(28 + 32);
    buf.extend_from_slice(b"\x19Ethereum Signed Message:\n32");
    buf.extend_from_slice(hash.as_slice());
    keccak256(buf)
}

/// Id of a scheduled operation: `keccak256(abi.encode(caller, target, data))`.
pub fn hash_operation(caller: Address, target: Address, data: &[u8]) -> FixedBytes<32> {
    let padded_len = data.len().div_ceil(32) * 32;
    let mut buf = Vec::with_capacity(32 * 4 + padded_len);
    buf.extend_from_slice(&address_word(caller));
    buf.extend_from_slice(&address_word(target));
    // offset of the dynamic `bytes` argument
    buf.extend_from_slice(&U256::from(32u64 * 3).to_be_bytes::<32>());
    buf.extend_from_slice(&U256::from(data.len()).to_be_bytes::<32>());
    buf.extend_from_slice(data);
    buf.resize(32 * 4 + padded_len, 0);
    keccak256(buf)
}

fn address_word(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..32].copy_from_slice(address.as_slice());
    word
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{GasFees, GasLimits};
    use alloy_primitives::{address, Bytes};
    use proptest::prelude::*;

    const ENTRY_POINT: Address = address!("0000000071727De22E5E9d8BAf0edAc6f37da032");

    fn sample_op() -> PackedUserOperation {
        PackedUserOperation {
            sender: address!("1111111111111111111111111111111111111111"),
            nonce: U256::from(3u64),
            init_code: Bytes::new(),
            call_data: Bytes::from_static(&[0xb6, 0x1d, 0x27, 0xf6, 0x01]),
            account_gas_limits: GasLimits::new(999_999, 999_999).pack(),
            pre_verification_gas: U256::from(999_999u64),
            gas_fees: GasFees::new(1_000_000_000, 1_000_000_000).pack(),
            paymaster_and_data: Bytes::new(),
            signature: Bytes::new(),
        }
    }

    #[test]
    fn signature_is_not_part_of_the_hash() {
        let op = sample_op();
        let mut signed = op.clone();
        signed.signature = Bytes::from_static(&[7u8; 65]);
        assert_eq!(
            user_op_hash(&op, ENTRY_POINT, 137),
            user_op_hash(&signed, ENTRY_POINT, 137)
        );
    }

    #[test]
    fn every_signed_field_changes_the_hash() {
        let base = sample_op();
        let h = user_op_hash(&base, ENTRY_POINT, 137);
        let mutations: [fn(&mut PackedUserOperation); 7] = [
            |op| op.sender = Address::ZERO,
            |op| op.init_code = Bytes::from_static(&[1]),
            |op| op.call_data = Bytes::new(),
            |op| op.account_gas_limits = GasLimits::new(1, 999_999).pack(),
            |op| op.pre_verification_gas = U256::ZERO,
            |op| op.gas_fees = GasFees::new(1, 1).pack(),
            |op| op.paymaster_and_data = Bytes::from_static(&[0u8; 52]),
        ];
        for mutate in mutations {
            let mut op = base.clone();
            mutate(&mut op);
            assert_ne!(user_op_hash(&op, ENTRY_POINT, 137), h);
        }
    }

    #[test]
    fn eth_signed_message_prefix() {
        // keccak256("\x19Ethereum Signed Message:\n32" || 0x00..00)
        let digest = to_eth_signed_message_hash(FixedBytes::ZERO);
        let mut buf = b"\x19Ethereum Signed Message:\n32".to_vec();
        buf.extend_from_slice(&[0u8; 32]);
        assert_eq!(digest, keccak256(buf));
    }

    #[test]
    fn operation_id_pads_data_to_words() {
        let caller = address!("2222222222222222222222222222222222222222");
        let target = address!("3333333333333333333333333333333333333333");
        let mut expected = Vec::new();
        expected.extend_from_slice(&address_word(caller));
        expected.extend_from_slice(&address_word(target));
        expected.extend_from_slice(&U256::from(96u64).to_be_bytes::<32>());
        expected.extend_from_slice(&U256::from(4u64).to_be_bytes::<32>());
        let mut word = [0u8; 32];
        word[..4].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        expected.extend_from_slice(&word);
        assert_eq!(
            hash_operation(caller, target, &[0xde, 0xad, 0xbe, 0xef]),
            keccak256(expected)
        );
        assert_ne!(
            hash_operation(caller, target, &[]),
            hash_operation(target, caller, &[])
        );
    }

    proptest! {
        #[test]
        fn nonce_alone_separates_hashes(a in any::<u64>(), b in any::<u64>()) {
            prop_assume!(a != b);
            let mut op_a = sample_op();
            op_a.nonce = U256::from(a);
            let mut op_b = sample_op();
            op_b.nonce = U256::from(b);
            prop_assert_ne!(
                user_op_hash(&op_a, ENTRY_POINT, 137),
                user_op_hash(&op_b, ENTRY_POINT, 137)
            );
        }

        #[test]
        fn domain_parameters_separate_hashes(
            chain_a in any::<u64>(),
            chain_b in any::<u64>(),
            relay in any::<[u8; 20]>(),
        ) {
            let op = sample_op();
            let relay = Address::from(relay);
            if chain_a != chain_b {
                prop_assert_ne!(
                    user_op_hash(&op, ENTRY_POINT, chain_a),
                    user_op_hash(&op, ENTRY_POINT, chain_b)
                );
            }
            if relay != ENTRY_POINT {
                prop_assert_ne!(
                    user_op_hash(&op, ENTRY_POINT, chain_a),
                    user_op_hash(&op, relay, chain_a)
                );
            }
        }
    }
}
