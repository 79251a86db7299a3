//! ERC-4337 (EntryPoint v0.7) packed user operation and its packed gas words.

use alloc::vec::Vec;

use alloy_primitives::{Address, Bytes, FixedBytes, U256};

/// Packed user operation as submitted to the relay.
///
/// Field order matches the Solidity struct; hashing and ABI encoding rely on it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackedUserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    /// `verificationGasLimit (16 bytes) || callGasLimit (16 bytes)`.
    pub account_gas_limits: FixedBytes<32>,
    pub pre_verification_gas: U256,
    /// `maxPriorityFeePerGas (16 bytes) || maxFeePerGas (16 bytes)`.
    pub gas_fees: FixedBytes<32>,
    /// Empty, or `paymaster (20) || verificationGas (16) || postOpGas (16) || data`.
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

impl PackedUserOperation {
    pub fn gas_limits(&self) -> GasLimits {
        GasLimits::unpack(self.account_gas_limits)
    }

    pub fn gas_fees(&self) -> GasFees {
        GasFees::unpack(self.gas_fees)
    }

    pub fn paymaster_info(&self) -> Result<Option<PaymasterInfo>, UnpackError> {
        PaymasterInfo::unpack(&self.paymaster_and_data)
    }

    /// Upper bound of gas the relay may charge for this operation.
    pub fn total_gas_limit(&self) -> Result<U256, UnpackError> {
        let limits = self.gas_limits();
        let mut total = U256::from(limits.verification)
            .saturating_add(U256::from(limits.call))
            .saturating_add(self.pre_verification_gas);
        if let Some(pm) = self.paymaster_info()? {
            total = total
                .saturating_add(U256::from(pm.verification_gas_limit))
                .saturating_add(U256::from(pm.post_op_gas_limit));
        }
        Ok(total)
    }

    /// Funds the relay must hold before running this operation (`total gas * maxFeePerGas`).
    pub fn required_prefund(&self) -> Result<U256, UnpackError> {
        Ok(self
            .total_gas_limit()?
            .saturating_mul(U256::from(self.gas_fees().max_fee)))
    }
}

/// Two gas limits sharing one 32-byte word, high half first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GasLimits {
    pub verification: u128,
    pub call: u128,
}

impl GasLimits {
    pub fn new(verification: u128, call: u128) -> Self {
        Self { verification, call }
    }

    pub fn pack(&self) -> FixedBytes<32> {
        pack_u128_pair(self.verification, self.call)
    }

    pub fn unpack(word: FixedBytes<32>) -> Self {
        let (verification, call) = unpack_u128_pair(word);
        Self { verification, call }
    }
}

/// Fee caps sharing one 32-byte word: priority fee in the high half, max fee in the low half.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GasFees {
    pub max_priority_fee: u128,
    pub max_fee: u128,
}

impl GasFees {
    pub fn new(max_priority_fee: u128, max_fee: u128) -> Self {
        Self {
            max_priority_fee,
            max_fee,
        }
    }

    pub fn pack(&self) -> FixedBytes<32> {
        pack_u128_pair(self.max_priority_fee, self.max_fee)
    }

    pub fn unpack(word: FixedBytes<32>) -> Self {
        let (max_priority_fee, max_fee) = unpack_u128_pair(word);
        Self {
            max_priority_fee,
            max_fee,
        }
    }
}

/// Paymaster section of `paymasterAndData`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaymasterInfo {
    pub paymaster: Address,
    pub verification_gas_limit: u128,
    pub post_op_gas_limit: u128,
    pub data: Bytes,
}

/// Minimum length of a non-empty `paymasterAndData` (address + two gas limits).
pub const PAYMASTER_DATA_OFFSET: usize = 20 + 16 + 16;

impl PaymasterInfo {
    /// Packs the paymaster section. A zero paymaster packs to empty bytes.
    pub fn pack(&self) -> Bytes {
        if self.paymaster == Address::ZERO {
            return Bytes::new();
        }
        let mut buf = Vec::with_capacity(PAYMASTER_DATA_OFFSET + self.data.len());
        buf.extend_from_slice(self.paymaster.as_slice());
        buf.extend_from_slice(&self.verification_gas_limit.to_be_bytes());
        buf.extend_from_slice(&self.post_op_gas_limit.to_be_bytes());
        buf.extend_from_slice(&self.data);
        Bytes::from(buf)
    }

    pub fn unpack(bytes: &[u8]) -> Result<Option<Self>, UnpackError> {
        if bytes.is_empty() {
            return Ok(None);
        }
        if bytes.len() < PAYMASTER_DATA_OFFSET {
            return Err(UnpackError::Truncated);
        }
        let paymaster = Address::from_slice(&bytes[0..20]);
        let verification_gas_limit = read_u128_be(&bytes[20..36]);
        let post_op_gas_limit = read_u128_be(&bytes[36..52]);
        Ok(Some(Self {
            paymaster,
            verification_gas_limit,
            post_op_gas_limit,
            data: Bytes::copy_from_slice(&bytes[PAYMASTER_DATA_OFFSET..]),
        }))
    }
}

/// Errors while unpacking packed operation fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpackError {
    Truncated,
}

fn pack_u128_pair(high: u128, low: u128) -> FixedBytes<32> {
    let mut word = [0u8; 32];
    word[0..16].copy_from_slice(&high.to_be_bytes());
    word[16..32].copy_from_slice(&low.to_be_bytes());
    FixedBytes(word)
}

fn unpack_u128_pair(word: FixedBytes<32>) -> (u128, u128) {
    (read_u128_be(&word[0..16]), read_u128_be(&word[16..32]))
}

fn read_u128_be(bytes: &[u8]) -> u128 {
    let mut buf = [0u8; 16];
    buf.copy_from_slice(&bytes[..16]);
    u128::from_be_bytes(buf)
}
