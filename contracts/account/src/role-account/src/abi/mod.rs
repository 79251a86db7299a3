//! ABI declarations and conversions between the generated Solidity types and the
//! plain Rust types used by the rest of the crate.

pub mod constants;
pub mod interfaces;

pub use interfaces::{IERC20, IEntryPoint, IRoleAccount};

use role_account_types::PackedUserOperation;

impl From<interfaces::PackedUserOperation> for PackedUserOperation {
    fn from(op: interfaces::PackedUserOperation) -> Self {
        Self {
            sender: op.sender,
            nonce: op.nonce,
            init_code: op.initCode,
            call_data: op.callData,
            account_gas_limits: op.accountGasLimits,
            pre_verification_gas: op.preVerificationGas,
            gas_fees: op.gasFees,
            paymaster_and_data: op.paymasterAndData,
            signature: op.signature,
        }
    }
}

impl From<PackedUserOperation> for interfaces::PackedUserOperation {
    fn from(op: PackedUserOperation) -> Self {
        Self {
            sender: op.sender,
            nonce: op.nonce,
            initCode: op.init_code,
            callData: op.call_data,
            accountGasLimits: op.account_gas_limits,
            preVerificationGas: op.pre_verification_gas,
            gasFees: op.gas_fees,
            paymasterAndData: op.paymaster_and_data,
            signature: op.signature,
        }
    }
}
