//! Account errors and their Solidity custom-error encoding.

use alloc::vec::Vec;

use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use alloy_sol_types::{SolError, SolInterface};
use role_account_types::{RoleId, Selector};

use crate::abi::IRoleAccount;

/// Errors raised by account entry points. Every variant rolls back the effects of the
/// entry point that raised it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("{caller} is missing role {required_role}")]
    Unauthorized { caller: Address, required_role: RoleId },
    #[error("insufficient deposit: have {have}, need {need}")]
    InsufficientDeposit { have: U256, need: U256 },
    #[error("wrong array length: expected {expected}, got {actual}")]
    WrongArrayLength { expected: usize, actual: usize },
    /// A delayed permission was used without a ready schedule.
    #[error("delayed operation is not scheduled or not ready")]
    DelayNotAllowed,
    #[error("invalid account nonce: expected {expected}, got {actual}")]
    ReplayOrBadNonce { expected: U256, actual: U256 },
    /// Call `index` of an execution reverted with `reason`.
    #[error("call {index} failed: 0x{}", hex::encode(.reason))]
    CallFailed { index: usize, reason: Bytes },
    #[error("{caller} is not the entry point")]
    NotFromEntryPoint { caller: Address },
    #[error("operation {operation_id} is already scheduled")]
    AlreadyScheduled { operation_id: FixedBytes<32> },
    #[error("operation {operation_id} is not scheduled")]
    NotScheduled { operation_id: FixedBytes<32> },
    #[error("operation {operation_id} is not ready")]
    NotReady { operation_id: FixedBytes<32> },
    #[error("role {role} is locked")]
    LockedRole { role: RoleId },
    #[error("renounce confirmation does not match the caller")]
    BadConfirmation,
    #[error("no account deployed at {address}")]
    UnknownAccount { address: Address },
    #[error("unknown selector 0x{}", hex::encode(.selector))]
    UnknownSelector { selector: Selector },
    #[error("malformed calldata")]
    MalformedCalldata,
}

impl AccountError {
    /// Revert data for this error, as a Solidity custom error.
    pub fn abi_encode(&self) -> Vec<u8> {
        use IRoleAccount as I;

        match self {
            AccountError::Unauthorized {
                caller,
                required_role,
            } => I::AccessManagerUnauthorizedAccount {
                msgsender: *caller,
                roleId: *required_role,
            }
            .abi_encode(),
            AccountError::InsufficientDeposit { have, need } => I::InsufficientDeposit {
                have: *have,
                need: *need,
            }
            .abi_encode(),
            AccountError::WrongArrayLength { expected, actual } => I::WrongArrayLength {
                expected: U256::from(*expected),
                actual: U256::from(*actual),
            }
            .abi_encode(),
            AccountError::DelayNotAllowed => I::DelayNotAllowed {}.abi_encode(),
            AccountError::ReplayOrBadNonce { expected, actual } => I::InvalidAccountNonce {
                expected: *expected,
                actual: *actual,
            }
            .abi_encode(),
            AccountError::CallFailed { index, reason } => I::CallFailed {
                index: U256::from(*index),
                reason: reason.clone(),
            }
            .abi_encode(),
            AccountError::NotFromEntryPoint { caller } => {
                I::NotFromEntryPoint { caller: *caller }.abi_encode()
            }
            AccountError::AlreadyScheduled { operation_id } => I::AccessManagerAlreadyScheduled {
                operationId: *operation_id,
            }
            .abi_encode(),
            AccountError::NotScheduled { operation_id } => I::AccessManagerNotScheduled {
                operationId: *operation_id,
            }
            .abi_encode(),
            AccountError::NotReady { operation_id } => I::AccessManagerNotReady {
                operationId: *operation_id,
            }
            .abi_encode(),
            AccountError::LockedRole { role } => I::AccessManagerLockedRole { roleId: *role }.abi_encode(),
            AccountError::BadConfirmation => I::AccessManagerBadConfirmation {}.abi_encode(),
            AccountError::UnknownAccount { address } => {
                I::UnknownAccount { account: *address }.abi_encode()
            }
            AccountError::UnknownSelector { selector } => I::UnknownSelector {
                selector: FixedBytes(*selector),
            }
            .abi_encode(),
            AccountError::MalformedCalldata => I::MalformedCalldata {}.abi_encode(),
        }
    }

    /// Parses revert data produced by [`AccountError::abi_encode`]. Returns `None` for
    /// anything else (string reverts, foreign custom errors).
    pub fn abi_decode(data: &[u8]) -> Option<Self> {
        use IRoleAccount::IRoleAccountErrors as E;

        let err = match E::abi_decode(data, true).ok()? {
            E::AccessManagerUnauthorizedAccount(e) => AccountError::Unauthorized {
                caller: e.msgsender,
                required_role: e.roleId,
            },
            E::InsufficientDeposit(e) => AccountError::InsufficientDeposit {
                have: e.have,
                need: e.need,
            },
            E::WrongArrayLength(e) => AccountError::WrongArrayLength {
                expected: saturating_usize(e.expected),
                actual: saturating_usize(e.actual),
            },
            E::DelayNotAllowed(_) => AccountError::DelayNotAllowed,
            E::InvalidAccountNonce(e) => AccountError::ReplayOrBadNonce {
                expected: e.expected,
                actual: e.actual,
            },
            E::CallFailed(e) => AccountError::CallFailed {
                index: saturating_usize(e.index),
                reason: e.reason,
            },
            E::NotFromEntryPoint(e) => AccountError::NotFromEntryPoint { caller: e.caller },
            E::AccessManagerAlreadyScheduled(e) => AccountError::AlreadyScheduled {
                operation_id: e.operationId,
            },
            E::AccessManagerNotScheduled(e) => AccountError::NotScheduled {
                operation_id: e.operationId,
            },
            E::AccessManagerNotReady(e) => AccountError::NotReady {
                operation_id: e.operationId,
            },
            E::AccessManagerLockedRole(e) => AccountError::LockedRole { role: e.roleId },
            E::AccessManagerBadConfirmation(_) => AccountError::BadConfirmation,
            E::UnknownAccount(e) => AccountError::UnknownAccount { address: e.account },
            E::UnknownSelector(e) => AccountError::UnknownSelector {
                selector: e.selector.0,
            },
            E::MalformedCalldata(_) => AccountError::MalformedCalldata,
        };
        Some(err)
    }
}

fn saturating_usize(value: U256) -> usize {
    let limbs = value.as_limbs();
    if limbs[1..].iter().any(|limb| *limb != 0) {
        return usize::MAX;
    }
    usize::try_from(limbs[0]).unwrap_or(usize::MAX)
}

/// Errors while recovering a signer from a 65-byte signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    InvalidLength(usize),
    InvalidRecoveryId(u8),
    /// `s` in the upper half of the curve order (malleable form).
    HighS,
    Malformed,
    RecoveryFailed,
}
