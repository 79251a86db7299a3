//! Shared types for the role-gated ERC-4337 account.
//!
//! Everything here is pure and deterministic so the same code can back the account itself,
//! the relay-side tooling and off-chain signers.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod calls;
pub mod hash;
pub mod operation;
pub mod roles;

pub use calls::{selector_of, Call, Selector};
pub use hash::{hash_operation, to_eth_signed_message_hash, user_op_hash};
pub use operation::{GasFees, GasLimits, PackedUserOperation, PaymasterInfo, UnpackError};
pub use roles::{RoleId, ADMIN_ROLE, EXECUTOR_ROLE, PUBLIC_ROLE, WITHDRAW_ROLE};
