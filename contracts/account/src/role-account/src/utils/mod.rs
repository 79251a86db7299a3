//! Small deterministic helpers shared by the account entry points.

pub mod calldata;
pub mod crypto;
