//! Calls performed by the account and selector helpers.

use alloy_primitives::{Address, Bytes, U256};

/// 4-byte function selector.
pub type Selector = [u8; 4];

/// One external call of an `execute` / `executeBatch`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Call {
    pub target: Address,
    pub value: U256,
    pub data: Bytes,
}

impl Call {
    pub fn new(target: Address, value: U256, data: Bytes) -> Self {
        Self {
            target,
            value,
            data,
        }
    }

    /// Selector addressed by this call; plain value transfers map to the zero selector.
    pub fn selector(&self) -> Selector {
        selector_of(&self.data)
    }
}

/// First four bytes of `data`, or the zero selector when `data` is shorter.
pub fn selector_of(data: &[u8]) -> Selector {
    let mut sel = [0u8; 4];
    if data.len() >= 4 {
        sel.copy_from_slice(&data[..4]);
    }
    sel
}
