//! Execution environment seam.
//!
//! The account never owns its state or talks to other contracts directly: it goes through a
//! `Host`. A chain integration and the in-memory [`MockChain`](crate::mock::MockChain)
//! implement the same trait, so the account logic is identical in both.

use alloc::vec::Vec;

use alloy_primitives::{Address, U256};

use crate::{account::AccountStorage, errors::AccountError, events::AccountEvent, policy::AuthorizationPolicy};

/// Handle to a host journal position, returned by [`Host::checkpoint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Checkpoint(pub usize);

pub trait Host {
    type Policy: AuthorizationPolicy;

    fn block_timestamp(&self) -> u64;

    fn chain_id(&self) -> u64;

    /// Native balance of `who`.
    fn balance(&self, who: Address) -> U256;

    /// Storage of the account deployed at `address`.
    fn account(&mut self, address: Address) -> Result<&mut AccountStorage<Self::Policy>, AccountError>;

    /// Transfers `value` from `caller` to `target` and runs `data` against `target`.
    ///
    /// Returns the return data, or the raw revert data. A reverted call leaves no effects.
    /// The target may call back into any account (re-entrancy), so callers must not hold
    /// storage references across this call.
    fn call(&mut self, caller: Address, target: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Vec<u8>>;

    fn checkpoint(&mut self) -> Checkpoint;

    /// Discards every effect recorded after `checkpoint`.
    fn revert_to(&mut self, checkpoint: Checkpoint);

    /// Keeps the effects recorded after `checkpoint`; it can no longer be reverted to.
    fn commit(&mut self, checkpoint: Checkpoint);

    fn emit(&mut self, account: Address, event: AccountEvent);
}
