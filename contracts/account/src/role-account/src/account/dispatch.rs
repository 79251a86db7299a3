use alloc::vec::Vec;

use alloy_primitives::{Address, Bytes, U256};
use role_account_types::Call;
use tracing::debug;

use super::Account;
use crate::{abi::IRoleAccount, errors::AccountError, host::Host, utils::calldata::batch_calls};

impl<H: Host> Account<'_, H> {
    /// Calls `target` with `value` and `data` on behalf of the account and returns the raw
    /// return data.
    ///
    /// Direct callers need permission for `execute` itself and for `(target, selector)`.
    pub fn execute(&mut self, caller: Address, target: Address, value: U256, data: Bytes) -> Result<Bytes, AccountError> {
        debug!(account = ?self.address, ?caller, ?target, %value, "execute");
        let call = Call::new(target, value, data);
        self.atomic(|acc| {
            if !acc.is_trusted(caller)? {
                acc.authorize_self(
                    caller,
                    &IRoleAccount::executeCall {
                        target: call.target,
                        value: call.value,
                        data: call.data.clone(),
                    },
                )?;
                acc.authorize_calls(caller, core::slice::from_ref(&call))?;
            }
            acc.perform(0, &call)
        })
    }

    /// Runs `targets.len()` calls in order, all or nothing.
    ///
    /// Array shapes and every authorization are checked before the first call.
    pub fn execute_batch(
        &mut self,
        caller: Address,
        targets: Vec<Address>,
        values: Vec<U256>,
        datas: Vec<Bytes>,
    ) -> Result<(), AccountError> {
        debug!(account = ?self.address, ?caller, calls = targets.len(), "execute_batch");
        let batch = IRoleAccount::executeBatchCall {
            targets,
            values,
            datas,
        };
        let calls = batch_calls(batch.targets.clone(), batch.values.clone(), batch.datas.clone())?;
        self.atomic(|acc| {
            if !acc.is_trusted(caller)? {
                acc.authorize_self(caller, &batch)?;
                acc.authorize_calls(caller, &calls)?;
            }
            for (index, call) in calls.iter().enumerate() {
                acc.perform(index, call)?;
            }
            Ok(())
        })
    }
}
