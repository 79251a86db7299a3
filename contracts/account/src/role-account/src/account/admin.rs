//! Role administration and scheduled operations.
//!
//! Mutators authorize the caller against the account's own selector first, so the policy
//! only ever sees changes already cleared for the caller.

use alloc::{string::String, vec::Vec};

use alloy_primitives::{Address, Bytes, FixedBytes};
use role_account_types::{hash_operation, RoleId, Selector};
use tracing::info;

use super::Account;
use crate::{
    abi::IRoleAccount,
    errors::AccountError,
    events::AccountEvent,
    host::Host,
    policy::AuthorizationPolicy,
};

impl<H: Host> Account<'_, H> {
    pub fn has_role(&mut self, role: RoleId, account: Address) -> Result<(bool, u32), AccountError> {
        Ok(self.policy()?.has_role(role, account))
    }

    pub fn role_label(&mut self, role: RoleId) -> Result<Option<String>, AccountError> {
        Ok(self.policy()?.role_label(role).map(String::from))
    }

    pub fn get_target_function_role(&mut self, target: Address, selector: Selector) -> Result<RoleId, AccountError> {
        Ok(self.policy()?.target_function_role(target, selector))
    }

    pub fn is_target_closed(&mut self, target: Address) -> Result<bool, AccountError> {
        Ok(self.policy()?.is_target_closed(target))
    }

    /// `(immediate, delay)`: whether `caller` may call right away, and otherwise the delay
    /// after which a scheduled call becomes executable.
    pub fn can_call(&mut self, caller: Address, target: Address, selector: Selector) -> Result<(bool, u32), AccountError> {
        let permission = self.policy()?.is_authorized(caller, target, selector);
        Ok(match (permission.allowed, permission.delay) {
            (false, _) => (false, 0),
            (true, 0) => (true, 0),
            (true, delay) => (false, delay),
        })
    }

    pub fn grant_role(&mut self, caller: Address, role: RoleId, account: Address, delay: u32) -> Result<(), AccountError> {
        self.atomic(|acc| {
            acc.authorize_self(
                caller,
                &IRoleAccount::grantRoleCall {
                    roleId: role,
                    account,
                    executionDelay: delay,
                },
            )?;
            let now = acc.host.block_timestamp();
            let new_member = acc.policy()?.grant_role(role, account, delay, now)?;
            info!(account = ?acc.address, role, member = ?account, delay, new_member, "role granted");
            acc.emit(AccountEvent::RoleGranted {
                role,
                account,
                delay,
                since: now,
                new_member,
            });
            Ok(())
        })
    }

    pub fn revoke_role(&mut self, caller: Address, role: RoleId, account: Address) -> Result<(), AccountError> {
        self.atomic(|acc| {
            acc.authorize_self(caller, &IRoleAccount::revokeRoleCall { roleId: role, account })?;
            acc.remove_member(role, account)
        })
    }

    /// Drops the caller's own membership. `confirmation` must repeat the caller's address.
    pub fn renounce_role(&mut self, caller: Address, role: RoleId, confirmation: Address) -> Result<(), AccountError> {
        if confirmation != caller {
            return Err(AccountError::BadConfirmation);
        }
        self.atomic(|acc| acc.remove_member(role, caller))
    }

    fn remove_member(&mut self, role: RoleId, account: Address) -> Result<(), AccountError> {
        if self.policy()?.revoke_role(role, account)? {
            info!(account = ?self.address, role, member = ?account, "role revoked");
            self.emit(AccountEvent::RoleRevoked { role, account });
        }
        Ok(())
    }

    pub fn label_role(&mut self, caller: Address, role: RoleId, label: String) -> Result<(), AccountError> {
        self.atomic(|acc| {
            acc.authorize_self(
                caller,
                &IRoleAccount::labelRoleCall {
                    roleId: role,
                    label: label.clone(),
                },
            )?;
            acc.policy()?.label_role(role, label.clone())?;
            acc.emit(AccountEvent::RoleLabel { role, label });
            Ok(())
        })
    }

    pub fn set_target_function_role(
        &mut self,
        caller: Address,
        target: Address,
        selectors: Vec<Selector>,
        role: RoleId,
    ) -> Result<(), AccountError> {
        self.atomic(|acc| {
            acc.authorize_self(
                caller,
                &IRoleAccount::setTargetFunctionRoleCall {
                    target,
                    selectors: selectors.iter().copied().map(FixedBytes).collect(),
                    roleId: role,
                },
            )?;
            acc.policy()?.set_target_function_role(target, &selectors, role)?;
            for selector in selectors {
                info!(account = ?acc.address, ?target, selector = %hex::encode(selector), role, "target function role set");
                acc.emit(AccountEvent::TargetFunctionRoleUpdated {
                    target,
                    selector,
                    role,
                });
            }
            Ok(())
        })
    }

    pub fn set_target_closed(&mut self, caller: Address, target: Address, closed: bool) -> Result<(), AccountError> {
        self.atomic(|acc| {
            acc.authorize_self(caller, &IRoleAccount::setTargetClosedCall { target, closed })?;
            acc.policy()?.set_target_closed(target, closed)?;
            info!(account = ?acc.address, ?target, closed, "target closed state set");
            acc.emit(AccountEvent::TargetClosed { target, closed });
            Ok(())
        })
    }

    /// Schedules `data` on `target` for `caller`, to run no earlier than `when`.
    ///
    /// Returns the operation id and its schedule nonce. When the caller holds no delayed
    /// permission for the call nothing is stored and the nonce is 0.
    pub fn schedule(
        &mut self,
        caller: Address,
        target: Address,
        data: Bytes,
        when: u64,
    ) -> Result<(FixedBytes<32>, u32), AccountError> {
        self.atomic(|acc| {
            let now = acc.host.block_timestamp();
            let Some(scheduled) = acc.policy()?.schedule(caller, target, &data, when, now)? else {
                return Ok((hash_operation(caller, target, &data), 0));
            };
            info!(
                account = ?acc.address,
                operation_id = ?scheduled.operation_id,
                nonce = scheduled.nonce,
                ready_at = scheduled.ready_at,
                "operation scheduled"
            );
            acc.emit(AccountEvent::OperationScheduled {
                operation_id: scheduled.operation_id,
                nonce: scheduled.nonce,
                schedule: scheduled.ready_at,
                caller,
                target,
                data: data.clone(),
            });
            Ok((scheduled.operation_id, scheduled.nonce))
        })
    }

    /// Cancels the pending schedule of `(caller, target, data)`. Allowed for the
    /// scheduler itself and for admins.
    pub fn cancel(&mut self, sender: Address, caller: Address, target: Address, data: Bytes) -> Result<u32, AccountError> {
        self.atomic(|acc| {
            let nonce = acc.policy()?.cancel(sender, caller, target, &data)?;
            let operation_id = hash_operation(caller, target, &data);
            info!(account = ?acc.address, ?operation_id, nonce, "operation canceled");
            acc.emit(AccountEvent::OperationCanceled { operation_id, nonce });
            Ok(nonce)
        })
    }

    pub fn hash_operation(&self, caller: Address, target: Address, data: &[u8]) -> FixedBytes<32> {
        hash_operation(caller, target, data)
    }

    pub fn get_schedule(&mut self, id: FixedBytes<32>) -> Result<u64, AccountError> {
        Ok(self.policy()?.get_schedule(id))
    }

    pub fn get_schedule_nonce(&mut self, id: FixedBytes<32>) -> Result<u32, AccountError> {
        Ok(self.policy()?.get_schedule_nonce(id))
    }
}
