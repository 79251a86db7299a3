use alloc::{collections::BTreeMap, string::String};

use alloy_primitives::Address;
use role_account_types::{RoleId, Selector, ADMIN_ROLE, EXECUTOR_ROLE, PUBLIC_ROLE, WITHDRAW_ROLE};

use super::{AuthorizationPolicy, Permission, RoleMembers};
use crate::{
    abi::constants::{EXECUTE_BATCH_SELECTOR, EXECUTE_SELECTOR, WITHDRAW_DEPOSIT_TO_SELECTOR},
    errors::AccountError,
};

/// Fixed role table: Executor runs calls, Withdraw moves the deposit, Admin does the rest.
///
/// Calls to other contracts are open to anyone allowed to reach `execute`; there are no
/// execution delays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticRoles {
    this: Address,
    members: RoleMembers,
    labels: BTreeMap<RoleId, String>,
}

impl StaticRoles {
    /// Policy for the account at `this`, administered by `admin`.
    pub fn new(this: Address, admin: Address, executors: &[Address], now: u64) -> Result<Self, AccountError> {
        let mut members = RoleMembers::default();
        members.grant(ADMIN_ROLE, admin, 0, now)?;
        for executor in executors {
            members.grant(EXECUTOR_ROLE, *executor, 0, now)?;
        }
        let labels = BTreeMap::from([
            (ADMIN_ROLE, String::from("ADMIN_ROLE")),
            (EXECUTOR_ROLE, String::from("EXECUTOR_ROLE")),
            (WITHDRAW_ROLE, String::from("WITHDRAW_ROLE")),
        ]);
        Ok(Self {
            this,
            members,
            labels,
        })
    }

    fn self_role(selector: Selector) -> RoleId {
        match selector {
            EXECUTE_SELECTOR | EXECUTE_BATCH_SELECTOR => EXECUTOR_ROLE,
            WITHDRAW_DEPOSIT_TO_SELECTOR => WITHDRAW_ROLE,
            _ => ADMIN_ROLE,
        }
    }
}

impl AuthorizationPolicy for StaticRoles {
    fn is_authorized(&self, caller: Address, target: Address, selector: Selector) -> Permission {
        let role = self.target_function_role(target, selector);
        if self.members.get(role, caller).is_some() {
            Permission::immediate(role)
        } else {
            Permission::denied(role)
        }
    }

    fn has_role(&self, role: RoleId, account: Address) -> (bool, u32) {
        self.members.has_role(role, account)
    }

    fn role_label(&self, role: RoleId) -> Option<&str> {
        self.labels.get(&role).map(String::as_str)
    }

    fn target_function_role(&self, target: Address, selector: Selector) -> RoleId {
        if target == self.this {
            Self::self_role(selector)
        } else {
            PUBLIC_ROLE
        }
    }

    fn grant_role(&mut self, role: RoleId, account: Address, delay: u32, now: u64) -> Result<bool, AccountError> {
        if delay != 0 {
            return Err(AccountError::DelayNotAllowed);
        }
        self.members.grant(role, account, 0, now)
    }

    fn revoke_role(&mut self, role: RoleId, account: Address) -> Result<bool, AccountError> {
        self.members.revoke(role, account)
    }

    fn label_role(&mut self, role: RoleId, label: String) -> Result<(), AccountError> {
        if role == PUBLIC_ROLE {
            return Err(AccountError::LockedRole { role });
        }
        self.labels.insert(role, label);
        Ok(())
    }
}
