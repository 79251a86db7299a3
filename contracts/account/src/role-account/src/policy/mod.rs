//! Authorization policies.
//!
//! A policy answers "may `caller` invoke `selector` on `target`, and after which delay" and
//! owns the role bookkeeping behind that answer. The account enforces the answer; the
//! policy never sees the host.
//!
//! Two variants:
//! - [`StaticRoles`]: fixed Admin / Executor / Withdraw roles, no delays.
//! - [`ScheduledRoles`]: roles bound per `(target, selector)` with per-member execution
//!   delays and scheduled operations.

use alloc::{collections::BTreeMap, string::String};

use alloy_primitives::{Address, FixedBytes};
use alloy_sol_types::SolCall;
use role_account_types::{RoleId, Selector, PUBLIC_ROLE};

use crate::{abi::IRoleAccount, errors::AccountError};

mod scheduled_roles;
mod static_roles;

pub use scheduled_roles::ScheduledRoles;
pub use static_roles::StaticRoles;

/// Result of an authorization query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Permission {
    pub allowed: bool,
    /// Seconds an operation must wait after being scheduled. Only meaningful when `allowed`.
    pub delay: u32,
    /// Role the call requires; reported in `Unauthorized` errors.
    pub role: RoleId,
}

impl Permission {
    pub fn denied(role: RoleId) -> Self {
        Self {
            allowed: false,
            delay: 0,
            role,
        }
    }

    pub fn immediate(role: RoleId) -> Self {
        Self {
            allowed: true,
            delay: 0,
            role,
        }
    }

    pub fn is_delayed(&self) -> bool {
        self.allowed && self.delay > 0
    }
}

/// A stored schedule, as returned by [`AuthorizationPolicy::schedule`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scheduled {
    pub operation_id: FixedBytes<32>,
    pub nonce: u32,
    pub ready_at: u64,
}

pub trait AuthorizationPolicy {
    fn is_authorized(&self, caller: Address, target: Address, selector: Selector) -> Permission;

    /// Membership of `account` in `role` and its execution delay.
    fn has_role(&self, role: RoleId, account: Address) -> (bool, u32);

    fn role_label(&self, _role: RoleId) -> Option<&str> {
        None
    }

    /// Role required to call `selector` on `target`.
    fn target_function_role(&self, target: Address, selector: Selector) -> RoleId;

    fn is_target_closed(&self, _target: Address) -> bool {
        false
    }

    // Mutators below are only invoked after the account authorized the caller.

    /// Returns whether `account` is a new member of `role`.
    fn grant_role(&mut self, role: RoleId, account: Address, delay: u32, now: u64) -> Result<bool, AccountError>;

    /// Returns whether `account` was a member of `role`.
    fn revoke_role(&mut self, role: RoleId, account: Address) -> Result<bool, AccountError>;

    fn label_role(&mut self, role: RoleId, label: String) -> Result<(), AccountError>;

    fn set_target_function_role(
        &mut self,
        _target: Address,
        _selectors: &[Selector],
        _role: RoleId,
    ) -> Result<(), AccountError> {
        Err(AccountError::UnknownSelector {
            selector: IRoleAccount::setTargetFunctionRoleCall::SELECTOR,
        })
    }

    fn set_target_closed(&mut self, _target: Address, _closed: bool) -> Result<(), AccountError> {
        Err(AccountError::UnknownSelector {
            selector: IRoleAccount::setTargetClosedCall::SELECTOR,
        })
    }

    /// Schedules `(caller, target, data)` to become executable at `max(when, now + delay)`.
    ///
    /// Returns `None`, storing nothing, when `caller` holds no delayed permission for it.
    fn schedule(
        &mut self,
        _caller: Address,
        _target: Address,
        _data: &[u8],
        _when: u64,
        _now: u64,
    ) -> Result<Option<Scheduled>, AccountError> {
        Err(AccountError::DelayNotAllowed)
    }

    /// Consumes a ready schedule of `(caller, target, data)` and returns its nonce.
    fn consume_scheduled(
        &mut self,
        _caller: Address,
        _target: Address,
        _data: &[u8],
        _now: u64,
    ) -> Result<u32, AccountError> {
        Err(AccountError::DelayNotAllowed)
    }

    /// Drops a pending schedule on behalf of `sender` and returns its nonce.
    fn cancel(
        &mut self,
        _sender: Address,
        caller: Address,
        target: Address,
        data: &[u8],
    ) -> Result<u32, AccountError> {
        Err(AccountError::NotScheduled {
            operation_id: role_account_types::hash_operation(caller, target, data),
        })
    }

    /// Time at which `id` becomes executable, or 0 when it is not scheduled.
    fn get_schedule(&self, _id: FixedBytes<32>) -> u64 {
        0
    }

    fn get_schedule_nonce(&self, _id: FixedBytes<32>) -> u32 {
        0
    }
}

/// Role membership entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Access {
    pub since: u64,
    pub delay: u32,
}

/// Role → member → access table shared by both policies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleMembers {
    roles: BTreeMap<RoleId, BTreeMap<Address, Access>>,
}

impl RoleMembers {
    pub fn get(&self, role: RoleId, account: Address) -> Option<Access> {
        if role == PUBLIC_ROLE {
            return Some(Access::default());
        }
        self.roles.get(&role)?.get(&account).copied()
    }

    pub fn has_role(&self, role: RoleId, account: Address) -> (bool, u32) {
        match self.get(role, account) {
            Some(access) => (true, access.delay),
            None => (false, 0),
        }
    }

    /// Inserts or updates a member. Existing members keep their `since` and only get the
    /// new delay.
    pub fn grant(&mut self, role: RoleId, account: Address, delay: u32, now: u64) -> Result<bool, AccountError> {
        if role == PUBLIC_ROLE {
            return Err(AccountError::LockedRole { role });
        }
        let members = self.roles.entry(role).or_default();
        match members.get_mut(&account) {
            Some(access) => {
                access.delay = delay;
                Ok(false)
            }
            None => {
                members.insert(account, Access { since: now, delay });
                Ok(true)
            }
        }
    }

    pub fn revoke(&mut self, role: RoleId, account: Address) -> Result<bool, AccountError> {
        if role == PUBLIC_ROLE {
            return Err(AccountError::LockedRole { role });
        }
        let Some(members) = self.roles.get_mut(&role) else {
            return Ok(false);
        };
        let removed = members.remove(&account).is_some();
        if members.is_empty() {
            self.roles.remove(&role);
        }
        Ok(removed)
    }
}
