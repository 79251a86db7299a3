use alloc::{
    collections::{BTreeMap, BTreeSet},
    string::String,
};

use alloy_primitives::{Address, FixedBytes};
use role_account_types::{hash_operation, selector_of, RoleId, Selector, ADMIN_ROLE, PUBLIC_ROLE};

use super::{AuthorizationPolicy, Permission, RoleMembers, Scheduled};
use crate::{abi::constants::is_admin_selector, errors::AccountError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Schedule {
    /// 0 when nothing is pending.
    ready_at: u64,
    /// Bumped on every schedule of the same operation id; survives consumption.
    nonce: u32,
}

/// Access-manager style policy: every `(target, selector)` is bound to a role (Admin when
/// unbound) and every membership carries an execution delay.
///
/// A member with a non-zero delay must `schedule` the exact call first; it can run once the
/// delay has elapsed, and only once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScheduledRoles {
    this: Address,
    members: RoleMembers,
    labels: BTreeMap<RoleId, String>,
    target_roles: BTreeMap<(Address, Selector), RoleId>,
    closed: BTreeSet<Address>,
    schedules: BTreeMap<FixedBytes<32>, Schedule>,
}

impl ScheduledRoles {
    pub fn new(this: Address, admin: Address, now: u64) -> Result<Self, AccountError> {
        let mut members = RoleMembers::default();
        members.grant(ADMIN_ROLE, admin, 0, now)?;
        Ok(Self {
            this,
            members,
            labels: BTreeMap::new(),
            target_roles: BTreeMap::new(),
            closed: BTreeSet::new(),
            schedules: BTreeMap::new(),
        })
    }
}

impl AuthorizationPolicy for ScheduledRoles {
    fn is_authorized(&self, caller: Address, target: Address, selector: Selector) -> Permission {
        let role = self.target_function_role(target, selector);
        // the account's own administration cannot be closed off
        let admin_call = target == self.this && is_admin_selector(selector);
        if !admin_call && self.closed.contains(&target) {
            return Permission::denied(role);
        }
        match self.members.get(role, caller) {
            Some(access) => Permission {
                allowed: true,
                delay: access.delay,
                role,
            },
            None => Permission::denied(role),
        }
    }

    fn has_role(&self, role: RoleId, account: Address) -> (bool, u32) {
        self.members.has_role(role, account)
    }

    fn role_label(&self, role: RoleId) -> Option<&str> {
        self.labels.get(&role).map(String::as_str)
    }

    fn target_function_role(&self, target: Address, selector: Selector) -> RoleId {
        if target == self.this && is_admin_selector(selector) {
            return ADMIN_ROLE;
        }
        self.target_roles
            .get(&(target, selector))
            .copied()
            .unwrap_or(ADMIN_ROLE)
    }

    fn is_target_closed(&self, target: Address) -> bool {
        self.closed.contains(&target)
    }

    fn grant_role(&mut self, role: RoleId, account: Address, delay: u32, now: u64) -> Result<bool, AccountError> {
        self.members.grant(role, account, delay, now)
    }

    fn revoke_role(&mut self, role: RoleId, account: Address) -> Result<bool, AccountError> {
        self.members.revoke(role, account)
    }

    fn label_role(&mut self, role: RoleId, label: String) -> Result<(), AccountError> {
        if role == ADMIN_ROLE || role == PUBLIC_ROLE {
            return Err(AccountError::LockedRole { role });
        }
        self.labels.insert(role, label);
        Ok(())
    }

    fn set_target_function_role(
        &mut self,
        target: Address,
        selectors: &[Selector],
        role: RoleId,
    ) -> Result<(), AccountError> {
        for selector in selectors {
            self.target_roles.insert((target, *selector), role);
        }
        Ok(())
    }

    fn set_target_closed(&mut self, target: Address, closed: bool) -> Result<(), AccountError> {
        if closed {
            self.closed.insert(target);
        } else {
            self.closed.remove(&target);
        }
        Ok(())
    }

    fn schedule(
        &mut self,
        caller: Address,
        target: Address,
        data: &[u8],
        when: u64,
        now: u64,
    ) -> Result<Option<Scheduled>, AccountError> {
        let permission = self.is_authorized(caller, target, selector_of(data));
        if !permission.is_delayed() {
            return Ok(None);
        }

        let operation_id = hash_operation(caller, target, data);
        let entry = self.schedules.entry(operation_id).or_default();
        if entry.ready_at != 0 {
            return Err(AccountError::AlreadyScheduled { operation_id });
        }
        let ready_at = when.max(now.saturating_add(u64::from(permission.delay)));
        entry.ready_at = ready_at;
        entry.nonce = entry.nonce.wrapping_add(1);
        Ok(Some(Scheduled {
            operation_id,
            nonce: entry.nonce,
            ready_at,
        }))
    }

    fn consume_scheduled(
        &mut self,
        caller: Address,
        target: Address,
        data: &[u8],
        now: u64,
    ) -> Result<u32, AccountError> {
        let operation_id = hash_operation(caller, target, data);
        let Some(entry) = self.schedules.get_mut(&operation_id) else {
            return Err(AccountError::NotScheduled { operation_id });
        };
        if entry.ready_at == 0 {
            return Err(AccountError::NotScheduled { operation_id });
        }
        if now < entry.ready_at {
            return Err(AccountError::NotReady { operation_id });
        }
        entry.ready_at = 0;
        Ok(entry.nonce)
    }

    fn cancel(
        &mut self,
        sender: Address,
        caller: Address,
        target: Address,
        data: &[u8],
    ) -> Result<u32, AccountError> {
        let operation_id = hash_operation(caller, target, data);
        let pending = self
            .schedules
            .get(&operation_id)
            .is_some_and(|entry| entry.ready_at != 0);
        if !pending {
            return Err(AccountError::NotScheduled { operation_id });
        }
        if sender != caller && !self.members.has_role(ADMIN_ROLE, sender).0 {
            return Err(AccountError::Unauthorized {
                caller: sender,
                required_role: ADMIN_ROLE,
            });
        }
        let entry = self.schedules.entry(operation_id).or_default();
        entry.ready_at = 0;
        Ok(entry.nonce)
    }

    fn get_schedule(&self, id: FixedBytes<32>) -> u64 {
        self.schedules.get(&id).map_or(0, |entry| entry.ready_at)
    }

    fn get_schedule_nonce(&self, id: FixedBytes<32>) -> u32 {
        self.schedules.get(&id).map_or(0, |entry| entry.nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::constants::{EXECUTE_SELECTOR, WITHDRAW_DEPOSIT_TO_SELECTOR};
    use alloy_primitives::address;
    use role_account_types::{EXECUTOR_ROLE, WITHDRAW_ROLE};

    const THIS: Address = address!("00000000000000000000000000000000000acc02");
    const ADMIN: Address = address!("000000000000000000000000000000000000ad02");
    const EXEC: Address = address!("000000000000000000000000000000000000e402");
    const ANON: Address = address!("00000000000000000000000000000000000a0a02");
    const TOKEN: Address = address!("0000000000000000000000000000000000070c02");
    const APPROVE: Selector = [0x09, 0x5e, 0xa7, 0xb3];
    const TOKEN_ROLE: RoleId = 3;

    fn approve_data() -> [u8; 8] {
        [0x09, 0x5e, 0xa7, 0xb3, 0, 0, 0, 1]
    }

    fn policy() -> ScheduledRoles {
        let mut p = ScheduledRoles::new(THIS, ADMIN, 100).unwrap();
        p.set_target_function_role(THIS, &[EXECUTE_SELECTOR], EXECUTOR_ROLE)
            .unwrap();
        p.set_target_function_role(TOKEN, &[APPROVE], TOKEN_ROLE).unwrap();
        p.grant_role(EXECUTOR_ROLE, EXEC, 0, 100).unwrap();
        p
    }

    #[test]
    fn unbound_functions_are_admin_only() {
        let p = policy();
        assert_eq!(p.target_function_role(TOKEN, [1, 1, 1, 1]), ADMIN_ROLE);
        assert_eq!(p.is_authorized(EXEC, TOKEN, [1, 1, 1, 1]), Permission::denied(ADMIN_ROLE));
        assert_eq!(p.is_authorized(ADMIN, TOKEN, [1, 1, 1, 1]), Permission::immediate(ADMIN_ROLE));
        assert_eq!(
            p.is_authorized(EXEC, THIS, WITHDRAW_DEPOSIT_TO_SELECTOR),
            Permission::denied(ADMIN_ROLE)
        );
    }

    #[test]
    fn admin_selectors_cannot_be_rebound() {
        let mut p = policy();
        let grant = crate::abi::constants::ADMIN_SELECTORS[0];
        p.set_target_function_role(THIS, &[grant], PUBLIC_ROLE).unwrap();
        assert_eq!(p.target_function_role(THIS, grant), ADMIN_ROLE);
        assert!(!p.is_authorized(ANON, THIS, grant).allowed);
    }

    #[test]
    fn closed_target_denies_everyone_but_admin_calls_on_self() {
        let mut p = policy();
        p.grant_role(TOKEN_ROLE, EXEC, 0, 100).unwrap();
        p.set_target_closed(TOKEN, true).unwrap();
        assert!(!p.is_authorized(EXEC, TOKEN, APPROVE).allowed);
        p.set_target_closed(THIS, true).unwrap();
        assert!(!p.is_authorized(EXEC, THIS, EXECUTE_SELECTOR).allowed);
        let grant = crate::abi::constants::ADMIN_SELECTORS[0];
        assert!(p.is_authorized(ADMIN, THIS, grant).allowed);
        p.set_target_closed(TOKEN, false).unwrap();
        assert!(p.is_authorized(EXEC, TOKEN, APPROVE).allowed);
    }

    #[test]
    fn public_bindings_are_open() {
        let mut p = policy();
        p.set_target_function_role(TOKEN, &[[2, 2, 2, 2]], PUBLIC_ROLE).unwrap();
        assert_eq!(p.is_authorized(ANON, TOKEN, [2, 2, 2, 2]), Permission::immediate(PUBLIC_ROLE));
    }

    #[test]
    fn schedule_waits_for_the_delay_and_is_single_use() {
        let mut p = policy();
        p.grant_role(TOKEN_ROLE, EXEC, 600, 100).unwrap();
        let data = approve_data();

        assert_eq!(
            p.consume_scheduled(EXEC, TOKEN, &data, 1_000),
            Err(AccountError::NotScheduled {
                operation_id: hash_operation(EXEC, TOKEN, &data)
            })
        );

        // `when` earlier than now + delay is clamped up
        let scheduled = p.schedule(EXEC, TOKEN, &data, 0, 1_000).unwrap().unwrap();
        assert_eq!(scheduled.nonce, 1);
        assert_eq!(scheduled.ready_at, 1_600);
        assert_eq!(p.get_schedule(scheduled.operation_id), 1_600);
        assert_eq!(
            p.schedule(EXEC, TOKEN, &data, 0, 1_000),
            Err(AccountError::AlreadyScheduled {
                operation_id: scheduled.operation_id
            })
        );

        assert_eq!(
            p.consume_scheduled(EXEC, TOKEN, &data, 1_599),
            Err(AccountError::NotReady {
                operation_id: scheduled.operation_id
            })
        );
        assert_eq!(p.consume_scheduled(EXEC, TOKEN, &data, 1_600), Ok(1));
        assert!(p.consume_scheduled(EXEC, TOKEN, &data, 1_600).is_err());
        assert_eq!(p.get_schedule(scheduled.operation_id), 0);
        assert_eq!(p.get_schedule_nonce(scheduled.operation_id), 1);

        let again = p.schedule(EXEC, TOKEN, &data, 5_000, 2_000).unwrap().unwrap();
        assert_eq!(again.nonce, 2);
        assert_eq!(again.ready_at, 5_000);
    }

    #[test]
    fn scheduling_without_a_delayed_permission_is_inert() {
        let mut p = policy();
        let data = approve_data();
        // not a member
        assert_eq!(p.schedule(ANON, TOKEN, &data, 0, 1_000), Ok(None));
        // member without delay
        p.grant_role(TOKEN_ROLE, EXEC, 0, 100).unwrap();
        assert_eq!(p.schedule(EXEC, TOKEN, &data, 0, 1_000), Ok(None));
        assert_eq!(p.get_schedule(hash_operation(EXEC, TOKEN, &data)), 0);
    }

    #[test]
    fn cancel_by_owner_or_admin_only() {
        let mut p = policy();
        p.grant_role(TOKEN_ROLE, EXEC, 600, 100).unwrap();
        let data = approve_data();
        p.schedule(EXEC, TOKEN, &data, 0, 1_000).unwrap();

        assert_eq!(
            p.cancel(ANON, EXEC, TOKEN, &data),
            Err(AccountError::Unauthorized {
                caller: ANON,
                required_role: ADMIN_ROLE
            })
        );
        assert_eq!(p.cancel(ADMIN, EXEC, TOKEN, &data), Ok(1));
        assert!(matches!(
            p.cancel(EXEC, EXEC, TOKEN, &data),
            Err(AccountError::NotScheduled { .. })
        ));

        p.schedule(EXEC, TOKEN, &data, 0, 1_000).unwrap();
        assert_eq!(p.cancel(EXEC, EXEC, TOKEN, &data), Ok(2));
    }

    #[test]
    fn admin_and_public_labels_are_locked() {
        let mut p = policy();
        assert_eq!(
            p.label_role(ADMIN_ROLE, "ROOT".into()),
            Err(AccountError::LockedRole { role: ADMIN_ROLE })
        );
        p.label_role(WITHDRAW_ROLE, "WITHDRAW_ROLE".into()).unwrap();
        assert_eq!(p.role_label(WITHDRAW_ROLE), Some("WITHDRAW_ROLE"));
    }
}
