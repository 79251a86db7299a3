//! The account: a handle over host-owned storage.
//!
//! `Account::at(host, address)` borrows the host for the duration of one entry point.
//! Storage is fetched from the host on every access and never held across an external call,
//! so an external call may re-enter the same account through the host.
//!
//! Entry points are split by concern:
//! - `deposit`: relay deposit pass-through.
//! - `dispatch`: `execute` / `execute_batch`.
//! - `validation`: `validate_user_op`.
//! - `admin`: role administration and scheduled operations.

use alloc::vec::Vec;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use role_account_types::{hash_operation, Call};
use tracing::debug;

use crate::{
    errors::AccountError,
    events::AccountEvent,
    host::Host,
    policy::{AuthorizationPolicy, Permission},
    utils::calldata::expand_calls,
};

mod admin;
mod deposit;
mod dispatch;
mod validation;

pub use validation::ValidationOutcome;

/// Persistent state of one account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountStorage<P> {
    pub address: Address,
    pub entry_point: Address,
    /// Next expected user-operation nonce.
    pub nonce: U256,
    pub policy: P,
}

impl<P: AuthorizationPolicy> AccountStorage<P> {
    pub fn new(address: Address, entry_point: Address, policy: P) -> Self {
        Self {
            address,
            entry_point,
            nonce: U256::ZERO,
            policy,
        }
    }
}

pub struct Account<'h, H: Host> {
    host: &'h mut H,
    address: Address,
}

impl<'h, H: Host> Account<'h, H> {
    pub fn at(host: &'h mut H, address: Address) -> Self {
        Self { host, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn entry_point(&mut self) -> Result<Address, AccountError> {
        Ok(self.storage()?.entry_point)
    }

    pub fn get_nonce(&mut self) -> Result<U256, AccountError> {
        Ok(self.storage()?.nonce)
    }

    fn storage(&mut self) -> Result<&mut AccountStorage<H::Policy>, AccountError> {
        self.host.account(self.address)
    }

    fn policy(&mut self) -> Result<&mut H::Policy, AccountError> {
        Ok(&mut self.storage()?.policy)
    }

    fn emit(&mut self, event: AccountEvent) {
        self.host.emit(self.address, event);
    }

    /// Runs `f` inside a host checkpoint: its effects are kept on `Ok` and dropped on `Err`.
    fn atomic<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, AccountError>) -> Result<T, AccountError> {
        let checkpoint = self.host.checkpoint();
        let result = f(self);
        match result {
            Ok(_) => self.host.commit(checkpoint),
            Err(_) => self.host.revert_to(checkpoint),
        }
        result
    }

    /// The relay and the account itself act without further checks. Relay calls were
    /// authorized during validation and self calls by the outer `execute`; both expand
    /// nested self-executions down to their leaves against the original caller.
    fn is_trusted(&mut self, caller: Address) -> Result<bool, AccountError> {
        Ok(caller == self.address || caller == self.storage()?.entry_point)
    }

    /// Authorizes `caller` for one of the account's own entry points, given as its decoded
    /// call. Delayed permissions consume the schedule of the encoded call.
    fn authorize_self<C: SolCall>(&mut self, caller: Address, call: &C) -> Result<(), AccountError> {
        if self.is_trusted(caller)? {
            return Ok(());
        }
        let target = self.address;
        let permission = self.policy()?.is_authorized(caller, target, C::SELECTOR);
        if !permission.allowed {
            return Err(AccountError::Unauthorized {
                caller,
                required_role: permission.role,
            });
        }
        if permission.delay > 0 {
            self.consume_delayed(caller, target, &call.abi_encode())?;
        }
        Ok(())
    }

    /// Authorizes every call, including those of nested self-executions, before consuming
    /// any schedule.
    fn authorize_calls(&mut self, caller: Address, calls: &[Call]) -> Result<(), AccountError> {
        let calls = expand_calls(self.address, calls.to_vec())?;
        match self.check_calls(caller, &calls)? {
            Verdict::Denied(permission) => Err(AccountError::Unauthorized {
                caller,
                required_role: permission.role,
            }),
            Verdict::Allowed { delayed } => {
                for call in delayed {
                    self.consume_delayed(caller, call.target, &call.data)?;
                }
                Ok(())
            }
        }
    }

    fn check_calls<'c>(&mut self, caller: Address, calls: &'c [Call]) -> Result<Verdict<'c>, AccountError> {
        let policy = self.policy()?;
        let mut delayed = Vec::new();
        for call in calls {
            let permission = policy.is_authorized(caller, call.target, call.selector());
            if !permission.allowed {
                debug!(?caller, target = ?call.target, role = permission.role, "call not authorized");
                return Ok(Verdict::Denied(permission));
            }
            if permission.delay > 0 {
                delayed.push(call);
            }
        }
        Ok(Verdict::Allowed { delayed })
    }

    /// Consumes the ready schedule of `(caller, target, data)`.
    ///
    /// Missing and premature schedules both surface as `DelayNotAllowed`.
    fn consume_delayed(&mut self, caller: Address, target: Address, data: &[u8]) -> Result<(), AccountError> {
        let now = self.host.block_timestamp();
        let nonce = self
            .policy()?
            .consume_scheduled(caller, target, data, now)
            .map_err(|err| {
                debug!(?caller, ?target, %err, "delayed operation not executable");
                AccountError::DelayNotAllowed
            })?;
        self.emit(AccountEvent::OperationExecuted {
            operation_id: hash_operation(caller, target, data),
            nonce,
        });
        Ok(())
    }

    /// Performs call `index` of an execution on behalf of the account.
    fn perform(&mut self, index: usize, call: &Call) -> Result<Bytes, AccountError> {
        self.host
            .call(self.address, call.target, call.value, &call.data)
            .map(Bytes::from)
            .map_err(|reason| AccountError::CallFailed {
                index,
                reason: Bytes::from(reason),
            })
    }
}

/// Outcome of checking a set of calls against the policy.
enum Verdict<'c> {
    /// Every call is allowed; `delayed` need a ready schedule.
    Allowed { delayed: Vec<&'c Call> },
    /// First denied call's permission.
    Denied(Permission),
}
