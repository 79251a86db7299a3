//! Pass-through to the account's deposit at the relay. The relay holds the balance; the
//! account only forwards value and reads it back.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use role_account_types::Call;
use tracing::{debug, info};

use super::Account;
use crate::{
    abi::{IEntryPoint, IRoleAccount},
    errors::AccountError,
    events::AccountEvent,
    host::Host,
};

impl<H: Host> Account<'_, H> {
    /// Forwards `value` (already credited to the account) to the relay deposit.
    pub fn add_deposit(&mut self, caller: Address, value: U256) -> Result<(), AccountError> {
        debug!(account = ?self.address, ?caller, %value, "add_deposit");
        self.atomic(|acc| {
            acc.deposit_to_relay(value)?;
            acc.emit(AccountEvent::Deposited {
                from: caller,
                amount: value,
            });
            Ok(())
        })
    }

    /// Withdraws `amount` of the relay deposit to `recipient`. Requires the withdraw
    /// permission.
    pub fn withdraw_deposit_to(&mut self, caller: Address, recipient: Address, amount: U256) -> Result<(), AccountError> {
        debug!(account = ?self.address, ?caller, ?recipient, %amount, "withdraw_deposit_to");
        self.atomic(|acc| {
            acc.authorize_self(
                caller,
                &IRoleAccount::withdrawDepositToCall {
                    withdrawAddress: recipient,
                    amount,
                },
            )?;
            let have = acc.get_deposit()?;
            if amount > have {
                return Err(AccountError::InsufficientDeposit { have, need: amount });
            }
            let entry_point = acc.entry_point()?;
            let data = IEntryPoint::withdrawToCall {
                withdrawAddress: recipient,
                withdrawAmount: amount,
            }
            .abi_encode();
            acc.perform(0, &Call::new(entry_point, U256::ZERO, Bytes::from(data)))?;
            info!(account = ?acc.address, ?recipient, %amount, "deposit withdrawn");
            acc.emit(AccountEvent::Withdrawn {
                to: recipient,
                amount,
            });
            Ok(())
        })
    }

    /// Current deposit, as reported by the relay.
    pub fn get_deposit(&mut self) -> Result<U256, AccountError> {
        let entry_point = self.entry_point()?;
        let data = IEntryPoint::balanceOfCall {
            account: self.address,
        }
        .abi_encode();
        let out = self
            .host
            .call(self.address, entry_point, U256::ZERO, &data)
            .map_err(|reason| AccountError::CallFailed {
                index: 0,
                reason: Bytes::from(reason),
            })?;
        IEntryPoint::balanceOfCall::abi_decode_returns(&out, true)
            .map(|ret| ret._0)
            .map_err(|_| AccountError::MalformedCalldata)
    }

    /// Moves `value` from the account balance into its relay deposit.
    pub(super) fn deposit_to_relay(&mut self, value: U256) -> Result<(), AccountError> {
        let entry_point = self.entry_point()?;
        let data = IEntryPoint::depositToCall {
            account: self.address,
        }
        .abi_encode();
        self.perform(0, &Call::new(entry_point, value, Bytes::from(data)))?;
        Ok(())
    }
}
