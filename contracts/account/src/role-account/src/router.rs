//! Calldata entry: decodes an incoming call against `IRoleAccount`, runs the matching
//! account entry point and ABI-encodes its result or revert data.

use alloc::{string::String, vec::Vec};

use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolInterface, SolValue};
use role_account_types::{selector_of, PackedUserOperation};

use crate::{
    abi::IRoleAccount::IRoleAccountCalls as Calls,
    account::Account,
    errors::AccountError,
    host::Host,
};

/// Runs `data` sent by `caller` with `value` against the account at `account`.
///
/// `value` has already been credited to the account by the host. Empty calldata is a plain
/// transfer and always succeeds.
pub fn dispatch<H: Host>(
    host: &mut H,
    account: Address,
    caller: Address,
    value: U256,
    data: &[u8],
) -> Result<Vec<u8>, Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let call = decode(data).map_err(|err| err.abi_encode())?;
    // a failed single `execute` re-raises the callee's revert data verbatim
    let raw_reason = matches!(call, Calls::execute(_));
    let mut acc = Account::at(host, account);
    run(&mut acc, caller, value, call).map_err(|err| match err {
        AccountError::CallFailed { reason, .. } if raw_reason => reason.to_vec(),
        err => err.abi_encode(),
    })
}

fn decode(data: &[u8]) -> Result<Calls, AccountError> {
    let selector = selector_of(data);
    if data.len() < 4 || !Calls::valid_selector(selector) {
        return Err(AccountError::UnknownSelector { selector });
    }
    Calls::abi_decode(data, true).map_err(|_| AccountError::MalformedCalldata)
}

fn run<H: Host>(acc: &mut Account<'_, H>, caller: Address, value: U256, call: Calls) -> Result<Vec<u8>, AccountError> {
    let out = match call {
        Calls::validateUserOp(c) => {
            let op: PackedUserOperation = c.userOp.into();
            let outcome = acc.validate_user_op(caller, &op, c.userOpHash, c.missingAccountFunds)?;
            outcome.validation_data.abi_encode()
        }
        Calls::getNonce(_) => acc.get_nonce()?.abi_encode(),
        Calls::entryPoint(_) => acc.entry_point()?.abi_encode(),
        Calls::execute(c) => acc.execute(caller, c.target, c.value, c.data).map(|r| (r,).abi_encode_params())?,
        Calls::executeBatch(c) => {
            acc.execute_batch(caller, c.targets, c.values, c.datas)?;
            Vec::new()
        }
        Calls::addDeposit(_) => {
            acc.add_deposit(caller, value)?;
            Vec::new()
        }
        Calls::withdrawDepositTo(c) => {
            acc.withdraw_deposit_to(caller, c.withdrawAddress, c.amount)?;
            Vec::new()
        }
        Calls::getDeposit(_) => acc.get_deposit()?.abi_encode(),
        Calls::hasRole(c) => acc.has_role(c.roleId, c.account)?.abi_encode_params(),
        Calls::grantRole(c) => {
            acc.grant_role(caller, c.roleId, c.account, c.executionDelay)?;
            Vec::new()
        }
        Calls::revokeRole(c) => {
            acc.revoke_role(caller, c.roleId, c.account)?;
            Vec::new()
        }
        Calls::renounceRole(c) => {
            acc.renounce_role(caller, c.roleId, c.callerConfirmation)?;
            Vec::new()
        }
        Calls::labelRole(c) => {
            acc.label_role(caller, c.roleId, c.label)?;
            Vec::new()
        }
        Calls::setTargetFunctionRole(c) => {
            let selectors = c.selectors.into_iter().map(|s| s.0).collect();
            acc.set_target_function_role(caller, c.target, selectors, c.roleId)?;
            Vec::new()
        }
        Calls::setTargetClosed(c) => {
            acc.set_target_closed(caller, c.target, c.closed)?;
            Vec::new()
        }
        Calls::getTargetFunctionRole(c) => acc.get_target_function_role(c.target, c.selector.0)?.abi_encode(),
        Calls::isTargetClosed(c) => acc.is_target_closed(c.target)?.abi_encode(),
        Calls::canCall(c) => acc.can_call(c.caller, c.target, c.selector.0)?.abi_encode_params(),
        Calls::schedule(c) => acc.schedule(caller, c.target, c.data, c.when)?.abi_encode_params(),
        Calls::cancel(c) => acc.cancel(caller, c.caller, c.target, c.data)?.abi_encode(),
        Calls::hashOperation(c) => acc.hash_operation(c.caller, c.target, &c.data).abi_encode(),
        Calls::getSchedule(c) => acc.get_schedule(c.id)?.abi_encode(),
        Calls::getScheduleNonce(c) => acc.get_schedule_nonce(c.id)?.abi_encode(),
    };
    Ok(out)
}

/// Human-readable revert reason, for logs.
pub fn describe_revert(data: &[u8]) -> String {
    if let Some(err) = AccountError::abi_decode(data) {
        return alloc::format!("{err}");
    }
    match alloy_sol_types::decode_revert_reason(data) {
        Some(reason) => reason,
        None => alloc::format!("0x{}", hex::encode(data)),
    }
}
