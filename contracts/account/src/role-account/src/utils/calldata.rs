//! Decoding of the account's own execution calldata into individual calls.

use alloc::vec::Vec;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use role_account_types::{selector_of, Call};

use crate::{
    abi::{
        constants::{EXECUTE_BATCH_SELECTOR, EXECUTE_SELECTOR},
        IRoleAccount,
    },
    errors::AccountError,
};

/// Zips batch arrays into calls.
///
/// `datas` must match `targets` in length; `values` is either empty (no value sent) or of
/// the same length.
pub fn batch_calls(targets: Vec<Address>, values: Vec<U256>, datas: Vec<Bytes>) -> Result<Vec<Call>, AccountError> {
    let expected = targets.len();
    if datas.len() != expected {
        return Err(AccountError::WrongArrayLength {
            expected,
            actual: datas.len(),
        });
    }
    if !values.is_empty() && values.len() != expected {
        return Err(AccountError::WrongArrayLength {
            expected,
            actual: values.len(),
        });
    }

    let mut values = values.into_iter();
    Ok(targets
        .into_iter()
        .zip(datas)
        .map(|(target, data)| Call::new(target, values.next().unwrap_or_default(), data))
        .collect())
}

/// Calls that `call_data` would perform when run against `account`.
///
/// Calls back into the account's own `execute` / `executeBatch` are listed and then
/// expanded in place, so the result holds every call of every nesting level.
/// `None` when `call_data` is not an `execute` / `executeBatch` call.
pub fn inner_calls(account: Address, call_data: &[u8]) -> Result<Option<Vec<Call>>, AccountError> {
    let calls = match decode_execution(call_data)? {
        Some(calls) => calls,
        None => return Ok(None),
    };
    expand_calls(account, calls).map(Some)
}

/// `calls` followed, after each self-targeted execution, by the calls it performs.
pub fn expand_calls(account: Address, calls: Vec<Call>) -> Result<Vec<Call>, AccountError> {
    let mut expanded = Vec::with_capacity(calls.len());
    for call in calls {
        let nested = if call.target == account {
            decode_execution(&call.data)?
        } else {
            None
        };
        expanded.push(call);
        if let Some(nested) = nested {
            expanded.extend(expand_calls(account, nested)?);
        }
    }
    Ok(expanded)
}

fn decode_execution(call_data: &[u8]) -> Result<Option<Vec<Call>>, AccountError> {
    match selector_of(call_data) {
        EXECUTE_SELECTOR => {
            let call = IRoleAccount::executeCall::abi_decode(call_data, true)
                .map_err(|_| AccountError::MalformedCalldata)?;
            Ok(Some(alloc::vec![Call::new(call.target, call.value, call.data)]))
        }
        EXECUTE_BATCH_SELECTOR => {
            let call = IRoleAccount::executeBatchCall::abi_decode(call_data, true)
                .map_err(|_| AccountError::MalformedCalldata)?;
            batch_calls(call.targets, call.values, call.datas).map(Some)
        }
        _ => Ok(None),
    }
}
