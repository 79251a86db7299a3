//! Relay constants (ERC-4337 EntryPoint v0.7) and the account's own selector table.

use alloy_primitives::{address, Address, U256};
use alloy_sol_types::SolCall;
use role_account_types::Selector;

use super::interfaces::IRoleAccount;

/// Canonical EntryPoint v0.7 deployment.
pub const ENTRY_POINT_V07: Address = address!("0000000071727De22E5E9d8BAf0edAc6f37da032");

// Validation return codes (the relay treats any non-zero value as a failed signature).
pub const SIG_VALIDATION_SUCCESS: U256 = U256::ZERO;
pub const SIG_VALIDATION_FAILED: U256 = U256::from_limbs([1, 0, 0, 0]);

pub const EXECUTE_SELECTOR: Selector = IRoleAccount::executeCall::SELECTOR;
pub const EXECUTE_BATCH_SELECTOR: Selector = IRoleAccount::executeBatchCall::SELECTOR;
pub const WITHDRAW_DEPOSIT_TO_SELECTOR: Selector = IRoleAccount::withdrawDepositToCall::SELECTOR;

/// Policy administration entry points. On the account itself these always require
/// `ADMIN_ROLE`, whatever bindings were configured.
pub const ADMIN_SELECTORS: [Selector; 5] = [
    IRoleAccount::grantRoleCall::SELECTOR,
    IRoleAccount::revokeRoleCall::SELECTOR,
    IRoleAccount::labelRoleCall::SELECTOR,
    IRoleAccount::setTargetFunctionRoleCall::SELECTOR,
    IRoleAccount::setTargetClosedCall::SELECTOR,
];

pub fn is_admin_selector(selector: Selector) -> bool {
    ADMIN_SELECTORS.contains(&selector)
}
