use alloc::string::String;

use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use role_account_types::{RoleId, Selector};

/// Events emitted by an account, recorded by the host in emission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccountEvent {
    RoleGranted {
        role: RoleId,
        account: Address,
        delay: u32,
        since: u64,
        new_member: bool,
    },
    RoleRevoked {
        role: RoleId,
        account: Address,
    },
    RoleLabel {
        role: RoleId,
        label: String,
    },
    TargetFunctionRoleUpdated {
        target: Address,
        selector: Selector,
        role: RoleId,
    },
    TargetClosed {
        target: Address,
        closed: bool,
    },
    OperationScheduled {
        operation_id: FixedBytes<32>,
        nonce: u32,
        schedule: u64,
        caller: Address,
        target: Address,
        data: Bytes,
    },
    OperationExecuted {
        operation_id: FixedBytes<32>,
        nonce: u32,
    },
    OperationCanceled {
        operation_id: FixedBytes<32>,
        nonce: u32,
    },
    Deposited {
        from: Address,
        amount: U256,
    },
    Withdrawn {
        to: Address,
        amount: U256,
    },
}
