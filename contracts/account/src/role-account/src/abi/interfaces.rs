//! Solidity ABI surface of the account and of the contracts it talks to.
//!
//! The account is reachable only through these signatures; `router` decodes incoming
//! calldata against `IRoleAccount` and the account encodes outgoing calls with
//! `IEntryPoint` / `IERC20`.

use alloy_sol_types::sol;

sol! {
    /// ERC-4337 v0.7 packed user operation.
    struct PackedUserOperation {
        address sender;
        uint256 nonce;
        bytes initCode;
        bytes callData;
        bytes32 accountGasLimits;
        uint256 preVerificationGas;
        bytes32 gasFees;
        bytes paymasterAndData;
        bytes signature;
    }

    interface IRoleAccount {
        error AccessManagerUnauthorizedAccount(address msgsender, uint64 roleId);
        error InsufficientDeposit(uint256 have, uint256 need);
        error WrongArrayLength(uint256 expected, uint256 actual);
        error DelayNotAllowed();
        error InvalidAccountNonce(uint256 expected, uint256 actual);
        error CallFailed(uint256 index, bytes reason);
        error NotFromEntryPoint(address caller);
        error AccessManagerAlreadyScheduled(bytes32 operationId);
        error AccessManagerNotScheduled(bytes32 operationId);
        error AccessManagerNotReady(bytes32 operationId);
        error AccessManagerLockedRole(uint64 roleId);
        error AccessManagerBadConfirmation();
        error UnknownAccount(address account);
        error UnknownSelector(bytes4 selector);
        error MalformedCalldata();

        // relay-facing
        function validateUserOp(PackedUserOperation userOp, bytes32 userOpHash, uint256 missingAccountFunds)
            external
            returns (uint256 validationData);
        function getNonce() external view returns (uint256);
        function entryPoint() external view returns (address);

        // owner-facing
        function execute(address target, uint256 value, bytes data) external returns (bytes result);
        function executeBatch(address[] targets, uint256[] values, bytes[] datas) external;
        function addDeposit() external payable;
        function withdrawDepositTo(address withdrawAddress, uint256 amount) external;
        function getDeposit() external view returns (uint256);

        // policy administration
        function hasRole(uint64 roleId, address account) external view returns (bool isMember, uint32 executionDelay);
        function grantRole(uint64 roleId, address account, uint32 executionDelay) external;
        function revokeRole(uint64 roleId, address account) external;
        function renounceRole(uint64 roleId, address callerConfirmation) external;
        function labelRole(uint64 roleId, string label) external;
        function setTargetFunctionRole(address target, bytes4[] selectors, uint64 roleId) external;
        function setTargetClosed(address target, bool closed) external;
        function getTargetFunctionRole(address target, bytes4 selector) external view returns (uint64);
        function isTargetClosed(address target) external view returns (bool);
        function canCall(address caller, address target, bytes4 selector)
            external
            view
            returns (bool immediate, uint32 delay);

        // delayed operations
        function schedule(address target, bytes data, uint64 when) external returns (bytes32 operationId, uint32 nonce);
        function cancel(address caller, address target, bytes data) external returns (uint32 nonce);
        function hashOperation(address caller, address target, bytes data) external view returns (bytes32);
        function getSchedule(bytes32 id) external view returns (uint64);
        function getScheduleNonce(bytes32 id) external view returns (uint32);
    }

    /// Subset of the EntryPoint v0.7 stake manager used for the account's deposit.
    interface IEntryPoint {
        function depositTo(address account) external payable;
        function withdrawTo(address withdrawAddress, uint256 withdrawAmount) external;
        function balanceOf(address account) external view returns (uint256);
        function addStake(uint32 unstakeDelaySec) external payable;
    }

    interface IERC20 {
        function transfer(address to, uint256 value) external returns (bool);
        function transferFrom(address from, address to, uint256 value) external returns (bool);
        function approve(address spender, uint256 value) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}
