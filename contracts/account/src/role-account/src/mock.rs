//! In-memory host for tests and off-chain simulation.
//!
//! `MockChain` keeps native balances, deployed accounts and a few scripted programs (an
//! EntryPoint-like relay, an ERC-20 token, a re-entrant caller and a reverter). Every call
//! is journaled: a failed call, or a failed account entry point, is rolled back by
//! restoring a snapshot.

use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{Revert, SolCall, SolError, SolInterface, SolValue};
use role_account_types::{user_op_hash, PackedUserOperation};
use tracing::{debug, warn};

use crate::{
    abi::{constants::ENTRY_POINT_V07, IEntryPoint, IRoleAccount, IERC20},
    account::AccountStorage,
    errors::AccountError,
    events::AccountEvent,
    host::{Checkpoint, Host},
    policy::AuthorizationPolicy,
    router,
};

/// Scripted contract code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Program {
    Relay(RelayState),
    Token(TokenState),
    /// Calls `account` with `payload` whenever it is called.
    Reentrant { account: Address, payload: Bytes },
    /// Always reverts with `Error(reason)`.
    Reverter { reason: String },
}

/// Deposits and stakes held by the relay, per account.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RelayState {
    pub deposits: BTreeMap<Address, U256>,
    pub stakes: BTreeMap<Address, U256>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenState {
    pub balances: BTreeMap<Address, U256>,
    pub allowances: BTreeMap<(Address, Address), U256>,
}

#[derive(Clone, Debug)]
struct World<P> {
    timestamp: u64,
    chain_id: u64,
    balances: BTreeMap<Address, U256>,
    accounts: BTreeMap<Address, AccountStorage<P>>,
    programs: BTreeMap<Address, Program>,
    events: Vec<(Address, AccountEvent)>,
}

/// Relay rejection of a user operation, mirroring EntryPoint `FailedOp`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedOp {
    pub index: usize,
    pub reason: String,
    /// Revert data of `validateUserOp`, when it reverted.
    pub revert_data: Bytes,
}

pub const AA23_REVERTED: &str = "AA23 reverted";
pub const AA24_SIGNATURE_ERROR: &str = "AA24 signature error";
pub const AA21_PREFUND: &str = "AA21 didn't pay prefund";

/// Outcome of one executed user operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpReceipt {
    pub op_hash: alloy_primitives::FixedBytes<32>,
    pub success: bool,
    /// Return data on success, revert data otherwise.
    pub output: Bytes,
}

pub struct MockChain<P> {
    world: World<P>,
    journal: Vec<World<P>>,
}

impl<P: AuthorizationPolicy + Clone> MockChain<P> {
    pub fn new(chain_id: u64) -> Self {
        Self {
            world: World {
                timestamp: 1_700_000_000,
                chain_id,
                balances: BTreeMap::new(),
                accounts: BTreeMap::new(),
                programs: BTreeMap::new(),
                events: Vec::new(),
            },
            journal: Vec::new(),
        }
    }

    /// Installs the relay at the canonical EntryPoint v0.7 address.
    pub fn deploy_relay(&mut self) -> Address {
        self.install(ENTRY_POINT_V07, Program::Relay(RelayState::default()));
        ENTRY_POINT_V07
    }

    pub fn deploy_token(&mut self, address: Address) -> Address {
        self.install(address, Program::Token(TokenState::default()));
        address
    }

    pub fn install(&mut self, address: Address, program: Program) {
        self.world.programs.insert(address, program);
    }

    pub fn deploy_account(&mut self, storage: AccountStorage<P>) -> Address {
        let address = storage.address;
        self.world.accounts.insert(address, storage);
        address
    }

    pub fn storage(&self, account: Address) -> Option<&AccountStorage<P>> {
        self.world.accounts.get(&account)
    }

    pub fn fund(&mut self, who: Address, amount: U256) {
        let balance = self.world.balances.entry(who).or_default();
        *balance = balance.saturating_add(amount);
    }

    pub fn mint(&mut self, token: Address, to: Address, amount: U256) {
        if let Some(Program::Token(state)) = self.world.programs.get_mut(&token) {
            let balance = state.balances.entry(to).or_default();
            *balance = balance.saturating_add(amount);
        }
    }

    pub fn timestamp(&self) -> u64 {
        self.world.timestamp
    }

    pub fn set_timestamp(&mut self, timestamp: u64) {
        self.world.timestamp = timestamp;
    }

    /// Advances the clock by `seconds`.
    pub fn warp(&mut self, seconds: u64) {
        self.world.timestamp = self.world.timestamp.saturating_add(seconds);
    }

    pub fn deposit_of(&self, account: Address) -> U256 {
        self.relay_state()
            .and_then(|relay| relay.deposits.get(&account).copied())
            .unwrap_or_default()
    }

    pub fn stake_of(&self, account: Address) -> U256 {
        self.relay_state()
            .and_then(|relay| relay.stakes.get(&account).copied())
            .unwrap_or_default()
    }

    pub fn token_balance(&self, token: Address, who: Address) -> U256 {
        match self.world.programs.get(&token) {
            Some(Program::Token(state)) => state.balances.get(&who).copied().unwrap_or_default(),
            _ => U256::ZERO,
        }
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        match self.world.programs.get(&token) {
            Some(Program::Token(state)) => state
                .allowances
                .get(&(owner, spender))
                .copied()
                .unwrap_or_default(),
            _ => U256::ZERO,
        }
    }

    pub fn events(&self) -> &[(Address, AccountEvent)] {
        &self.world.events
    }

    /// Runs a batch of user operations the way the relay does: validate all, then execute
    /// each. A validation failure rejects the whole batch with no effects. Execution
    /// failures only mark the receipt.
    pub fn handle_ops(&mut self, ops: &[PackedUserOperation]) -> Result<Vec<OpReceipt>, FailedOp> {
        let relay = ENTRY_POINT_V07;
        let checkpoint = self.checkpoint();
        let mut hashes = Vec::with_capacity(ops.len());
        for (index, op) in ops.iter().enumerate() {
            match self.validate_op(relay, index, op) {
                Ok(op_hash) => hashes.push(op_hash),
                Err(failed) => {
                    warn!(index, reason = %failed.reason, "user operation rejected");
                    self.revert_to(checkpoint);
                    return Err(failed);
                }
            }
        }

        let mut receipts = Vec::with_capacity(ops.len());
        for (op, op_hash) in ops.iter().zip(hashes) {
            let receipt = match self.call(relay, op.sender, U256::ZERO, &op.call_data) {
                Ok(out) => OpReceipt {
                    op_hash,
                    success: true,
                    output: out.into(),
                },
                Err(revert) => {
                    debug!(reason = %router::describe_revert(&revert), "user operation execution reverted");
                    OpReceipt {
                        op_hash,
                        success: false,
                        output: revert.into(),
                    }
                }
            };
            receipts.push(receipt);
        }
        self.commit(checkpoint);
        Ok(receipts)
    }

    pub fn handle_op(&mut self, op: &PackedUserOperation) -> Result<OpReceipt, FailedOp> {
        let mut receipts = self.handle_ops(core::slice::from_ref(op))?;
        Ok(receipts.remove(0))
    }

    fn validate_op(&mut self, relay: Address, index: usize, op: &PackedUserOperation) -> Result<alloy_primitives::FixedBytes<32>, FailedOp> {
        let failed = |reason: &str, revert_data: Vec<u8>| FailedOp {
            index,
            reason: reason.to_string(),
            revert_data: revert_data.into(),
        };

        let op_hash = user_op_hash(op, relay, self.world.chain_id);
        let required = op.required_prefund().map_err(|_| failed("AA93 invalid paymasterAndData", Vec::new()))?;
        let missing = required.saturating_sub(self.deposit_of(op.sender));

        let data = IRoleAccount::validateUserOpCall {
            userOp: op.clone().into(),
            userOpHash: op_hash,
            missingAccountFunds: missing,
        }
        .abi_encode();
        let out = self
            .call(relay, op.sender, U256::ZERO, &data)
            .map_err(|revert| failed(AA23_REVERTED, revert))?;
        let validation_data = U256::abi_decode(&out, true).map_err(|_| failed(AA23_REVERTED, out.clone()))?;
        if validation_data != U256::ZERO {
            return Err(failed(AA24_SIGNATURE_ERROR, Vec::new()));
        }
        if self.deposit_of(op.sender) < required {
            return Err(failed(AA21_PREFUND, Vec::new()));
        }
        Ok(op_hash)
    }

    fn relay_state(&self) -> Option<&RelayState> {
        match self.world.programs.get(&ENTRY_POINT_V07) {
            Some(Program::Relay(state)) => Some(state),
            _ => None,
        }
    }

    fn transfer(&mut self, from: Address, to: Address, value: U256) -> Result<(), Vec<u8>> {
        if value.is_zero() {
            return Ok(());
        }
        let have = self.balance(from);
        if have < value {
            return Err(revert("insufficient balance"));
        }
        self.world.balances.insert(from, have - value);
        self.fund(to, value);
        Ok(())
    }

    fn run(&mut self, caller: Address, target: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        if self.world.accounts.contains_key(&target) {
            return router::dispatch(self, target, caller, value, data);
        }
        match self.world.programs.get(&target).cloned() {
            Some(Program::Relay(_)) => self.run_relay(caller, value, data),
            Some(Program::Token(_)) => self.run_token(target, caller, data),
            Some(Program::Reentrant { account, payload }) => self.call(target, account, U256::ZERO, &payload),
            Some(Program::Reverter { reason }) => Err(revert(&reason)),
            // externally owned account
            None => Ok(Vec::new()),
        }
    }

    fn relay_mut(&mut self) -> Result<&mut RelayState, Vec<u8>> {
        match self.world.programs.get_mut(&ENTRY_POINT_V07) {
            Some(Program::Relay(state)) => Ok(state),
            _ => Err(revert("relay not deployed")),
        }
    }

    fn run_relay(&mut self, caller: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        use IEntryPoint::IEntryPointCalls as Calls;

        if data.is_empty() {
            credit(&mut self.relay_mut()?.deposits, caller, value);
            return Ok(Vec::new());
        }
        let call = Calls::abi_decode(data, true).map_err(|_| revert("unknown relay call"))?;
        match call {
            Calls::depositTo(c) => {
                credit(&mut self.relay_mut()?.deposits, c.account, value);
                Ok(Vec::new())
            }
            Calls::withdrawTo(c) => {
                let relay = self.relay_mut()?;
                let have = relay.deposits.get(&caller).copied().unwrap_or_default();
                if c.withdrawAmount > have {
                    return Err(revert("Withdraw amount too large"));
                }
                relay.deposits.insert(caller, have - c.withdrawAmount);
                self.transfer(ENTRY_POINT_V07, c.withdrawAddress, c.withdrawAmount)?;
                Ok(Vec::new())
            }
            Calls::balanceOf(c) => Ok(self.deposit_of(c.account).abi_encode()),
            Calls::addStake(c) => {
                if c.unstakeDelaySec == 0 {
                    return Err(revert("must specify unstake delay"));
                }
                if value.is_zero() {
                    return Err(revert("no stake specified"));
                }
                credit(&mut self.relay_mut()?.stakes, caller, value);
                Ok(Vec::new())
            }
        }
    }

    fn run_token(&mut self, token: Address, caller: Address, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        use IERC20::IERC20Calls as Calls;

        let call = Calls::abi_decode(data, true).map_err(|_| revert("unknown token call"))?;
        let Some(Program::Token(state)) = self.world.programs.get_mut(&token) else {
            return Err(revert("not a token"));
        };
        match call {
            Calls::transfer(c) => {
                move_tokens(state, caller, c.to, c.value)?;
                Ok(true.abi_encode())
            }
            Calls::transferFrom(c) => {
                let allowance = state
                    .allowances
                    .get(&(c.from, caller))
                    .copied()
                    .unwrap_or_default();
                if allowance < c.value {
                    return Err(revert("ERC20: insufficient allowance"));
                }
                if allowance != U256::MAX {
                    state.allowances.insert((c.from, caller), allowance - c.value);
                }
                move_tokens(state, c.from, c.to, c.value)?;
                Ok(true.abi_encode())
            }
            Calls::approve(c) => {
                state.allowances.insert((caller, c.spender), c.value);
                Ok(true.abi_encode())
            }
            Calls::balanceOf(c) => Ok(state
                .balances
                .get(&c.account)
                .copied()
                .unwrap_or_default()
                .abi_encode()),
            Calls::allowance(c) => Ok(state
                .allowances
                .get(&(c.owner, c.spender))
                .copied()
                .unwrap_or_default()
                .abi_encode()),
        }
    }
}

impl<P: AuthorizationPolicy + Clone> Host for MockChain<P> {
    type Policy = P;

    fn block_timestamp(&self) -> u64 {
        self.world.timestamp
    }

    fn chain_id(&self) -> u64 {
        self.world.chain_id
    }

    fn balance(&self, who: Address) -> U256 {
        self.world.balances.get(&who).copied().unwrap_or_default()
    }

    fn account(&mut self, address: Address) -> Result<&mut AccountStorage<P>, AccountError> {
        self.world
            .accounts
            .get_mut(&address)
            .ok_or(AccountError::UnknownAccount { address })
    }

    fn call(&mut self, caller: Address, target: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        let checkpoint = self.checkpoint();
        let result = self
            .transfer(caller, target, value)
            .and_then(|()| self.run(caller, target, value, data));
        match result {
            Ok(_) => self.commit(checkpoint),
            Err(_) => self.revert_to(checkpoint),
        }
        result
    }

    fn checkpoint(&mut self) -> Checkpoint {
        self.journal.push(self.world.clone());
        Checkpoint(self.journal.len() - 1)
    }

    fn revert_to(&mut self, checkpoint: Checkpoint) {
        if let Some(snapshot) = self.journal.get(checkpoint.0).cloned() {
            self.world = snapshot;
        }
        self.journal.truncate(checkpoint.0);
    }

    fn commit(&mut self, checkpoint: Checkpoint) {
        self.journal.truncate(checkpoint.0);
    }

    fn emit(&mut self, account: Address, event: AccountEvent) {
        self.world.events.push((account, event));
    }
}

fn revert(reason: &str) -> Vec<u8> {
    Revert {
        reason: reason.to_string(),
    }
    .abi_encode()
}

fn credit(ledger: &mut BTreeMap<Address, U256>, who: Address, amount: U256) {
    let balance = ledger.entry(who).or_default();
    *balance = balance.saturating_add(amount);
}

fn move_tokens(state: &mut TokenState, from: Address, to: Address, amount: U256) -> Result<(), Vec<u8>> {
    let have = state.balances.get(&from).copied().unwrap_or_default();
    if have < amount {
        return Err(revert("ERC20: transfer amount exceeds balance"));
    }
    state.balances.insert(from, have - amount);
    credit(&mut state.balances, to, amount);
    Ok(())
}
