//! Scenario tests against `MockChain`.
//!
//! Fixtures mirror a production deployment: an EntryPoint v0.7 relay at its canonical
//! address, a 6-decimals token, and five signers (two executors, a withdrawer, an admin
//! and an outsider).

use alloy_primitives::{address, Address, Bytes, FixedBytes, U256};
use alloy_sol_types::{Revert, SolCall, SolError};
use k256::ecdsa::SigningKey;
use role_account_types::{
    to_eth_signed_message_hash, user_op_hash, GasFees, GasLimits, PackedUserOperation, EXECUTOR_ROLE,
};

use crate::{
    abi::{constants::ENTRY_POINT_V07, IRoleAccount, IERC20},
    account::{Account, AccountStorage},
    errors::AccountError,
    host::Host,
    mock::MockChain,
    policy::{AuthorizationPolicy, ScheduledRoles, StaticRoles},
    utils::crypto::address_of,
};


pub(crate) const CHAIN_ID: u64 = 137;
pub(crate) const ACCOUNT: Address = address!("00000000000000000000000000000000000acc00");
pub(crate) const USDC: Address = address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
pub(crate) const DEPLOYER: Address = address!("00000000000000000000000000000000000de910");

pub(crate) const WITHDRAW_ROLE: u64 = role_account_types::WITHDRAW_ROLE;
pub(crate) const USDC_ROLE: u64 = 3;

pub(crate) fn ether(units: u64) -> U256 {
    U256::from(units) * U256::from(10u64).pow(U256::from(18u64))
}

pub(crate) fn milli_ether(units: u64) -> U256 {
    U256::from(units) * U256::from(10u64).pow(U256::from(15u64))
}

pub(crate) fn usdc(units: u64) -> U256 {
    U256::from(units) * U256::from(1_000_000u64)
}

pub(crate) fn revert_data(reason: &str) -> Vec<u8> {
    Revert {
        reason: reason.into(),
    }
    .abi_encode()
}

pub(crate) fn account_error(revert: Vec<u8>) -> AccountError {
    AccountError::abi_decode(&revert).expect("revert data is an account error")
}

pub(crate) struct Signer {
    key: SigningKey,
    pub address: Address,
}

impl Signer {
    pub(crate) fn from_seed(seed: u8) -> Self {
        let key = SigningKey::from_slice(&[seed; 32]).unwrap();
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    /// EIP-191 signature over `op_hash`, `v` in {27, 28}.
    pub(crate) fn sign(&self, op_hash: FixedBytes<32>) -> Bytes {
        let digest = to_eth_signed_message_hash(op_hash);
        let (sig, recid) = self.key.sign_prehash_recoverable(digest.as_slice()).unwrap();
        let mut out = sig.to_bytes().to_vec();
        out.push(27 + recid.to_byte());
        Bytes::from(out)
    }
}

pub(crate) fn approve_max(spender: Address) -> Vec<u8> {
    IERC20::approveCall {
        spender,
        value: U256::MAX,
    }
    .abi_encode()
}

pub(crate) fn transfer(to: Address, value: U256) -> Vec<u8> {
    IERC20::transferCall { to, value }.abi_encode()
}

pub(crate) fn execute_call(target: Address, value: U256, data: Vec<u8>) -> Vec<u8> {
    IRoleAccount::executeCall {
        target,
        value,
        data: data.into(),
    }
    .abi_encode()
}

pub(crate) struct Fixture<P> {
    pub chain: MockChain<P>,
    pub account: Address,
    pub relay: Address,
    pub usdc: Address,
    pub exec1: Signer,
    pub exec2: Signer,
    pub anon: Signer,
    pub withdraw: Signer,
    pub admin: Signer,
}

/// Account logs go to the test output, filtered by `RUST_LOG`.
fn init_tracing() {
    // the first test to run installs it
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

impl<P: AuthorizationPolicy + Clone> Fixture<P> {
    fn deploy(policy: impl FnOnce(&Fixture<P>, u64) -> P) -> Self {
        init_tracing();
        let mut chain = MockChain::new(CHAIN_ID);
        let relay = chain.deploy_relay();
        let usdc = chain.deploy_token(USDC);
        let mut fixture = Self {
            chain,
            account: ACCOUNT,
            relay,
            usdc,
            exec1: Signer::from_seed(1),
            exec2: Signer::from_seed(2),
            anon: Signer::from_seed(3),
            withdraw: Signer::from_seed(4),
            admin: Signer::from_seed(5),
        };
        let now = fixture.chain.timestamp();
        let policy = policy(&fixture, now);
        fixture
            .chain
            .deploy_account(AccountStorage::new(ACCOUNT, relay, policy));

        let (exec1, exec2) = (fixture.exec1.address, fixture.exec2.address);
        fixture.chain.mint(usdc, exec1, self::usdc(100));
        fixture.chain.mint(usdc, exec2, self::usdc(100));
        for who in [
            DEPLOYER,
            exec1,
            exec2,
            fixture.anon.address,
            fixture.withdraw.address,
            fixture.admin.address,
        ] {
            fixture.chain.fund(who, ether(100));
        }
        fixture
    }

    pub(crate) fn send(&mut self, from: Address, to: Address, value: U256, data: &[u8]) -> Result<Vec<u8>, Vec<u8>> {
        self.chain.call(from, to, value, data)
    }

    /// Calls the account through its ABI, decoding reverts as account errors.
    pub(crate) fn call<C: SolCall>(&mut self, from: Address, call: &C) -> Result<Vec<u8>, AccountError> {
        self.send(from, self.account, U256::ZERO, &call.abi_encode())
            .map_err(account_error)
    }

    pub(crate) fn account(&mut self) -> Account<'_, MockChain<P>> {
        Account::at(&mut self.chain, self.account)
    }

    pub(crate) fn add_deposit(&mut self, from: Address, value: U256) {
        self.send(from, self.account, value, &IRoleAccount::addDepositCall {}.abi_encode())
            .unwrap();
    }

    pub(crate) fn has_role(&mut self, role: u64, who: Address) -> (bool, u32) {
        self.account().has_role(role, who).unwrap()
    }

    /// User operation for `call_data` at the account's current nonce, signed by `signer`.
    pub(crate) fn signed_op(&mut self, signer: &Signer, call_data: Vec<u8>) -> PackedUserOperation {
        let nonce = self.account().get_nonce().unwrap();
        let mut op = user_op(self.account, nonce, call_data);
        op.signature = signer.sign(user_op_hash(&op, ENTRY_POINT_V07, CHAIN_ID));
        op
    }
}

pub(crate) fn user_op(sender: Address, nonce: U256, call_data: Vec<u8>) -> PackedUserOperation {
    PackedUserOperation {
        sender,
        nonce,
        init_code: Bytes::new(),
        call_data: call_data.into(),
        account_gas_limits: GasLimits::new(999_999, 999_999).pack(),
        pre_verification_gas: U256::from(999_999u64),
        gas_fees: GasFees::new(1_000_000_000, 1_000_000_000).pack(),
        paymaster_and_data: Bytes::new(),
        signature: Bytes::new(),
    }
}

/// Fixed-role account: `admin` administers, `exec1` and `exec2` execute.
pub(crate) fn static_fixture() -> Fixture<StaticRoles> {
    Fixture::deploy(|f, now| {
        StaticRoles::new(ACCOUNT, f.admin.address, &[f.exec1.address, f.exec2.address], now).unwrap()
    })
}

/// Access-manager account configured by `admin` through the ABI: executors bound to
/// `execute` and `executeBatch`, withdrawers to `withdrawDepositTo`, `USDC_ROLE` to token
/// `approve` / `transfer`.
pub(crate) fn scheduled_fixture() -> Fixture<ScheduledRoles> {
    let mut f = Fixture::deploy(|f, now| ScheduledRoles::new(ACCOUNT, f.admin.address, now).unwrap());
    let admin = f.admin.address;
    let execute = IRoleAccount::executeCall::SELECTOR;
    let execute_batch = IRoleAccount::executeBatchCall::SELECTOR;
    let withdraw = IRoleAccount::withdrawDepositToCall::SELECTOR;
    let approve = IERC20::approveCall::SELECTOR;
    let token_transfer = IERC20::transferCall::SELECTOR;

    let setup: Vec<Vec<u8>> = vec![
        label(EXECUTOR_ROLE, "EXECUTOR_ROLE"),
        grant(EXECUTOR_ROLE, f.exec1.address, 0),
        grant(EXECUTOR_ROLE, f.exec2.address, 0),
        bind(ACCOUNT, &[execute, execute_batch], EXECUTOR_ROLE),
        label(WITHDRAW_ROLE, "WITHDRAW_ROLE"),
        bind(ACCOUNT, &[withdraw], WITHDRAW_ROLE),
        label(USDC_ROLE, "USDC_ROLE"),
        bind(USDC, &[approve], USDC_ROLE),
        bind(USDC, &[token_transfer], USDC_ROLE),
    ];
    for data in setup {
        f.send(admin, ACCOUNT, U256::ZERO, &data).unwrap();
    }
    f
}

pub(crate) fn grant(role: u64, account: Address, delay: u32) -> Vec<u8> {
    IRoleAccount::grantRoleCall {
        roleId: role,
        account,
        executionDelay: delay,
    }
    .abi_encode()
}

fn label(role: u64, name: &str) -> Vec<u8> {
    IRoleAccount::labelRoleCall {
        roleId: role,
        label: name.into(),
    }
    .abi_encode()
}

fn bind(target: Address, selectors: &[[u8; 4]], role: u64) -> Vec<u8> {
    IRoleAccount::setTargetFunctionRoleCall {
        target,
        selectors: selectors.iter().copied().map(FixedBytes).collect(),
        roleId: role,
    }
    .abi_encode()
}
