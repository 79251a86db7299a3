use alloy_primitives::{Address, FixedBytes, U256};
use role_account_types::{selector_of, to_eth_signed_message_hash, user_op_hash, Call, PackedUserOperation};
use tracing::{debug, warn};

use super::{Account, Verdict};
use crate::{
    abi::constants::{SIG_VALIDATION_FAILED, SIG_VALIDATION_SUCCESS},
    errors::AccountError,
    host::Host,
    utils::{calldata::inner_calls, crypto::recover_signer},
};

/// Result of a successful `validate_user_op`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// `SIG_VALIDATION_SUCCESS` or `SIG_VALIDATION_FAILED`.
    pub validation_data: U256,
    /// Amount moved into the relay deposit to cover the operation.
    pub prefund_paid: U256,
}

impl ValidationOutcome {
    fn signature_failed() -> Self {
        Self {
            validation_data: SIG_VALIDATION_FAILED,
            prefund_paid: U256::ZERO,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validation_data == SIG_VALIDATION_SUCCESS
    }
}

impl<H: Host> Account<'_, H> {
    /// Relay pre-admission of a user operation.
    ///
    /// A bad signature (wrong hash, unrecoverable or unauthorized signer) is reported as
    /// `SIG_VALIDATION_FAILED` with no state change. Structural problems (bad nonce, missing
    /// schedule, unpayable prefund) are errors; the nonce is checked before any schedule is
    /// touched. On success the nonce advances by one.
    pub fn validate_user_op(
        &mut self,
        caller: Address,
        op: &PackedUserOperation,
        op_hash: FixedBytes<32>,
        missing_funds: U256,
    ) -> Result<ValidationOutcome, AccountError> {
        let entry_point = self.entry_point()?;
        if caller != entry_point {
            return Err(AccountError::NotFromEntryPoint { caller });
        }
        debug!(account = ?self.address, nonce = %op.nonce, %missing_funds, "validate_user_op");

        self.atomic(|acc| {
            let chain_id = acc.host.chain_id();
            if op_hash != user_op_hash(op, entry_point, chain_id) {
                warn!(account = ?acc.address, ?op_hash, "user operation hash mismatch");
                return Ok(ValidationOutcome::signature_failed());
            }

            let digest = to_eth_signed_message_hash(op_hash);
            let signer = match recover_signer(digest, &op.signature) {
                Ok(signer) => signer,
                Err(err) => {
                    warn!(account = ?acc.address, ?err, "signature not recoverable");
                    return Ok(ValidationOutcome::signature_failed());
                }
            };

            // the account entry point itself, then every call it would make at any depth
            let mut calls = alloc::vec![Call::new(acc.address, U256::ZERO, op.call_data.clone())];
            if let Some(inner) = inner_calls(acc.address, &op.call_data)? {
                calls.extend(inner);
            }
            let delayed = match acc.check_calls(signer, &calls)? {
                Verdict::Allowed { delayed } => delayed,
                Verdict::Denied(permission) => {
                    warn!(
                        account = ?acc.address,
                        ?signer,
                        selector = ?selector_of(&op.call_data),
                        role = permission.role,
                        "signer not authorized"
                    );
                    return Ok(ValidationOutcome::signature_failed());
                }
            };

            // a replay must not reach the schedules
            let expected = acc.storage()?.nonce;
            if op.nonce != expected {
                return Err(AccountError::ReplayOrBadNonce {
                    expected,
                    actual: op.nonce,
                });
            }
            for call in delayed {
                acc.consume_delayed(signer, call.target, &call.data)?;
            }

            if missing_funds > U256::ZERO {
                let have = acc.host.balance(acc.address);
                if have < missing_funds {
                    return Err(AccountError::InsufficientDeposit {
                        have,
                        need: missing_funds,
                    });
                }
                acc.deposit_to_relay(missing_funds)?;
            }

            acc.storage()?.nonce = expected + U256::from(1u64);
            debug!(account = ?acc.address, ?signer, "user operation accepted");
            Ok(ValidationOutcome {
                validation_data: SIG_VALIDATION_SUCCESS,
                prefund_paid: missing_funds,
            })
        })
    }
}
