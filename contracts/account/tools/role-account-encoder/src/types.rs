use alloy_primitives::{Address, Bytes, U256};
use role_account_types::{Call, GasFees, GasLimits, PackedUserOperation, PaymasterInfo};
use serde::{Deserialize, Serialize};

/// User operation with its gas and paymaster fields spelled out, as wallets and bundlers
/// exchange it in JSON. [`UserOperation::pack`] produces the on-chain layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    /// Deploys `sender` when set; `init_code` is `factory || factory_data`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factory: Option<Address>,
    #[serde(default)]
    pub factory_data: Bytes,
    pub call_data: Bytes,
    pub call_gas_limit: u128,
    pub verification_gas_limit: u128,
    pub pre_verification_gas: U256,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paymaster: Option<Address>,
    #[serde(default)]
    pub paymaster_verification_gas_limit: u128,
    #[serde(default)]
    pub paymaster_post_op_gas_limit: u128,
    #[serde(default)]
    pub paymaster_data: Bytes,
    /// 65-byte `r || s || v` EIP-191 signature over the user-operation hash.
    #[serde(default)]
    pub signature: Bytes,
}

impl UserOperation {
    pub fn init_code(&self) -> Bytes {
        match self.factory {
            Some(factory) => {
                let mut buf = Vec::with_capacity(20 + self.factory_data.len());
                buf.extend_from_slice(factory.as_slice());
                buf.extend_from_slice(&self.factory_data);
                buf.into()
            }
            None => Bytes::new(),
        }
    }

    pub fn pack(&self) -> PackedUserOperation {
        let paymaster_and_data = match self.paymaster {
            Some(paymaster) => PaymasterInfo {
                paymaster,
                verification_gas_limit: self.paymaster_verification_gas_limit,
                post_op_gas_limit: self.paymaster_post_op_gas_limit,
                data: self.paymaster_data.clone(),
            }
            .pack(),
            None => Bytes::new(),
        };
        PackedUserOperation {
            sender: self.sender,
            nonce: self.nonce,
            init_code: self.init_code(),
            call_data: self.call_data.clone(),
            account_gas_limits: GasLimits::new(self.verification_gas_limit, self.call_gas_limit).pack(),
            pre_verification_gas: self.pre_verification_gas,
            gas_fees: GasFees::new(self.max_priority_fee_per_gas, self.max_fee_per_gas).pack(),
            paymaster_and_data,
            signature: self.signature.clone(),
        }
    }
}

/// One call of an `executeBatch`, in JSON form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSpec {
    pub target: Address,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub data: Bytes,
}

impl From<CallSpec> for Call {
    fn from(spec: CallSpec) -> Self {
        Call::new(spec.target, spec.value, spec.data)
    }
}
