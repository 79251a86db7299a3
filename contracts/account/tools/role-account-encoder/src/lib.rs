//! Off-chain companion of the role-gated account: packs user operations, hashes and signs
//! them exactly as the relay and the account expect, and encodes account calldata.

pub mod encoder;
pub mod types;


pub use encoder::{
    address_of, encode_execute, encode_execute_batch, encode_schedule, eth_signed_message_digest, operation_id,
    ready_at, sign_user_op, sign_user_op_hash, user_op_hash,
};
pub use types::{CallSpec, UserOperation};
