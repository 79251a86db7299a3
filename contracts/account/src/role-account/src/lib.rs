//! Role-gated ERC-4337 account.
//!
//! The account authenticates user operations for an EntryPoint v0.7 relay, authorizes
//! every call it makes against a role policy, and executes single or batched calls
//! atomically. It is written against the [`host::Host`] seam rather than a concrete chain,
//! so the same code runs inside a chain integration and inside [`mock::MockChain`].
//!
//! Layout:
//! - `abi`: Solidity interfaces, selectors and relay constants.
//! - `policy`: `AuthorizationPolicy` and its `StaticRoles` / `ScheduledRoles` variants.
//! - `account`: the account entry points.
//! - `router`: calldata decoding into entry points.
//! - `mock`: in-memory host with a relay and an ERC-20 token.

extern crate alloc;

pub mod abi;
pub mod account;
pub mod errors;
pub mod events;
pub mod host;
pub mod mock;
pub mod policy;
pub mod router;
pub mod utils;

#[cfg(test)]
mod tests;

pub use account::{Account, AccountStorage, ValidationOutcome};
pub use errors::{AccountError, SignatureError};
pub use events::AccountEvent;
pub use host::Host;
pub use policy::{AuthorizationPolicy, Permission, ScheduledRoles, StaticRoles};
