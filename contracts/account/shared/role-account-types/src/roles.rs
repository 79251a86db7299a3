//! Role identifiers.
//!
//! Roles are small integers; labels are cosmetic and never consulted for authorization.

pub type RoleId = u64;

/// Administers every other role and the policy itself.
pub const ADMIN_ROLE: RoleId = 0;
/// May submit operations and call `execute` / `executeBatch`.
pub const EXECUTOR_ROLE: RoleId = 1;
/// May move the relay deposit out (`withdrawDepositTo`).
pub const WITHDRAW_ROLE: RoleId = 2;
/// Every account is implicitly a member.
pub const PUBLIC_ROLE: RoleId = u64::MAX;
