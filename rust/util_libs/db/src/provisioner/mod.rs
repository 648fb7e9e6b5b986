//! Provisioning of the monitoring user on the `admin` database.
//!
//! The flow is two explicit steps: a configuration-loading step that yields a
//! fully-resolved [`spec::MonitoringUserSpec`], and a provisioning call that
//! turns that spec into a principal in the target server's user store. The
//! two never mix; substitution syntax and environment lookups stop at the
//! spec boundary.

pub mod api;
pub mod config;
pub mod error;
pub mod spec;

pub use api::{AdminDb, EnsureOutcome, UserProvisionerApi};
pub use error::ProvisionError;
pub use spec::{MonitoringUserSpec, RoleGrant, RoleName, StoredRoleGrant};
