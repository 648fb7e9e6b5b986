use std::collections::HashSet;
use std::fmt;

use bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use super::error::ProvisionError;

/// Name of the privileged database that holds user and role records
pub const ADMIN_DB_NAME: &str = "admin";
/// Name of the replication-internal database the monitoring user reads
pub const LOCAL_DB_NAME: &str = "local";

/// Username of the literal (non-templated) monitoring account
pub const DEFAULT_MONITORING_USERNAME: &str = "monitoring";
/// Password of the literal (non-templated) monitoring account
pub const DEFAULT_MONITORING_PASSWORD: &str = "monitoringpassword";

/// Built-in server roles this tool grants.
///
/// Serialized in the server's camelCase spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum RoleName {
    /// Read access to cluster monitoring and diagnostic data
    ClusterMonitor,
    /// Read access to one database
    Read,
}

/// One (role, database) pair granted to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleGrant {
    pub role: RoleName,
    pub db: String,
}

impl RoleGrant {
    pub fn new(role: RoleName, db: impl Into<String>) -> Self {
        Self {
            role,
            db: db.into(),
        }
    }

    /// Wire form the server expects inside `createUser`/`updateUser`.
    pub fn to_document(&self) -> Document {
        doc! { "role": self.role.as_ref(), "db": &self.db }
    }

    /// The same grant in the server's own (string-named) representation.
    pub fn to_stored(&self) -> StoredRoleGrant {
        StoredRoleGrant::new(self.role.as_ref(), &self.db)
    }
}

impl fmt::Display for RoleGrant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.role, self.db)
    }
}

/// A grant as reported back by the server.
///
/// The role name stays a raw string: operators can hand users grants this
/// tool never issues, and those must still round-trip through `usersInfo`
/// so reconciliation sees them as drift rather than a malformed reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredRoleGrant {
    pub role: String,
    pub db: String,
}

impl StoredRoleGrant {
    pub fn new(role: impl Into<String>, db: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            db: db.into(),
        }
    }
}

impl From<&RoleGrant> for StoredRoleGrant {
    fn from(grant: &RoleGrant) -> Self {
        grant.to_stored()
    }
}

impl fmt::Display for StoredRoleGrant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.role, self.db)
    }
}

/// Declarative description of the monitoring account: one username, one
/// password, and the role grants it receives on creation.
///
/// Constructed once, immediately before the provisioning call; the durable
/// entity it produces is the user record in the target server's own store.
#[derive(Clone, Serialize, Deserialize)]
pub struct MonitoringUserSpec {
    pub username: String,
    pub password: String,
    pub roles: Vec<RoleGrant>,
}

// Keeps the password out of log output.
impl fmt::Debug for MonitoringUserSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("MonitoringUserSpec")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("roles", &self.roles)
            .finish()
    }
}

impl MonitoringUserSpec {
    /// Builds a spec, rejecting empty usernames, empty role sets, and
    /// duplicate (role, db) pairs.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        roles: Vec<RoleGrant>,
    ) -> Result<Self, ProvisionError> {
        let spec = Self {
            username: username.into(),
            password: password.into(),
            roles,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// The literal variant: user `monitoring` with the two base grants.
    pub fn monitoring_default() -> Self {
        Self {
            username: DEFAULT_MONITORING_USERNAME.to_string(),
            password: DEFAULT_MONITORING_PASSWORD.to_string(),
            roles: Self::base_roles(),
        }
    }

    /// Grants every monitoring account carries: `clusterMonitor@admin` and
    /// `read@local`.
    pub fn base_roles() -> Vec<RoleGrant> {
        vec![
            RoleGrant::new(RoleName::ClusterMonitor, ADMIN_DB_NAME),
            RoleGrant::new(RoleName::Read, LOCAL_DB_NAME),
        ]
    }

    /// Grants of the templated variant: the base set plus `read@admin`.
    pub fn templated_roles() -> Vec<RoleGrant> {
        let mut roles = Self::base_roles();
        roles.push(RoleGrant::new(RoleName::Read, ADMIN_DB_NAME));
        roles
    }

    /// Adds one grant, re-checking the uniqueness invariant.
    pub fn with_role(mut self, grant: RoleGrant) -> Result<Self, ProvisionError> {
        self.roles.push(grant);
        self.validate()?;
        Ok(self)
    }

    /// Checks the spec invariants: non-empty username, non-empty role set,
    /// unique (role, db) pairs.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.username.is_empty() {
            return Err(ProvisionError::invalid_spec("username must not be empty"));
        }
        if self.roles.is_empty() {
            return Err(ProvisionError::invalid_spec(
                "at least one role grant is required",
            ));
        }
        let mut seen = HashSet::new();
        for grant in &self.roles {
            if !seen.insert(grant) {
                return Err(ProvisionError::invalid_spec(format!(
                    "duplicate role grant {grant}"
                )));
            }
        }
        Ok(())
    }

    /// The `roles` array in the form `createUser`/`updateUser` expect.
    pub fn roles_bson(&self) -> Bson {
        Bson::Array(
            self.roles
                .iter()
                .map(|grant| Bson::Document(grant.to_document()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_spec_matches_literal_variant() {
        let spec = MonitoringUserSpec::monitoring_default();
        assert_eq!(spec.username, "monitoring");
        assert_eq!(spec.password, "monitoringpassword");
        assert_eq!(
            spec.roles,
            vec![
                RoleGrant::new(RoleName::ClusterMonitor, "admin"),
                RoleGrant::new(RoleName::Read, "local"),
            ]
        );
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn templated_roles_add_admin_read() {
        let roles = MonitoringUserSpec::templated_roles();
        assert_eq!(roles.len(), 3);
        assert!(roles.contains(&RoleGrant::new(RoleName::Read, "admin")));
    }

    #[test]
    fn empty_role_set_is_rejected() {
        let err = MonitoringUserSpec::new("monitoring", "pw", vec![])
            .expect_err("empty role set must be rejected");
        assert!(err.is_invalid_spec());
    }

    #[test]
    fn duplicate_grants_are_rejected() {
        let err = MonitoringUserSpec::new(
            "monitoring",
            "pw",
            vec![
                RoleGrant::new(RoleName::Read, "local"),
                RoleGrant::new(RoleName::Read, "local"),
            ],
        )
        .expect_err("duplicate grant must be rejected");
        assert!(err.is_invalid_spec());
    }

    #[test]
    fn empty_username_is_rejected() {
        let err = MonitoringUserSpec::new("", "pw", MonitoringUserSpec::base_roles())
            .expect_err("empty username must be rejected");
        assert!(err.is_invalid_spec());
    }

    #[test]
    fn role_grant_wire_form_uses_camel_case() {
        let grant = RoleGrant::new(RoleName::ClusterMonitor, "admin");
        assert_eq!(
            grant.to_document(),
            bson::doc! { "role": "clusterMonitor", "db": "admin" }
        );
    }

    #[test]
    fn stored_form_keeps_the_wire_spelling() {
        let grant = RoleGrant::new(RoleName::ClusterMonitor, "admin");
        assert_eq!(grant.to_stored(), StoredRoleGrant::new("clusterMonitor", "admin"));
    }

    #[test]
    fn debug_output_redacts_password() {
        let spec = MonitoringUserSpec::monitoring_default();
        let printed = format!("{spec:?}");
        assert!(printed.contains("<redacted>"));
        assert!(!printed.contains("monitoringpassword"));
    }
}
