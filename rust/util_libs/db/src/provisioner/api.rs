use std::collections::HashSet;

use async_trait::async_trait;
use bson::{doc, Document};
use mongodb::{Client, Database};

use super::error::ProvisionError;
use super::spec::{MonitoringUserSpec, RoleGrant, StoredRoleGrant, ADMIN_DB_NAME};

/// Result of an [`UserProvisionerApi::ensure`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// The user did not exist and was created.
    Created,
    /// The user existed with drifted grants; password and roles were reset.
    Updated,
    /// The user existed with exactly the declared grants; nothing was touched.
    Unchanged,
}

/// Handle on the `admin` database of an already-authenticated client.
///
/// Construction performs no I/O; the caller is responsible for supplying a
/// client whose credentials carry user-creation privilege.
#[derive(Debug, Clone)]
pub struct AdminDb {
    inner: Database,
}

impl AdminDb {
    pub fn new(client: &Client) -> Self {
        Self {
            inner: client.database(ADMIN_DB_NAME),
        }
    }

    /// The underlying admin database, for callers issuing their own commands.
    pub fn database(&self) -> &Database {
        &self.inner
    }

    async fn run_user_command(
        &self,
        operation: &str,
        username: &str,
        command: Document,
    ) -> Result<Document, ProvisionError> {
        self.inner
            .run_command(command)
            .await
            .map_err(|e| ProvisionError::classify(operation, username, e))
    }
}

/// Operations for provisioning the monitoring user on the `admin` database.
#[async_trait]
pub trait UserProvisionerApi {
    /// The error type returned by operations in this trait.
    type Error;

    /// Creates the user described by `spec`.
    ///
    /// Not idempotent: an existing user of the same name surfaces
    /// `UserAlreadyExists`; roles are never merged or overwritten.
    async fn provision(&self, spec: &MonitoringUserSpec) -> Result<(), Self::Error>;

    /// Creates the user if absent, otherwise reconciles it so the stored
    /// grants equal `spec.roles` exactly. Safe to repeat.
    async fn ensure(&self, spec: &MonitoringUserSpec) -> Result<EnsureOutcome, Self::Error>;

    /// Looks up the grants currently held by `username`, or `None` when no
    /// such user exists. Role names come back verbatim, including grants
    /// this tool never issues.
    async fn fetch_roles(&self, username: &str)
        -> Result<Option<Vec<StoredRoleGrant>>, Self::Error>;
}

/// True when the stored grants equal the declared set exactly.
fn grants_match(declared: &[RoleGrant], stored: &[StoredRoleGrant]) -> bool {
    let declared: HashSet<StoredRoleGrant> = declared.iter().map(RoleGrant::to_stored).collect();
    let stored: HashSet<StoredRoleGrant> = stored.iter().cloned().collect();
    declared == stored
}

#[async_trait]
impl UserProvisionerApi for AdminDb {
    type Error = ProvisionError;

    async fn provision(&self, spec: &MonitoringUserSpec) -> Result<(), Self::Error> {
        spec.validate()?;
        log::debug!("Creating user {:?} in the admin database", spec.username);

        self.run_user_command(
            "createUser",
            &spec.username,
            doc! {
                "createUser": &spec.username,
                "pwd": &spec.password,
                "roles": spec.roles_bson(),
            },
        )
        .await?;

        log::info!(
            "Created user {} with {} role grant(s)",
            spec.username,
            spec.roles.len()
        );
        Ok(())
    }

    async fn ensure(&self, spec: &MonitoringUserSpec) -> Result<EnsureOutcome, Self::Error> {
        spec.validate()?;

        let existing = match self.fetch_roles(&spec.username).await? {
            None => {
                self.provision(spec).await?;
                return Ok(EnsureOutcome::Created);
            }
            Some(existing) => existing,
        };

        if grants_match(&spec.roles, &existing) {
            log::debug!("User {} already matches the declared spec", spec.username);
            return Ok(EnsureOutcome::Unchanged);
        }

        log::debug!(
            "Reconciling user {}: stored grants {:?} differ from declared {:?}",
            spec.username,
            existing,
            spec.roles
        );
        self.run_user_command(
            "updateUser",
            &spec.username,
            doc! {
                "updateUser": &spec.username,
                "pwd": &spec.password,
                "roles": spec.roles_bson(),
            },
        )
        .await?;

        log::info!(
            "Updated user {} to the declared {} role grant(s)",
            spec.username,
            spec.roles.len()
        );
        Ok(EnsureOutcome::Updated)
    }

    async fn fetch_roles(
        &self,
        username: &str,
    ) -> Result<Option<Vec<StoredRoleGrant>>, Self::Error> {
        log::debug!("Looking up user {username:?} in the admin database");
        let reply = self
            .run_user_command(
                "usersInfo",
                username,
                doc! { "usersInfo": { "user": username, "db": ADMIN_DB_NAME } },
            )
            .await?;

        let users = reply.get_array("users").map_err(|e| {
            ProvisionError::internal(
                format!("usersInfo reply missing users array: {e}"),
                Some("usersInfo".to_string()),
            )
        })?;

        let user = match users.first() {
            None => {
                log::debug!("No user named {username:?} found");
                return Ok(None);
            }
            Some(user) => user.as_document().ok_or_else(|| {
                ProvisionError::internal(
                    "usersInfo returned a non-document user entry",
                    Some("usersInfo".to_string()),
                )
            })?,
        };

        let roles = user.get_array("roles").map_err(|e| {
            ProvisionError::internal(
                format!("usersInfo user entry missing roles array: {e}"),
                Some("usersInfo".to_string()),
            )
        })?;

        let mut grants = Vec::with_capacity(roles.len());
        for role in roles {
            let doc = role.as_document().ok_or_else(|| {
                ProvisionError::internal(
                    "usersInfo returned a non-document role entry",
                    Some("usersInfo".to_string()),
                )
            })?;
            let name = doc.get_str("role").map_err(|e| {
                ProvisionError::internal(
                    format!("role entry missing role name: {e}"),
                    Some("usersInfo".to_string()),
                )
            })?;
            let db = doc.get_str("db").map_err(|e| {
                ProvisionError::internal(
                    format!("role entry missing db name: {e}"),
                    Some("usersInfo".to_string()),
                )
            })?;
            grants.push(StoredRoleGrant::new(name, db));
        }

        log::debug!("User {username:?} holds {} role grant(s)", grants.len());
        Ok(Some(grants))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn matching_grants_compare_equal_regardless_of_order() {
        let declared = MonitoringUserSpec::base_roles();
        let stored = vec![
            StoredRoleGrant::new("read", "local"),
            StoredRoleGrant::new("clusterMonitor", "admin"),
        ];
        assert!(grants_match(&declared, &stored));
    }

    #[test]
    fn grants_this_tool_never_issues_register_as_drift() {
        let declared = MonitoringUserSpec::base_roles();
        let stored = vec![
            StoredRoleGrant::new("clusterMonitor", "admin"),
            StoredRoleGrant::new("read", "local"),
            StoredRoleGrant::new("readWrite", "admin"),
        ];
        assert!(!grants_match(&declared, &stored));
    }

    #[test]
    fn missing_grants_register_as_drift() {
        let declared = MonitoringUserSpec::base_roles();
        let stored = vec![StoredRoleGrant::new("read", "local")];
        assert!(!grants_match(&declared, &stored));
    }
}
