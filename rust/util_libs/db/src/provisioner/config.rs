//! Environment resolution for the templated account variant.
//!
//! Upstream deployment tooling renders `${MONGO_MONITORING_USER}` and
//! `${MONGO_MONITORING_PASSWORD}` into the environment; this module binds
//! those values into a fully-resolved spec before any server is contacted.
//! Binaries load `.env` files themselves (`dotenv().ok()` in `main`).

use thiserror::Error;

use super::error::ProvisionError;
use super::spec::MonitoringUserSpec;

/// Environment variable holding the monitoring username
pub const MONITORING_USER_ENV_VAR: &str = "MONGO_MONITORING_USER";
/// Environment variable holding the monitoring password
pub const MONITORING_PASSWORD_ENV_VAR: &str = "MONGO_MONITORING_PASSWORD";

/// Failures while resolving the spec from the environment, before any
/// provisioning call is made.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("resolved values form an invalid spec")]
    Spec(#[source] ProvisionError),
}

/// Resolves the templated variant from the environment: the externally
/// substituted username and password plus the three-role grant set.
pub fn resolve_from_env() -> Result<MonitoringUserSpec, ConfigError> {
    let username = std::env::var(MONITORING_USER_ENV_VAR)
        .map_err(|_| ConfigError::MissingVar(MONITORING_USER_ENV_VAR))?;
    let password = std::env::var(MONITORING_PASSWORD_ENV_VAR)
        .map_err(|_| ConfigError::MissingVar(MONITORING_PASSWORD_ENV_VAR))?;

    let spec = MonitoringUserSpec::new(username, password, MonitoringUserSpec::templated_roles())
        .map_err(ConfigError::Spec)?;
    log::debug!("Resolved monitoring user spec from environment: {spec:?}");
    Ok(spec)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::provisioner::spec::{RoleGrant, RoleName};
    use serial_test::serial;

    #[test]
    #[serial]
    fn resolves_substituted_values_with_three_grants() {
        std::env::set_var(MONITORING_USER_ENV_VAR, "svc_mon");
        std::env::set_var(MONITORING_PASSWORD_ENV_VAR, "p@ss");

        let spec = resolve_from_env().expect("both variables are set");
        assert_eq!(spec.username, "svc_mon");
        assert_eq!(spec.password, "p@ss");
        assert_eq!(
            spec.roles,
            vec![
                RoleGrant::new(RoleName::ClusterMonitor, "admin"),
                RoleGrant::new(RoleName::Read, "local"),
                RoleGrant::new(RoleName::Read, "admin"),
            ]
        );

        std::env::remove_var(MONITORING_USER_ENV_VAR);
        std::env::remove_var(MONITORING_PASSWORD_ENV_VAR);
    }

    #[test]
    #[serial]
    fn missing_username_variable_is_a_config_error() {
        std::env::remove_var(MONITORING_USER_ENV_VAR);
        std::env::set_var(MONITORING_PASSWORD_ENV_VAR, "p@ss");

        let err = resolve_from_env().expect_err("username variable is unset");
        assert!(matches!(err, ConfigError::MissingVar(MONITORING_USER_ENV_VAR)));

        std::env::remove_var(MONITORING_PASSWORD_ENV_VAR);
    }

    #[test]
    #[serial]
    fn empty_username_is_an_invalid_spec() {
        std::env::set_var(MONITORING_USER_ENV_VAR, "");
        std::env::set_var(MONITORING_PASSWORD_ENV_VAR, "p@ss");

        let err = resolve_from_env().expect_err("empty username is invalid");
        assert!(matches!(err, ConfigError::Spec(_)));

        std::env::remove_var(MONITORING_USER_ENV_VAR);
        std::env::remove_var(MONITORING_PASSWORD_ENV_VAR);
    }
}
