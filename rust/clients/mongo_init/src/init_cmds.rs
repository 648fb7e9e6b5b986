use anyhow::Result;
use db_utils::mongodb::connect;
use db_utils::provisioner::{
    config,
    spec::{MonitoringUserSpec, RoleGrant, RoleName, ADMIN_DB_NAME},
    AdminDb, EnsureOutcome, UserProvisionerApi,
};

use crate::init_cli::{Commands, Root, SpecArgs};

pub async fn run(cli: Root) -> Result<()> {
    let client = connect(&cli.mongo_url).await?;
    let admin = AdminDb::new(&client);

    match cli.command {
        Commands::Provision(args) => {
            let spec = resolve_spec(&args)?;
            admin.provision(&spec).await?;
            log::info!("Provisioned monitoring user {}", spec.username);
        }
        Commands::Ensure(args) => {
            let spec = resolve_spec(&args)?;
            match admin.ensure(&spec).await? {
                EnsureOutcome::Created => {
                    log::info!("Created monitoring user {}", spec.username)
                }
                EnsureOutcome::Updated => {
                    log::info!("Reconciled grants for monitoring user {}", spec.username)
                }
                EnsureOutcome::Unchanged => {
                    log::info!("Monitoring user {} already up to date", spec.username)
                }
            }
        }
    }

    Ok(())
}

/// Turns CLI arguments into a fully-resolved spec before any server traffic.
fn resolve_spec(args: &SpecArgs) -> Result<MonitoringUserSpec> {
    if args.from_env {
        return Ok(config::resolve_from_env()?);
    }

    let mut spec = MonitoringUserSpec::monitoring_default();
    if let Some(username) = &args.username {
        spec.username = username.clone();
    }
    if let Some(password) = &args.password {
        spec.password = password.clone();
    }
    if args.admin_read {
        spec = spec.with_role(RoleGrant::new(RoleName::Read, ADMIN_DB_NAME))?;
    }
    spec.validate()?;
    Ok(spec)
}

#[cfg(test)]
mod test {
    use super::*;

    fn args() -> SpecArgs {
        SpecArgs {
            from_env: false,
            username: None,
            password: None,
            admin_read: false,
        }
    }

    #[test]
    fn defaults_to_the_literal_two_role_variant() {
        let spec = resolve_spec(&args()).unwrap();
        assert_eq!(spec.username, "monitoring");
        assert_eq!(spec.roles.len(), 2);
    }

    #[test]
    fn admin_read_flag_adds_the_third_grant() {
        let spec = resolve_spec(&SpecArgs {
            admin_read: true,
            ..args()
        })
        .unwrap();
        assert_eq!(spec.roles.len(), 3);
        assert!(spec
            .roles
            .contains(&RoleGrant::new(RoleName::Read, ADMIN_DB_NAME)));
    }

    #[test]
    fn explicit_credentials_override_the_literals() {
        let spec = resolve_spec(&SpecArgs {
            username: Some("svc_mon".to_string()),
            password: Some("p@ss".to_string()),
            ..args()
        })
        .unwrap();
        assert_eq!(spec.username, "svc_mon");
        assert_eq!(spec.password, "p@ss");
    }
}
