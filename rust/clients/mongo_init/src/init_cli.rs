use clap::{Args, Parser, Subcommand};

/// Module containing all of the Clap Derive structs/definitions that make up
/// the provisioner's command line. The binary is intended to run once per
/// deployment, usually from an init container or a bootstrap script.

#[derive(Parser)]
#[command(
    version,
    about,
    author,
    long_about = "Command line interface for provisioning the MongoDB monitoring user"
)]
pub struct Root {
    /// Connection string for the target server. Must carry credentials with
    /// user-creation privilege on the admin database. Defaults to `MONGO_URI`
    /// or the local server when unset.
    #[clap(long, default_value_t = db_utils::mongodb::get_mongodb_url())]
    pub mongo_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Create the monitoring user; fails if it already exists.
    Provision(SpecArgs),
    /// Create the monitoring user, or reconcile its grants if it exists.
    /// Safe to run repeatedly.
    Ensure(SpecArgs),
}

#[derive(Args, Clone, Debug)]
pub struct SpecArgs {
    #[arg(
        long,
        help = "resolve username and password strictly from MONGO_MONITORING_USER / MONGO_MONITORING_PASSWORD and grant read@admin as well"
    )]
    pub from_env: bool,

    #[arg(
        long,
        env = "MONGO_MONITORING_USER",
        help = "username for the monitoring account (defaults to \"monitoring\")"
    )]
    pub username: Option<String>,

    #[arg(
        long,
        env = "MONGO_MONITORING_PASSWORD",
        help = "password for the monitoring account (defaults to the literal development password)"
    )]
    pub password: Option<String>,

    #[arg(long, help = "additionally grant read on the admin database")]
    pub admin_read: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    // Both cases live in one test since they share the MONGO_URI variable.
    #[test]
    fn mongo_url_default_comes_from_the_shared_env_helper() {
        std::env::set_var("MONGO_URI", "mongodb://db.internal:27017");
        let cli = Root::try_parse_from(["mongo_init", "provision"]).unwrap();
        assert_eq!(cli.mongo_url, "mongodb://db.internal:27017");

        std::env::remove_var("MONGO_URI");
        let cli = Root::try_parse_from(["mongo_init", "provision"]).unwrap();
        assert_eq!(cli.mongo_url, "mongodb://127.0.0.1:27017");
    }
}
