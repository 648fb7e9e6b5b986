/*
 This client is associated with the:
- admin database of the target MongoDB server
- monitoring user it provisions there

// This client is responsible for:
  - resolving the monitoring user spec (literal flags or environment)
  - issuing the one createUser request (`provision`)
  - optionally reconciling an existing user (`ensure`)
*/

mod init_cli;
mod init_cmds;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let cli = init_cli::Root::parse();
    init_cmds::run(cli).await
}
