//! MongoDB connection helpers.
//!
//! Connection parameters, authentication, and retry policy around
//! connectivity belong to the caller; this module only resolves the
//! connection string and builds a client from it.

use mongodb::{options::ClientOptions, Client};

use crate::provisioner::error::ProvisionError;

/// Returns the MongoDB connection URL from environment variables.
///
/// # Returns
///
/// - If `MONGO_URI` environment variable is set, returns its value
/// - Otherwise, returns the default local MongoDB URL: "mongodb://127.0.0.1:27017"
pub fn get_mongodb_url() -> String {
    std::env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://127.0.0.1:27017".to_string())
}

/// Builds a MongoDB client from a connection string.
///
/// The string is expected to already carry whatever credentials the caller
/// intends to provision with; no authentication happens here beyond what the
/// driver performs lazily on first use.
///
// NB: Each `mongodb::Client` clone is an alias of an Arc type and allows for multiple references of the same connection pool.
pub async fn connect(url: &str) -> Result<Client, ProvisionError> {
    log::debug!("Parsing MongoDB connection string");
    let options = ClientOptions::parse(url)
        .await
        .map_err(ProvisionError::connection)?;

    let client = Client::with_options(options).map_err(ProvisionError::connection)?;
    log::debug!("MongoDB client constructed");
    Ok(client)
}
