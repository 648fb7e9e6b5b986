//! Ephemeral `mongod` instances for integration tests.
//!
//! TCP is disabled; the server listens only on a unix domain socket inside a
//! tempdir, so parallel tests never contend for a port.

use anyhow::Context;
use mongodb::{
    options::{ClientOptions, Credential, ServerAddress},
    Client as MongoDBClient,
};
use std::{path::PathBuf, process::Stdio, time::Duration};
use tempfile::TempDir;

pub struct MongodRunner {
    child: std::process::Child,
    // Held so the datadir and socket outlive the child process
    tempdir: TempDir,
}

impl MongodRunner {
    fn socket_path(tempdir: &TempDir) -> anyhow::Result<PathBuf> {
        Ok(tempdir.path().canonicalize()?.join("mongod.sock"))
    }

    /// Spawns a fresh `mongod` and waits until its socket accepts clients.
    pub fn run() -> anyhow::Result<Self> {
        Self::spawn(false)
    }

    /// Spawns a fresh `mongod` with access control enabled.
    ///
    /// Until a first user is created through the localhost exception, only
    /// user-creation commands are permitted; everything else is unauthorized.
    pub fn run_with_auth() -> anyhow::Result<Self> {
        Self::spawn(true)
    }

    fn spawn(auth: bool) -> anyhow::Result<Self> {
        let tempdir = TempDir::new().context("Failed to create tempdir")?;
        let socket_path = Self::socket_path(&tempdir)?;

        let socket_str = socket_path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("socket path is not valid UTF-8"))?
            .to_string();

        let mut cmd = std::process::Command::new("mongod");
        cmd.args([
            "--unixSocketPrefix",
            &tempdir.path().to_string_lossy(),
            "--dbpath",
            &tempdir.path().to_string_lossy(),
            "--bind_ip",
            &socket_str,
            "--port",
            &0.to_string(),
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
        if auth {
            cmd.arg("--auth");
        }

        let child = cmd.spawn().context("Failed to start mongod")?;
        let runner = Self { child, tempdir };

        // mongod creates the socket file once it is ready to accept clients
        let retries = 30;
        for _ in 0..retries {
            if socket_path.exists() {
                log::debug!("mongod is listening at {socket_path:?}");
                return Ok(runner);
            }
            std::thread::sleep(Duration::from_millis(500));
        }

        Err(anyhow::anyhow!(
            "mongod did not create its socket file in time"
        ))
    }

    pub fn socket_pathbuf(&self) -> anyhow::Result<PathBuf> {
        Self::socket_path(&self.tempdir)
    }

    /// A client connected to this instance over its unix socket.
    pub fn client(&self) -> anyhow::Result<MongoDBClient> {
        let address = ServerAddress::Unix {
            path: self.socket_pathbuf()?,
        };
        let options = ClientOptions::builder().hosts(vec![address]).build();
        Ok(MongoDBClient::with_options(options)?)
    }

    /// A client authenticating against the admin database as `username`.
    pub fn client_with_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> anyhow::Result<MongoDBClient> {
        let address = ServerAddress::Unix {
            path: self.socket_pathbuf()?,
        };
        let credential = Credential::builder()
            .username(username.to_string())
            .password(password.to_string())
            .build();
        let options = ClientOptions::builder()
            .hosts(vec![address])
            .credential(credential)
            .build();
        Ok(MongoDBClient::with_options(options)?)
    }
}

impl Drop for MongodRunner {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            log::warn!("Failed to stop mongod: {e}");
        }
        let _ = self.child.wait();
    }
}
