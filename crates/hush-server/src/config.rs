//! Deployment configuration.
//!
//! All values come from environment variables written once at deploy time.
//! The defense policy is deployment-time state: it cannot be changed at
//! runtime, and validation failures are fatal at startup rather than
//! discovered mid-incident.

use std::str::FromStr;

use crate::error::ServerError;

/// What happens when an IP exhausts its failure budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Temporary IP block for `IP_BLOCK_MINUTES`.
    IpTemp,
    /// Permanent IP block.
    IpPerm,
    /// Irreversibly erase all encrypted message/thread storage.
    DbWipe,
    /// Erase storage, then terminate the service process.
    DbWipeShutdown,
}

impl FromStr for FailureMode {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ip_temp" => Ok(Self::IpTemp),
            "ip_perm" => Ok(Self::IpPerm),
            "db_wipe" => Ok(Self::DbWipe),
            "db_wipe_shutdown" => Ok(Self::DbWipeShutdown),
            other => Err(ServerError::Config(format!("unknown FAILURE_MODE: {other}"))),
        }
    }
}

impl std::fmt::Display for FailureMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::IpTemp => "ip_temp",
            Self::IpPerm => "ip_perm",
            Self::DbWipe => "db_wipe",
            Self::DbWipeShutdown => "db_wipe_shutdown",
        };
        f.write_str(name)
    }
}

/// Server deployment configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// base64(SHA-256(normalized passphrase)) - the only credential the
    /// server ever holds.
    pub auth_hash: String,
    /// Base64 deployment KDF salt, served to clients. Non-secret.
    pub kdf_salt: String,
    /// Secret for signing session tokens.
    pub session_secret: String,
    /// Session token lifetime in minutes. No refresh: expiry forces a full
    /// re-authentication.
    pub session_ttl_minutes: u64,
    /// Failures allowed before the failure mode triggers.
    pub max_auth_failures: u32,
    /// Escalation applied at the failure threshold.
    pub failure_mode: FailureMode,
    /// Temporary block duration for [`FailureMode::IpTemp`].
    pub ip_block_minutes: u64,
    /// If set, any single failure wipes storage and shuts down.
    pub panic_mode: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Variable names match the deployment tooling: `AUTH_HASH`,
    /// `KDF_SALT`, `JWT_SECRET`, `JWT_EXPIRE_MINUTES`,
    /// `MAX_AUTH_FAILURES`, `FAILURE_MODE`, `IP_BLOCK_MINUTES`,
    /// `PANIC_MODE`.
    ///
    /// # Errors
    ///
    /// [`ServerError::Config`] for unparseable values or failed
    /// validation.
    pub fn from_env() -> Result<Self, ServerError> {
        let config = Self {
            auth_hash: env_string("AUTH_HASH"),
            kdf_salt: env_string("KDF_SALT"),
            session_secret: env_string("JWT_SECRET"),
            session_ttl_minutes: env_parse("JWT_EXPIRE_MINUTES", 60)?,
            max_auth_failures: env_parse("MAX_AUTH_FAILURES", 5)?,
            failure_mode: std::env::var("FAILURE_MODE")
                .unwrap_or_else(|_| "ip_temp".to_string())
                .parse()?,
            ip_block_minutes: env_parse("IP_BLOCK_MINUTES", 60)?,
            panic_mode: env_bool("PANIC_MODE")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would disable authentication or make the
    /// defense policy meaningless.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.auth_hash.is_empty() {
            return Err(ServerError::Config("AUTH_HASH must be set".to_string()));
        }
        if self.kdf_salt.is_empty() {
            return Err(ServerError::Config("KDF_SALT must be set".to_string()));
        }
        if self.session_secret.is_empty() {
            return Err(ServerError::Config("JWT_SECRET must be set".to_string()));
        }
        if self.session_ttl_minutes == 0 {
            return Err(ServerError::Config("JWT_EXPIRE_MINUTES must be positive".to_string()));
        }
        if self.max_auth_failures == 0 {
            return Err(ServerError::Config("MAX_AUTH_FAILURES must be positive".to_string()));
        }
        if self.failure_mode == FailureMode::IpTemp && self.ip_block_minutes == 0 {
            return Err(ServerError::Config(
                "IP_BLOCK_MINUTES must be positive for ip_temp".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_string(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T, ServerError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ServerError::Config(format!("{name} is not a valid number: {raw}"))),
        Err(_) => Ok(default),
    }
}

fn env_bool(name: &str) -> Result<bool, ServerError> {
    match std::env::var(name) {
        Ok(raw) => match raw.as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            other => Err(ServerError::Config(format!("{name} is not a boolean: {other}"))),
        },
        Err(_) => Ok(false),
    }
}
