//! Dashboard runtime configuration loaded via OrthoConfig.
//!
//! Values come from the command line, `ECOBIN_*` environment variables and
//! configuration files, merged by `ortho_config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{EmailAddress, Error, Identity, IdentitySnapshot, SessionConfig};
use crate::outbound::persistence::PoolConfig;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/ecobin";
const DEFAULT_POOL_MAX_SIZE: u32 = 8;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_REPORT_INTERVAL_SECS: u64 = 15;

/// Settings for the `ecobin` binary.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ECOBIN")]
pub struct DashboardSettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// Apply embedded migrations before mounting.
    #[ortho_config(default = false)]
    pub run_migrations: bool,
    /// Seconds between notification polls.
    pub poll_interval_secs: Option<u64>,
    /// Email of the identity to mount the dashboard for.
    pub identity_email: Option<String>,
    /// Display name for that identity.
    pub identity_name: Option<String>,
    /// Seconds between header reports in the log.
    pub report_interval_secs: Option<u64>,
}

impl DashboardSettings {
    /// Connection string, falling back to a local database.
    pub fn database_url(&self) -> &str {
        self.database_url.as_deref().unwrap_or(DEFAULT_DATABASE_URL)
    }

    /// Pool configuration derived from these settings.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.database_url())
            .with_max_size(self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE).max(1))
    }

    /// Notification polling cadence; never shorter than one second.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(
            self.poll_interval_secs
                .unwrap_or(DEFAULT_POLL_INTERVAL_SECS)
                .max(1),
        )
    }

    /// Header report cadence; never shorter than one second.
    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(
            self.report_interval_secs
                .unwrap_or(DEFAULT_REPORT_INTERVAL_SECS)
                .max(1),
        )
    }

    /// Session configuration derived from these settings.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default().with_poll_interval(self.poll_interval())
    }

    /// Identity snapshot to feed the session.
    ///
    /// Without a configured email the dashboard runs signed out.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::InvalidRequest`] when the email is
    /// malformed.
    pub fn identity(&self) -> Result<IdentitySnapshot, Error> {
        let Some(raw) = self.identity_email.as_deref() else {
            return Ok(IdentitySnapshot::signed_out());
        };
        let email = EmailAddress::new(raw)
            .map_err(|err| Error::invalid_request(format!("identity_email: {err}")))?;
        Ok(IdentitySnapshot::signed_in(Identity::new(
            email,
            self.identity_name.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for dashboard configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use crate::domain::ErrorCode;
    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 7] = [
        "ECOBIN_DATABASE_URL",
        "ECOBIN_POOL_MAX_SIZE",
        "ECOBIN_RUN_MIGRATIONS",
        "ECOBIN_POLL_INTERVAL_SECS",
        "ECOBIN_IDENTITY_EMAIL",
        "ECOBIN_IDENTITY_NAME",
        "ECOBIN_REPORT_INTERVAL_SECS",
    ];

    fn load_from_empty_args() -> DashboardSettings {
        DashboardSettings::load_from_iter([OsString::from("ecobin")]).expect("config should load")
    }

    fn cleared() -> Vec<(&'static str, Option<String>)> {
        VARS.iter().map(|name| (*name, None)).collect()
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(cleared());

        let settings = load_from_empty_args();

        assert_eq!(settings.database_url(), DEFAULT_DATABASE_URL);
        assert!(!settings.run_migrations);
        assert_eq!(settings.poll_interval(), Duration::from_secs(30));
        assert_eq!(settings.report_interval(), Duration::from_secs(15));
        assert_eq!(settings.pool_config().max_size(), DEFAULT_POOL_MAX_SIZE);
        assert_eq!(
            settings.identity().expect("signed out"),
            IdentitySnapshot::signed_out()
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let mut vars = cleared();
        for (name, value) in &mut vars {
            *value = match *name {
                "ECOBIN_DATABASE_URL" => Some("postgres://db/ecobin".to_owned()),
                "ECOBIN_RUN_MIGRATIONS" => Some("true".to_owned()),
                "ECOBIN_POLL_INTERVAL_SECS" => Some("5".to_owned()),
                "ECOBIN_IDENTITY_EMAIL" => Some("ada@example.com".to_owned()),
                "ECOBIN_IDENTITY_NAME" => Some("Ada Lovelace".to_owned()),
                _ => None,
            };
        }
        let _guard = lock_env(vars);

        let settings = load_from_empty_args();
        let identity = settings.identity().expect("valid identity");

        assert_eq!(settings.database_url(), "postgres://db/ecobin");
        assert!(settings.run_migrations);
        assert_eq!(settings.session_config().poller.interval, Duration::from_secs(5));
        let user = identity.user.expect("signed in");
        assert_eq!(user.account_label().as_deref(), Some("Ada Lovelace"));
    }

    #[rstest]
    fn zero_intervals_are_raised_to_one_second() {
        let mut vars = cleared();
        for (name, value) in &mut vars {
            if name.ends_with("_INTERVAL_SECS") {
                *value = Some("0".to_owned());
            }
        }
        let _guard = lock_env(vars);

        let settings = load_from_empty_args();

        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
        assert_eq!(settings.report_interval(), Duration::from_secs(1));
    }

    #[rstest]
    fn malformed_identity_email_is_rejected() {
        let mut vars = cleared();
        vars[4].1 = Some("not-an-email".to_owned());
        let _guard = lock_env(vars);

        let error = load_from_empty_args().identity().expect_err("invalid email");

        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }
}
