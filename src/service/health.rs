//! Health-check options and their resolution.

use tracing::debug;

use crate::error::CompileError;
use crate::options::PositiveDurationOpt;
use crate::swarm::HealthConfig;

/// Test command that disables a health check inherited from the image.
pub const HEALTHCHECK_DISABLED: &str = "NONE";

/// Test command prefix for a shell health check.
pub const HEALTHCHECK_SHELL: &str = "CMD-SHELL";

/// Health-check related options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthCheckOptions {
    /// Shell command to run (`--health-cmd`).
    pub cmd: String,
    /// Time between checks (`--health-interval`).
    pub interval: PositiveDurationOpt,
    /// Time allowed for one check (`--health-timeout`).
    pub timeout: PositiveDurationOpt,
    /// Consecutive failures before unhealthy (`--health-retries`); zero
    /// means not given.
    pub retries: u64,
    /// Disable any health check (`--no-healthcheck`).
    pub no_healthcheck: bool,
}

impl HealthCheckOptions {
    /// Returns true if any `--health-*` setting was given.
    #[must_use]
    pub fn has_settings(&self) -> bool {
        !self.cmd.is_empty()
            || self.interval.value().is_some()
            || self.timeout.value().is_some()
            || self.retries != 0
    }

    /// Resolves the options into a health check.
    ///
    /// Returns `None` when nothing was configured, which is distinct from a
    /// configuration with an empty test: the latter keeps the image's command
    /// but overrides its timing.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::HealthCheckConflict`] if the check is disabled
    /// and configured at the same time.
    pub fn to_health_config(&self) -> Result<Option<HealthConfig>, CompileError> {
        let have_settings = self.has_settings();

        if self.no_healthcheck {
            if have_settings {
                return Err(CompileError::HealthCheckConflict);
            }
            debug!("Health check disabled");
            return Ok(Some(HealthConfig {
                test: vec![HEALTHCHECK_DISABLED.to_string()],
                ..HealthConfig::default()
            }));
        }

        if !have_settings {
            return Ok(None);
        }

        let test = if self.cmd.is_empty() {
            Vec::new()
        } else {
            vec![HEALTHCHECK_SHELL.to_string(), self.cmd.clone()]
        };

        debug!(cmd = %self.cmd, retries = self.retries, "Health check configured");
        Ok(Some(HealthConfig {
            test,
            interval: self.interval.value().unwrap_or_default(),
            timeout: self.timeout.value().unwrap_or_default(),
            retries: self.retries,
        }))
    }
}
