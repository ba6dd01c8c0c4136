//! CLI command definitions.
//!
//! Flags are collected as raw text by clap and then fed, occurrence by
//! occurrence, through the option value types so that every value is parsed
//! and reported the same way regardless of where it came from.

use clap::{Args, Parser, Subcommand};

use crate::error::{Result, ServiceError};
use crate::options::{FlagValue, parse_uint};
use crate::service::{MODE_REPLICATED, ServiceOptions};

/// svcspec - Compile service flags into a swarm service specification.
#[derive(Parser, Debug)]
#[command(name = "svcspec")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json, yaml).
    #[arg(long, global = true, env = "SVCSPEC_OUTPUT", default_value = "text")]
    pub output: OutputFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum Commands {
    /// Compile a new service specification.
    Create(CreateArgs),
}

/// Flags of `svcspec create`.
#[derive(Args, Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct CreateArgs {
    /// Service name.
    #[arg(long)]
    pub name: Option<String>,

    /// Service labels.
    #[arg(short = 'l', long = "label", value_name = "KEY=VALUE")]
    pub labels: Vec<String>,

    /// Container labels.
    #[arg(long = "container-label", value_name = "KEY=VALUE")]
    pub container_labels: Vec<String>,

    /// Set environment variables.
    #[arg(short, long, value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Read in a file of environment variables.
    #[arg(long = "env-file", value_name = "PATH")]
    pub env_files: Vec<String>,

    /// Working directory inside the container.
    #[arg(short = 'w', long)]
    pub workdir: Option<String>,

    /// Username or UID (format: <name|uid>[:<group|gid>]).
    #[arg(short, long)]
    pub user: Option<String>,

    /// Set one or more supplementary user groups for the container.
    #[arg(long = "group")]
    pub groups: Vec<String>,

    /// Container hostname.
    #[arg(long)]
    pub hostname: Option<String>,

    /// Allocate a pseudo-TTY.
    #[arg(short, long)]
    pub tty: bool,

    /// Attach a filesystem mount to the service.
    #[arg(long = "mount")]
    pub mounts: Vec<String>,

    /// Set custom DNS servers.
    #[arg(long)]
    pub dns: Vec<String>,

    /// Set custom DNS search domains.
    #[arg(long = "dns-search")]
    pub dns_search: Vec<String>,

    /// Set DNS options.
    #[arg(long = "dns-option")]
    pub dns_option: Vec<String>,

    /// Set one or more custom host-to-IP mappings (host:ip).
    #[arg(long = "host")]
    pub hosts: Vec<String>,

    /// Limit CPUs.
    #[arg(long = "limit-cpu")]
    pub limit_cpu: Option<String>,

    /// Limit Memory.
    #[arg(long = "limit-memory")]
    pub limit_memory: Option<String>,

    /// Reserve CPUs.
    #[arg(long = "reserve-cpu")]
    pub reserve_cpu: Option<String>,

    /// Reserve Memory.
    #[arg(long = "reserve-memory")]
    pub reserve_memory: Option<String>,

    /// Time to wait before force killing a container (ns|us|ms|s|m|h).
    #[arg(long = "stop-grace-period")]
    pub stop_grace_period: Option<String>,

    /// Number of tasks.
    #[arg(long)]
    pub replicas: Option<String>,

    /// Service mode (replicated or global).
    #[arg(long, default_value = MODE_REPLICATED)]
    pub mode: String,

    /// Restart when condition is met (none, on-failure, or any).
    #[arg(long = "restart-condition")]
    pub restart_condition: Option<String>,

    /// Delay between restart attempts (ns|us|ms|s|m|h).
    #[arg(long = "restart-delay")]
    pub restart_delay: Option<String>,

    /// Maximum number of restarts before giving up.
    #[arg(long = "restart-max-attempts")]
    pub restart_max_attempts: Option<String>,

    /// Window used to evaluate the restart policy (ns|us|ms|s|m|h).
    #[arg(long = "restart-window")]
    pub restart_window: Option<String>,

    /// Placement constraints.
    #[arg(long = "constraint")]
    pub constraints: Vec<String>,

    /// Maximum number of tasks updated simultaneously (0 to update all at once).
    #[arg(long = "update-parallelism")]
    pub update_parallelism: Option<String>,

    /// Delay between updates (ns|us|ms|s|m|h).
    #[arg(long = "update-delay")]
    pub update_delay: Option<String>,

    /// Duration after each task update to monitor for failure (ns|us|ms|s|m|h).
    #[arg(long = "update-monitor")]
    pub update_monitor: Option<String>,

    /// Action on update failure (pause|continue).
    #[arg(long = "update-failure-action")]
    pub update_failure_action: Option<String>,

    /// Failure rate to tolerate during an update.
    #[arg(long = "update-max-failure-ratio")]
    pub update_max_failure_ratio: Option<String>,

    /// Network attachments.
    #[arg(long = "network")]
    pub networks: Vec<String>,

    /// Endpoint mode (vip or dnsrr).
    #[arg(long = "endpoint-mode")]
    pub endpoint_mode: Option<String>,

    /// Publish a port as a node port ([hostPort:]containerPort[/proto]).
    #[arg(short = 'p', long = "publish")]
    pub publish: Vec<String>,

    /// Publish a port (target=<port>[,published=<port>][,protocol=<proto>][,mode=<mode>]).
    #[arg(long = "port")]
    pub ports: Vec<String>,

    /// Send registry authentication details to swarm agents.
    #[arg(long = "with-registry-auth")]
    pub with_registry_auth: bool,

    /// Logging driver for service.
    #[arg(long = "log-driver")]
    pub log_driver: Option<String>,

    /// Logging driver options.
    #[arg(long = "log-opt")]
    pub log_opts: Vec<String>,

    /// Command to run to check health.
    #[arg(long = "health-cmd")]
    pub health_cmd: Option<String>,

    /// Time between running the check (ns|us|ms|s|m|h).
    #[arg(long = "health-interval")]
    pub health_interval: Option<String>,

    /// Maximum time to allow one check to run (ns|us|ms|s|m|h).
    #[arg(long = "health-timeout")]
    pub health_timeout: Option<String>,

    /// Consecutive failures needed to report unhealthy.
    #[arg(long = "health-retries")]
    pub health_retries: Option<u64>,

    /// Disable any container-specified HEALTHCHECK.
    #[arg(long = "no-healthcheck")]
    pub no_healthcheck: bool,

    /// Specify secrets to expose to the service.
    #[arg(long = "secret")]
    pub secrets: Vec<String>,

    /// Image to run.
    #[arg(value_name = "IMAGE")]
    pub image: String,

    /// Arguments passed to the image's entrypoint.
    #[arg(value_name = "ARG", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Feeds every occurrence of `flag` into `target`.
fn set_all<V: FlagValue>(target: &mut V, flag: &str, values: &[String]) -> Result<()> {
    for value in values {
        target
            .set(value)
            .map_err(|source| ServiceError::flag(flag, value, target.value_type(), source))?;
    }
    Ok(())
}

impl CreateArgs {
    /// Builds the option aggregate from the collected flags.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError::Flag`] naming the first flag whose value
    /// does not parse.
    pub fn to_options(&self) -> Result<ServiceOptions> {
        let mut opts = ServiceOptions::new();

        opts.name = self.name.clone().unwrap_or_default();
        opts.image.clone_from(&self.image);
        opts.args.clone_from(&self.args);
        opts.hostname = self.hostname.clone().unwrap_or_default();
        opts.workdir = self.workdir.clone().unwrap_or_default();
        opts.user = self.user.clone().unwrap_or_default();
        opts.tty = self.tty;
        opts.mode.clone_from(&self.mode);
        opts.registry_auth = self.with_registry_auth;

        set_all(&mut opts.labels, "label", &self.labels)?;
        set_all(&mut opts.container_labels, "container-label", &self.container_labels)?;
        set_all(&mut opts.env, "env", &self.env)?;
        set_all(&mut opts.env_file, "env-file", &self.env_files)?;
        set_all(&mut opts.groups, "group", &self.groups)?;
        set_all(&mut opts.mounts, "mount", &self.mounts)?;
        set_all(&mut opts.dns, "dns", &self.dns)?;
        set_all(&mut opts.dns_search, "dns-search", &self.dns_search)?;
        set_all(&mut opts.dns_option, "dns-option", &self.dns_option)?;
        set_all(&mut opts.hosts, "host", &self.hosts)?;

        set_all(&mut opts.resources.limit_cpu, "limit-cpu", self.limit_cpu.as_slice())?;
        set_all(&mut opts.resources.limit_memory, "limit-memory", self.limit_memory.as_slice())?;
        set_all(&mut opts.resources.reserve_cpu, "reserve-cpu", self.reserve_cpu.as_slice())?;
        set_all(
            &mut opts.resources.reserve_memory,
            "reserve-memory",
            self.reserve_memory.as_slice(),
        )?;
        set_all(&mut opts.stop_grace, "stop-grace-period", self.stop_grace_period.as_slice())?;
        set_all(&mut opts.replicas, "replicas", self.replicas.as_slice())?;

        let restart = &mut opts.restart_policy;
        set_all(&mut restart.condition, "restart-condition", self.restart_condition.as_slice())?;
        set_all(&mut restart.delay, "restart-delay", self.restart_delay.as_slice())?;
        set_all(
            &mut restart.max_attempts,
            "restart-max-attempts",
            self.restart_max_attempts.as_slice(),
        )?;
        set_all(&mut restart.window, "restart-window", self.restart_window.as_slice())?;
        set_all(&mut opts.constraints, "constraint", &self.constraints)?;

        if let Some(value) = &self.update_parallelism {
            opts.update.parallelism = parse_uint(value)
                .map_err(|source| ServiceError::flag("update-parallelism", value, "uint", source))?;
        }
        set_all(&mut opts.update.delay, "update-delay", self.update_delay.as_slice())?;
        set_all(&mut opts.update.monitor, "update-monitor", self.update_monitor.as_slice())?;
        set_all(
            &mut opts.update.on_failure,
            "update-failure-action",
            self.update_failure_action.as_slice(),
        )?;
        set_all(
            &mut opts.update.max_failure_ratio,
            "update-max-failure-ratio",
            self.update_max_failure_ratio.as_slice(),
        )?;

        set_all(&mut opts.networks, "network", &self.networks)?;
        set_all(&mut opts.endpoint.mode, "endpoint-mode", self.endpoint_mode.as_slice())?;
        set_all(&mut opts.endpoint.publish_ports, "publish", &self.publish)?;
        set_all(&mut opts.endpoint.expanded_ports, "port", &self.ports)?;

        opts.log_driver.name = self.log_driver.clone().unwrap_or_default();
        set_all(&mut opts.log_driver.opts, "log-opt", &self.log_opts)?;

        opts.healthcheck.cmd = self.health_cmd.clone().unwrap_or_default();
        set_all(&mut opts.healthcheck.interval, "health-interval", self.health_interval.as_slice())?;
        set_all(&mut opts.healthcheck.timeout, "health-timeout", self.health_timeout.as_slice())?;
        opts.healthcheck.retries = self.health_retries.unwrap_or_default();
        opts.healthcheck.no_healthcheck = self.no_healthcheck;

        set_all(&mut opts.secrets, "secret", &self.secrets)?;

        Ok(opts)
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
    /// YAML output.
    Yaml,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
