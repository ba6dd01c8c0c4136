//! The service option aggregate and its compilation into a [`ServiceSpec`].

use tracing::{debug, info};

use super::convert::{
    convert_extra_hosts, convert_kv_strings_to_map, convert_networks, convert_secrets,
};
use super::env::{DotenvReader, EnvFileReader, merge_env, read_kv_strings};
use super::health::HealthCheckOptions;
use crate::error::{CompileError, OptionError, Result};
use crate::options::{
    ChoiceOpt, DurationOpt, FloatOpt, ListOpts, MemBytes, MountOpt, NanoCpus, PortOpt, SecretOpt,
    Uint64Opt, convert_port_to_port_config, parse_port_specs, validate_dns_search, validate_env,
    validate_extra_host, validate_ip_address, validate_label, validate_port,
};
use crate::swarm::{
    Annotations, ContainerSpec, Driver, DnsConfig, EndpointSpec, FailureAction, GlobalService,
    Placement, ReplicatedService, ResolutionMode, ResourceRequirements, Resources,
    RestartCondition, RestartPolicy, ServiceMode, ServiceSpec, TaskSpec, UpdateConfig,
};

/// Mode name for one task per node.
pub const MODE_GLOBAL: &str = "global";

/// Mode name for a fixed number of tasks.
pub const MODE_REPLICATED: &str = "replicated";

/// Default number of tasks updated at once.
pub const DEFAULT_UPDATE_PARALLELISM: u64 = 1;

/// CPU and memory limits and reservations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceOptions {
    /// `--limit-cpu`.
    pub limit_cpu: NanoCpus,
    /// `--limit-memory`.
    pub limit_memory: MemBytes,
    /// `--reserve-cpu`.
    pub reserve_cpu: NanoCpus,
    /// `--reserve-memory`.
    pub reserve_memory: MemBytes,
}

impl ResourceOptions {
    /// Converts the options into resource requirements.
    #[must_use]
    pub const fn to_resource_requirements(&self) -> ResourceRequirements {
        ResourceRequirements {
            limits: Resources {
                nano_cpus: self.limit_cpu.value(),
                memory_bytes: self.limit_memory.value(),
            },
            reservations: Resources {
                nano_cpus: self.reserve_cpu.value(),
                memory_bytes: self.reserve_memory.value(),
            },
        }
    }
}

/// Restart policy options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestartPolicyOptions {
    /// `--restart-condition`.
    pub condition: ChoiceOpt<RestartCondition>,
    /// `--restart-delay`.
    pub delay: DurationOpt,
    /// `--restart-max-attempts`.
    pub max_attempts: Uint64Opt,
    /// `--restart-window`.
    pub window: DurationOpt,
}

impl RestartPolicyOptions {
    /// Converts the options into a restart policy.
    #[must_use]
    pub const fn to_restart_policy(&self) -> RestartPolicy {
        RestartPolicy {
            condition: self.condition.value(),
            delay: self.delay.value(),
            max_attempts: self.max_attempts.value(),
            window: self.window.value(),
        }
    }
}

/// Rollout options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateOptions {
    /// `--update-parallelism`; zero updates all tasks at once.
    pub parallelism: u64,
    /// `--update-delay`.
    pub delay: DurationOpt,
    /// `--update-monitor`.
    pub monitor: DurationOpt,
    /// `--update-failure-action`.
    pub on_failure: ChoiceOpt<FailureAction>,
    /// `--update-max-failure-ratio`.
    pub max_failure_ratio: FloatOpt,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            parallelism: DEFAULT_UPDATE_PARALLELISM,
            delay: DurationOpt::new(),
            monitor: DurationOpt::new(),
            on_failure: ChoiceOpt::with_default(FailureAction::Pause),
            max_failure_ratio: FloatOpt::new(),
        }
    }
}

impl UpdateOptions {
    /// Converts the options into an update config.
    #[must_use]
    pub fn to_update_config(&self) -> UpdateConfig {
        UpdateConfig {
            parallelism: self.parallelism,
            delay: self.delay.value().unwrap_or_default(),
            monitor: self.monitor.value().unwrap_or_default(),
            failure_action: self.on_failure.value(),
            max_failure_ratio: self.max_failure_ratio.value().unwrap_or_default(),
        }
    }
}

/// Endpoint options.
#[derive(Debug, Clone)]
pub struct EndpointOptions {
    /// `--endpoint-mode`.
    pub mode: ChoiceOpt<ResolutionMode>,
    /// `--publish`, short form.
    pub publish_ports: ListOpts,
    /// `--port`, long form.
    pub expanded_ports: PortOpt,
}

impl Default for EndpointOptions {
    fn default() -> Self {
        Self {
            mode: ChoiceOpt::new(),
            publish_ports: ListOpts::with_validator(validate_port),
            expanded_ports: PortOpt::new(),
        }
    }
}

impl EndpointOptions {
    /// Converts the options into an endpoint spec. Short-form ports come
    /// first, in order of first appearance, followed by long-form ports.
    ///
    /// # Errors
    ///
    /// Returns an error if a short-form port no longer parses.
    pub fn to_endpoint_spec(&self) -> std::result::Result<EndpointSpec, OptionError> {
        let specs = parse_port_specs(self.publish_ports.values())?;

        let mut ports: Vec<_> = specs
            .ports
            .iter()
            .flat_map(|port| convert_port_to_port_config(port, &specs.bindings))
            .collect();
        ports.extend_from_slice(self.expanded_ports.value());

        Ok(EndpointSpec {
            mode: self.mode.value(),
            ports,
        })
    }
}

/// Log driver options.
#[derive(Debug, Clone)]
pub struct LogDriverOptions {
    /// `--log-driver`.
    pub name: String,
    /// `--log-opt`.
    pub opts: ListOpts,
}

impl Default for LogDriverOptions {
    fn default() -> Self {
        Self {
            name: String::new(),
            opts: ListOpts::with_validator(validate_env),
        }
    }
}

impl LogDriverOptions {
    /// Converts the options into a driver; `None` when no driver was named.
    #[must_use]
    pub fn to_log_driver(&self) -> Option<Driver> {
        if self.name.is_empty() {
            return None;
        }
        Some(Driver {
            name: self.name.clone(),
            options: convert_kv_strings_to_map(self.opts.values()),
        })
    }
}

/// Every configurable dimension of a service.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// `--name`.
    pub name: String,
    /// `--label`.
    pub labels: ListOpts,
    /// `--container-label`.
    pub container_labels: ListOpts,
    /// Image reference.
    pub image: String,
    /// Arguments passed to the entrypoint.
    pub args: Vec<String>,
    /// `--hostname`.
    pub hostname: String,
    /// `--env`.
    pub env: ListOpts,
    /// `--env-file`.
    pub env_file: ListOpts,
    /// `--workdir`.
    pub workdir: String,
    /// `--user`.
    pub user: String,
    /// `--group`.
    pub groups: ListOpts,
    /// `--tty`.
    pub tty: bool,
    /// `--mount`.
    pub mounts: MountOpt,
    /// `--dns`.
    pub dns: ListOpts,
    /// `--dns-search`.
    pub dns_search: ListOpts,
    /// `--dns-option`.
    pub dns_option: ListOpts,
    /// `--host`.
    pub hosts: ListOpts,

    /// Resource limits and reservations.
    pub resources: ResourceOptions,
    /// `--stop-grace-period`.
    pub stop_grace: DurationOpt,

    /// `--replicas`.
    pub replicas: Uint64Opt,
    /// `--mode`.
    pub mode: String,

    /// Restart policy.
    pub restart_policy: RestartPolicyOptions,
    /// `--constraint`.
    pub constraints: ListOpts,
    /// Rollout policy.
    pub update: UpdateOptions,
    /// `--network`.
    pub networks: ListOpts,
    /// Endpoint.
    pub endpoint: EndpointOptions,

    /// `--with-registry-auth`.
    pub registry_auth: bool,

    /// Log driver.
    pub log_driver: LogDriverOptions,

    /// Health check.
    pub healthcheck: HealthCheckOptions,
    /// `--secret`.
    pub secrets: SecretOpt,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceOptions {
    /// Creates an aggregate with every option unset and the default mode.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: String::new(),
            labels: ListOpts::with_validator(validate_label),
            container_labels: ListOpts::with_validator(validate_label),
            image: String::new(),
            args: Vec::new(),
            hostname: String::new(),
            env: ListOpts::with_validator(validate_env),
            env_file: ListOpts::new(),
            workdir: String::new(),
            user: String::new(),
            groups: ListOpts::new(),
            tty: false,
            mounts: MountOpt::new(),
            dns: ListOpts::with_validator(validate_ip_address),
            dns_search: ListOpts::with_validator(validate_dns_search),
            dns_option: ListOpts::new(),
            hosts: ListOpts::with_validator(validate_extra_host),
            resources: ResourceOptions::default(),
            stop_grace: DurationOpt::new(),
            replicas: Uint64Opt::new(),
            mode: MODE_REPLICATED.to_string(),
            restart_policy: RestartPolicyOptions::default(),
            constraints: ListOpts::new(),
            update: UpdateOptions::default(),
            networks: ListOpts::new(),
            endpoint: EndpointOptions::default(),
            registry_auth: false,
            log_driver: LogDriverOptions::default(),
            healthcheck: HealthCheckOptions::default(),
            secrets: SecretOpt::new(),
        }
    }

    /// Compiles the options into a service specification, reading env files
    /// from the local filesystem.
    ///
    /// # Errors
    ///
    /// See [`ServiceOptions::to_service_with`].
    pub fn to_service(&self) -> Result<ServiceSpec> {
        self.to_service_with(&DotenvReader)
    }

    /// Compiles the options into a service specification, reading env files
    /// through `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error if an env file cannot be read, the health-check
    /// options conflict, the mode is unknown or replicas are given for a
    /// global service.
    pub fn to_service_with(&self, reader: &dyn EnvFileReader) -> Result<ServiceSpec> {
        let entries = read_kv_strings(reader, self.env_file.values(), self.env.values())?;
        let env = merge_env(entries.as_slice());
        debug!(
            files = self.env_file.len(),
            entries = entries.len(),
            merged = env.len(),
            "Merged environment"
        );

        let container_spec = ContainerSpec {
            image: self.image.clone(),
            labels: convert_kv_strings_to_map(self.container_labels.values()),
            args: self.args.clone(),
            hostname: self.hostname.clone(),
            env,
            dir: self.workdir.clone(),
            user: self.user.clone(),
            groups: self.groups.to_vec(),
            tty: self.tty,
            mounts: self.mounts.value().to_vec(),
            stop_grace_period: self.stop_grace.value(),
            healthcheck: self.healthcheck.to_health_config()?,
            hosts: convert_extra_hosts(self.hosts.values())?,
            dns_config: DnsConfig {
                nameservers: self.dns.to_vec(),
                search: self.dns_search.to_vec(),
                options: self.dns_option.to_vec(),
            },
            secrets: convert_secrets(self.secrets.value()),
        };

        let task_template = TaskSpec {
            container_spec,
            resources: self.resources.to_resource_requirements(),
            restart_policy: self.restart_policy.to_restart_policy(),
            placement: Placement {
                constraints: self.constraints.to_vec(),
            },
            networks: convert_networks(self.networks.values()),
            log_driver: self.log_driver.to_log_driver(),
        };

        let spec = ServiceSpec {
            annotations: Annotations {
                name: self.name.clone(),
                labels: convert_kv_strings_to_map(self.labels.values()),
            },
            task_template,
            mode: self.service_mode()?,
            update_config: self.update.to_update_config(),
            endpoint_spec: self.endpoint.to_endpoint_spec()?,
        };

        info!(
            name = %spec.annotations.name,
            image = %spec.task_template.container_spec.image,
            mode = %self.mode,
            "Compiled service spec"
        );
        Ok(spec)
    }

    fn service_mode(&self) -> std::result::Result<ServiceMode, CompileError> {
        match self.mode.as_str() {
            MODE_GLOBAL => {
                if self.replicas.value().is_some() {
                    return Err(CompileError::ReplicasUnderGlobalMode);
                }
                Ok(ServiceMode::Global(GlobalService {}))
            }
            MODE_REPLICATED => Ok(ServiceMode::Replicated(ReplicatedService {
                replicas: self.replicas.value(),
            })),
            other => Err(CompileError::InvalidMode {
                mode: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::options::{Duration, FlagValue};
    use crate::swarm::{MountType, PortConfig, PortProtocol};
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::NamedTempFile;

    struct MapReader(HashMap<PathBuf, Vec<String>>);

    impl MapReader {
        fn new(path: &str, entries: &[&str]) -> Self {
            let entries = entries.iter().map(ToString::to_string).collect();
            Self(HashMap::from([(PathBuf::from(path), entries)]))
        }
    }

    impl EnvFileReader for MapReader {
        fn read(&self, path: &Path) -> Result<Vec<String>> {
            Ok(self.0.get(path).cloned().unwrap_or_default())
        }
    }

    fn options(image: &str) -> ServiceOptions {
        let mut opts = ServiceOptions::new();
        opts.image = image.to_string();
        opts
    }

    #[test]
    fn test_defaults() {
        let spec = options("nginx").to_service().unwrap();

        assert_eq!(
            spec.mode,
            ServiceMode::Replicated(ReplicatedService { replicas: None })
        );
        assert_eq!(spec.update_config.parallelism, 1);
        assert_eq!(spec.update_config.failure_action, Some(FailureAction::Pause));
        assert_eq!(spec.task_template.container_spec.image, "nginx");
        assert!(spec.task_template.container_spec.healthcheck.is_none());
        assert!(spec.task_template.log_driver.is_none());
        assert!(spec.endpoint_spec.ports.is_empty());
        assert_eq!(spec.task_template.resources, ResourceRequirements::default());
    }

    #[test]
    fn test_env_files_then_flags() {
        let reader = MapReader::new("app.env", &["A=1", "B=2"]);
        let mut opts = options("app");
        opts.env_file.set("app.env").unwrap();
        opts.env.set("A=3").unwrap();

        let spec = opts.to_service_with(&reader).unwrap();
        assert_eq!(spec.task_template.container_spec.env, vec!["B=2", "A=3"]);
    }

    #[test]
    fn test_env_file_read_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "A=1\nB=2").unwrap();
        file.flush().unwrap();

        let mut opts = options("app");
        opts.env_file.set(&file.path().display().to_string()).unwrap();
        opts.env.set("A=3").unwrap();

        let spec = opts.to_service().unwrap();
        assert_eq!(spec.task_template.container_spec.env, vec!["B=2", "A=3"]);
    }

    #[test]
    fn test_env_file_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options("app");
        opts.env_file
            .set(&dir.path().join("nope.env").display().to_string())
            .unwrap();

        assert!(matches!(opts.to_service(), Err(ServiceError::EnvFile { .. })));
    }

    #[test]
    fn test_global_mode() {
        let mut opts = options("agent");
        opts.mode = String::from("global");
        let spec = opts.to_service().unwrap();
        assert_eq!(spec.mode, ServiceMode::Global(GlobalService {}));

        opts.replicas.set("2").unwrap();
        let err = opts.to_service().unwrap_err();
        assert_eq!(err.as_compile(), Some(&CompileError::ReplicasUnderGlobalMode));
        assert_eq!(
            err.to_string(),
            "replicas can only be used with replicated mode"
        );
    }

    #[test]
    fn test_replicated_mode_with_replicas() {
        let mut opts = options("web");
        opts.replicas.set("3").unwrap();
        let spec = opts.to_service().unwrap();
        assert_eq!(
            spec.mode,
            ServiceMode::Replicated(ReplicatedService { replicas: Some(3) })
        );
    }

    #[test]
    fn test_unknown_mode() {
        let mut opts = options("web");
        opts.mode = String::from("bogus");
        let err = opts.to_service().unwrap_err();
        assert_eq!(
            err.as_compile(),
            Some(&CompileError::InvalidMode {
                mode: String::from("bogus")
            })
        );
        assert_eq!(err.to_string(), "Unknown mode: bogus");
    }

    #[test]
    fn test_health_conflict_aborts() {
        let mut opts = options("web");
        opts.healthcheck.no_healthcheck = true;
        opts.healthcheck.cmd = String::from("echo ok");
        assert_eq!(
            opts.to_service().unwrap_err().as_compile(),
            Some(&CompileError::HealthCheckConflict)
        );
    }

    #[test]
    fn test_full_container_spec() {
        let mut opts = options("nginx:alpine");
        opts.name = String::from("web");
        opts.args = vec![String::from("nginx"), String::from("-g")];
        opts.labels.set("tier=front").unwrap();
        opts.labels.set("tier=edge").unwrap();
        opts.container_labels.set("owner").unwrap();
        opts.hostname = String::from("web-1");
        opts.workdir = String::from("/srv");
        opts.user = String::from("www-data");
        opts.groups.set("adm").unwrap();
        opts.tty = true;
        opts.mounts.set("type=bind,src=/srv,dst=/data").unwrap();
        opts.dns.set("10.0.0.53").unwrap();
        opts.dns_search.set("example.com.").unwrap();
        opts.dns_option.set("ndots:2").unwrap();
        opts.hosts.set("db:10.0.0.2").unwrap();
        opts.stop_grace.set("10s").unwrap();
        opts.secrets.set("source=tls_key,target=key.pem").unwrap();
        opts.healthcheck.cmd = String::from("curl -f localhost");

        let spec = opts.to_service().unwrap();
        let container = &spec.task_template.container_spec;

        assert_eq!(spec.annotations.name, "web");
        assert_eq!(spec.annotations.labels["tier"], "edge");
        assert_eq!(container.labels["owner"], "");
        assert_eq!(container.args, vec!["nginx", "-g"]);
        assert_eq!(container.hostname, "web-1");
        assert_eq!(container.dir, "/srv");
        assert_eq!(container.user, "www-data");
        assert_eq!(container.groups, vec!["adm"]);
        assert!(container.tty);
        assert_eq!(container.mounts[0].kind, MountType::Bind);
        assert_eq!(container.dns_config.nameservers, vec!["10.0.0.53"]);
        assert_eq!(container.dns_config.search, vec!["example.com"]);
        assert_eq!(container.dns_config.options, vec!["ndots:2"]);
        assert_eq!(container.hosts, vec!["10.0.0.2 db"]);
        assert_eq!(container.stop_grace_period, Some(Duration::from_secs(10)));
        assert_eq!(container.secrets[0].secret_name, "tls_key");
        assert_eq!(
            container.healthcheck.as_ref().map(|h| h.test.clone()),
            Some(vec![String::from("CMD-SHELL"), String::from("curl -f localhost")])
        );
    }

    #[test]
    fn test_task_level_fields() {
        let mut opts = options("worker");
        opts.resources.limit_cpu.set("1.5").unwrap();
        opts.resources.reserve_memory.set("256m").unwrap();
        opts.restart_policy.condition.set("on-failure").unwrap();
        opts.restart_policy.max_attempts.set("5").unwrap();
        opts.constraints.set("node.role==worker").unwrap();
        opts.networks.set("backend").unwrap();
        opts.log_driver.name = String::from("json-file");
        opts.log_driver.opts.set("max-size=10m").unwrap();

        let spec = opts.to_service().unwrap();
        let task = &spec.task_template;

        assert_eq!(task.resources.limits.nano_cpus, 1_500_000_000);
        assert_eq!(task.resources.reservations.memory_bytes, 256 << 20);
        assert_eq!(task.restart_policy.condition, Some(RestartCondition::OnFailure));
        assert_eq!(task.restart_policy.max_attempts, Some(5));
        assert_eq!(task.restart_policy.delay, None);
        assert_eq!(task.placement.constraints, vec!["node.role==worker"]);
        assert_eq!(task.networks[0].target, "backend");

        let driver = task.log_driver.as_ref().unwrap();
        assert_eq!(driver.name, "json-file");
        assert_eq!(driver.options["max-size"], "10m");
    }

    #[test]
    fn test_log_opts_without_driver_are_dropped() {
        let mut opts = options("worker");
        opts.log_driver.opts.set("max-size=10m").unwrap();
        assert!(opts.to_service().unwrap().task_template.log_driver.is_none());
    }

    #[test]
    fn test_update_and_endpoint() {
        let mut opts = options("web");
        opts.update.parallelism = 0;
        opts.update.delay.set("10s").unwrap();
        opts.update.on_failure.set("continue").unwrap();
        opts.update.max_failure_ratio.set("0.2").unwrap();
        opts.endpoint.mode.set("dnsrr").unwrap();
        opts.endpoint.publish_ports.set("8080:80/tcp").unwrap();
        opts.endpoint.expanded_ports.set("target=53,protocol=udp").unwrap();

        let spec = opts.to_service().unwrap();
        assert_eq!(spec.update_config.parallelism, 0);
        assert_eq!(spec.update_config.delay, Duration::from_secs(10));
        assert_eq!(spec.update_config.monitor, Duration::ZERO);
        assert_eq!(spec.update_config.failure_action, Some(FailureAction::Continue));
        assert!((spec.update_config.max_failure_ratio - 0.2).abs() < f32::EPSILON);
        assert_eq!(spec.endpoint_spec.mode, Some(ResolutionMode::Dnsrr));
        assert_eq!(
            spec.endpoint_spec.ports,
            vec![
                PortConfig {
                    protocol: PortProtocol::Tcp,
                    target_port: 80,
                    published_port: 8080,
                    publish_mode: None,
                },
                PortConfig {
                    protocol: PortProtocol::Udp,
                    target_port: 53,
                    published_port: 0,
                    publish_mode: None,
                },
            ]
        );
    }

    #[test]
    fn test_publish_rejects_host_ip() {
        let mut opts = options("web");
        assert_eq!(
            opts.endpoint.publish_ports.set("127.0.0.1:8080:80"),
            Err(OptionError::PortHostIpUnsupported)
        );
        assert!(opts.endpoint.publish_ports.is_empty());
    }

    #[test]
    fn test_compilation_is_idempotent() {
        let mut opts = options("web");
        opts.env.set("A=1").unwrap();
        opts.endpoint.publish_ports.set("8000-8002:80-82").unwrap();
        opts.labels.set("a=b").unwrap();

        let first = opts.to_service().unwrap();
        let second = opts.to_service().unwrap();
        assert_eq!(first, second);
    }
}
