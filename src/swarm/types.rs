//! Service specification types.
//!
//! Field names serialize in the orchestrator API's `PascalCase` convention.
//! Durations serialize as integer nanoseconds.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OptionError;
use crate::options::Duration;

/// Implements case-insensitive `FromStr` and `Display` for a word enum.
macro_rules! word_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $word:literal),+ $(,)? }) => {
        impl $name {
            /// Returns the canonical word for this variant.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $word),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = OptionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($word) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(OptionError::InvalidChoice {
                    kind: $kind,
                    input: s.to_string(),
                    expected: concat!($($word, ", "),+).trim_end_matches(", "),
                })
            }
        }
    };
}

/// When a failed task is restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartCondition {
    /// Never restart.
    None,
    /// Restart when the task exits with a non-zero code.
    OnFailure,
    /// Always restart.
    Any,
}

word_enum!(RestartCondition, "restart condition", {
    None => "none",
    OnFailure => "on-failure",
    Any => "any",
});

/// Action taken when an update fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureAction {
    /// Pause the rollout.
    Pause,
    /// Keep rolling out.
    Continue,
}

word_enum!(FailureAction, "update failure action", {
    Pause => "pause",
    Continue => "continue",
});

/// Endpoint load-balancing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Virtual IP.
    Vip,
    /// DNS round-robin.
    Dnsrr,
}

word_enum!(ResolutionMode, "endpoint mode", {
    Vip => "vip",
    Dnsrr => "dnsrr",
});

/// Transport protocol of a published port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortProtocol {
    /// TCP.
    Tcp,
    /// UDP.
    Udp,
}

word_enum!(PortProtocol, "protocol", {
    Tcp => "tcp",
    Udp => "udp",
});

/// How a port is published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishMode {
    /// Through the routing mesh.
    Ingress,
    /// Directly on the node running the task.
    Host,
}

word_enum!(PublishMode, "publish mode", {
    Ingress => "ingress",
    Host => "host",
});

/// Kind of a container mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MountType {
    /// Host path.
    Bind,
    /// Named volume.
    Volume,
    /// In-memory filesystem.
    Tmpfs,
}

word_enum!(MountType, "mount type", {
    Bind => "bind",
    Volume => "volume",
    Tmpfs => "tmpfs",
});

/// The compiled service specification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceSpec {
    /// Name and labels.
    #[serde(flatten)]
    pub annotations: Annotations,
    /// Template for the tasks of the service.
    pub task_template: TaskSpec,
    /// Scheduling mode.
    pub mode: ServiceMode,
    /// Rollout policy.
    pub update_config: UpdateConfig,
    /// Published ports and resolution mode.
    pub endpoint_spec: EndpointSpec,
}

/// Name and labels of an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Annotations {
    /// Object name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Object labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

/// Template for the tasks of a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskSpec {
    /// Container to run.
    pub container_spec: ContainerSpec,
    /// Resource limits and reservations.
    pub resources: ResourceRequirements,
    /// Restart policy.
    pub restart_policy: RestartPolicy,
    /// Placement constraints.
    pub placement: Placement,
    /// Networks the tasks attach to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<NetworkAttachmentConfig>,
    /// Log driver override; absent when no driver was named.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_driver: Option<Driver>,
}

/// Container part of a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerSpec {
    /// Image reference.
    pub image: String,
    /// Container labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Arguments passed to the entrypoint.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Container hostname.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    /// `KEY=VALUE` environment entries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<String>,
    /// Working directory.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub dir: String,
    /// User the process runs as.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user: String,
    /// Additional groups.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    /// Allocate a pseudo-TTY.
    #[serde(rename = "TTY", default, skip_serializing_if = "std::ops::Not::not")]
    pub tty: bool,
    /// Mounts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mounts: Vec<Mount>,
    /// Time to wait before killing the container.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_grace_period: Option<Duration>,
    /// Health check; absent when none was configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthConfig>,
    /// Extra `/etc/hosts` lines in `ip host` form.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
    /// Resolver configuration.
    #[serde(rename = "DNSConfig", default)]
    pub dns_config: DnsConfig,
    /// Secrets exposed to the container.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<SecretReference>,
}

/// Resolver configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DnsConfig {
    /// Name server addresses.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nameservers: Vec<String>,
    /// Search domains.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search: Vec<String>,
    /// Resolver options.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Container health check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HealthConfig {
    /// Test command; `["NONE"]` disables an inherited check, empty inherits
    /// the image's command.
    #[serde(default)]
    pub test: Vec<String>,
    /// Time between checks.
    #[serde(default)]
    pub interval: Duration,
    /// Time after which a check is considered hung.
    #[serde(default)]
    pub timeout: Duration,
    /// Consecutive failures needed to report unhealthy.
    #[serde(default)]
    pub retries: u64,
}

/// A container mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Mount {
    /// Mount kind.
    #[serde(rename = "Type")]
    pub kind: MountType,
    /// Host path or volume name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    /// Path inside the container.
    pub target: String,
    /// Mount read-only.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

/// CPU and memory figures. Zero means unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resources {
    /// CPU quantity in units of 10^-9 CPUs.
    #[serde(rename = "NanoCPUs", default, skip_serializing_if = "is_zero")]
    pub nano_cpus: i64,
    /// Memory in bytes.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub memory_bytes: i64,
}

/// Resource limits and reservations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRequirements {
    /// Upper bounds.
    pub limits: Resources,
    /// Guaranteed amounts.
    pub reservations: Resources,
}

/// Restart policy; every field is independently optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestartPolicy {
    /// When to restart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<RestartCondition>,
    /// Delay between restart attempts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<Duration>,
    /// Maximum number of restarts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u64>,
    /// Window used to evaluate the restart policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<Duration>,
}

/// Placement constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Placement {
    /// Constraint expressions such as `node.role==manager`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
}

/// Attachment of a task to a network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkAttachmentConfig {
    /// Network name or id.
    pub target: String,
    /// Aliases on the network.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

/// A named driver with options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Driver {
    /// Driver name.
    pub name: String,
    /// Driver options.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

/// Rollout policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateConfig {
    /// Tasks updated at once; zero means all.
    pub parallelism: u64,
    /// Delay between updates.
    #[serde(default, skip_serializing_if = "is_zero_duration")]
    pub delay: Duration,
    /// Time to monitor each updated task for failure.
    #[serde(default, skip_serializing_if = "is_zero_duration")]
    pub monitor: Duration,
    /// Action when an updated task fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_action: Option<FailureAction>,
    /// Tolerated failure ratio.
    #[serde(default)]
    pub max_failure_ratio: f32,
}

/// Published ports and resolution mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointSpec {
    /// Resolution mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ResolutionMode>,
    /// Published ports.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortConfig>,
}

/// A published port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PortConfig {
    /// Transport protocol.
    pub protocol: PortProtocol,
    /// Port inside the container.
    pub target_port: u32,
    /// Port published on the cluster; zero lets the orchestrator pick.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub published_port: u32,
    /// Publish mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_mode: Option<PublishMode>,
}

/// Scheduling mode of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceMode {
    /// One task per eligible node.
    Global(GlobalService),
    /// A fixed number of tasks.
    Replicated(ReplicatedService),
}

impl Default for ServiceMode {
    fn default() -> Self {
        Self::Replicated(ReplicatedService::default())
    }
}

/// Marker for global mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalService {}

/// Replicated mode settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicatedService {
    /// Replica count; absent lets the orchestrator choose.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u64>,
}

/// Reference to a secret exposed to a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecretReference {
    /// Secret id, filled in once the name is resolved.
    #[serde(rename = "SecretID", default, skip_serializing_if = "String::is_empty")]
    pub secret_id: String,
    /// Secret name.
    pub secret_name: String,
    /// File the secret is exposed as.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<SecretFile>,
}

/// File a secret is exposed as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecretFile {
    /// File name under the secrets directory.
    pub name: String,
    /// Owner user id.
    #[serde(rename = "UID")]
    pub uid: String,
    /// Owner group id.
    #[serde(rename = "GID")]
    pub gid: String,
    /// File mode bits.
    pub mode: u32,
}

fn is_zero<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero_duration(value: &Duration) -> bool {
    *value == Duration::ZERO
}
