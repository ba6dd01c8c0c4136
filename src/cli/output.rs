//! Output formatting for CLI commands.
//!
//! The compiled specification is rendered as JSON or YAML for scripting, or
//! as a summary table for humans.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::error::{Result, ServiceError};
use crate::options::{Duration, MemBytes, NanoCpus};
use crate::service::HEALTHCHECK_DISABLED;
use crate::swarm::{HealthConfig, PortConfig, Resources, ServiceMode, ServiceSpec};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Field row for table display.
#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a compiled service specification.
    ///
    /// # Errors
    ///
    /// Returns an error if the specification cannot be serialized.
    pub fn format_service(&self, spec: &ServiceSpec) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(spec)
                .map_err(|e| ServiceError::serialize(e.to_string())),
            OutputFormat::Yaml => {
                serde_yaml::to_string(spec).map_err(|e| ServiceError::serialize(e.to_string()))
            }
            OutputFormat::Text => Ok(Self::format_service_text(spec)),
        }
    }

    /// Formats a specification as text.
    fn format_service_text(spec: &ServiceSpec) -> String {
        let container = &spec.task_template.container_spec;
        let task = &spec.task_template;

        let mut rows = vec![
            FieldRow {
                field: "Image",
                value: container.image.clone(),
            },
            FieldRow {
                field: "Mode",
                value: Self::format_mode(&spec.mode),
            },
        ];

        let mut push = |field: &'static str, value: String| {
            if !value.is_empty() {
                rows.push(FieldRow { field, value });
            }
        };

        push("Args", container.args.join(" "));
        push("Env", container.env.join("\n"));
        push("Labels", Self::format_map(spec.annotations.labels.iter()));
        push("Container labels", Self::format_map(container.labels.iter()));
        push("Hostname", container.hostname.clone());
        push("Workdir", container.dir.clone());
        push("User", container.user.clone());
        push("Groups", container.groups.join(", "));
        push("Mounts", Self::format_mounts(spec));
        push("Hosts", container.hosts.join("\n"));
        push("DNS", container.dns_config.nameservers.join(", "));
        push("DNS search", container.dns_config.search.join(", "));
        push("DNS options", container.dns_config.options.join(", "));
        push("Limits", Self::format_resources(&task.resources.limits));
        push("Reservations", Self::format_resources(&task.resources.reservations));
        push("Restart", Self::format_restart(spec));
        push("Constraints", task.placement.constraints.join("\n"));
        push(
            "Networks",
            task.networks
                .iter()
                .map(|n| n.target.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        );
        push(
            "Ports",
            spec.endpoint_spec
                .ports
                .iter()
                .map(Self::format_port)
                .collect::<Vec<_>>()
                .join("\n"),
        );
        push(
            "Endpoint mode",
            spec.endpoint_spec
                .mode
                .map(|m| m.to_string())
                .unwrap_or_default(),
        );
        push("Update", Self::format_update(spec));
        push(
            "Healthcheck",
            container
                .healthcheck
                .as_ref()
                .map(Self::format_health)
                .unwrap_or_default(),
        );
        push(
            "Log driver",
            task.log_driver
                .as_ref()
                .map(|d| format!("{} {}", d.name, Self::format_map(d.options.iter())))
                .unwrap_or_default(),
        );
        push(
            "Secrets",
            container
                .secrets
                .iter()
                .map(|s| {
                    let target = s.file.as_ref().map_or(s.secret_name.as_str(), |f| f.name.as_str());
                    format!("{} -> {target}", s.secret_name)
                })
                .collect::<Vec<_>>()
                .join("\n"),
        );

        let mut output = String::new();
        let name = if spec.annotations.name.is_empty() {
            "(unnamed)".dimmed().to_string()
        } else {
            spec.annotations.name.bold().to_string()
        };
        let _ = write!(output, "\nService: {name}\n\n");
        output.push_str(&Table::new(rows).to_string());
        output.push('\n');
        output
    }

    fn format_mode(mode: &ServiceMode) -> String {
        match mode {
            ServiceMode::Global(_) => "global".cyan().to_string(),
            ServiceMode::Replicated(r) => match r.replicas {
                Some(n) => format!("{} ({n})", "replicated".green()),
                None => "replicated".green().to_string(),
            },
        }
    }

    fn format_map<'a>(entries: impl Iterator<Item = (&'a String, &'a String)>) -> String {
        entries
            .map(|(k, v)| if v.is_empty() { k.clone() } else { format!("{k}={v}") })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn format_mounts(spec: &ServiceSpec) -> String {
        spec.task_template
            .container_spec
            .mounts
            .iter()
            .map(|m| {
                let ro = if m.read_only { " (ro)" } else { "" };
                format!("{} {} -> {}{ro}", m.kind, m.source, m.target)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_resources(resources: &Resources) -> String {
        let mut parts = Vec::new();
        if resources.nano_cpus != 0 {
            parts.push(format!("{} CPUs", NanoCpus::new(resources.nano_cpus)));
        }
        if resources.memory_bytes != 0 {
            parts.push(MemBytes::new(resources.memory_bytes).to_string());
        }
        parts.join(", ")
    }

    fn format_restart(spec: &ServiceSpec) -> String {
        let policy = &spec.task_template.restart_policy;
        let mut parts = Vec::new();
        if let Some(condition) = policy.condition {
            parts.push(condition.to_string());
        }
        if let Some(delay) = policy.delay {
            parts.push(format!("delay {delay}"));
        }
        if let Some(attempts) = policy.max_attempts {
            parts.push(format!("max {attempts} attempts"));
        }
        if let Some(window) = policy.window {
            parts.push(format!("window {window}"));
        }
        parts.join(", ")
    }

    fn format_port(port: &PortConfig) -> String {
        let published = if port.published_port == 0 {
            String::from("*")
        } else {
            port.published_port.to_string()
        };
        let mode = port
            .publish_mode
            .map(|m| format!(" ({m})"))
            .unwrap_or_default();
        format!("{published}:{}/{}{mode}", port.target_port, port.protocol)
    }

    fn format_update(spec: &ServiceSpec) -> String {
        let update = &spec.update_config;
        let mut text = format!("parallelism {}", update.parallelism);
        if update.delay != Duration::ZERO {
            let _ = write!(text, ", delay {}", update.delay);
        }
        if update.monitor != Duration::ZERO {
            let _ = write!(text, ", monitor {}", update.monitor);
        }
        if let Some(action) = update.failure_action {
            let _ = write!(text, ", on failure {action}");
        }
        if update.max_failure_ratio.abs() > f32::EPSILON {
            let _ = write!(text, ", max failure ratio {}", update.max_failure_ratio);
        }
        text
    }

    fn format_health(health: &HealthConfig) -> String {
        if health.test.first().map(String::as_str) == Some(HEALTHCHECK_DISABLED) {
            return "disabled".yellow().to_string();
        }
        let test = if health.test.is_empty() {
            String::from("(image default)")
        } else {
            health.test[1..].join(" ")
        };
        format!(
            "{test} every {} timeout {} retries {}",
            health.interval, health.timeout, health.retries
        )
    }
}
