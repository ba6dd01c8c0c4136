//! Port publishing options.
//!
//! Short-form specifications (`[ip:][hostPort:]containerPort[/proto]`) are
//! parsed into [`PortMapping`]s and later converted into endpoint
//! [`PortConfig`]s. The long form (`target=80,published=8080`) is handled by
//! [`PortOpt`].

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;

use super::{FlagValue, read_csv_fields, split_field};
use crate::error::OptionError;
use crate::swarm::{PortConfig, PortProtocol, PublishMode};

/// A container-side port and protocol, such as `80/tcp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Port {
    /// Port number inside the container.
    pub number: u16,
    /// Transport protocol.
    pub protocol: PortProtocol,
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.protocol)
    }
}

/// Host side of a port mapping. Both fields may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortBinding {
    /// Host IP address the port is bound to.
    pub host_ip: String,
    /// Host port, a single number or a `start-end` range.
    pub host_port: String,
}

/// One container port together with its host binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMapping {
    /// Container port.
    pub port: Port,
    /// Host binding.
    pub binding: PortBinding,
}

/// Distinct ports of a list of specifications, in order of first
/// appearance, with every binding given for each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSpecs {
    /// Distinct container ports.
    pub ports: Vec<Port>,
    /// Bindings per container port.
    pub bindings: HashMap<Port, Vec<PortBinding>>,
}

fn parse_port_range(range: &str) -> Result<(u16, u16), ()> {
    if range.is_empty() {
        return Err(());
    }
    let (start, end) = range.split_once('-').unwrap_or((range, range));
    let start: u16 = start.parse().map_err(|_| ())?;
    let end: u16 = end.parse().map_err(|_| ())?;
    if end < start {
        return Err(());
    }
    Ok((start, end))
}

/// Splits `ip:host:container` on colons; anything left of the last two parts
/// is the IP.
fn split_parts(raw: &str) -> (String, &str, &str) {
    let parts: Vec<&str> = raw.split(':').collect();
    let n = parts.len();
    let container = parts[n - 1];
    match n {
        1 => (String::new(), "", container),
        2 => (String::new(), parts[0], container),
        _ => (parts[..n - 2].join(":"), parts[n - 2], container),
    }
}

/// Splits `80/udp` into the port text and the protocol; the protocol
/// defaults to `tcp`.
fn split_proto_port(raw: &str) -> (&str, &str) {
    match raw.split_once('/') {
        None => (raw, "tcp"),
        Some((port, "")) => (port, "tcp"),
        Some((port, proto)) => (port, proto),
    }
}

fn strip_ip_brackets(raw_ip: &str) -> Result<String, OptionError> {
    let ip = match raw_ip.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        Some(inner) => inner,
        None if raw_ip.contains(':') => {
            return Err(OptionError::port(format!(
                "Invalid ip address {raw_ip}: too many colons"
            )));
        }
        None => raw_ip,
    };
    if !ip.is_empty() && ip.parse::<IpAddr>().is_err() {
        return Err(OptionError::port(format!("Invalid ip address: {ip}")));
    }
    Ok(ip.to_string())
}

/// Parses one short-form port specification into its mappings; a range
/// yields one mapping per port.
///
/// # Errors
///
/// Returns an error if the address, either port (range) or the protocol is
/// malformed, or the container and host ranges differ in length.
pub fn parse_port_spec(raw: &str) -> Result<Vec<PortMapping>, OptionError> {
    let (raw_ip, host_port, container_part) = split_parts(raw);
    let (container_port, proto) = split_proto_port(container_part);

    let ip = strip_ip_brackets(&raw_ip)?;
    if container_port.is_empty() {
        return Err(OptionError::port(format!("No port specified: {raw}<empty>")));
    }

    let (start, end) = parse_port_range(container_port)
        .map_err(|()| OptionError::port(format!("Invalid containerPort: {container_port}")))?;

    let (host_start, host_end) = if host_port.is_empty() {
        (0, 0)
    } else {
        parse_port_range(host_port)
            .map_err(|()| OptionError::port(format!("Invalid hostPort: {host_port}")))?
    };

    if !host_port.is_empty() && end - start != host_end - host_start && end != start {
        return Err(OptionError::port(format!(
            "Invalid ranges specified for container and host Ports: {container_port} and {host_port}"
        )));
    }

    let protocol: PortProtocol = proto
        .parse()
        .map_err(|_| OptionError::port(format!("Invalid proto: {proto}")))?;

    let mut mappings = Vec::with_capacity(usize::from(end - start) + 1);
    for offset in 0..=(end - start) {
        let mut binding_port = if host_port.is_empty() {
            String::new()
        } else {
            (host_start + offset).to_string()
        };
        // A single container port with a host range keeps the whole range.
        if start == end && host_start != host_end {
            binding_port = format!("{binding_port}-{host_end}");
        }
        mappings.push(PortMapping {
            port: Port {
                number: start + offset,
                protocol,
            },
            binding: PortBinding {
                host_ip: ip.clone(),
                host_port: binding_port,
            },
        });
    }
    Ok(mappings)
}

/// Parses a list of short-form specifications, grouping bindings by port.
///
/// # Errors
///
/// Returns the first specification error encountered.
pub fn parse_port_specs<S: AsRef<str>>(specs: &[S]) -> Result<PortSpecs, OptionError> {
    let mut result = PortSpecs::default();
    for spec in specs {
        for mapping in parse_port_spec(spec.as_ref())? {
            if !result.bindings.contains_key(&mapping.port) {
                result.ports.push(mapping.port);
            }
            result
                .bindings
                .entry(mapping.port)
                .or_default()
                .push(mapping.binding);
        }
    }
    Ok(result)
}

/// List validator for `--publish`: services cannot publish on a specific
/// host IP.
///
/// # Errors
///
/// Returns an error if the specification is malformed or names a host IP.
pub fn validate_port(value: &str) -> Result<String, OptionError> {
    let mappings = parse_port_spec(value)?;
    if mappings.iter().any(|m| !m.binding.host_ip.is_empty()) {
        return Err(OptionError::PortHostIpUnsupported);
    }
    Ok(value.to_string())
}

/// Converts every binding of `port` into an endpoint port record. A host
/// port that is not a single number publishes on port 0, letting the
/// orchestrator pick one.
#[must_use]
pub fn convert_port_to_port_config(
    port: &Port,
    bindings: &HashMap<Port, Vec<PortBinding>>,
) -> Vec<PortConfig> {
    bindings
        .get(port)
        .map(|list| {
            list.iter()
                .map(|binding| PortConfig {
                    protocol: port.protocol,
                    target_port: u32::from(port.number),
                    published_port: binding.host_port.parse::<u16>().map_or(0, u32::from),
                    publish_mode: None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Long-form port option (`--port target=80,published=8080,protocol=udp`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortOpt {
    ports: Vec<PortConfig>,
}

impl PortOpt {
    /// Creates an empty option.
    #[must_use]
    pub const fn new() -> Self {
        Self { ports: Vec::new() }
    }

    /// Returns the parsed port records in order.
    #[must_use]
    pub fn value(&self) -> &[PortConfig] {
        &self.ports
    }
}

fn parse_port_number(value: &str) -> Result<u32, OptionError> {
    value
        .parse::<u16>()
        .map(u32::from)
        .map_err(|_| OptionError::number("port", value))
}

impl FlagValue for PortOpt {
    fn set(&mut self, value: &str) -> Result<(), OptionError> {
        let mut config = PortConfig {
            protocol: PortProtocol::Tcp,
            target_port: 0,
            published_port: 0,
            publish_mode: None,
        };

        for field in read_csv_fields(value)? {
            let (key, val) = split_field(&field)?;
            match key.as_str() {
                "mode" => config.publish_mode = Some(val.parse::<PublishMode>()?),
                "target" => config.target_port = parse_port_number(val)?,
                "published" => config.published_port = parse_port_number(val)?,
                "protocol" => config.protocol = val.parse()?,
                _ => {
                    return Err(OptionError::UnknownField {
                        key,
                        field: field.clone(),
                    });
                }
            }
        }

        if config.target_port == 0 {
            return Err(OptionError::MissingField { field: "target" });
        }

        self.ports.push(config);
        Ok(())
    }

    fn value_type(&self) -> &'static str {
        "port"
    }
}

impl fmt::Display for PortOpt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .ports
            .iter()
            .map(|p| {
                let mode = p.publish_mode.map(|m| m.to_string()).unwrap_or_default();
                format!("{}:{}/{}/{mode}", p.published_port, p.target_port, p.protocol)
            })
            .collect();
        f.write_str(&rendered.join(", "))
    }
}
