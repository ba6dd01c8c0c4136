//! Service option aggregate and compiler.
//!
//! [`ServiceOptions`] holds one typed value per configurable dimension of a
//! service. [`ServiceOptions::to_service`] validates the combination and
//! produces a [`ServiceSpec`](crate::swarm::ServiceSpec):
//!
//! 1. Environment entries from env files and `--env` are merged
//! 2. Container, task and service level fields are assembled
//! 3. The health check and the scheduling mode are resolved

mod convert;
mod env;
mod health;
mod opts;

pub use convert::{
    convert_extra_hosts, convert_kv_strings_to_map, convert_networks, convert_secrets,
};
pub use env::{DotenvReader, EnvFileReader, merge_env, read_kv_strings};
pub use health::{HEALTHCHECK_DISABLED, HEALTHCHECK_SHELL, HealthCheckOptions};
pub use opts::{
    DEFAULT_UPDATE_PARALLELISM, EndpointOptions, LogDriverOptions, MODE_GLOBAL, MODE_REPLICATED,
    ResourceOptions, RestartPolicyOptions, ServiceOptions, UpdateOptions,
};
