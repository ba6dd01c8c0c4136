// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # svcspec
//!
//! Compiles service deployment flags into a swarm service specification.
//!
//! ## Overview
//!
//! Every flag a user can give for a service is backed by a typed option
//! value that parses, validates and renders itself. The option aggregate is
//! then compiled into a single [`ServiceSpec`](swarm::ServiceSpec):
//!
//! - Environment variables from env files and flags are merged, last write wins
//! - Health-check flags resolve to disabled, configured or absent
//! - Replica counts are only accepted in replicated mode
//! - Port specifications become endpoint port records
//!
//! ## Modules
//!
//! - [`options`]: Typed option values
//! - [`service`]: Option aggregate and compiler
//! - [`swarm`]: Service specification types
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```
//! use svcspec::options::FlagValue;
//! use svcspec::service::ServiceOptions;
//!
//! let mut opts = ServiceOptions::new();
//! opts.image = String::from("nginx:alpine");
//! opts.replicas.set("3")?;
//! opts.endpoint.publish_ports.set("8080:80")?;
//!
//! let spec = opts.to_service()?;
//! assert_eq!(spec.endpoint_spec.ports[0].published_port, 8080);
//! # Ok::<(), svcspec::error::ServiceError>(())
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod error;
pub mod options;
pub mod service;
pub mod swarm;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use error::{CompileError, OptionError, Result, ServiceError};
pub use options::FlagValue;
pub use service::{EnvFileReader, ServiceOptions};
pub use swarm::ServiceSpec;
