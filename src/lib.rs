// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(warnings)]                    // All warnings are treated as errors
#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
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

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # devbench
//!
//! A workstation CLI for setting up and operating a local development
//! environment for a two-edition server application.
//!
//! ## Overview
//!
//! devbench orchestrates three external tools - a version-control client
//! (`svn`), a build tool (`ant`), and an application server (Tomcat) - so
//! that checking out, building, and running both the community ("ce") and
//! professional ("pro") source trees is one command each.
//!
//! ## Architecture
//!
//! The heart of the tool is the **context**: a layered configuration store
//! resolved once per invocation from
//!
//! 1. Built-in computed defaults
//! 2. The user-level properties file (`~/.devbench/devbench.properties`)
//! 3. The workspace properties file (`./devbench.properties`)
//! 4. Command-line overrides
//!
//! Later layers win per property. Missing files are seeded from bundled
//! templates on first use; derived values (checkout URLs, working-copy
//! paths) are computed from already-resolved primitives; mandatory
//! properties with no value fail resolution fast. Every driver reads the
//! resolved context without further existence checks.
//!
//! ## Modules
//!
//! - [`context`]: Layered configuration resolution (the core)
//! - [`resources`]: Drivers for svn, ant, and the application server
//! - [`cli`]: Command-line interface
//! - [`error`]: Error hierarchy
//!
//! ## Example
//!
//! ```properties
//! [src]
//! user = alice
//! server = scm.example.com
//! branch_ce = release-7
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod context;
pub mod error;
pub mod resources;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use context::{Context, ContextResolver, Edition, Overrides, PropertySet};
pub use error::{DevbenchError, Result};
pub use resources::{BuildDriver, ScmAction, ScmDriver, ServerDriver, ServerInstance};
