//! Context module: the layered configuration engine.
//!
//! This module owns everything configuration-related:
//! - Parsing INI-style properties files into immutable layers
//! - Seeding missing files from bundled templates on first use
//! - Merging layers (user file, workspace file, command-line overrides)
//!   with later-wins precedence
//! - Filling hardcoded and derived defaults in fixed dependency order
//! - Validating mandatory properties and failing fast

mod properties;
mod resolver;
mod store;

pub use properties::PropertySet;
pub use resolver::{APP_NAME, ContextResolver, Overrides};
pub use store::{Context, CoreSection, Edition, SrcSection, TcSection};
