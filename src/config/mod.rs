//! Configuration module for the lakestack deployment engine.
//!
//! This module handles all configuration-related functionality:
//! - Parsing and deserializing the stack configuration file
//! - Validation of resource declarations

mod parser;
mod spec;
mod validator;

pub use parser::ConfigParser;
pub use spec::{Resource, ResourceKind, StackConfig};
pub use validator::{ConfigValidator, ValidationError, ValidationResult};
