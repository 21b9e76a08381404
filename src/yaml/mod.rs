//! YAML reading and writing with source-located diagnostics

pub mod diagnostics;

pub use diagnostics::{parse, read_file, write_file, YamlError, YamlSyntaxError};
