//! Estimation errors
//!
//! Everything here aborts the estimate. Incomplete master data (missing
//! weights or prices) is not an error: it degrades to zero and is reported
//! through `tracing::warn!`.

use miette::Diagnostic;
use thiserror::Error;

use crate::engine::formula::FormulaError;
use crate::entities::MaterialSource;

/// Kind of record a collaborator was asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    MaterialSet,
    RuleSet,
    Material,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::MaterialSet => write!(f, "material set"),
            RecordKind::RuleSet => write!(f, "rule set for product"),
            RecordKind::Material => write!(f, "material"),
        }
    }
}

/// Failure reported by a master-data collaborator
#[derive(Debug, Error, Diagnostic)]
pub enum ProviderError {
    #[error("{kind} '{name}' not found")]
    #[diagnostic(code(fabest::catalog::not_found))]
    NotFound { kind: RecordKind, name: String },

    #[error("failed to load {kind} '{name}': {message}")]
    #[diagnostic(code(fabest::catalog::load))]
    Load {
        kind: RecordKind,
        name: String,
        message: String,
    },
}

impl ProviderError {
    pub fn not_found(kind: RecordKind, name: impl Into<String>) -> Self {
        ProviderError::NotFound {
            kind,
            name: name.into(),
        }
    }
}

/// Why an estimate could not be produced
#[derive(Debug, Error, Diagnostic)]
pub enum EstimateError {
    #[error("{context}: {source}")]
    #[diagnostic(code(fabest::estimate::formula))]
    Formula {
        context: String,
        #[diagnostic_source]
        source: FormulaError,
    },

    #[error("Material Item not defined for {category} in set {set_name}")]
    #[diagnostic(
        code(fabest::estimate::missing_binding),
        help("Bind a material for this category in the material set, or drop the rule")
    )]
    MissingMaterialBinding {
        category: MaterialSource,
        set_name: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Provider(#[from] ProviderError),
}

impl EstimateError {
    pub(crate) fn formula(context: impl Into<String>, source: FormulaError) -> Self {
        EstimateError::Formula {
            context: context.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, EstimateError::Provider(ProviderError::NotFound { .. }))
    }
}
