//! Estimation engine
//!
//! Pure and synchronous: the only outside contact is through the provider
//! traits in [`provider`]. Every call to [`Estimator::estimate`] is
//! independent, so one estimator can serve many threads.

pub mod aggregate;
pub mod consolidate;
pub mod error;
pub mod formula;
pub mod processor;
pub mod provider;
pub mod resolver;

use serde::{Deserialize, Serialize};

pub use aggregate::{Estimate, EstimateBreakdown, EstimateResult, DEFAULT_MARKUP_FACTOR};
pub use consolidate::{consolidate, consolidate_json, consolidate_lines, ConsolidatedBom};
pub use error::{EstimateError, ProviderError, RecordKind};
pub use formula::{Formula, FormulaError, FormulaErrorKind, Namespace, Value};
pub use processor::ComponentLine;
pub use provider::{Catalog, MaterialMaster, MaterialSetProvider, RuleSetProvider};

use crate::engine::resolver::Resolver;

/// What to estimate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateRequest {
    /// Product (item code) whose rule set applies
    pub product: String,

    /// Customer inputs referenced by the rule formulas
    #[serde(default)]
    pub inputs: Namespace,

    /// Material specification set to build from
    pub material_set: String,
}

impl EstimateRequest {
    pub fn new(product: impl Into<String>, material_set: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            inputs: Namespace::new(),
            material_set: material_set.into(),
        }
    }

    pub fn input(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(name.into(), value.into());
        self
    }
}

/// Estimator over injected master-data collaborators
pub struct Estimator<'a> {
    material_sets: &'a dyn MaterialSetProvider,
    rule_sets: &'a dyn RuleSetProvider,
    master: &'a dyn MaterialMaster,
    markup_factor: f64,
}

impl<'a> Estimator<'a> {
    pub fn new(
        material_sets: &'a dyn MaterialSetProvider,
        rule_sets: &'a dyn RuleSetProvider,
        master: &'a dyn MaterialMaster,
    ) -> Self {
        Self {
            material_sets,
            rule_sets,
            master,
            markup_factor: DEFAULT_MARKUP_FACTOR,
        }
    }

    /// Estimator over a single source providing all master data
    pub fn from_catalog<C>(catalog: &'a C) -> Self
    where
        C: MaterialSetProvider + RuleSetProvider + MaterialMaster,
    {
        Self::new(catalog, catalog, catalog)
    }

    /// Selling price over total cost (default `DEFAULT_MARKUP_FACTOR`)
    pub fn with_markup(mut self, markup_factor: f64) -> Self {
        self.markup_factor = markup_factor;
        self
    }

    /// Price, weight, cost and component lines for one configured product
    pub fn estimate(&self, request: &EstimateRequest) -> Result<Estimate, EstimateError> {
        let _span = tracing::debug_span!(
            "estimate",
            product = %request.product,
            material_set = %request.material_set
        )
        .entered();

        let set = self.material_sets.material_set(&request.material_set)?;
        let rules = self.rule_sets.rule_set(&request.product)?;

        let mut resolver = Resolver::new(self.master);
        let lines = processor::process_rules(&rules, &set, &request.inputs, &mut resolver)?;
        aggregate::aggregate(lines, &rules, &set, &request.inputs, &mut resolver, self.markup_factor)
    }
}
