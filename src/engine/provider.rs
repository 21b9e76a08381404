//! Master-data collaborators consumed by the estimator
//!
//! The engine never reaches storage directly. Callers hand it these traits;
//! [`Catalog`] is the in-memory implementation and
//! [`crate::core::ProjectCatalog`] reads a project directory.

use std::collections::HashMap;

use crate::engine::error::{ProviderError, RecordKind};
use crate::entities::{MaterialProperties, MaterialSpecSet, ProductRuleSet};

pub trait MaterialSetProvider: Send + Sync {
    /// Fails with `NotFound` when no set has this name
    fn material_set(&self, name: &str) -> Result<MaterialSpecSet, ProviderError>;
}

pub trait RuleSetProvider: Send + Sync {
    /// Fails with `NotFound` when the product has no rule set
    fn rule_set(&self, product: &str) -> Result<ProductRuleSet, ProviderError>;
}

pub trait MaterialMaster: Send + Sync {
    /// `Ok(None)` when the material has no master record
    fn properties(&self, material_id: &str) -> Result<Option<MaterialProperties>, ProviderError>;
}

/// In-memory master data
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    material_sets: HashMap<String, MaterialSpecSet>,
    rule_sets: HashMap<String, ProductRuleSet>,
    materials: HashMap<String, MaterialProperties>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_material_set(mut self, set: MaterialSpecSet) -> Self {
        self.material_sets.insert(set.name.clone(), set);
        self
    }

    pub fn with_rule_set(mut self, rules: ProductRuleSet) -> Self {
        self.rule_sets.insert(rules.product.clone(), rules);
        self
    }

    pub fn with_material(mut self, id: impl Into<String>, properties: MaterialProperties) -> Self {
        self.materials.insert(id.into(), properties);
        self
    }
}

impl MaterialSetProvider for Catalog {
    fn material_set(&self, name: &str) -> Result<MaterialSpecSet, ProviderError> {
        self.material_sets
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(RecordKind::MaterialSet, name))
    }
}

impl RuleSetProvider for Catalog {
    fn rule_set(&self, product: &str) -> Result<ProductRuleSet, ProviderError> {
        self.rule_sets
            .get(product)
            .cloned()
            .ok_or_else(|| ProviderError::not_found(RecordKind::RuleSet, product))
    }
}

impl MaterialMaster for Catalog {
    fn properties(&self, material_id: &str) -> Result<Option<MaterialProperties>, ProviderError> {
        Ok(self.materials.get(material_id).cloned())
    }
}
