//! Material resolution: category -> bound material -> master properties

use std::collections::HashMap;

use crate::engine::error::EstimateError;
use crate::engine::provider::MaterialMaster;
use crate::entities::{MaterialProperties, MaterialSource, MaterialSpecSet};

/// A material bound by the set, with its master-data properties
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMaterial {
    pub id: String,
    pub properties: MaterialProperties,
}

impl ResolvedMaterial {
    /// Weight per meter (or per piece); missing master data counts as zero
    pub fn weight_per_unit(&self) -> f64 {
        match self.properties.weight_per_unit {
            Some(w) => w,
            None => {
                tracing::warn!(material = %self.id, "material has no weight_per_unit, weight counts as 0");
                0.0
            }
        }
    }
}

/// Resolves materials for one estimate, reading each master record once
pub struct Resolver<'a> {
    master: &'a dyn MaterialMaster,
    cache: HashMap<String, MaterialProperties>,
}

impl<'a> Resolver<'a> {
    pub fn new(master: &'a dyn MaterialMaster) -> Self {
        Self {
            master,
            cache: HashMap::new(),
        }
    }

    /// The material a set binds for a category, with its properties
    pub fn resolve(
        &mut self,
        source: MaterialSource,
        set: &MaterialSpecSet,
    ) -> Result<ResolvedMaterial, EstimateError> {
        let id = set
            .binding(source)
            .ok_or_else(|| EstimateError::MissingMaterialBinding {
                category: source,
                set_name: set.name.clone(),
            })?
            .to_string();
        let properties = self.properties(&id)?;
        Ok(ResolvedMaterial { id, properties })
    }

    /// Master properties for a material; an unknown material degrades to all-zero
    pub fn properties(&mut self, material_id: &str) -> Result<MaterialProperties, EstimateError> {
        if let Some(props) = self.cache.get(material_id) {
            return Ok(props.clone());
        }
        let props = match self.master.properties(material_id)? {
            Some(props) => props,
            None => {
                tracing::warn!(material = %material_id, "material has no master record, using zero weight and price");
                MaterialProperties::default()
            }
        };
        self.cache.insert(material_id.to_string(), props.clone());
        Ok(props)
    }

    /// Unit price: valuation rate, then buying price list rate, then zero
    pub fn unit_price(&mut self, material_id: &str) -> Result<f64, EstimateError> {
        let props = self.properties(material_id)?;
        Ok(match props.unit_price() {
            Some(rate) => rate,
            None => {
                tracing::warn!(material = %material_id, "material has no valuation or price list rate, costing at 0");
                0.0
            }
        })
    }
}
