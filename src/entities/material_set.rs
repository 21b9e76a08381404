//! Material specification set - concrete material bindings for a construction standard

use serde::{Deserialize, Serialize};

use crate::entities::rule_set::MaterialSource;

/// A named bundle of material bindings and cost factors
///
/// One set (e.g. "SS 304 Heavy") is shared by every product built to the
/// same construction standard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialSpecSet {
    /// Set name
    #[serde(alias = "set_name")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_item: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round_pipe_item: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect_pipe_item: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle_item: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flat_item: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub square_rod_item: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub washer_item: Option<String>,

    /// Sheet mass per square inch of area
    #[serde(default)]
    pub density_factor: f64,

    /// Scales the total cost (material + labor + consumables)
    #[serde(default = "default_rate_multiplier")]
    pub rate_multiplier: f64,
}

fn default_rate_multiplier() -> f64 {
    1.0
}

impl MaterialSpecSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rate_multiplier: 1.0,
            ..Default::default()
        }
    }

    /// The material bound for a category, if the binding is non-empty
    pub fn binding(&self, source: MaterialSource) -> Option<&str> {
        let field = match source {
            MaterialSource::Sheet => &self.sheet_item,
            MaterialSource::RoundPipe => &self.round_pipe_item,
            MaterialSource::RectanglePipe => &self.rect_pipe_item,
            MaterialSource::Angle => &self.angle_item,
            MaterialSource::Flat => &self.flat_item,
            MaterialSource::SquareRod => &self.square_rod_item,
            MaterialSource::Washer => &self.washer_item,
        };
        field.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Bind a material to a category
    pub fn with_binding(mut self, source: MaterialSource, item: impl Into<String>) -> Self {
        let item = Some(item.into());
        match source {
            MaterialSource::Sheet => self.sheet_item = item,
            MaterialSource::RoundPipe => self.round_pipe_item = item,
            MaterialSource::RectanglePipe => self.rect_pipe_item = item,
            MaterialSource::Angle => self.angle_item = item,
            MaterialSource::Flat => self.flat_item = item,
            MaterialSource::SquareRod => self.square_rod_item = item,
            MaterialSource::Washer => self.washer_item = item,
        }
        self
    }
}
