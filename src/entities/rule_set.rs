//! Product rule set - how a configurable product decomposes into components

use serde::{Deserialize, Serialize};

/// Where a component's raw material comes from in a material set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialSource {
    #[serde(alias = "Sheet")]
    Sheet,
    #[serde(alias = "Round Pipe")]
    RoundPipe,
    #[serde(alias = "rect_pipe", alias = "Rectangle Pipe")]
    RectanglePipe,
    #[serde(alias = "Angle")]
    Angle,
    #[serde(alias = "Flat")]
    Flat,
    #[serde(alias = "Square Rod")]
    SquareRod,
    #[serde(alias = "Washer")]
    Washer,
}

impl MaterialSource {
    pub fn all() -> &'static [MaterialSource] {
        &[
            MaterialSource::Sheet,
            MaterialSource::RoundPipe,
            MaterialSource::RectanglePipe,
            MaterialSource::Angle,
            MaterialSource::Flat,
            MaterialSource::SquareRod,
            MaterialSource::Washer,
        ]
    }

    /// Human-readable label, as shown in configuration screens
    pub fn label(&self) -> &'static str {
        match self {
            MaterialSource::Sheet => "Sheet",
            MaterialSource::RoundPipe => "Round Pipe",
            MaterialSource::RectanglePipe => "Rectangle Pipe",
            MaterialSource::Angle => "Angle",
            MaterialSource::Flat => "Flat",
            MaterialSource::SquareRod => "Square Rod",
            MaterialSource::Washer => "Washer",
        }
    }
}

impl std::fmt::Display for MaterialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for MaterialSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();
        match key.as_str() {
            "sheet" => Ok(MaterialSource::Sheet),
            "round_pipe" => Ok(MaterialSource::RoundPipe),
            "rectangle_pipe" | "rect_pipe" => Ok(MaterialSource::RectanglePipe),
            "angle" => Ok(MaterialSource::Angle),
            "flat" => Ok(MaterialSource::Flat),
            "square_rod" => Ok(MaterialSource::SquareRod),
            "washer" => Ok(MaterialSource::Washer),
            _ => Err(format!(
                "Invalid material source: {}. Use sheet, round_pipe, rectangle_pipe, angle, flat, square_rod, or washer",
                s
            )),
        }
    }
}

/// One physical component of a product and the formulas that size it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRule {
    /// Part name shown on the cut list
    pub part_name: String,

    /// Material category the part is cut from
    pub material_source: MaterialSource,

    /// Number of pieces
    #[serde(default, alias = "qty_formula", skip_serializing_if = "Option::is_none")]
    pub quantity_formula: Option<String>,

    /// Cut length in millimeters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length_formula: Option<String>,

    /// Cut width in millimeters (sheet parts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_formula: Option<String>,

    /// The rule only applies when this evaluates truthy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

impl ComponentRule {
    pub fn new(part_name: impl Into<String>, material_source: MaterialSource) -> Self {
        Self {
            part_name: part_name.into(),
            material_source,
            quantity_formula: None,
            length_formula: None,
            width_formula: None,
            condition: None,
        }
    }

    pub fn quantity(mut self, formula: impl Into<String>) -> Self {
        self.quantity_formula = Some(formula.into());
        self
    }

    pub fn length(mut self, formula: impl Into<String>) -> Self {
        self.length_formula = Some(formula.into());
        self
    }

    pub fn width(mut self, formula: impl Into<String>) -> Self {
        self.width_formula = Some(formula.into());
        self
    }

    pub fn when(mut self, formula: impl Into<String>) -> Self {
        self.condition = Some(formula.into());
        self
    }

    /// All formulas on the rule, labelled by field
    pub fn formulas(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("condition", self.condition.as_deref()),
            ("quantity", self.quantity_formula.as_deref()),
            ("length", self.length_formula.as_deref()),
            ("width", self.width_formula.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, formula)| formula.map(|f| (field, f)))
        .filter(|(_, f)| !f.trim().is_empty())
    }
}

/// Component rules for one product, plus its labor and consumables formulas
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRuleSet {
    /// Product (item code) the rules build
    pub product: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Labor cost, may reference `weight`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labor_formula: Option<String>,

    /// Consumables cost, may reference `weight`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumables_formula: Option<String>,

    /// Evaluated in order
    #[serde(default)]
    pub components: Vec<ComponentRule>,
}

impl ProductRuleSet {
    pub fn new(product: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            description: None,
            labor_formula: None,
            consumables_formula: None,
            components: Vec::new(),
        }
    }
}
