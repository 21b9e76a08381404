//! Sales orders and the production BOMs created from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of a sales order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// 1-based row number
    pub idx: u32,

    pub item_code: String,

    #[serde(default = "default_qty")]
    pub qty: f64,

    /// Estimate snapshot (JSON) captured when the line was configured
    #[serde(default, alias = "configuration_json", skip_serializing_if = "Option::is_none")]
    pub configuration: Option<String>,

    /// Production BOM created for this line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bom_no: Option<String>,
}

fn default_qty() -> f64 {
    1.0
}

/// A sales order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default)]
    pub lines: Vec<OrderLine>,

    /// Audit trail appended by submission
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Order {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            customer: None,
            currency: None,
            lines: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Append a configured line, numbering it after the existing rows
    pub fn push_line(&mut self, item_code: impl Into<String>, configuration: Option<String>) -> u32 {
        let idx = self.lines.iter().map(|l| l.idx).max().unwrap_or(0) + 1;
        self.lines.push(OrderLine {
            idx,
            item_code: item_code.into(),
            qty: 1.0,
            configuration,
            bom_no: None,
        });
        idx
    }
}

/// One consolidated material line on a production BOM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomItem {
    pub item_code: String,
    pub qty: f64,
    pub uom: String,
}

/// Production BOM for a single configured order line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionBom {
    /// `BOM-<order>-<item>-<row>`
    pub name: String,

    /// Product the BOM builds
    pub item: String,

    pub quantity: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    pub is_active: bool,

    pub is_default: bool,

    pub rm_cost_as_per: String,

    pub items: Vec<BomItem>,

    /// Human-readable cut list for the shop floor
    #[serde(default)]
    pub cut_list: String,

    pub created: DateTime<Utc>,
}

impl ProductionBom {
    /// Deterministic name so re-submitting an order never duplicates a BOM
    pub fn name_for(order: &str, item_code: &str, idx: u32) -> String {
        format!("BOM-{}-{}-{}", order, item_code, idx)
    }
}
