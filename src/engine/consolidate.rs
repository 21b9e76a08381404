//! BOM consolidation: component lines -> net quantity per material
//!
//! Works on the stored snapshot of an estimate, not on live rules, so a
//! production BOM can be built long after the quote was priced. Snapshots are
//! read leniently: numbers may be missing, null, or written as strings.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;

use crate::engine::processor::{format_dimension, ComponentLine};

/// A component line as read back from a stored snapshot
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoredLine {
    #[serde(default)]
    pub part: String,
    #[serde(default)]
    pub cut_size: String,
    #[serde(default)]
    pub qty: f64,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub stock_qty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material_item: Option<String>,
}

impl From<&ComponentLine> for StoredLine {
    fn from(line: &ComponentLine) -> Self {
        Self {
            part: line.part_name.clone(),
            cut_size: line.cut_size.clone(),
            qty: line.quantity,
            weight: line.weight,
            stock_qty: line.stock_quantity,
            material_item: Some(line.material_item.clone()),
        }
    }
}

impl StoredLine {
    /// Read one line from a JSON object, coercing numbers the lenient way
    pub fn from_json(value: &JsonValue) -> Result<Self, ConsolidateError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ConsolidateError::Shape("each detail line must be an object".to_string()))?;
        let text = |key: &str| match obj.get(key) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        let number = |key: &str| obj.get(key).map(lenient_number).unwrap_or(0.0);
        let material_item = match obj.get("material_item") {
            Some(JsonValue::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => None,
        };
        Ok(Self {
            part: if obj.contains_key("part") {
                text("part")
            } else {
                text("part_name")
            },
            cut_size: text("cut_size"),
            qty: number("qty"),
            weight: number("weight"),
            stock_qty: number("stock_qty"),
            material_item,
        })
    }

    /// Quantity to draw from stock; lines without a stock quantity fall back to weight
    pub fn required_quantity(&self) -> f64 {
        if self.stock_qty == 0.0 {
            self.weight
        } else {
            self.stock_qty
        }
    }
}

fn lenient_number(value: &JsonValue) -> f64 {
    match value {
        JsonValue::Number(n) => n.as_f64().unwrap_or(0.0),
        JsonValue::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()).unwrap_or(0.0),
        JsonValue::Bool(true) => 1.0,
        _ => 0.0,
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConsolidateError {
    #[error("estimate snapshot is not valid JSON: {0}")]
    #[diagnostic(code(fabest::consolidate::json))]
    Json(#[from] serde_json::Error),

    #[error("unexpected estimate snapshot: {0}")]
    #[diagnostic(
        code(fabest::consolidate::shape),
        help("Expected an estimate object with a 'details' list, or the list itself")
    )]
    Shape(String),
}

/// Net quantity of one material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRequirement {
    pub material_item: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutListEntry {
    pub part: String,
    pub cut_size: String,
    pub qty: f64,
}

/// Consolidated materials plus the cut list they came from
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConsolidatedBom {
    /// In order of first appearance
    pub materials: Vec<MaterialRequirement>,
    pub cut_list: Vec<CutListEntry>,
}

impl ConsolidatedBom {
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn quantity_of(&self, material_item: &str) -> Option<f64> {
        self.materials
            .iter()
            .find(|m| m.material_item == material_item)
            .map(|m| m.quantity)
    }

    /// Plain-text cut list for audit notes
    pub fn cut_list_note(&self) -> String {
        let mut note = String::from("Cut List:\n");
        for entry in &self.cut_list {
            note.push_str(&format!(
                "- {}: {} (Qty: {})\n",
                entry.part,
                entry.cut_size,
                format_dimension(entry.qty)
            ));
        }
        note
    }
}

/// Group lines by material, summing their required quantities
pub fn consolidate(lines: &[StoredLine]) -> ConsolidatedBom {
    let mut bom = ConsolidatedBom::default();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for line in lines {
        let Some(material) = line.material_item.as_deref() else {
            continue;
        };
        let qty = line.required_quantity();
        match index.get(material) {
            Some(&i) => bom.materials[i].quantity += qty,
            None => {
                index.insert(material, bom.materials.len());
                bom.materials.push(MaterialRequirement {
                    material_item: material.to_string(),
                    quantity: qty,
                });
            }
        }
        bom.cut_list.push(CutListEntry {
            part: line.part.clone(),
            cut_size: line.cut_size.clone(),
            qty: line.qty,
        });
    }

    bom
}

/// Consolidate freshly computed lines
pub fn consolidate_lines(lines: &[ComponentLine]) -> ConsolidatedBom {
    let stored: Vec<StoredLine> = lines.iter().map(StoredLine::from).collect();
    consolidate(&stored)
}

/// Detail lines from a parsed snapshot: an estimate object or a bare list
pub fn snapshot_lines(snapshot: &JsonValue) -> Result<Vec<StoredLine>, ConsolidateError> {
    let details = match snapshot {
        JsonValue::Array(items) => items,
        JsonValue::Object(obj) => match obj.get("details") {
            Some(JsonValue::Array(items)) => items,
            Some(JsonValue::Null) | None => return Ok(Vec::new()),
            Some(_) => return Err(ConsolidateError::Shape("'details' must be a list".to_string())),
        },
        JsonValue::Null => return Ok(Vec::new()),
        _ => {
            return Err(ConsolidateError::Shape(
                "expected an object or a list".to_string(),
            ))
        }
    };
    details.iter().map(StoredLine::from_json).collect()
}

/// Consolidate a snapshot stored as JSON text
pub fn consolidate_json(snapshot: &str) -> Result<ConsolidatedBom, ConsolidateError> {
    let value: JsonValue = serde_json::from_str(snapshot)?;
    Ok(consolidate(&snapshot_lines(&value)?))
}
