//! Component rule processing: rules + inputs -> component lines

use serde::{Deserialize, Serialize};

use crate::engine::error::EstimateError;
use crate::engine::formula::{evaluate_condition, evaluate_number, Namespace};
use crate::engine::resolver::Resolver;
use crate::entities::{ComponentRule, MaterialSource, MaterialSpecSet, ProductRuleSet, StockBasis};

/// Square millimeters per square inch (25.4²)
pub const AREA_MM2_PER_SQ_INCH: f64 = 645.16;

pub const MM_PER_METER: f64 = 1000.0;

/// One cut component of an estimate
///
/// Field names on the wire match the snapshot stored on quote and order
/// lines, which is what BOM consolidation later reads back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentLine {
    #[serde(rename = "part")]
    pub part_name: String,

    pub cut_size: String,

    #[serde(rename = "qty")]
    pub quantity: f64,

    pub weight: f64,

    /// In the material's stock unit: meters, pieces, or mass
    #[serde(rename = "stock_qty")]
    pub stock_quantity: f64,

    pub material_item: String,
}

/// Render a millimeter dimension the way cut lists show it (`950`, `12.5`)
pub fn format_dimension(value: f64) -> String {
    format!("{}", value)
}

/// `"<length> x <width>"`, or just the length for parts without a width
pub fn cut_size(length_mm: f64, width_mm: f64) -> String {
    if width_mm != 0.0 {
        format!("{} x {}", format_dimension(length_mm), format_dimension(width_mm))
    } else {
        format_dimension(length_mm)
    }
}

/// Evaluate every rule of a product, in order, into component lines
pub fn process_rules(
    rules: &ProductRuleSet,
    set: &MaterialSpecSet,
    inputs: &Namespace,
    resolver: &mut Resolver<'_>,
) -> Result<Vec<ComponentLine>, EstimateError> {
    let mut lines = Vec::with_capacity(rules.components.len());
    for rule in &rules.components {
        if let Some(line) = process_rule(rule, set, inputs, resolver)? {
            lines.push(line);
        }
    }
    Ok(lines)
}

/// A single rule; `None` when its condition fails or its quantity is not positive
pub fn process_rule(
    rule: &ComponentRule,
    set: &MaterialSpecSet,
    inputs: &Namespace,
    resolver: &mut Resolver<'_>,
) -> Result<Option<ComponentLine>, EstimateError> {
    let part = &rule.part_name;
    let context = |field: &str| format!("{} formula of '{}'", field, part);

    if !evaluate_condition(rule.condition.as_deref(), inputs)
        .map_err(|e| EstimateError::formula(context("condition"), e))?
    {
        tracing::debug!(part = %part, "condition not met, skipping");
        return Ok(None);
    }

    let qty = evaluate_number(rule.quantity_formula.as_deref(), inputs)
        .map_err(|e| EstimateError::formula(context("quantity"), e))?;
    let length_mm = evaluate_number(rule.length_formula.as_deref(), inputs)
        .map_err(|e| EstimateError::formula(context("length"), e))?;
    let width_mm = evaluate_number(rule.width_formula.as_deref(), inputs)
        .map_err(|e| EstimateError::formula(context("width"), e))?;

    if qty.is_nan() || qty <= 0.0 {
        tracing::debug!(part = %part, qty, "non-positive quantity, skipping");
        return Ok(None);
    }

    let material = resolver.resolve(rule.material_source, set)?;

    let (weight, stock_quantity) = match rule.material_source {
        MaterialSource::Sheet => {
            let area_sq_inch = (length_mm * width_mm) / AREA_MM2_PER_SQ_INCH;
            let weight = area_sq_inch * set.density_factor * qty;
            // Sheet is stocked by mass
            (weight, weight)
        }
        MaterialSource::RoundPipe
        | MaterialSource::RectanglePipe
        | MaterialSource::Angle
        | MaterialSource::Flat
        | MaterialSource::SquareRod => {
            let length_m = length_mm / MM_PER_METER;
            let weight = length_m * material.weight_per_unit() * qty;
            let stock = match material.properties.stock_uom().basis() {
                StockBasis::Length => length_m * qty,
                StockBasis::Mass | StockBasis::Count => weight,
            };
            (weight, stock)
        }
        MaterialSource::Washer => (material.weight_per_unit() * qty, qty),
    };

    tracing::debug!(part = %part, material = %material.id, qty, weight, stock_quantity, "component line");

    Ok(Some(ComponentLine {
        part_name: part.clone(),
        cut_size: cut_size(length_mm, width_mm),
        quantity: qty,
        weight,
        stock_quantity,
        material_item: material.id,
    }))
}
