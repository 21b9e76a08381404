//! Roll component lines up into weight, cost and selling price

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::engine::error::EstimateError;
use crate::engine::formula::{evaluate_number, Namespace, Value};
use crate::engine::processor::ComponentLine;
use crate::engine::resolver::Resolver;
use crate::entities::{MaterialSpecSet, ProductRuleSet};

/// Selling price over total cost unless configuration says otherwise
pub const DEFAULT_MARKUP_FACTOR: f64 = 1.30;

/// Name under which the total weight is visible to labor/consumables formulas
pub const WEIGHT_VARIABLE: &str = "weight";

/// The estimate snapshot returned to callers and stored on order lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateResult {
    pub price: f64,
    pub weight: f64,
    pub cost: f64,
    pub details: Vec<ComponentLine>,
}

/// How the price was built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateBreakdown {
    pub material_cost: f64,
    pub labor_cost: f64,
    pub consumables_cost: f64,
    pub rate_multiplier: f64,
    pub markup_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub result: EstimateResult,
    pub breakdown: EstimateBreakdown,
}

/// Total weight, costs and price for a set of component lines
pub fn aggregate(
    lines: Vec<ComponentLine>,
    rules: &ProductRuleSet,
    set: &MaterialSpecSet,
    inputs: &Namespace,
    resolver: &mut Resolver<'_>,
    markup_factor: f64,
) -> Result<Estimate, EstimateError> {
    let total_weight: f64 = lines.iter().map(|l| l.weight).sum();

    let mut namespace = inputs.clone();
    namespace.insert(WEIGHT_VARIABLE.to_string(), Value::Number(total_weight));

    let labor_cost = evaluate_number(rules.labor_formula.as_deref(), &namespace)
        .map_err(|e| EstimateError::formula(format!("labor formula of '{}'", rules.product), e))?;
    let consumables_cost = evaluate_number(rules.consumables_formula.as_deref(), &namespace)
        .map_err(|e| {
            EstimateError::formula(format!("consumables formula of '{}'", rules.product), e)
        })?;

    // One price lookup per distinct material
    let materials: BTreeSet<&str> = lines.iter().map(|l| l.material_item.as_str()).collect();
    let mut prices = std::collections::HashMap::with_capacity(materials.len());
    for material in materials {
        prices.insert(material, resolver.unit_price(material)?);
    }
    let material_cost: f64 = lines
        .iter()
        .map(|l| l.stock_quantity * prices.get(l.material_item.as_str()).copied().unwrap_or(0.0))
        .sum();

    let cost = (material_cost + labor_cost + consumables_cost) * set.rate_multiplier;
    let price = cost * markup_factor;

    tracing::debug!(
        weight = total_weight,
        material_cost,
        labor_cost,
        consumables_cost,
        cost,
        price,
        "estimate totals"
    );

    Ok(Estimate {
        result: EstimateResult {
            price,
            weight: total_weight,
            cost,
            details: lines,
        },
        breakdown: EstimateBreakdown {
            material_cost,
            labor_cost,
            consumables_cost,
            rate_multiplier: set.rate_multiplier,
            markup_factor,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::provider::Catalog;
    use crate::entities::MaterialProperties;

    fn line(material: &str, weight: f64, stock: f64) -> ComponentLine {
        ComponentLine {
            part_name: "Part".to_string(),
            cut_size: "100".to_string(),
            quantity: 1.0,
            weight,
            stock_quantity: stock,
            material_item: material.to_string(),
        }
    }

    fn priced(valuation: Option<f64>, price_list: Option<f64>) -> MaterialProperties {
        MaterialProperties {
            valuation_rate: valuation,
            price_list_rate: price_list,
            ..Default::default()
        }
    }

    #[test]
    fn test_labor_sees_total_weight() {
        let catalog = Catalog::new();
        let mut resolver = Resolver::new(&catalog);
        let mut rules = ProductRuleSet::new("Stove");
        rules.labor_formula = Some("weight * 10".to_string());
        rules.consumables_formula = Some("50".to_string());

        let mut inputs = Namespace::new();
        inputs.insert("weight".to_string(), Value::Number(999.0));

        let estimate = aggregate(
            vec![line("A", 2.0, 2.0), line("A", 3.0, 3.0)],
            &rules,
            &MaterialSpecSet::new("Set"),
            &inputs,
            &mut resolver,
            DEFAULT_MARKUP_FACTOR,
        )
        .unwrap();

        assert_eq!(estimate.result.weight, 5.0);
        assert_eq!(estimate.breakdown.labor_cost, 50.0);
        assert_eq!(estimate.breakdown.consumables_cost, 50.0);
        assert_eq!(estimate.breakdown.material_cost, 0.0);
        assert!((estimate.result.price - 130.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_fallback_chain() {
        let catalog = Catalog::new()
            .with_material("Valued", priced(Some(10.0), Some(99.0)))
            .with_material("ZeroValued", priced(Some(0.0), Some(4.0)))
            .with_material("Listed", priced(None, Some(5.0)))
            .with_material("Unpriced", priced(None, None));
        let mut resolver = Resolver::new(&catalog);

        let estimate = aggregate(
            vec![
                line("Valued", 0.0, 2.0),
                line("ZeroValued", 0.0, 1.0),
                line("Listed", 0.0, 3.0),
                line("Unpriced", 0.0, 7.0),
            ],
            &ProductRuleSet::new("Stove"),
            &MaterialSpecSet::new("Set"),
            &Namespace::new(),
            &mut resolver,
            1.0,
        )
        .unwrap();

        assert_eq!(estimate.breakdown.material_cost, 20.0 + 4.0 + 15.0);
    }

    #[test]
    fn test_rate_multiplier_and_markup() {
        let catalog = Catalog::new().with_material("A", priced(Some(10.0), None));
        let mut resolver = Resolver::new(&catalog);
        let mut set = MaterialSpecSet::new("Set");
        set.rate_multiplier = 1.5;

        let estimate = aggregate(
            vec![line("A", 1.0, 10.0)],
            &ProductRuleSet::new("Stove"),
            &set,
            &Namespace::new(),
            &mut resolver,
            2.0,
        )
        .unwrap();

        assert_eq!(estimate.result.cost, 150.0);
        assert_eq!(estimate.result.price, 300.0);
    }

    #[test]
    fn test_labor_formula_error_names_formula() {
        let catalog = Catalog::new();
        let mut resolver = Resolver::new(&catalog);
        let mut rules = ProductRuleSet::new("Stove");
        rules.labor_formula = Some("hours * rate".to_string());

        let err = aggregate(
            Vec::new(),
            &rules,
            &MaterialSpecSet::new("Set"),
            &Namespace::new(),
            &mut resolver,
            DEFAULT_MARKUP_FACTOR,
        )
        .unwrap_err();

        assert!(err.to_string().contains("hours * rate"));
    }
}
