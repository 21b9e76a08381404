//! Material master records and the properties the estimator needs from them

use serde::{Deserialize, Serialize};

/// How a material is counted in inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockBasis {
    Mass,
    Length,
    Count,
}

/// Stock unit of measure as recorded on the material master
///
/// The raw text is kept for display (and for production BOM lines); the
/// basis decides how stock quantity is derived from cut dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockUom(String);

impl StockUom {
    pub fn new(uom: impl Into<String>) -> Self {
        Self(uom.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn basis(&self) -> StockBasis {
        match self.0.trim().to_lowercase().as_str() {
            "meter" | "meters" | "metre" | "metres" | "m" => StockBasis::Length,
            "nos" | "no" | "unit" | "units" | "pcs" | "pc" | "each" | "ea" => StockBasis::Count,
            _ => StockBasis::Mass,
        }
    }

    pub fn is_length(&self) -> bool {
        self.basis() == StockBasis::Length
    }
}

impl Default for StockUom {
    fn default() -> Self {
        Self("Kg".to_string())
    }
}

impl std::fmt::Display for StockUom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Physical and cost properties of one material, as seen by the estimator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    /// Mass per meter for profiles, mass per piece for washers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_per_unit: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_uom: Option<StockUom>,

    /// Cost-basis rate per stock unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation_rate: Option<f64>,

    /// Buying price list rate, used when there is no valuation rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_list_rate: Option<f64>,
}

impl MaterialProperties {
    /// Unit price: valuation rate when set and non-zero, else the price list rate
    pub fn unit_price(&self) -> Option<f64> {
        self.valuation_rate
            .filter(|rate| *rate != 0.0)
            .or(self.price_list_rate)
    }

    pub fn stock_uom(&self) -> StockUom {
        self.stock_uom.clone().unwrap_or_default()
    }
}

/// A price list entry on a material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPrice {
    pub price_list: String,
    pub rate: f64,
}

/// A raw material master record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialItem {
    /// Item code referenced by material sets
    #[serde(alias = "item_code")]
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_uom: Option<StockUom>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_per_unit: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prices: Vec<ItemPrice>,
}

impl MaterialItem {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: None,
            stock_uom: None,
            weight_per_unit: None,
            valuation_rate: None,
            prices: Vec::new(),
        }
    }

    /// Rate on the named price list, if the item is listed there
    pub fn price_on(&self, price_list: &str) -> Option<f64> {
        self.prices
            .iter()
            .find(|p| p.price_list == price_list)
            .map(|p| p.rate)
    }

    /// Estimator view of the item, pricing from the given buying price list
    pub fn properties(&self, price_list: &str) -> MaterialProperties {
        MaterialProperties {
            weight_per_unit: self.weight_per_unit,
            stock_uom: self.stock_uom.clone(),
            valuation_rate: self.valuation_rate,
            price_list_rate: self.price_on(price_list),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_basis() {
        assert_eq!(StockUom::new("Meter").basis(), StockBasis::Length);
        assert_eq!(StockUom::new("m").basis(), StockBasis::Length);
        assert_eq!(StockUom::new("Nos").basis(), StockBasis::Count);
        assert_eq!(StockUom::new("Kg").basis(), StockBasis::Mass);
        assert_eq!(StockUom::default().as_str(), "Kg");
    }

    #[test]
    fn test_unit_price_fallback() {
        let mut props = MaterialProperties {
            valuation_rate: Some(200.0),
            price_list_rate: Some(150.0),
            ..Default::default()
        };
        assert_eq!(props.unit_price(), Some(200.0));

        props.valuation_rate = Some(0.0);
        assert_eq!(props.unit_price(), Some(150.0));

        props.price_list_rate = None;
        assert_eq!(props.unit_price(), None);
    }

    #[test]
    fn test_item_properties_uses_price_list() {
        let yaml = r#"
item_code: Pipe 25mm
stock_uom: Meter
weight_per_unit: 1.5
prices:
  - price_list: Standard Buying
    rate: 95
  - price_list: Standard Selling
    rate: 130
"#;
        let item: MaterialItem = serde_yml::from_str(yaml).unwrap();
        let props = item.properties("Standard Buying");
        assert_eq!(props.price_list_rate, Some(95.0));
        assert_eq!(props.valuation_rate, None);
        assert!(props.stock_uom().is_length());
        assert_eq!(item.properties("Other").price_list_rate, None);
    }
}
