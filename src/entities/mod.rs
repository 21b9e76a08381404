//! Master data and order records

pub mod material;
pub mod material_set;
pub mod order;
pub mod rule_set;

pub use material::{ItemPrice, MaterialItem, MaterialProperties, StockBasis, StockUom};
pub use material_set::MaterialSpecSet;
pub use order::{BomItem, Order, OrderLine, ProductionBom};
pub use rule_set::{ComponentRule, MaterialSource, ProductRuleSet};
