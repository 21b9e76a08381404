//! fabest: rule-driven estimating for configurable fabricated products
//!
//! Product rule sets describe each component with small arithmetic formulas.
//! Given a material set and the customer's dimensions, the estimator
//! produces a cut list, total weight, cost and selling price; the same cut
//! list later becomes a consolidated production BOM.

pub mod cli;
pub mod core;
pub mod engine;
pub mod entities;
pub mod yaml;
