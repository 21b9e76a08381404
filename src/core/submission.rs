//! Order submission: production BOMs from configured order lines
//!
//! Each order line that carries an estimate snapshot gets one production BOM,
//! named from order + item + row so re-submitting is a no-op. A failure on
//! one line is logged and reported as a warning; it never stops the other
//! lines or the submission itself.

use chrono::Utc;
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::loader::find_record;
use crate::core::project::{Project, RecordDir};
use crate::engine::consolidate::{consolidate_json, ConsolidateError, ConsolidatedBom};
use crate::engine::{MaterialMaster, ProviderError};
use crate::entities::{BomItem, Order, OrderLine, ProductionBom};
use crate::yaml::{write_file, YamlError};

#[derive(Debug, Error, Diagnostic)]
pub enum SubmissionError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Snapshot(#[from] ConsolidateError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] YamlError),
}

/// Where production BOMs are kept
pub trait BomStore {
    fn exists(&self, name: &str) -> Result<bool, SubmissionError>;

    fn save(&mut self, bom: &ProductionBom) -> Result<(), SubmissionError>;
}

/// Production BOMs as YAML files under `boms/`
pub struct FileBomStore {
    project: Project,
}

impl FileBomStore {
    pub fn new(project: Project) -> Self {
        Self { project }
    }
}

impl BomStore for FileBomStore {
    fn exists(&self, name: &str) -> Result<bool, SubmissionError> {
        let found = find_record(&self.project, RecordDir::Boms, name, |b: &ProductionBom| {
            b.name.as_str()
        })?;
        Ok(found.is_some())
    }

    fn save(&mut self, bom: &ProductionBom) -> Result<(), SubmissionError> {
        let path = match find_record(&self.project, RecordDir::Boms, &bom.name, |b: &ProductionBom| {
            b.name.as_str()
        })? {
            Some((path, _)) => path,
            None => self.project.new_record_path(RecordDir::Boms, &bom.name),
        };
        write_file(&path, bom)?;
        Ok(())
    }
}

/// A line whose BOM could not be created
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionWarning {
    pub row: u32,
    pub item_code: String,
    pub message: String,
}

impl std::fmt::Display for SubmissionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Failed to generate custom BOM for {} (row {}): {}",
            self.item_code, self.row, self.message
        )
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SubmissionReport {
    /// Names of BOMs created by this submission
    pub created: Vec<String>,
    /// Names of BOMs that already existed
    pub skipped: Vec<String>,
    pub warnings: Vec<SubmissionWarning>,
    /// Audit notes appended to the order
    pub notes: Vec<String>,
}

enum LineOutcome {
    Unconfigured,
    AlreadyExists(String),
    Created { bom: String, note: String },
}

/// Create production BOMs for every configured line of an order
///
/// Sets `bom_no` on lines that got a BOM and appends an audit note per BOM
/// to the order. The caller persists the updated order.
pub fn submit_order(
    order: &mut Order,
    store: &mut dyn BomStore,
    master: &dyn MaterialMaster,
) -> SubmissionReport {
    let mut report = SubmissionReport::default();
    let order_name = order.name.clone();
    let currency = order.currency.clone();

    for line in order.lines.iter_mut() {
        match create_line_bom(&order_name, currency.as_deref(), line, store, master) {
            Ok(LineOutcome::Unconfigured) => {}
            Ok(LineOutcome::AlreadyExists(name)) => {
                tracing::debug!(order = %order_name, bom = %name, "BOM already exists, skipping");
                report.skipped.push(name);
            }
            Ok(LineOutcome::Created { bom, note }) => {
                tracing::info!(order = %order_name, row = line.idx, bom = %bom, "created production BOM");
                line.bom_no = Some(bom.clone());
                order.notes.push(note.clone());
                report.notes.push(note);
                report.created.push(bom);
            }
            Err(e) => {
                tracing::error!(
                    order = %order_name,
                    item = %line.item_code,
                    row = line.idx,
                    error = %e,
                    "error creating custom BOM"
                );
                report.warnings.push(SubmissionWarning {
                    row: line.idx,
                    item_code: line.item_code.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    report
}

fn create_line_bom(
    order_name: &str,
    currency: Option<&str>,
    line: &OrderLine,
    store: &mut dyn BomStore,
    master: &dyn MaterialMaster,
) -> Result<LineOutcome, SubmissionError> {
    let Some(snapshot) = line.configuration.as_deref().filter(|s| !s.trim().is_empty()) else {
        return Ok(LineOutcome::Unconfigured);
    };
    let consolidated = consolidate_json(snapshot)?;
    if consolidated.cut_list.is_empty() {
        return Ok(LineOutcome::Unconfigured);
    }

    let name = ProductionBom::name_for(order_name, &line.item_code, line.idx);
    if store.exists(&name)? {
        return Ok(LineOutcome::AlreadyExists(name));
    }

    let bom = build_bom(&name, &line.item_code, currency, &consolidated, master)?;
    store.save(&bom)?;

    let note = format!("BOM Created for Row {}: {}\n{}", line.idx, name, bom.cut_list);
    Ok(LineOutcome::Created { bom: name, note })
}

fn build_bom(
    name: &str,
    item: &str,
    currency: Option<&str>,
    consolidated: &ConsolidatedBom,
    master: &dyn MaterialMaster,
) -> Result<ProductionBom, SubmissionError> {
    let mut items = Vec::with_capacity(consolidated.materials.len());
    for material in &consolidated.materials {
        let uom = master
            .properties(&material.material_item)?
            .map(|p| p.stock_uom())
            .unwrap_or_default();
        items.push(BomItem {
            item_code: material.material_item.clone(),
            qty: material.quantity,
            uom: uom.as_str().to_string(),
        });
    }

    Ok(ProductionBom {
        name: name.to_string(),
        item: item.to_string(),
        quantity: 1.0,
        currency: currency.map(str::to_string),
        is_active: true,
        is_default: false,
        rm_cost_as_per: "Valuation Rate".to_string(),
        items,
        cut_list: consolidated.cut_list_note(),
        created: Utc::now(),
    })
}
