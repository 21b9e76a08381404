//! `fabest consolidate` command - BOM quantities from an estimate snapshot

use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::Value as JsonValue;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{effective_format, format_qty};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, Project};
use crate::engine::consolidate::{consolidate, snapshot_lines};
use crate::engine::ConsolidatedBom;

#[derive(clap::Args, Debug)]
pub struct ConsolidateArgs {
    /// Estimate snapshot (JSON or YAML), as written by `fabest estimate -f json`
    pub file: PathBuf,
}

pub fn run(args: ConsolidateArgs, global: &GlobalOpts) -> Result<()> {
    // A project only contributes configuration here
    let project = Project::open(global.project.as_deref()).ok();
    let config = Config::load(project.as_ref());

    let bom = consolidate_file(&args.file)?;

    match effective_format(global, &config) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&bom).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(&bom).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for material in &bom.materials {
                wtr.serialize(material).into_diagnostic()?;
            }
            wtr.flush().into_diagnostic()?;
        }
        OutputFormat::Table | OutputFormat::Auto => print_table(&bom, global.quiet),
    }

    Ok(())
}

fn consolidate_file(path: &PathBuf) -> Result<ConsolidatedBom> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("Cannot read {}: {}", path.display(), e))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let snapshot: JsonValue = if is_json {
        serde_json::from_str(&text).into_diagnostic()?
    } else {
        crate::yaml::parse(&text, &path.display().to_string())?
    };

    let lines = snapshot_lines(&snapshot)?;
    Ok(consolidate(&lines))
}

fn print_table(bom: &ConsolidatedBom, quiet: bool) {
    if bom.is_empty() {
        println!("{}", style("No material lines in snapshot.").dim());
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(["Material", "Quantity"]);
    for material in &bom.materials {
        builder.push_record([material.material_item.clone(), format_qty(material.quantity)]);
    }
    println!("{}", builder.build().with(Style::rounded()));

    if !quiet {
        println!();
        print!("{}", bom.cut_list_note());
    }
}
