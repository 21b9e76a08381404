//! `fabest order` command - sales order operations

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{effective_format, open_project, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::loader::find_record;
use crate::core::{submit_order, Config, FileBomStore, Project, ProjectCatalog, RecordDir};
use crate::entities::Order;
use crate::yaml::write_file;

#[derive(Subcommand, Debug)]
pub enum OrderCommands {
    /// Submit an order, creating a production BOM for each configured line
    Submit(SubmitArgs),

    /// Show an order's lines and their BOMs
    Show(ShowArgs),
}

#[derive(clap::Args, Debug)]
pub struct SubmitArgs {
    /// Order name
    pub order: String,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Order name
    pub order: String,
}

pub fn run(cmd: OrderCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        OrderCommands::Submit(args) => run_submit(args, global),
        OrderCommands::Show(args) => run_show(args, global),
    }
}

fn load_order(project: &Project, name: &str) -> Result<(PathBuf, Order)> {
    find_record(project, RecordDir::Orders, name, |o: &Order| o.name.as_str())?
        .ok_or_else(|| miette::miette!("Order '{}' not found", name))
}

fn run_submit(args: SubmitArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let (path, mut order) = load_order(&project, &args.order)?;

    let catalog = ProjectCatalog::new(project.clone(), &config);
    let mut store = FileBomStore::new(project.clone());
    let report = submit_order(&mut order, &mut store, &catalog);

    write_file(&path, &order)?;

    match effective_format(global, &config) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&report).into_diagnostic()?),
        _ => {
            for name in &report.created {
                println!("{} Created BOM {}", style("✓").green(), style(name).cyan());
            }
            if !global.quiet {
                for name in &report.skipped {
                    println!("{} {} already exists", style("-").dim(), style(name).dim());
                }
            }
            for warning in &report.warnings {
                eprintln!("{} {}", style("!").yellow(), style(warning).yellow());
            }
            let nothing_done =
                report.created.is_empty() && report.skipped.is_empty() && report.warnings.is_empty();
            if nothing_done && !global.quiet {
                println!("{}", style("No configured lines on this order.").dim());
            }
        }
    }

    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let (_, order) = load_order(&project, &args.order)?;

    match effective_format(global, &config) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&order).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&order).into_diagnostic()?),
        _ => {
            println!("{} {}", style("Order:").bold(), style(&order.name).cyan());
            let mut builder = Builder::default();
            builder.push_record(["Row", "Item", "Qty", "Configured", "BOM"]);
            for line in &order.lines {
                builder.push_record([
                    line.idx.to_string(),
                    truncate_str(&line.item_code, 30),
                    line.qty.to_string(),
                    if line.configuration.is_some() { "yes" } else { "no" }.to_string(),
                    line.bom_no.clone().unwrap_or_default(),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));
            if !global.quiet {
                for note in &order.notes {
                    println!();
                    print!("{}", style(note).dim());
                }
            }
        }
    }

    Ok(())
}
