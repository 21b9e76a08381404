//! `fabest estimate` command - price a configured product

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{effective_format, format_money, format_qty, open_project, parse_input};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::loader::find_record;
use crate::core::{Config, Project, ProjectCatalog, RecordDir};
use crate::engine::{Estimate, EstimateRequest, EstimateResult, Estimator, Namespace, Value};
use crate::entities::Order;
use crate::yaml::{read_file, write_file};

#[derive(clap::Args, Debug)]
pub struct EstimateArgs {
    /// Product (item code) whose rule set applies
    pub product: String,

    /// Material specification set (default: default_material_set from config)
    #[arg(long, short = 's')]
    pub set: Option<String>,

    /// Customer input as KEY=VALUE, e.g. -i L=1000 -i has_shelf=true
    #[arg(long = "input", short = 'i', value_parser = parse_input)]
    pub inputs: Vec<(String, Value)>,

    /// Read inputs from a YAML or JSON mapping (command-line inputs win)
    #[arg(long)]
    pub inputs_file: Option<PathBuf>,

    /// Markup over cost (overrides config and FABEST_MARKUP)
    #[arg(long)]
    pub markup: Option<f64>,

    /// Include the cost breakdown
    #[arg(long)]
    pub breakdown: bool,

    /// Append the estimate as a configured line on this order
    #[arg(long, value_name = "ORDER")]
    pub save: Option<String>,
}

pub fn run(args: EstimateArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let format = effective_format(global, &config);

    let material_set = args
        .set
        .clone()
        .or_else(|| config.default_material_set.clone())
        .ok_or_else(|| {
            miette::miette!(
                help = "Pass --set <name> or set default_material_set in .fabest/config.yaml",
                "No material set given"
            )
        })?;

    let mut request = EstimateRequest::new(&args.product, material_set);
    if let Some(path) = &args.inputs_file {
        let from_file: Namespace = read_file(path)?;
        request.inputs.extend(from_file);
    }
    request.inputs.extend(args.inputs.iter().cloned());

    let catalog = ProjectCatalog::new(project.clone(), &config);
    let estimator =
        Estimator::from_catalog(&catalog).with_markup(args.markup.unwrap_or(config.markup_factor()));
    let estimate = estimator.estimate(&request)?;

    match format {
        OutputFormat::Json => {
            let json = if args.breakdown {
                serde_json::to_string_pretty(&estimate)
            } else {
                serde_json::to_string_pretty(&estimate.result)
            }
            .into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = if args.breakdown {
                serde_yml::to_string(&estimate)
            } else {
                serde_yml::to_string(&estimate.result)
            }
            .into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout());
            for line in &estimate.result.details {
                wtr.serialize(line).into_diagnostic()?;
            }
            wtr.flush().into_diagnostic()?;
        }
        OutputFormat::Table | OutputFormat::Auto => {
            if global.quiet {
                println!("{}", format_money(estimate.result.price));
            } else {
                print_table(&request, &estimate, args.breakdown);
            }
        }
    }

    if let Some(order_name) = &args.save {
        let (order, row) = save_to_order(&project, order_name, &args.product, &estimate.result)?;
        if !global.quiet {
            eprintln!(
                "{} Saved as row {} of order {}",
                style("✓").green(),
                style(row).cyan(),
                style(&order.name).cyan()
            );
        }
    }

    Ok(())
}

fn print_table(request: &EstimateRequest, estimate: &Estimate, breakdown: bool) {
    let result = &estimate.result;

    println!(
        "{} {} in {}",
        style("Estimate:").bold(),
        style(&request.product).cyan(),
        style(&request.material_set).cyan()
    );
    println!();

    if result.details.is_empty() {
        println!("{}", style("No components apply to these inputs.").dim());
    } else {
        let mut builder = Builder::default();
        builder.push_record(["Part", "Cut Size", "Qty", "Weight", "Stock Qty", "Material"]);
        for line in &result.details {
            builder.push_record([
                line.part_name.clone(),
                line.cut_size.clone(),
                format_qty(line.quantity),
                format_qty(line.weight),
                format_qty(line.stock_quantity),
                line.material_item.clone(),
            ]);
        }
        println!("{}", builder.build().with(Style::rounded()));
    }
    println!();

    if breakdown {
        let b = &estimate.breakdown;
        println!("  Material:     {}", format_money(b.material_cost));
        println!("  Labor:        {}", format_money(b.labor_cost));
        println!("  Consumables:  {}", format_money(b.consumables_cost));
        println!("  Rate ×:       {}", b.rate_multiplier);
        println!("  Markup ×:     {}", b.markup_factor);
        println!();
    }

    println!("  Weight: {} kg", style(format_qty(result.weight)).cyan());
    println!("  Cost:   {}", style(format_money(result.cost)).cyan());
    println!("  Price:  {}", style(format_money(result.price)).green().bold());
}

/// Append the snapshot to an order, creating the order when missing
fn save_to_order(
    project: &Project,
    order_name: &str,
    product: &str,
    result: &EstimateResult,
) -> Result<(Order, u32)> {
    let (path, mut order) = match find_record(project, RecordDir::Orders, order_name, |o: &Order| {
        o.name.as_str()
    })? {
        Some(found) => found,
        None => (
            project.new_record_path(RecordDir::Orders, order_name),
            Order::new(order_name),
        ),
    };

    let snapshot = serde_json::to_string(result).into_diagnostic()?;
    let row = order.push_line(product, Some(snapshot));
    write_file(&path, &order)?;
    tracing::info!(order = %order.name, row, product, "saved estimate to order");
    Ok((order, row))
}
