//! `fabest catalog` command - inspect and check master data

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::de::DeserializeOwned;
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{effective_format, format_money, open_project, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, Project, ProjectCatalog, RecordDir};
use crate::engine::aggregate::WEIGHT_VARIABLE;
use crate::engine::Formula;
use crate::entities::{MaterialItem, MaterialSource, MaterialSpecSet, ProductRuleSet};
use crate::yaml::read_file;

#[derive(Subcommand, Debug)]
pub enum CatalogCommands {
    /// List material specification sets
    Sets,

    /// List product rule sets and the inputs they need
    Rules,

    /// List material items with their stock unit and price
    Items,

    /// Check every record parses, every formula is valid and every binding resolves
    Check,
}

pub fn run(cmd: CatalogCommands, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let catalog = ProjectCatalog::new(project, &config);
    let format = effective_format(global, &config);

    match cmd {
        CatalogCommands::Sets => list_sets(&catalog, format),
        CatalogCommands::Rules => list_rules(&catalog, format),
        CatalogCommands::Items => list_items(&catalog, &config, format),
        CatalogCommands::Check => check(&catalog, &config, global),
    }
}

/// Customer inputs a rule set's formulas refer to
pub fn required_inputs(rules: &ProductRuleSet) -> BTreeSet<String> {
    let mut inputs = BTreeSet::new();
    for component in &rules.components {
        for (_, source) in component.formulas() {
            if let Ok(formula) = Formula::parse(source) {
                inputs.extend(formula.variables());
            }
        }
    }
    for source in [&rules.labor_formula, &rules.consumables_formula]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
    {
        if let Ok(formula) = Formula::parse(source) {
            inputs.extend(
                formula
                    .variables()
                    .into_iter()
                    .filter(|v| v != WEIGHT_VARIABLE),
            );
        }
    }
    inputs
}

fn print_structured<T: serde::Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(value).into_diagnostic()?),
        _ => return Ok(false),
    }
    Ok(true)
}

fn list_sets(catalog: &ProjectCatalog, format: OutputFormat) -> Result<()> {
    let sets = catalog.material_sets();
    if print_structured(&sets, format)? {
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["Name", "Density", "Rate ×", "Bound"]);
    for set in &sets {
        let bound: Vec<&str> = MaterialSource::all()
            .iter()
            .filter(|s| set.binding(**s).is_some())
            .map(|s| s.label())
            .collect();
        builder.push_record([
            set.name.clone(),
            set.density_factor.to_string(),
            set.rate_multiplier.to_string(),
            bound.join(", "),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
    println!("{} material set(s) found", style(sets.len()).cyan());
    Ok(())
}

fn list_rules(catalog: &ProjectCatalog, format: OutputFormat) -> Result<()> {
    let rule_sets = catalog.rule_sets();
    if print_structured(&rule_sets, format)? {
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["Product", "Components", "Inputs", "Labor", "Consumables"]);
    for rules in &rule_sets {
        let inputs: Vec<String> = required_inputs(rules).into_iter().collect();
        builder.push_record([
            rules.product.clone(),
            rules.components.len().to_string(),
            inputs.join(", "),
            truncate_str(rules.labor_formula.as_deref().unwrap_or("-"), 30),
            truncate_str(rules.consumables_formula.as_deref().unwrap_or("-"), 30),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
    println!("{} rule set(s) found", style(rule_sets.len()).cyan());
    Ok(())
}

fn list_items(catalog: &ProjectCatalog, config: &Config, format: OutputFormat) -> Result<()> {
    let items = catalog.items();
    if print_structured(&items, format)? {
        return Ok(());
    }

    let price_list = config.buying_price_list();
    let mut builder = Builder::default();
    builder.push_record(["Code", "UOM", "Weight/Unit", "Unit Price"]);
    for item in &items {
        let props = item.properties(price_list);
        builder.push_record([
            item.code.clone(),
            props.stock_uom().to_string(),
            props
                .weight_per_unit
                .map(|w| w.to_string())
                .unwrap_or_else(|| "-".to_string()),
            props.unit_price().map(format_money).unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
    println!("{} item(s) found", style(items.len()).cyan());
    Ok(())
}

#[derive(Default)]
struct CheckStats {
    files: usize,
    errors: usize,
    warnings: usize,
}

impl CheckStats {
    fn error(&mut self, what: &str, message: impl std::fmt::Display) {
        self.errors += 1;
        println!("{} {}: {}", style("✗").red(), what, message);
    }

    fn warn(&mut self, what: &str, message: impl std::fmt::Display) {
        self.warnings += 1;
        println!("{} {}: {}", style("!").yellow(), what, style(message).yellow());
    }
}

/// Read every record of a kind, reporting files that do not parse
fn read_records<T: DeserializeOwned + 'static>(
    project: &Project,
    kind: RecordDir,
    stats: &mut CheckStats,
) -> Vec<(PathBuf, T)> {
    let mut records = Vec::new();
    for path in project.iter_record_files(kind) {
        stats.files += 1;
        match read_file::<T>(&path) {
            Ok(record) => records.push((path, record)),
            Err(e) => {
                stats.errors += 1;
                println!("{} {}", style("✗").red(), style(path.display()).cyan());
                println!("{:?}", miette::Report::new(e));
            }
        }
    }
    records
}

fn check(catalog: &ProjectCatalog, config: &Config, global: &GlobalOpts) -> Result<()> {
    let project = catalog.project();
    let mut stats = CheckStats::default();

    let items: Vec<(PathBuf, MaterialItem)> = read_records(project, RecordDir::MaterialItems, &mut stats);
    let sets: Vec<(PathBuf, MaterialSpecSet)> = read_records(project, RecordDir::MaterialSets, &mut stats);
    let rule_sets: Vec<(PathBuf, ProductRuleSet)> = read_records(project, RecordDir::RuleSets, &mut stats);

    let known_items: HashSet<&str> = items.iter().map(|(_, i)| i.code.as_str()).collect();

    let price_list = config.buying_price_list();
    for (_, item) in &items {
        if item.properties(price_list).unit_price().is_none() {
            stats.warn(&format!("item '{}'", item.code), "no valuation rate or buying price");
        }
    }

    for (_, set) in &sets {
        if set.density_factor <= 0.0 && set.binding(MaterialSource::Sheet).is_some() {
            stats.warn(&format!("set '{}'", set.name), "sheet is bound but density_factor is 0");
        }
        for source in MaterialSource::all() {
            if let Some(item) = set.binding(*source) {
                if !known_items.contains(item) {
                    stats.warn(
                        &format!("set '{}'", set.name),
                        format!("{} item '{}' is not in materials/items", source, item),
                    );
                }
            }
        }
    }

    for (_, rules) in &rule_sets {
        let product = format!("rules '{}'", rules.product);
        for component in &rules.components {
            for (field, source) in component.formulas() {
                if let Err(e) = Formula::parse(source) {
                    stats.error(&format!("{} / {} {}", product, component.part_name, field), &e);
                    if global.verbose {
                        println!("{:?}", miette::Report::new(e));
                    }
                }
            }
        }
        for (field, source) in [
            ("labor", &rules.labor_formula),
            ("consumables", &rules.consumables_formula),
        ] {
            if let Some(source) = source.as_deref().filter(|s| !s.trim().is_empty()) {
                if let Err(e) = Formula::parse(source) {
                    stats.error(&format!("{} {} formula", product, field), &e);
                }
            }
        }
        if rules.components.is_empty() {
            stats.warn(&product, "no components");
        }
    }

    println!();
    println!(
        "{} file(s) checked: {} error(s), {} warning(s)",
        style(stats.files).cyan(),
        style(stats.errors).red(),
        style(stats.warnings).yellow()
    );

    if stats.errors > 0 {
        return Err(miette::miette!("Master data check failed with {} error(s)", stats.errors));
    }
    if !global.quiet {
        println!("{} Master data is consistent", style("✓").green().bold());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ComponentRule;

    #[test]
    fn test_required_inputs() {
        let mut rules = ProductRuleSet::new("Table");
        rules.labor_formula = Some("weight * rate".to_string());
        rules.components = vec![
            ComponentRule::new("Top", MaterialSource::Sheet)
                .quantity("1")
                .length("L")
                .width("W"),
            ComponentRule::new("Shelf", MaterialSource::Sheet)
                .quantity("1")
                .length("L - 40")
                .width("W")
                .when("has_shelf"),
        ];
        let inputs: Vec<String> = required_inputs(&rules).into_iter().collect();
        assert_eq!(inputs, vec!["L", "W", "has_shelf", "rate"]);
    }
}
