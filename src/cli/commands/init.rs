//! `fabest init` command - Initialize a new fabest project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::core::project::{Project, ProjectError, RecordDir};

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Force initialization even if .fabest/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            println!(
                "{} Initialized fabest project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created project structure:");
            print_structure(project.root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Add material items, material sets and rule sets as YAML",
                style("materials/ rules/").yellow()
            );
            println!(
                "  {} Check formulas and bindings",
                style("fabest catalog check").yellow()
            );
            println!(
                "  {} Price a configured product",
                style("fabest estimate <product> -s <set> -i L=1000").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} fabest project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("fabest init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn print_structure(root: &Path) {
    let config = root.join(".fabest/config.yaml");
    if config.exists() {
        println!("  📁 {}", style(".fabest/").dim());
        println!("  📄 {}", style(".fabest/config.yaml").dim());
    }
    for dir in RecordDir::all() {
        if root.join(dir.path()).exists() {
            println!("  📁 {}", style(format!("{}/", dir.path())).dim());
        }
    }
}
