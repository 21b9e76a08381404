use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use fabest::cli::{Cli, Commands, GlobalOpts};
use fabest::core::{Config, Project};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_logging(&global);

    match cli.command {
        Commands::Init(args) => fabest::cli::commands::init::run(args),
        Commands::Estimate(args) => fabest::cli::commands::estimate::run(args, &global),
        Commands::Consolidate(args) => fabest::cli::commands::consolidate::run(args, &global),
        Commands::Order(cmd) => fabest::cli::commands::order::run(cmd, &global),
        Commands::Catalog(cmd) => fabest::cli::commands::catalog::run(cmd, &global),
        Commands::Completions(args) => fabest::cli::commands::completions::run(args),
    }
}

/// Logs go to stderr so stdout stays pipeable.
/// Priority: FABEST_LOG, then `-v`, then the configured log_level.
fn init_logging(global: &GlobalOpts) {
    let level = if global.verbose {
        "debug".to_string()
    } else {
        let project = Project::open(global.project.as_deref()).ok();
        Config::load(project.as_ref()).log_level().to_string()
    };

    let filter = EnvFilter::try_from_env("FABEST_LOG")
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
