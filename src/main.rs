use clap::Parser;
use miette::Result;
use panelmap::cli::{Cli, Commands};
use tracing::Level;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Install miette's fancy error handler for diagnostics
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
    init_logging(cli.global.verbose);

    match cli.command {
        Commands::Geometry(args) => panelmap::cli::commands::geometry::run(args, &cli.global),
        Commands::Stress(args) => panelmap::cli::commands::stress::run(args, &cli.global),
        Commands::Kpi(args) => panelmap::cli::commands::kpi::run(args, &cli.global),
        Commands::Slice(args) => panelmap::cli::commands::slice::run(args, &cli.global),
        Commands::Cells(args) => panelmap::cli::commands::cells::run(args, &cli.global),
        Commands::Pareto(args) => panelmap::cli::commands::pareto::run(args, &cli.global),
    }
}
