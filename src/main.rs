//! devbench CLI entrypoint.
//!
//! This is the main entrypoint for the devbench command-line tool.

use std::process::ExitCode;

use devbench::cli::{Cli, Commands, OutputFormatter, ServerCommands, SrcCommands};
use devbench::context::{Context, ContextResolver, Edition, Overrides};
use devbench::error::Result;
use devbench::resources::{BuildDriver, ScmAction, ScmDriver, ServerDriver};

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initializes the logging system.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Main entry point: resolve the context once, then dispatch.
fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.output);

    let overrides = collect_overrides(&cli)?;
    let resolver = ContextResolver::new()?;
    let ctx = resolver.resolve(&overrides)?;
    debug!("Context resolved for workspace");

    match cli.command {
        Commands::Init => cmd_init(&ctx),
        Commands::Ctx => {
            eprintln!("{}", formatter.format_context(&ctx));
            Ok(())
        }
        Commands::Src { command } => cmd_src(&ctx, &command),
        Commands::Build { dir, edition } => cmd_build(&ctx, dir.as_deref(), edition),
        Commands::Server { command } => cmd_server(&ctx, &command, &formatter),
    }
}

/// Builds the command-line override layer from the parsed flags.
fn collect_overrides(cli: &Cli) -> Result<Overrides> {
    let mut overrides = Overrides::new();

    for expression in &cli.overrides {
        overrides.parse_assignment(expression)?;
    }

    if let Some(skip_tests) = cli.skip_tests {
        overrides.set_skip_tests(skip_tests);
    }

    Ok(overrides)
}

/// Prepare the server installation and check out both source trees.
fn cmd_init(ctx: &Context) -> Result<()> {
    ServerDriver::new(ctx).init()?;

    let scm = ScmDriver::new(ctx);
    scm.clean_checkout(Edition::Ce)?;
    scm.clean_checkout(Edition::Pro)?;

    BuildDriver::new(ctx).write_default_master_properties()?;

    eprintln!("Environment initialized.");
    eprintln!("Next steps:");
    eprintln!("  1. Run 'devbench build' to build both source trees");
    eprintln!("  2. Run 'devbench server deploy' to deploy the webapp");
    eprintln!("  3. Run 'devbench server start' to start the server");

    Ok(())
}

/// Source-control operations.
fn cmd_src(ctx: &Context, command: &SrcCommands) -> Result<()> {
    let scm = ScmDriver::new(ctx);
    let action = match command {
        SrcCommands::Checkout => ScmAction::Checkout,
        SrcCommands::Update => ScmAction::Update,
        SrcCommands::Status => ScmAction::Status,
        SrcCommands::Diff => ScmAction::Diff,
        SrcCommands::Revert => ScmAction::Revert,
    };
    scm.run(action)
}

/// Build both source trees, or one directory of one edition.
fn cmd_build(ctx: &Context, dir: Option<&str>, edition: Option<Edition>) -> Result<()> {
    let build = BuildDriver::new(ctx);
    match (dir, edition) {
        (Some(dir_name), Some(ed)) => build.build_dir(ed, dir_name),
        _ => build.build_all(),
    }
}

/// Application-server operations.
fn cmd_server(ctx: &Context, command: &ServerCommands, formatter: &OutputFormatter) -> Result<()> {
    let server = ServerDriver::new(ctx);
    match command {
        ServerCommands::Start => {
            server.start()?;
            eprintln!("{}", formatter.format_server_status(&server.status()));
            Ok(())
        }
        ServerCommands::Stop => server.stop(),
        ServerCommands::Restart => {
            server.restart()?;
            eprintln!("{}", formatter.format_server_status(&server.status()));
            Ok(())
        }
        ServerCommands::Deploy { dir, edition } => match (dir.as_deref(), *edition) {
            (Some(dir_name), Some(ed)) => server.deploy_jar(ed, dir_name),
            _ => server.deploy_webapp(),
        },
        ServerCommands::Status => {
            eprintln!("{}", formatter.format_server_status(&server.status()));
            Ok(())
        }
        ServerCommands::Go => server.go(),
    }
}
