mod cli;
mod error;
mod render;
mod server;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{CheckArgs, Cli, Command, GlobalOpts, ServeArgs};
use crate::error::ExporterError;
use crate::server::AppState;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), ExporterError> {
    match cli.command {
        Command::Serve(args) => serve(&cli.global, args).await,
        Command::Check(args) => check(&cli.global, args).await,
    }
}

async fn serve(global: &GlobalOpts, args: ServeArgs) -> Result<(), ExporterError> {
    let config = eoc_config::load_config(&global.config)?;
    let listen = args.listen.unwrap_or_else(|| config.defaults.listen.clone());
    let state = Arc::new(AppState {
        controllers: eoc_config::build_clients(&config)?,
    });
    server::serve(state, &listen).await
}

async fn check(global: &GlobalOpts, args: CheckArgs) -> Result<(), ExporterError> {
    let config = eoc_config::load_config(&global.config)?;
    let ctrl = config
        .find(&args.target)
        .ok_or_else(|| ExporterError::UnknownTarget {
            target: args.target.clone(),
            available: config
                .controllers
                .iter()
                .map(|c| c.alias.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })?;

    let client = eoc_config::build_client(ctrl, &config.defaults)?;
    let (samples, result) = render::scrape(&ctrl.alias, &client).await;
    print!("{}", render::render(&samples)?);

    if let Some(name) = client.backend_name().await {
        tracing::info!(controller = %ctrl.alias, backend = name, "collected");
    }
    result.map_err(|err| ExporterError::collect(&ctrl.alias, err))
}
