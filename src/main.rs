use clap::Parser;
use odsp_auth::cli::{Cli, Commands};
use odsp_auth::{config_source, init_config, init_tracing, load_config, run};
use tracing::info;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Init) {
        return init_config(cli.config.as_deref());
    }

    let source = config_source(&cli);
    let config = load_config(&cli)?;
    init_tracing(&config)?;

    match source {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let worker_threads = config.general.worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(run(cli, config))
}
