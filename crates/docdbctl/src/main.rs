use clap::ArgMatches;
use clap_complete::{Shell, generate};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docdbctl_core::{AccountClient, CoreError, SchemaRegistry};

use docdbctl::error::DocdbCtlError;
use docdbctl::output::{self, OutputFormat};
use docdbctl::{cli, commands, params};

#[tokio::main]
async fn main() {
    let mut registry = SchemaRegistry::new();
    if let Err(e) = params::load_arguments(&mut registry) {
        // Registration failures are programming errors; nothing the user can do.
        eprintln!("error: {}", e);
        std::process::exit(1);
    }

    let matches = cli::build_cli(&registry).get_matches();
    init_tracing(matches.get_count("verbose"));

    if let Err(e) = run(&registry, &matches).await {
        e.print_diagnostic();
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    // RUST_LOG wins over the verbosity flag.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "docdbctl=warn,docdbctl_core=warn",
            1 => "docdbctl=info,docdbctl_core=info",
            2 => "docdbctl=debug,docdbctl_core=debug",
            _ => "docdbctl=trace,docdbctl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn run(registry: &SchemaRegistry, matches: &ArgMatches) -> Result<(), DocdbCtlError> {
    let format = matches
        .get_one::<OutputFormat>("output")
        .copied()
        .unwrap_or_default();
    let query = matches.get_one::<String>("query").map(String::as_str);

    match matches.subcommand() {
        Some(("version", _)) => {
            let data = serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "name": env!("CARGO_PKG_NAME"),
            });
            output::print_output(&data, format, None)?;
            return Ok(());
        }
        Some(("completions", sub)) => {
            if let Some(shell) = sub.get_one::<Shell>("shell") {
                let mut cmd = cli::build_cli(registry);
                generate(*shell, &mut cmd, "docdbctl", &mut std::io::stdout());
            }
            return Ok(());
        }
        _ => {}
    }

    let (path, leaf) = cli::command_path(matches);
    info!("Command: {}", path);

    let (api_url, api_token) = cli::resolve_endpoint(matches).map_err(CoreError::from)?;
    debug!("Using endpoint {}", api_url);
    let client = AccountClient::new(api_url, api_token).map_err(CoreError::from)?;

    let raw = registry.raw_from_matches(&path, leaf);
    let bag = docdbctl_core::bind(registry, &path, &raw)?;

    let dispatcher = commands::build_dispatcher(client);
    let start = std::time::Instant::now();
    let result = dispatcher.dispatch(&path, bag).await;
    match &result {
        Ok(_) => info!("Command completed in {:?}", start.elapsed()),
        Err(e) => error!("Command failed after {:?}: {}", start.elapsed(), e),
    }

    output::print_output(&result?, format, query)?;
    Ok(())
}
