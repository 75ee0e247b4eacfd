//! CLI structure
//!
//! The subcommand tree is generated from the schema registry; this module
//! adds the global flags and the few commands (version, completions) that
//! sit outside the binder.

use clap::builder::EnumValueParser;
use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;

use docdbctl_core::{Config, ConfigError, SchemaRegistry};

use crate::output::OutputFormat;

const LONG_ABOUT: &str = "\
Document-database management CLI

EXAMPLES:
    # Create an account with bounded staleness
    docdbctl account create --name acct1 \\
        --locations eastus=0 westus=1 \\
        --default-consistency-level bounded-staleness \\
        --max-staleness-prefix 200 --max-interval 10

    # Restrict client IPs
    docdbctl account update --name acct1 --ip-range-filter 10.0.0.0/8,20.1.2.3

    # Rotate a key
    docdbctl account regenerate-key --name acct1 --key-kind secondary

    # Get JSON output for scripting
    docdbctl account list -o json -q \"[?status=='active'].name\"
";

/// Build the complete parser: generated scope tree plus global flags.
pub fn build_cli(registry: &SchemaRegistry) -> Command {
    registry
        .to_command("docdbctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Document-database management CLI")
        .long_about(LONG_ABOUT)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("profile")
                .long("profile")
                .short('p')
                .global(true)
                .env("DOCDBCTL_PROFILE")
                .help("Profile to use for this command"),
        )
        .arg(
            Arg::new("config-file")
                .long("config-file")
                .global(true)
                .env("DOCDBCTL_CONFIG_FILE")
                .help("Path to alternate configuration file"),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .global(true)
                .env("DOCDBCTL_API_URL")
                .help("Management API endpoint (overrides the profile)"),
        )
        .arg(
            Arg::new("api-token")
                .long("api-token")
                .global(true)
                .env("DOCDBCTL_API_TOKEN")
                .help("Management API token (overrides the profile)"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .global(true)
                .value_parser(EnumValueParser::<OutputFormat>::new())
                .default_value("json")
                .help("Output format"),
        )
        .arg(
            Arg::new("query")
                .long("query")
                .short('q')
                .global(true)
                .help("JMESPath query to filter output"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Enable verbose logging (-v, -vv, -vvv)"),
        )
        .subcommand(Command::new("version").about("Version information"))
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(clap::value_parser!(Shell))
                        .help("Shell to generate completions for"),
                ),
        )
}

/// Walk the matched subcommand chain and return the space-joined command
/// path plus the leaf matches that carry the flags.
pub fn command_path(matches: &ArgMatches) -> (String, &ArgMatches) {
    let mut path = String::new();
    let mut current = matches;
    while let Some((name, sub)) = current.subcommand() {
        if !path.is_empty() {
            path.push(' ');
        }
        path.push_str(name);
        current = sub;
    }
    (path, current)
}

/// Resolve the management endpoint: explicit flags beat the profile, which
/// comes from the config file (or environment).
pub fn resolve_endpoint(
    matches: &ArgMatches,
) -> Result<(String, Option<String>), ConfigError> {
    let flag_url = matches.get_one::<String>("api-url").cloned();
    let flag_token = matches.get_one::<String>("api-token").cloned();

    if let Some(url) = flag_url {
        return Ok((url, flag_token));
    }

    let config = match matches.get_one::<String>("config-file") {
        Some(path) => Config::load_from_path(std::path::Path::new(path))?,
        None => Config::load()?,
    };
    let profile = config.resolve_profile(matches.get_one::<String>("profile").map(String::as_str))?;
    Ok((profile.api_url, flag_token.or(profile.api_token)))
}
