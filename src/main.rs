use std::path::PathBuf;
use std::process::exit;

use clap::{ArgAction, CommandFactory, Parser};
use log::{debug, info, warn};

use certexpiry::config::Config;
use certexpiry::output::{self, CheckOutcome, OutputFormat};
use certexpiry::{clean_hostname, logger, ExpiryChecker, Target};

/// Exit status for usage and configuration errors.
const USAGE_EXIT_CODE: i32 = 2;

#[derive(Parser, Debug)]
#[command(name = "certexpiry", version, about, long_about = None)]
struct Args {
    /// Domain name to check; scheme, path and port suffix are stripped
    domain: Option<String>,

    /// TLS port of the domain (1-65535)
    #[arg(allow_negative_numbers = true)]
    port: Option<i64>,

    /// Output format
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Connect and handshake timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Exit code when a check fails or a certificate has expired
    #[arg(short, long)]
    exit_code: Option<i32>,

    /// Read targets and settings from a TOML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print an example configuration file and exit
    #[arg(long)]
    generate_config: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn usage() -> ! {
    let _ = Args::command().print_help();
    println!();
    exit(USAGE_EXIT_CODE);
}

fn main() {
    let args = Args::parse();

    if args.generate_config {
        println!("{}", Config::example_toml());
        exit(0);
    }

    if let Err(e) = logger::init_logger(args.verbose) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    let file_config = match &args.config {
        Some(path) => match Config::from_file(path) {
            Ok(config) => {
                info!("loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                println!("Failed to load {}: {}", path.display(), e);
                exit(USAGE_EXIT_CODE);
            }
        },
        None => Config::empty(),
    };

    let config = Config::default()
        .merge_with(file_config)
        .merge_with(Config::from_cli_args(
            None,
            args.timeout,
            args.output,
            args.exit_code,
        ));
    if let Err(e) = config.validate() {
        println!("{}", e);
        exit(USAGE_EXIT_CODE);
    }

    let targets = match (&args.domain, args.port) {
        (Some(domain), Some(port)) => Target::new(&clean_hostname(domain), port).map(|t| vec![t]),
        (None, None) if config.targets.is_some() => config.targets(),
        _ => usage(),
    };
    let targets = match targets {
        Ok(targets) if !targets.is_empty() => targets,
        Ok(_) => usage(),
        Err(e) => {
            println!("{}: {}", e.kind(), e);
            exit(USAGE_EXIT_CODE);
        }
    };

    let checker = ExpiryChecker::new().with_timeout(config.timeout_duration());
    debug!("checking {} target(s) with {:?}", targets.len(), checker);

    let outcomes: Vec<CheckOutcome> = targets
        .into_iter()
        .map(|target| {
            info!("checking {}", target);
            let result = checker.report(&target);
            if let Err(e) = &result {
                warn!("{} failed: {}", target, e.kind());
            }
            CheckOutcome { target, result }
        })
        .collect();

    let format = config.output.unwrap_or(OutputFormat::Text);
    print!("{}", output::render(format, &outcomes));

    if outcomes.iter().any(CheckOutcome::is_failure) {
        exit(config.exit_code.unwrap_or(0));
    }
    exit(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_positional_domain_and_port() {
        let args = Args::try_parse_from(["certexpiry", "example.com", "8443"]).unwrap();
        assert_eq!(args.domain.as_deref(), Some("example.com"));
        assert_eq!(args.port, Some(8443));
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_negative_port_reaches_validation() {
        let args = Args::try_parse_from(["certexpiry", "example.com", "-1"]).unwrap();
        assert_eq!(args.port, Some(-1));
    }

    #[test]
    fn test_options() {
        let args = Args::try_parse_from([
            "certexpiry",
            "-o",
            "json",
            "-t",
            "3",
            "-e",
            "4",
            "-vv",
            "--config",
            "certexpiry.toml",
        ])
        .unwrap();
        assert_eq!(args.output, Some(OutputFormat::Json));
        assert_eq!(args.timeout, Some(3));
        assert_eq!(args.exit_code, Some(4));
        assert_eq!(args.verbose, 2);
        assert_eq!(args.config, Some(PathBuf::from("certexpiry.toml")));
        assert!(args.domain.is_none());
    }
}
