use anyhow::Context;
use anyhow::Result;
use clap::Arg;
use clap::ArgAction;
use clap::ArgMatches;
use clap::Command;
use clap::ValueHint;
use log::LevelFilter;
use sitesheet::EngineConfig;
use sitesheet::MissingInputPolicy;
use sitesheet::Mode;
use sitesheet::Payload;
use sitesheet::ReportEngine;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("SITESHEET_LOG", "error,sitesheet=info"))
        .init();

    let matches = Command::new("sitesheet")
        .version(clap::crate_version!())
        .about("Fills the site report template with a daily report and its photo reference pages")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("generate")
                .about("Generate an .xlsx document from a JSON request")
                .arg(
                    Arg::new("input")
                        .help("JSON request, either {\"mode\": ..., \"data\": {...}} or a bare data object")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("mode")
                        .short('m')
                        .long("mode")
                        .help("Sheets to produce. Overrides the mode given in the request.")
                        .value_parser(["report", "reference", "combined"]),
                )
                .arg(
                    Arg::new("template")
                        .short('t')
                        .long("template")
                        .help("Template workbook. Overrides template_path of the configuration file.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help("Engine configuration file (JSON)")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("output_file")
                        .short('o')
                        .long("output")
                        .help("Where to write the document. Defaults to the download name of the mode.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("reject_missing")
                        .long("reject-missing")
                        .help("Fail instead of filling a best-effort document when required input is missing")
                        .action(ArgAction::SetTrue),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("generate", generate_matches)) => handle_generate(generate_matches),
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

/// Builds the engine configuration: file first, then command line overrides
fn load_config(matches: &ArgMatches) -> Result<EngineConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            log::info!("Using config: {}", path.display());
            EngineConfig::from_file(path)?
        }
        None => EngineConfig::default(),
    };
    if let Some(template) = matches.get_one::<PathBuf>("template") {
        config.template_path = template.clone();
    }
    if matches.get_flag("reject_missing") {
        config.missing_input = MissingInputPolicy::Reject;
    }
    Ok(config)
}

fn handle_generate(matches: &ArgMatches) -> Result<()> {
    let config = load_config(matches)?;

    let input_path: &PathBuf = matches
        .get_one("input")
        .context("Missing input file")?;
    let mode = matches
        .get_one::<String>("mode")
        .map(|mode| mode.parse::<Mode>())
        .transpose()?;
    let json = std::fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read request '{}'", input_path.display()))?;
    let payload = Payload::from_json(&json, mode)
        .with_context(|| format!("Failed to parse request '{}'", input_path.display()))?;

    let output_path = matches
        .get_one::<PathBuf>("output_file")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(payload.mode.download_name()));

    let engine = ReportEngine::new(config);
    match engine.generate(&payload) {
        Ok(bytes) => {
            std::fs::write(&output_path, &bytes)
                .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
            log::info!("Wrote {} document to {} ({} bytes)", payload.mode, output_path.display(), bytes.len());
            Ok(())
        }
        Err(e) => {
            log::error!("Generation failed: {:#}", e);
            std::process::exit(1)
        }
    }
}
