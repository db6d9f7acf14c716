//! Formflow CLI Entry Point
//!
//! Inspects form workflow schemas from the command line: loads and
//! validates a schema, optionally reconciles a record file into it, and
//! prints the flat submission payload.
//!
//! # Usage
//!
//! ```bash
//! # Validate a schema
//! formflow onboarding.yaml
//!
//! # Reconcile a record export against the schema
//! formflow onboarding.yaml --record company.json
//!
//! # Print the submission payload for the reconciled values
//! formflow onboarding.yaml --record company.json --payload
//! ```

use std::env;
use std::fs;
use std::process::ExitCode;

use colored::Colorize;
use log::{error, info};

use formflow::form::{validate_step, FormValueMap};
use formflow::reconcile::{build_payload, reconcile, ExternalRecord};
use formflow::schema::load_schema;
use formflow::{APP_NAME, VERSION};

/// Command-line configuration parsed from arguments.
#[derive(Debug, Default)]
struct Config {
    schema_path: String,
    record_path: Option<String>,
    print_payload: bool,
    strict: bool,
    verbose: bool,
}

/// Configures the logging system with appropriate formatting.
fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| {
            use std::io::Write;

            match record.level() {
                log::Level::Warn | log::Level::Error => {
                    writeln!(buf, "[{}] {}", record.level(), record.args())
                }
                _ => writeln!(buf, "{}", record.args()),
            }
        })
        .init();
}

/// Prints the application banner with version information.
fn print_banner() {
    println!();
    println!("{} v{}", APP_NAME, VERSION);
    println!("Dynamic Form Workflow Engine");
    println!();
}

/// Prints usage information.
fn print_usage() {
    println!("Usage: formflow [OPTIONS] <SCHEMA_FILE>");
    println!();
    println!("Arguments:");
    println!("  <SCHEMA_FILE>    Path to a workflow schema (YAML or JSON)");
    println!();
    println!("Options:");
    println!("  --record FILE    Reconcile a JSON record export into the form");
    println!("  --payload        Print the flat submission payload");
    println!("  --strict         Exit with failure when validation issues remain");
    println!("  --verbose        Enable debug logging");
    println!("  --help           Show this help message");
    println!("  --version        Show version information");
    println!();
    println!("Examples:");
    println!("  formflow onboarding.yaml");
    println!("  formflow onboarding.yaml --record company.json --payload");
}

/// Parses command-line arguments into a Config struct.
fn parse_arguments(args: &[String]) -> Result<Config, String> {
    let mut config = Config::default();
    let mut positional_index = 0;
    let mut i = 1; // Skip program name

    while i < args.len() {
        let arg = &args[i];

        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("{} {}", APP_NAME, VERSION);
                std::process::exit(0);
            }
            "--payload" => {
                config.print_payload = true;
            }
            "--strict" => {
                config.strict = true;
            }
            "--verbose" | "-v" => {
                config.verbose = true;
            }
            "--record" => {
                i += 1;
                if i >= args.len() {
                    return Err("--record requires a file argument".to_string());
                }
                config.record_path = Some(args[i].clone());
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            _ => {
                match positional_index {
                    0 => config.schema_path = arg.clone(),
                    _ => return Err(format!("Unexpected argument: {}", arg)),
                }
                positional_index += 1;
            }
        }
        i += 1;
    }

    if config.schema_path.is_empty() {
        return Err("Missing schema file argument".to_string());
    }

    Ok(config)
}

/// Reads and wraps a record export file.
fn load_record(path: &str) -> Result<ExternalRecord, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Could not read record file '{}': {}", path, e))?;
    let raw: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("Record file '{}' is not valid JSON: {}", path, e))?;
    Ok(ExternalRecord::new(raw))
}

/// Main application entry point.
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    // Parse arguments
    let config = parse_arguments(&args).map_err(|e| {
        eprintln!("Error: {}", e);
        eprintln!();
        print_usage();
        e
    })?;

    // Setup logging
    setup_logging(config.verbose);

    // Print banner
    print_banner();

    // Load schema
    let schema = load_schema(&config.schema_path).map_err(|e| {
        error!("Failed to load schema: {}", e);
        format!("Could not load schema from '{}': {}", config.schema_path, e)
    })?;

    println!(
        "Workflow: {} ({} steps, {} fields)",
        schema.name.bold(),
        schema.steps.len(),
        schema.all_fields().count()
    );

    // Reconcile a record if one was provided
    let mut values = FormValueMap::new();
    if let Some(record_path) = &config.record_path {
        info!("Reconciling record: {}", record_path);
        let record = load_record(record_path)?;
        let report = reconcile(&schema, &record, &mut values);

        println!();
        println!("Reconciliation:");
        for (field_id, rule) in &report.resolved {
            let value = values
                .get(field_id)
                .map(|v| v.display())
                .unwrap_or_default();
            println!(
                "  {} {} = {} ({:?})",
                "+".green(),
                field_id,
                value,
                rule
            );
        }
        for field_id in &report.unmatched_options {
            println!(
                "  {} {} resolved a value outside its options",
                "!".yellow(),
                field_id
            );
        }
        if report.is_empty() {
            println!("  (nothing resolved)");
        }
    }

    // Per-step validation summary
    println!();
    println!("Validation:");
    let mut total_issues = 0;
    for step in &schema.steps {
        let issues = validate_step(step, &values);
        if issues.is_empty() {
            println!("  {} {}. {}", "ok".green(), step.order, step.name);
        } else {
            println!("  {} {}. {}", "!!".red(), step.order, step.name);
            for issue in &issues {
                println!("       {}: {}", issue.field_id, issue.message);
            }
            total_issues += issues.len();
        }
    }

    // Payload output
    if config.print_payload {
        let payload = build_payload(&schema, &values);
        println!();
        println!("Payload:");
        println!("{}", serde_json::to_string_pretty(&payload)?);
    }

    println!();
    if total_issues > 0 {
        println!("{} {} validation issue(s)", "!".yellow(), total_issues);
        if config.strict {
            return Err(format!("{} validation issue(s)", total_issues).into());
        }
    } else {
        println!("{}", "All steps valid".green());
    }

    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!();
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
