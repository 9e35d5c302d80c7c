//! pg-ai-query - Generate read-only PostgreSQL queries from natural language.

mod cli;

use cli::Cli;
use pg_ai_query::logging::{self, Logger};
use pg_ai_query::{generate_query, Config, GeneratorContext, PgAiError, QueryGenerator, Result};
use tracing::{error, info};

fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<bool> {
    let config_path = cli.config_path();
    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env_defaults();

    if cli.log_file {
        logging::init_file_logging(&config.general.log_level);
    } else {
        logging::init_stderr_logging(&config.general.log_level);
    }
    info!("Loaded config from: {}", config_path.display());

    let mut context = GeneratorContext::from_config(config);
    if let Some(safety) = cli.safety {
        context = context.with_safety(safety);
    }
    if cli.verbose {
        context = context.with_logger(Logger::new(true));
    }

    let generator = QueryGenerator::with_http_clients(context);
    let result = generate_query(&generator, &cli.to_request());

    if cli.json {
        let json = serde_json::to_string_pretty(&result)
            .map_err(|e| PgAiError::internal(format!("Failed to serialize result: {e}")))?;
        println!("{json}");
        return Ok(result.is_success());
    }

    if !result.is_success() {
        eprintln!("Query generation failed: {}", result.error_message());
        return Ok(false);
    }

    println!("{}", result.generated_query());
    if !result.explanation().is_empty() {
        eprintln!("Explanation: {}", result.explanation());
    }
    for warning in result.warnings() {
        eprintln!("Warning: {warning}");
    }

    Ok(true)
}
