use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use redirect_resolver::config::{load_config, pattern_warnings, ConfigError, RedirectConfig};
use redirect_resolver::routing::{PublicUrlService, Resolver};
use redirect_resolver::rules::Catalog;

#[derive(Parser)]
#[command(name = "redirect-cli")]
#[command(about = "Inspect and test redirect rules offline", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "redirects.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a request path against the configured rules
    Resolve {
        path: String,
        /// Query string (without '?')
        #[arg(short, long)]
        query: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the configuration and report broken patterns
    Check,
    /// Show the public short URL and target URL of a rule
    PublicUrl { rule: String },
    /// List configured rules
    Rules,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            report_config_error(&cli.config, &e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &RedirectConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let catalog = Catalog::from_config(config);

    match command {
        Commands::Resolve { path, query, json } => {
            let resolver = Resolver::from_catalog(&catalog, &config.resolver);
            let target = resolver.resolve_request(&path, query.as_deref());

            if json {
                let value = json!({
                    "path": path,
                    "resolved": target.is_some(),
                    "action": target.as_ref().map(|t| t.action),
                    "url": target.as_ref().map(|t| t.url.clone()),
                    "dispatch": target.as_ref().map(|t| t.dispatch_uri()),
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                match &target {
                    Some(target) => println!("{}", target),
                    None => println!("no match"),
                }
            }

            Ok(if target.is_some() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
        Commands::Check => {
            let warnings = pattern_warnings(config);
            println!(
                "OK: {} rules, {} sites, {} content entries, {} excludes",
                config.rules.len(),
                config.sites.len(),
                config.content.len(),
                config.resolver.excludes.len()
            );
            for warning in &warnings {
                println!("warning: {}", warning);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::PublicUrl { rule } => {
            let Some(rule) = catalog.snapshot().rule(&rule) else {
                eprintln!("Error: no rule named '{}'", rule);
                return Ok(ExitCode::FAILURE);
            };
            let service = PublicUrlService::new(
                &config.public_url,
                std::sync::Arc::new(catalog.clone()),
                config.resolver.context_path.clone(),
            );
            println!("short:   {}", service.public_redirect_url(&rule));
            println!("target:  {}", service.public_target_url(&rule));
            println!("preview: {}", service.preview_url(&rule));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Rules => {
            for rule in catalog.snapshot().rules() {
                let target = if rule.to_url.is_empty() { &rule.link } else { &rule.to_url };
                println!(
                    "{:<24} {:<10} {:<8} {:<32} -> {}",
                    rule.name,
                    if rule.site.is_empty() { "default" } else { rule.site.as_str() },
                    if rule.use_pattern { "pattern" } else { "exact" },
                    rule.source(),
                    format!("{}{}", rule.action_type().prefix(), target)
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn report_config_error(path: &std::path::Path, error: &ConfigError) {
    eprintln!("Error: cannot load {}", path.display());
    match error {
        ConfigError::Validation(errors) => {
            for e in errors {
                eprintln!("  - {}", e);
            }
        }
        other => eprintln!("  {}", other),
    }
}
