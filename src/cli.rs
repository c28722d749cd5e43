use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::app_state::AppState;
use crate::config_loader::{load_config, DashConfig};
use crate::form_builder::FormEdits;
use crate::log_sink::init_tracing;
use crate::record::FeatureValue;

/// Top-level CLI interface
#[derive(Parser)]
#[command(
    name = "churn_dash",
    version = "0.1.0",
    about = "Customer churn prediction dashboard"
)]
pub struct Cli {
    /// Configuration file (defaults to churn_dash.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the dashboard over HTTP
    Serve {
        /// Host/IP to bind (overrides configuration)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides configuration)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run a single prediction from the default form plus edits
    Predict {
        /// Feature edit as NAME=VALUE, repeatable
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the generated form controls and default record
    Form,

    /// Print model metadata
    ModelInfo,
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

pub fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    init_tracing(&config.log_level);

    let state = AppState::initialize(&config).context("Failed to initialize dashboard state")?;

    match cli.command {
        Commands::Serve { host, port } => serve(&config, Arc::new(state), host, port),
        Commands::Predict { set, json } => {
            let edits: FormEdits = set
                .into_iter()
                .map(|(name, value)| (name, FeatureValue::Text(value)))
                .collect();
            let (cycle, outcome) = state.predict(&edits);
            let result = outcome.context("Prediction failed")?;

            if json {
                let body = serde_json::json!({
                    "requestId": cycle.id,
                    "record": cycle.record(),
                    "rawLabel": result.raw_label,
                    "displayLabel": result.display_label,
                    "isPositiveOutcome": result.is_positive_outcome,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                if let Some(record) = cycle.record() {
                    println!("Input: {}", serde_json::to_string(record)?);
                }
                let framing = if result.is_positive_outcome {
                    "likely to STAY"
                } else {
                    "ALERT: likely to LEAVE"
                };
                println!("Prediction: {} ({framing})", result.display_label);
            }
            Ok(())
        }
        Commands::Form => {
            let body = serde_json::json!({
                "controls": state.form.controls(),
                "defaultRecord": state.form.default_record(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(())
        }
        Commands::ModelInfo => {
            println!("{}", serde_json::to_string_pretty(&state.model_info)?);
            Ok(())
        }
    }
}

fn serve(
    config: &DashConfig,
    state: Arc<AppState>,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let app = crate::web::build_router(state);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    rt.block_on(async move {
        let listener = bind_listener(&host, port).await?;
        tracing::info!("HTTP server listening on http://{}:{}", host, port);
        axum::serve(listener, app).await.context("Server error")
    })
}

/// Bind `host:port`; `host` may be a name such as `localhost`
async fn bind_listener(host: &str, port: u16) -> anyhow::Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {host}:{port}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_predict_assignments() {
        let cli = Cli::try_parse_from([
            "churn_dash",
            "predict",
            "--set",
            "GENDER=F",
            "--set",
            "AGE = 41",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Predict { set, json } => {
                assert!(json);
                assert_eq!(
                    set,
                    vec![
                        ("GENDER".to_string(), "F".to_string()),
                        ("AGE".to_string(), "41".to_string())
                    ]
                );
            }
            _ => panic!("expected predict"),
        }
    }

    #[test]
    fn rejects_assignment_without_name() {
        assert!(parse_assignment("=3").is_err());
        assert!(parse_assignment("AGE").is_err());
    }

    #[tokio::test]
    async fn binds_hostnames_as_well_as_addresses() {
        let listener = bind_listener("localhost", 0).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());

        let listener = bind_listener("127.0.0.1", 0).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from(["churn_dash", "serve", "--port", "9000", "--config", "x.toml"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000), .. }));
    }
}
