use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceBackend {
    Postgres,
    Memory,
}

impl FromStr for SourceBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(SourceBackend::Postgres),
            "memory" => Ok(SourceBackend::Memory),
            other => anyhow::bail!("unknown DATA_SOURCE '{other}', expected postgres or memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: String,
    pub data_source: SourceBackend,
    pub database_url: Option<String>,
    pub fixtures_path: Option<PathBuf>,
    pub simulated_latency: bool,
    pub analysis_pause_ms: u64,
    pub otel_service_name: String,
    pub otel_exporter_endpoint: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let data_source: SourceBackend = var_or("DATA_SOURCE", "postgres").parse()?;
        let database_url = env::var("DATABASE_URL").ok();
        if data_source == SourceBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when DATA_SOURCE is postgres");
        }

        Ok(Self {
            port: var_or("APP_PORT", "8080")
                .parse()
                .context("APP_PORT must be a number")?,
            environment: var_or("SKIP_TRACE_ENVIRONMENT", "development"),
            data_source,
            database_url,
            fixtures_path: env::var("FIXTURES_PATH").ok().map(PathBuf::from),
            simulated_latency: var_or("SIMULATED_LATENCY", "true")
                .parse()
                .context("SIMULATED_LATENCY must be true or false")?,
            analysis_pause_ms: var_or("ANALYSIS_PAUSE_MS", "500")
                .parse()
                .context("ANALYSIS_PAUSE_MS must be a number")?,
            otel_service_name: var_or("OTEL_SERVICE_NAME", "skip-trace"),
            otel_exporter_endpoint: var_or("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
