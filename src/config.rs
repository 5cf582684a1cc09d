// Configuration is loaded once at startup and passed down explicitly; there is
// no global mutable state.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_GRIST_BASE_URL: &str = "https://grist.numerique.gouv.fr";
const DEFAULT_SEARCH_TABLE: &str = "Recherche";
const DEFAULT_RESULTS_TABLE: &str = "Resultats";

const DEFAULT_TOKEN_URL: &str = "https://oauth.aife.economie.gouv.fr/api/oauth/token";
const DEFAULT_SEARCH_URL: &str =
    "https://api.aife.economie.gouv.fr/dila/legifrance/lf-engine-app/consult/search";

/// Pause between consecutive result-row inserts, in milliseconds.
const DEFAULT_INSERT_DELAY_MS: u64 = 500;

/// Grist connection details: which document, which tables, and the API key.
#[derive(Debug, Clone)]
pub struct GristConfig {
    pub api_key: String,
    pub base_url: String,
    pub doc_id: String,
    pub search_table: String,
    pub results_table: String,
}

impl GristConfig {
    /// Base URL for record calls against the configured document.
    pub fn doc_url(&self) -> String {
        format!(
            "{}/api/docs/{}",
            self.base_url.trim_end_matches('/'),
            self.doc_id
        )
    }
}

/// Légifrance OAuth credentials and endpoints.
#[derive(Debug, Clone)]
pub struct LegifranceConfig {
    pub client_id: String,
    pub client_secret: String,
    pub token_url: String,
    pub search_url: String,
}

/// Everything the job needs, assembled from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub grist: GristConfig,
    pub legifrance: LegifranceConfig,
    pub insert_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let grist = GristConfig {
            api_key: required("GRIST_API_KEY")?,
            base_url: optional("GRIST_BASE_URL", DEFAULT_GRIST_BASE_URL),
            doc_id: required("GRIST_DOC_ID")?,
            search_table: optional("GRIST_SEARCH_TABLE", DEFAULT_SEARCH_TABLE),
            results_table: optional("GRIST_TABLE", DEFAULT_RESULTS_TABLE),
        };

        let legifrance = LegifranceConfig {
            client_id: required("LEGIFRANCE_CLIENT_ID")?,
            client_secret: required("LEGIFRANCE_CLIENT_SECRET")?,
            token_url: optional("LEGIFRANCE_TOKEN_URL", DEFAULT_TOKEN_URL),
            search_url: optional("LEGIFRANCE_SEARCH_URL", DEFAULT_SEARCH_URL),
        };

        let insert_delay = env::var("INSERT_DELAY_MS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_INSERT_DELAY_MS));

        Ok(Self {
            grist,
            legifrance,
            insert_delay,
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("Missing {name} environment variable"))
}

fn optional(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}
