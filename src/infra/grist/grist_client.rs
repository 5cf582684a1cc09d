use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::GristConfig;
use crate::core::watch::{RecordStore, ResultRecord, SearchRequest, WatchError};

/// Trigger column in the requests table. Set to true by the user to ask for a
/// run, cleared by us once the run is over.
const TRIGGER_FIELD: &str = "Soumettre";

/// Free-text criterion column in the requests table.
const CRITERION_FIELD: &str = "Critere";

/// Grist REST client covering the three record operations the core layer
/// needs: list, insert, and patch.
pub struct GristApiClient {
    client: Client,
    config: GristConfig,
}

impl GristApiClient {
    pub fn new(client: Client, config: GristConfig) -> Self {
        Self { client, config }
    }

    fn records_url(&self, table: &str) -> String {
        format!("{}/tables/{}/records", self.config.doc_url(), table)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.config.api_key)
    }
}

#[derive(Debug, Deserialize)]
struct ApiRecordList {
    #[serde(default)]
    records: Vec<ApiRecord>,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    id: u64,
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
}

/// First record whose trigger field is true, mapped to the domain request.
/// A flagged row without a criterion yields an empty criterion.
fn find_active(records: Vec<ApiRecord>) -> Option<SearchRequest> {
    records
        .into_iter()
        .find(|record| record.fields.get(TRIGGER_FIELD).and_then(Value::as_bool) == Some(true))
        .map(|record| SearchRequest {
            row_id: record.id,
            criterion: record
                .fields
                .get(CRITERION_FIELD)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
}

/// Map a domain record onto the results table's column names. The columns the
/// search response cannot fill carry fixed placeholders.
fn result_fields(record: &ResultRecord) -> Value {
    json!({
        "Critere de recherche": record.criterion,
        "Titre du document": record.title,
        "Date de publication": record.publication_date,
        "Source (URL PDF ou Legifrance)": record.source_url,
        "Type d’habilitation repérée": record.habilitation,
        "Région si mentionnée": record.region,
        "Validité estimée (année de fin)": record.validity_year,
    })
}

/// Grist answers record writes with 200 or 201 depending on the deployment.
fn is_write_success(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 200 | 201)
}

#[async_trait]
impl RecordStore for GristApiClient {
    async fn find_pending_request(&self) -> Result<Option<SearchRequest>, WatchError> {
        let url = self.records_url(&self.config.search_table);
        debug!("Reading request records from {url}");

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| WatchError::Store(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WatchError::Store(format!(
                "request table read returned {}: {}",
                status, text
            )));
        }

        let list: ApiRecordList = response
            .json()
            .await
            .map_err(|e| WatchError::Store(e.to_string()))?;

        Ok(find_active(list.records))
    }

    async fn insert_result(&self, record: &ResultRecord) -> Result<(), WatchError> {
        let payload = json!({
            "records": [{ "fields": result_fields(record) }]
        });

        let response = self
            .client
            .post(self.records_url(&self.config.results_table))
            .header("Authorization", self.bearer())
            .json(&payload)
            .send()
            .await
            .map_err(|e| WatchError::Store(e.to_string()))?;

        if !is_write_success(response.status()) {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WatchError::Store(format!(
                "insert returned {}: {}",
                status, text
            )));
        }

        Ok(())
    }

    async fn reset_trigger(&self, row_id: u64) -> Result<(), WatchError> {
        let payload = json!({
            "records": [{ "id": row_id, "fields": { (TRIGGER_FIELD): false } }]
        });

        let response = self
            .client
            .patch(self.records_url(&self.config.search_table))
            .header("Authorization", self.bearer())
            .json(&payload)
            .send()
            .await
            .map_err(|e| WatchError::Store(e.to_string()))?;

        if !is_write_success(response.status()) {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WatchError::Store(format!(
                "trigger reset returned {}: {}",
                status, text
            )));
        }

        Ok(())
    }
}
