use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::config::LegifranceConfig;
use crate::core::watch::{DocumentHit, SearchClient, WatchError};

/// Minimal Légifrance client. It deliberately exposes only the two calls the
/// core layer needs: the OAuth credential exchange and one search request.
pub struct LegifranceApiClient {
    client: Client,
    config: LegifranceConfig,
}

impl LegifranceApiClient {
    pub fn new(client: Client, config: LegifranceConfig) -> Self {
        Self { client, config }
    }
}

#[derive(Debug, Deserialize)]
struct ApiTokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    #[serde(default)]
    results: Vec<ApiDocument>,
}

#[derive(Debug, Deserialize)]
struct ApiDocument {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default, rename = "datePubli")]
    date_publi: String,
}

impl From<ApiDocument> for DocumentHit {
    fn from(api: ApiDocument) -> Self {
        DocumentHit {
            id: api.id,
            title: api.title,
            date_publi: api.date_publi,
        }
    }
}

#[async_trait]
impl SearchClient for LegifranceApiClient {
    /// Exchange the client credentials for a bearer token.
    async fn fetch_token(&self) -> Result<String, WatchError> {
        debug!("Requesting Légifrance access token");

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", "openid legifrance"),
            ])
            .send()
            .await
            .map_err(|e| WatchError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WatchError::Auth(format!(
                "token endpoint returned {}: {}",
                status, text
            )));
        }

        let token: ApiTokenResponse = response
            .json()
            .await
            .map_err(|e| WatchError::Auth(e.to_string()))?;

        Ok(token.access_token)
    }

    /// Run one fixed-shape search: first page of 10 JORF arrêtés matching the
    /// criterion.
    async fn search(&self, criterion: &str, token: &str) -> Result<Vec<DocumentHit>, WatchError> {
        let payload = json!({
            "pageSize": 10,
            "pageNumber": 1,
            "query": criterion,
            "sources": ["JORF"],
            "types": ["ARRETE"],
        });

        debug!(criterion, "Querying Légifrance search endpoint");

        let response = self
            .client
            .post(&self.config.search_url)
            .header("Authorization", format!("Bearer {}", token))
            .json(&payload)
            .send()
            .await
            .map_err(|e| WatchError::Search(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(WatchError::Search(format!(
                "search endpoint returned {}: {}",
                status, text
            )));
        }

        let body: ApiSearchResponse = response
            .json()
            .await
            .map_err(|e| WatchError::Search(e.to_string()))?;

        Ok(body.results.into_iter().map(DocumentHit::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_response() {
        let raw = r#"{"access_token": "abc123", "token_type": "Bearer", "expires_in": 3600}"#;
        let token: ApiTokenResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(token.access_token, "abc123");
    }

    #[test]
    fn parses_search_response_documents() {
        let raw = r#"{
            "totalResultNumber": 2,
            "results": [
                {"id": "JORFTEXT000047", "title": "Arrêté du 12 avril", "datePubli": "2023-04-14T00:00:00"},
                {"id": "JORFTEXT000048", "title": "Arrêté du 13 avril", "datePubli": "2023-04-15"}
            ]
        }"#;
        let body: ApiSearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(body.results.len(), 2);
        assert_eq!(body.results[0].id, "JORFTEXT000047");
        assert_eq!(body.results[0].date_publi, "2023-04-14T00:00:00");
        assert_eq!(body.results[1].title, "Arrêté du 13 avril");
    }

    #[test]
    fn missing_results_array_is_empty() {
        let body: ApiSearchResponse = serde_json::from_str(r#"{"totalResultNumber": 0}"#).unwrap();
        assert!(body.results.is_empty());
    }

    #[test]
    fn missing_document_fields_default_to_empty() {
        let body: ApiSearchResponse =
            serde_json::from_str(r#"{"results": [{"title": "Sans id"}]}"#).unwrap();
        let hit = DocumentHit::from(body.results.into_iter().next().unwrap());
        assert_eq!(hit.id, "");
        assert_eq!(hit.title, "Sans id");
        assert_eq!(hit.date_publi, "");
    }
}
