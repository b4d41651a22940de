use crate::ports::outbound::{PageRequest, TrackingQueries, TrackingService};
use crate::sbom_generation::domain::ExternalProjectId;
use crate::sbom_generation::policies::RetryPolicy;
use crate::shared::error::PipelineError;
use crate::shared::security::{validate_file_size, validate_regular_file, MAX_ARTIFACT_SIZE};
use crate::shared::text::truncate_message;
use crate::shared::Result;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

const API_KEY_HEADER: &str = "X-Api-Key";

#[derive(Debug, Serialize)]
struct CreateProjectRequest<'a> {
    active: bool,
    name: &'a str,
    classifier: &'a str,
    parent: Option<()>,
    tags: Vec<String>,
    version: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateProjectResponse {
    #[serde(default)]
    uuid: Option<String>,
}

/// DependencyTrackClient adapter for the Dependency-Track REST API
///
/// Implements both tracking ports. Mutating calls go through the
/// [`RetryPolicy`]; read-only queries are attempted once.
#[derive(Clone)]
pub struct DependencyTrackClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl DependencyTrackClient {
    /// Creates a client for the service at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the API key is empty or the HTTP client cannot
    /// be built.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        if api_key.trim().is_empty() {
            anyhow::bail!(
                "Dependency-Track API key is not configured\n\n💡 Hint: set tracking.api_key in the config file or the DX_API_KEY environment variable"
            );
        }

        let user_agent = format!("sbom-pipeline/{}", env!("CARGO_PKG_VERSION"));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    /// Sends the request built by `build` until `accept` holds for the
    /// status, the service reports an outage, or attempts run out.
    async fn send_with_retry<F>(
        &self,
        operation: &'static str,
        build: F,
        accept: fn(u16) -> bool,
    ) -> std::result::Result<Response, PipelineError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=self.retry.max_attempts {
            match build().send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if accept(status) {
                        return Ok(response);
                    }

                    let details = error_of(response).await;
                    if RetryPolicy::is_outage(status) {
                        warn!(operation, status, "tracking service outage, not retrying");
                        return Err(PipelineError::RemoteCallFailed { operation, details });
                    }
                    last_error = details;
                }
                Err(e) => {
                    last_error = truncate_message(&e.to_string());
                }
            }

            warn!(operation, attempt, error = %last_error, "tracking service call failed");
            if self.retry.has_attempts_left(attempt) {
                tokio::time::sleep(self.retry.delay).await;
            }
        }

        Err(PipelineError::RemoteCallFailed {
            operation,
            details: last_error,
        })
    }

    /// Single-attempt GET. `None` for any non-200 answer.
    async fn get_json(&self, url: String) -> Result<Option<Value>> {
        let response = self.authorized(self.client.get(&url)).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            debug!(url = %url, status = status.as_u16(), "query returned no data");
            return Ok(None);
        }

        match response.json::<Value>().await {
            Ok(body) => Ok(Some(body)),
            Err(e) => {
                warn!(url = %url, error = %e, "query returned invalid JSON");
                Ok(None)
            }
        }
    }

    fn validate_url_component(component: &str, component_type: &str) -> Result<()> {
        if component.is_empty() {
            anyhow::bail!("{} cannot be empty", component_type);
        }

        if component.contains('/') || component.contains('\\') || component.contains("..") {
            anyhow::bail!(
                "Security: {} contains path characters which are not allowed",
                component_type
            );
        }

        if component.contains('#') || component.contains('?') || component.contains('@') {
            anyhow::bail!(
                "Security: {} contains URL-unsafe characters",
                component_type
            );
        }

        Ok(())
    }
}

/// Status and body text of a failed response, truncated.
async fn error_of(response: Response) -> String {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    truncate_message(&format!("{}: {}", status, body))
}

#[async_trait]
impl TrackingService for DependencyTrackClient {
    async fn create_project(&self, name: &str) -> std::result::Result<ExternalProjectId, PipelineError> {
        let url = self.url("/api/v1/project");
        let payload = CreateProjectRequest {
            active: true,
            name,
            classifier: "LIBRARY",
            parent: None,
            tags: Vec::new(),
            version: "1.0",
        };

        let response = self
            .send_with_retry(
                "create project",
                || self.authorized(self.client.put(&url)).json(&payload),
                |status| status == 201,
            )
            .await?;

        let body: CreateProjectResponse =
            response
                .json()
                .await
                .map_err(|e| PipelineError::RemoteCallFailed {
                    operation: "create project",
                    details: format!("unreadable response: {}", e),
                })?;

        let uuid = body
            .uuid
            .filter(|u| !u.is_empty())
            .ok_or(PipelineError::RemoteCallFailed {
                operation: "create project",
                details: "created project has no uuid".to_string(),
            })?;

        ExternalProjectId::new(uuid).map_err(|e| PipelineError::RemoteCallFailed {
            operation: "create project",
            details: e.to_string(),
        })
    }

    async fn delete_project(&self, id: &ExternalProjectId) -> std::result::Result<(), PipelineError> {
        let url = self.url(&format!("/api/v1/project/{}", urlencoding::encode(id.as_str())));

        self.send_with_retry(
            "delete project",
            || self.authorized(self.client.delete(&url)),
            |status| matches!(status, 200 | 202 | 204 | 404),
        )
        .await?;
        Ok(())
    }

    async fn upload_bom(
        &self,
        artifact: &Path,
        id: &ExternalProjectId,
    ) -> std::result::Result<(), PipelineError> {
        let missing = || PipelineError::ArtifactMissing {
            path: artifact.to_path_buf(),
        };

        if let Err(e) = validate_regular_file(artifact, "BOM artifact") {
            warn!(artifact = %artifact.display(), error = %e, "artifact not uploadable");
            return Err(missing());
        }
        let bytes = tokio::fs::read(artifact).await.map_err(|_| missing())?;
        if let Err(e) = validate_file_size(bytes.len() as u64, artifact, MAX_ARTIFACT_SIZE) {
            warn!(artifact = %artifact.display(), error = %e, "artifact not uploadable");
            return Err(missing());
        }

        let url = self.url("/api/v1/bom");
        let file_name = id.artifact_file_name();
        let form = || {
            let part = Part::bytes(bytes.clone())
                .file_name(file_name.clone())
                .mime_str("application/json")
                .unwrap_or_else(|_| Part::bytes(bytes.clone()).file_name(file_name.clone()));
            Form::new().text("project", id.as_str().to_string()).part("bom", part)
        };

        self.send_with_retry(
            "upload bom",
            || self.authorized(self.client.post(&url)).multipart(form()),
            |status| matches!(status, 200 | 201),
        )
        .await?;

        debug!(project = %id, bytes = bytes.len(), "bom uploaded");
        Ok(())
    }
}

#[async_trait]
impl TrackingQueries for DependencyTrackClient {
    async fn components(
        &self,
        id: &ExternalProjectId,
        search_text: Option<&str>,
        page: PageRequest,
    ) -> Result<Option<Value>> {
        let url = self.url(&format!(
            "/api/v1/component/project/{}?searchText={}&pageSize={}&pageNumber={}",
            urlencoding::encode(id.as_str()),
            urlencoding::encode(search_text.unwrap_or_default()),
            page.page_size,
            page.page_number
        ));
        self.get_json(url).await
    }

    async fn findings(&self, id: &ExternalProjectId, search_text: Option<&str>) -> Result<Option<Value>> {
        let url = self.url(&format!(
            "/api/v1/finding/project/{}?source=NVD&suppressed=false&searchText={}",
            urlencoding::encode(id.as_str()),
            urlencoding::encode(search_text.unwrap_or_default())
        ));
        self.get_json(url).await
    }

    async fn metrics(&self, id: &ExternalProjectId) -> Result<Option<Value>> {
        let url = self.url(&format!(
            "/api/v1/metrics/project/{}/current",
            urlencoding::encode(id.as_str())
        ));
        self.get_json(url).await
    }

    async fn project_graph(&self, id: &ExternalProjectId) -> Result<Option<Value>> {
        let url = self.url(&format!("/api/v1/project/{}", urlencoding::encode(id.as_str())));
        self.get_json(url).await
    }

    async fn component_graph(&self, component_id: &str) -> Result<Option<Value>> {
        Self::validate_url_component(component_id, "Component id")?;
        let url = self.url(&format!(
            "/api/v1/component/{}?includeRepositoryMetaData=true",
            urlencoding::encode(component_id)
        ));
        self.get_json(url).await
    }

    async fn vulnerability(&self, vuln_id: &str) -> Result<Option<Value>> {
        Self::validate_url_component(vuln_id, "Vulnerability id")?;
        let url = self.url(&format!(
            "/api/v1/vulnerability/source/NVD/vuln/{}",
            urlencoding::encode(vuln_id)
        ));
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::fs;
    use tempfile::TempDir;

    const PROJECT_UUID: &str = "0f3c6a52-9d1e-4b7a-8e2f-5c4d3b2a1f00";

    fn client(base_url: &str) -> DependencyTrackClient {
        DependencyTrackClient::new(
            base_url,
            "test-key",
            Duration::from_secs(5),
            RetryPolicy::new(3, Duration::ZERO),
        )
        .unwrap()
    }

    fn project_id() -> ExternalProjectId {
        ExternalProjectId::new(PROJECT_UUID).unwrap()
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let result = DependencyTrackClient::new(
            "http://localhost",
            " ",
            Duration::from_secs(1),
            RetryPolicy::default(),
        );
        assert!(result.err().unwrap().to_string().contains("DX_API_KEY"));
    }

    #[tokio::test]
    async fn test_create_project_returns_uuid() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/v1/project")
            .match_header("x-api-key", "test-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "name": "abc123",
                "classifier": "LIBRARY",
                "version": "1.0",
                "active": true
            })))
            .with_status(201)
            .with_body(format!(r#"{{"uuid":"{}"}}"#, PROJECT_UUID))
            .create_async()
            .await;

        let id = client(&server.url()).create_project("abc123").await.unwrap();
        assert_eq!(id.as_str(), PROJECT_UUID);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_project_retries_transient_failures() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/v1/project")
            .with_status(409)
            .with_body("project already exists")
            .expect(3)
            .create_async()
            .await;

        let err = client(&server.url()).create_project("dup").await.unwrap_err();
        assert_eq!(err.kind(), "RemoteCallFailed");
        assert!(err.to_string().contains("409"));
        assert!(err.to_string().contains("already exists"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_outage_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/api/v1/project")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let err = client(&server.url()).create_project("x").await.unwrap_err();
        assert_eq!(err.kind(), "RemoteCallFailed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_without_uuid_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/api/v1/project")
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        let err = client(&server.url()).create_project("x").await.unwrap_err();
        assert!(err.to_string().contains("no uuid"));
    }

    #[tokio::test]
    async fn test_delete_not_found_is_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", format!("/api/v1/project/{}", PROJECT_UUID).as_str())
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        client(&server.url()).delete_project(&project_id()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_retries_then_fails() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", format!("/api/v1/project/{}", PROJECT_UUID).as_str())
            .with_status(403)
            .expect(3)
            .create_async()
            .await;

        let err = client(&server.url())
            .delete_project(&project_id())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "RemoteCallFailed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_sends_multipart() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/bom")
            .match_header("x-api-key", "test-key")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="project""#.to_string()),
                Matcher::Regex(PROJECT_UUID.to_string()),
                Matcher::Regex(r#"name="bom"; filename=""#.to_string()),
                Matcher::Regex(r#""bomFormat":"CycloneDX""#.to_string()),
            ]))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let artifact = dir.path().join("bom.json");
        fs::write(&artifact, r#"{"bomFormat":"CycloneDX"}"#).unwrap();

        client(&server.url())
            .upload_bom(&artifact, &project_id())
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_missing_artifact_fails_fast() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/bom")
            .expect(0)
            .create_async()
            .await;

        let dir = TempDir::new().unwrap();
        let err = client(&server.url())
            .upload_bom(&dir.path().join("missing.json"), &project_id())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ArtifactMissing");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_components_query() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("/api/v1/component/project/{}", PROJECT_UUID).as_str())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("searchText".into(), "log4j core".into()),
                Matcher::UrlEncoded("pageSize".into(), "20".into()),
                Matcher::UrlEncoded("pageNumber".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"name":"log4j-core"}]"#)
            .create_async()
            .await;

        let page = PageRequest {
            page_number: 2,
            page_size: 20,
        };
        let body = client(&server.url())
            .components(&project_id(), Some("log4j core"), page)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(body[0]["name"], "log4j-core");
    }

    #[tokio::test]
    async fn test_query_non_200_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock(
                "GET",
                format!("/api/v1/metrics/project/{}/current", PROJECT_UUID).as_str(),
            )
            .with_status(401)
            .create_async()
            .await;

        let body = client(&server.url()).metrics(&project_id()).await.unwrap();
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_findings_query_fixed_parameters() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("/api/v1/finding/project/{}", PROJECT_UUID).as_str())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("source".into(), "NVD".into()),
                Matcher::UrlEncoded("suppressed".into(), "false".into()),
            ]))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let body = client(&server.url())
            .findings(&project_id(), None)
            .await
            .unwrap();
        assert_eq!(body, Some(serde_json::json!([])));
    }

    #[tokio::test]
    async fn test_vulnerability_id_is_validated() {
        let err = client("http://127.0.0.1:9")
            .vulnerability("../admin")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Security"));
    }

    #[tokio::test]
    async fn test_component_graph_query() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/component/c-1")
            .match_query(Matcher::UrlEncoded(
                "includeRepositoryMetaData".into(),
                "true".into(),
            ))
            .with_status(200)
            .with_body(r#"{"uuid":"c-1"}"#)
            .create_async()
            .await;

        let body = client(&server.url())
            .component_graph("c-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(body["uuid"], "c-1");
    }
}
