//! Spreadsheet exports.

use std::sync::Arc;
use std::time::Duration;

use nimbus_domain::{DomainError, ExportInfo, ExportKind, RequestSpec, ResponseType};
use serde_json::Value;
use tracing::{info, warn};

use super::{ensure_success, json_body};
use crate::auth::{AuthenticatedClient, SessionError};
use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::HttpTransport;

/// Default bound for document generation.
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// A downloaded spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// File name, always ending in `.xlsx`
    pub name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

/// Fetches, downloads and regenerates report spreadsheets.
///
/// Generated files are static assets served from absolute URLs, so the
/// download goes through a plain transport without credentials.
#[derive(Clone)]
pub struct ExportService {
    client: AuthenticatedClient,
    files: Arc<dyn HttpTransport>,
    generation_timeout: Duration,
}

impl ExportService {
    /// Creates a service. `files` is used only for the file download.
    #[must_use]
    pub fn new(client: AuthenticatedClient, files: Arc<dyn HttpTransport>) -> Self {
        Self {
            client,
            files,
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
        }
    }

    /// Overrides the generation bound.
    #[must_use]
    pub const fn with_generation_timeout(mut self, timeout: Duration) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Describes the most recently generated file.
    ///
    /// # Errors
    ///
    /// Session failures, non-2xx statuses and undecodable bodies.
    pub async fn info(&self, kind: ExportKind) -> ApplicationResult<ExportInfo> {
        let body = json_body(&self.client.send(RequestSpec::get(kind.info_path())).await?)?;
        serde_json::from_value(body).map_err(|e| DomainError::InvalidPayload(e.to_string()).into())
    }

    /// Downloads the most recently generated file.
    ///
    /// # Errors
    ///
    /// `MissingExportFile` when the description has no URL, plus the
    /// errors of [`Self::info`] and of the download itself.
    pub async fn download(&self, kind: ExportKind) -> ApplicationResult<DownloadedFile> {
        let info = self.info(kind).await?;
        let Some(url) = info.file_url() else {
            warn!(export = %kind, "export description has no file URL");
            return Err(ApplicationError::MissingExportFile(kind));
        };

        info!(export = %kind, url, "downloading export");
        let request = RequestSpec::get(url).with_response_type(ResponseType::Bytes);
        let response = self.files.execute(&request).await?;
        ensure_success(&response)?;

        Ok(DownloadedFile {
            name: info.file_name(kind),
            bytes: response.body,
        })
    }

    /// Asks the server to generate a new file with the given filters.
    ///
    /// # Errors
    ///
    /// `GenerationTimeout` when the call exceeds the generation bound,
    /// otherwise as [`Self::info`].
    pub async fn generate(&self, kind: ExportKind, filters: &Value) -> ApplicationResult<Value> {
        let request = RequestSpec::post(kind.generate_path(), filters.clone())
            .with_timeout(self.generation_timeout);
        info!(export = %kind, "requesting export generation");

        match self.client.send(request).await {
            Ok(response) => json_body(&response),
            Err(SessionError::Timeout { timeout_ms }) => {
                warn!(export = %kind, timeout_ms, "export generation timed out");
                Err(ApplicationError::GenerationTimeout { timeout_ms })
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl std::fmt::Debug for ExportService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportService")
            .field("generation_timeout", &self.generation_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::{MemoryTokenStore, RefreshConfig, SessionState};
    use crate::ports::{Clock, HttpClientError};
    use crate::services::testing::ScriptedTransport;
    use chrono::{DateTime, Utc};
    use nimbus_domain::{HttpMethod, ResponseSpec, TokenPair};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;

    struct EpochClock;

    impl Clock for EpochClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::UNIX_EPOCH
        }
    }

    struct Fixture {
        api: Arc<ScriptedTransport>,
        files: Arc<ScriptedTransport>,
        service: ExportService,
    }

    fn fixture() -> Fixture {
        let api = Arc::new(ScriptedTransport::default());
        let files = Arc::new(ScriptedTransport::default());
        let store = Arc::new(MemoryTokenStore::with_pair(&TokenPair::new("a1", "r1")));
        let state = Arc::new(SessionState::new(store, Arc::new(EpochClock)));
        let client = AuthenticatedClient::new(api.clone(), state, RefreshConfig::default());
        let service = ExportService::new(client, files.clone());
        Fixture { api, files, service }
    }

    fn file(bytes: &[u8]) -> ResponseSpec {
        ResponseSpec::new(200, BTreeMap::new(), bytes.to_vec(), Duration::ZERO)
    }

    #[tokio::test]
    async fn test_download_uses_fallback_url_without_bearer() {
        let f = fixture();
        f.api.push(Ok(ResponseSpec::json(
            200,
            &json!({"archivo": "https://cdn.example.com/r.xlsx", "nombre": "informe"}),
        )));
        f.files.push(Ok(file(b"PK")));

        let downloaded = f.service.download(ExportKind::Registros).await.unwrap();

        assert_eq!(downloaded.name, "informe.xlsx");
        assert_eq!(downloaded.bytes, b"PK");
        let sent = &f.files.sent()[0];
        assert_eq!(sent.path, "https://cdn.example.com/r.xlsx");
        assert_eq!(sent.bearer(), None);
        assert_eq!(sent.response_type, ResponseType::Bytes);
        assert_eq!(f.api.sent()[0].path, "/excel/registros/");
        assert_eq!(f.api.sent()[0].bearer(), Some("a1"));
    }

    #[tokio::test]
    async fn test_download_prefers_file_url_and_default_name() {
        let f = fixture();
        f.api.push(Ok(ResponseSpec::json(
            200,
            &json!({"file_url": "https://a/1.xlsx", "file": "https://a/2.xlsx"}),
        )));
        f.files.push(Ok(file(b"x")));

        let downloaded = f.service.download(ExportKind::ControlHoras).await.unwrap();

        assert_eq!(f.files.sent()[0].path, "https://a/1.xlsx");
        assert_eq!(downloaded.name, "control_horas.xlsx");
    }

    #[tokio::test]
    async fn test_download_without_url_fails() {
        let f = fixture();
        f.api.push(Ok(ResponseSpec::json(200, &json!({"nombre": "x"}))));

        let err = f.service.download(ExportKind::Ausencias).await.unwrap_err();

        assert!(matches!(err, ApplicationError::MissingExportFile(ExportKind::Ausencias)));
        assert!(f.files.sent().is_empty());
    }

    #[tokio::test]
    async fn test_generate_uses_long_timeout() {
        let f = fixture();
        f.api.push(Ok(ResponseSpec::json(200, &json!({"status": "ok"}))));

        let body = f
            .service
            .generate(ExportKind::Registros, &json!({"ano_contable": 2024}))
            .await
            .unwrap();

        assert_eq!(body, json!({"status": "ok"}));
        let sent = &f.api.sent()[0];
        assert_eq!(sent.method, HttpMethod::Post);
        assert_eq!(sent.path, "/excel/registros/generar/");
        assert_eq!(sent.timeout, Some(DEFAULT_GENERATION_TIMEOUT));
        assert_eq!(sent.body, Some(json!({"ano_contable": 2024})));
    }

    #[tokio::test]
    async fn test_generate_timeout_is_reported_as_generation_timeout() {
        let f = fixture();
        f.api.push(Err(HttpClientError::Timeout { timeout_ms: 120_000 }));

        let err = f
            .service
            .generate(ExportKind::Ausencias, &json!({}))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        match err {
            ApplicationError::GenerationTimeout { timeout_ms } => assert_eq!(timeout_ms, 120_000),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
