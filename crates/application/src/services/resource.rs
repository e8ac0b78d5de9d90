//! CRUD access to one API collection.

use nimbus_domain::RequestSpec;
use serde_json::Value;

use super::{ensure_success, json_body};
use crate::auth::AuthenticatedClient;
use crate::error::ApplicationResult;

const CONTROL_HORAS_READ_ONLY: &[&str] = &["id", "created_at", "updated_at", "intervalo_tiempo"];

/// A REST collection such as `/registros/`.
///
/// Fields listed as read-only are stripped from create and update
/// payloads.
#[derive(Debug, Clone)]
pub struct ResourceService {
    client: AuthenticatedClient,
    collection: &'static str,
    read_only: &'static [&'static str],
}

impl ResourceService {
    /// Creates a service for an arbitrary collection path.
    #[must_use]
    pub const fn new(
        client: AuthenticatedClient,
        collection: &'static str,
        read_only: &'static [&'static str],
    ) -> Self {
        Self {
            client,
            collection,
            read_only,
        }
    }

    /// Work records.
    #[must_use]
    pub const fn registros(client: AuthenticatedClient) -> Self {
        Self::new(client, "/registros/", &[])
    }

    /// Absences.
    #[must_use]
    pub const fn ausencias(client: AuthenticatedClient) -> Self {
        Self::new(client, "/ausencias/", &[])
    }

    /// Time control entries.
    #[must_use]
    pub const fn control_horas(client: AuthenticatedClient) -> Self {
        Self::new(client, "/control-horas/", CONTROL_HORAS_READ_ONLY)
    }

    /// Collection path.
    #[must_use]
    pub const fn collection(&self) -> &'static str {
        self.collection
    }

    /// Lists the collection, filtered by the scalar entries of `params`.
    ///
    /// # Errors
    ///
    /// Session failures, non-2xx statuses and undecodable bodies.
    pub async fn list(&self, params: &Value) -> ApplicationResult<Value> {
        let request = RequestSpec::get(self.collection).with_params(params);
        json_body(&self.client.send(request).await?)
    }

    /// Fetches one item.
    ///
    /// # Errors
    ///
    /// As [`Self::list`].
    pub async fn get(&self, id: u64) -> ApplicationResult<Value> {
        json_body(&self.client.send(RequestSpec::get(self.item(id))).await?)
    }

    /// Creates an item.
    ///
    /// # Errors
    ///
    /// As [`Self::list`].
    pub async fn create(&self, data: Value) -> ApplicationResult<Value> {
        let request = RequestSpec::post(self.collection, self.writable(data));
        json_body(&self.client.send(request).await?)
    }

    /// Replaces an item.
    ///
    /// # Errors
    ///
    /// As [`Self::list`].
    pub async fn update(&self, id: u64, data: Value) -> ApplicationResult<Value> {
        let request = RequestSpec::put(self.item(id), self.writable(data));
        json_body(&self.client.send(request).await?)
    }

    /// Partially updates an item.
    ///
    /// # Errors
    ///
    /// As [`Self::list`].
    pub async fn patch(&self, id: u64, data: Value) -> ApplicationResult<Value> {
        let request = RequestSpec::patch(self.item(id), self.writable(data));
        json_body(&self.client.send(request).await?)
    }

    /// Deletes an item.
    ///
    /// # Errors
    ///
    /// Session failures and non-2xx statuses.
    pub async fn delete(&self, id: u64) -> ApplicationResult<()> {
        let response = self.client.send(RequestSpec::delete(self.item(id))).await?;
        ensure_success(&response)
    }

    fn item(&self, id: u64) -> String {
        format!("{}{id}/", self.collection)
    }

    fn writable(&self, mut data: Value) -> Value {
        if let Value::Object(map) = &mut data {
            for field in self.read_only {
                map.remove(*field);
            }
        }
        data
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::auth::{MemoryTokenStore, RefreshConfig, SessionState};
    use crate::error::ApplicationError;
    use crate::ports::Clock;
    use crate::services::testing::ScriptedTransport;
    use chrono::{DateTime, Utc};
    use nimbus_domain::{HttpMethod, ResponseSpec, TokenPair};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    struct EpochClock;

    impl Clock for EpochClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::UNIX_EPOCH
        }
    }

    fn client(transport: Arc<ScriptedTransport>) -> AuthenticatedClient {
        let store = Arc::new(MemoryTokenStore::with_pair(&TokenPair::new("a1", "r1")));
        let state = Arc::new(SessionState::new(store, Arc::new(EpochClock)));
        AuthenticatedClient::new(transport, state, RefreshConfig::default())
    }

    #[tokio::test]
    async fn test_list_sends_filters_and_bearer() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Ok(ResponseSpec::json(200, &json!({"count": 0, "results": []}))));
        let service = ResourceService::registros(client(transport.clone()));

        let page = service
            .list(&json!({"page": 2, "fecha_desde": "2024-01-01", "activo": null}))
            .await
            .unwrap();

        assert_eq!(page["count"], 0);
        let sent = &transport.sent()[0];
        assert_eq!(sent.path, "/registros/");
        assert_eq!(
            sent.query,
            vec![
                ("fecha_desde".to_string(), "2024-01-01".to_string()),
                ("page".to_string(), "2".to_string()),
            ]
        );
        assert_eq!(sent.bearer(), Some("a1"));
    }

    #[tokio::test]
    async fn test_control_horas_strips_read_only_fields() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Ok(ResponseSpec::json(200, &json!({"id": 7}))));
        let service = ResourceService::control_horas(client(transport.clone()));

        service
            .update(
                7,
                json!({
                    "id": 7,
                    "fecha": "2024-05-02",
                    "created_at": "x",
                    "updated_at": "y",
                    "intervalo_tiempo": "01:00:00",
                }),
            )
            .await
            .unwrap();

        let sent = &transport.sent()[0];
        assert_eq!(sent.method, HttpMethod::Put);
        assert_eq!(sent.path, "/control-horas/7/");
        assert_eq!(sent.body, Some(json!({"fecha": "2024-05-02"})));
    }

    #[tokio::test]
    async fn test_registros_keep_all_fields() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Ok(ResponseSpec::json(201, &json!({"id": 1}))));
        let service = ResourceService::registros(client(transport.clone()));

        service.create(json!({"id": 1, "tarea": 3})).await.unwrap();

        assert_eq!(transport.sent()[0].body, Some(json!({"id": 1, "tarea": 3})));
    }

    #[tokio::test]
    async fn test_delete_accepts_empty_no_content() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Ok(ResponseSpec::new(204, Default::default(), Vec::new(), Default::default())));
        let service = ResourceService::ausencias(client(transport.clone()));

        service.delete(4).await.unwrap();

        assert_eq!(transport.sent()[0].path, "/ausencias/4/");
        assert_eq!(transport.sent()[0].method, HttpMethod::Delete);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Ok(ResponseSpec::json(400, &json!({"fecha": ["required"]}))));
        let service = ResourceService::registros(client(transport));

        let err = service.create(json!({})).await.unwrap_err();

        match err {
            ApplicationError::Status { status, body } => {
                assert_eq!(status, 400);
                assert!(body.contains("required"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
