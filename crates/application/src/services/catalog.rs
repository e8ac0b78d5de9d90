//! Lookup lists used to populate filters and forms.

use nimbus_domain::RequestSpec;
use serde_json::Value;

use super::json_body;
use crate::auth::AuthenticatedClient;
use crate::error::ApplicationResult;

/// Read-only reference data.
#[derive(Debug, Clone)]
pub struct Catalog {
    client: AuthenticatedClient,
}

impl Catalog {
    /// Creates a catalog over the given client.
    #[must_use]
    pub const fn new(client: AuthenticatedClient) -> Self {
        Self { client }
    }

    /// Companies.
    ///
    /// # Errors
    ///
    /// Session failures, non-2xx statuses and undecodable bodies.
    pub async fn empresas(&self) -> ApplicationResult<Value> {
        self.fetch("/empresas/", &Value::Null).await
    }

    /// Business areas.
    ///
    /// # Errors
    ///
    /// As [`Self::empresas`].
    pub async fn rubros(&self) -> ApplicationResult<Value> {
        self.fetch("/rubros/", &Value::Null).await
    }

    /// Tasks.
    ///
    /// # Errors
    ///
    /// As [`Self::empresas`].
    pub async fn tareas(&self) -> ApplicationResult<Value> {
        self.fetch("/tareas/", &Value::Null).await
    }

    /// Users assigned to the caller.
    ///
    /// # Errors
    ///
    /// As [`Self::empresas`].
    pub async fn usuarios_asignados(&self) -> ApplicationResult<Value> {
        self.fetch("/usuarios-asignados/", &Value::Null).await
    }

    /// Branches. Unwraps the `results` page when the server paginates.
    ///
    /// # Errors
    ///
    /// As [`Self::empresas`].
    pub async fn sucursales(&self, params: &Value) -> ApplicationResult<Value> {
        let mut data = self.fetch("/sucursales/", params).await?;
        Ok(match data.get_mut("results") {
            Some(results) if !results.is_null() => results.take(),
            _ => data,
        })
    }

    /// Absence reasons.
    ///
    /// # Errors
    ///
    /// As [`Self::empresas`].
    pub async fn motivos_ausencia(&self) -> ApplicationResult<Value> {
        self.fetch("/motivos-ausencia/", &Value::Null).await
    }

    async fn fetch(&self, path: &str, params: &Value) -> ApplicationResult<Value> {
        let request = RequestSpec::get(path).with_params(params);
        json_body(&self.client.send(request).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::auth::{MemoryTokenStore, RefreshConfig, SessionState};
    use crate::ports::Clock;
    use crate::services::testing::ScriptedTransport;
    use chrono::{DateTime, Utc};
    use nimbus_domain::ResponseSpec;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    struct EpochClock;

    impl Clock for EpochClock {
        fn now(&self) -> DateTime<Utc> {
            DateTime::UNIX_EPOCH
        }
    }

    fn catalog(transport: Arc<ScriptedTransport>) -> Catalog {
        let state = Arc::new(SessionState::new(
            Arc::new(MemoryTokenStore::new()),
            Arc::new(EpochClock),
        ));
        Catalog::new(AuthenticatedClient::new(transport, state, RefreshConfig::default()))
    }

    #[tokio::test]
    async fn test_sucursales_unwraps_paginated_results() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push(Ok(ResponseSpec::json(
            200,
            &json!({"count": 1, "results": [{"id": 1, "nombre": "Centro"}]}),
        )));
        transport.push(Ok(ResponseSpec::json(200, &json!([{"id": 2}]))));
        let catalog = catalog(transport.clone());

        let paged = catalog.sucursales(&json!({"page_size": 100})).await.unwrap();
        let plain = catalog.sucursales(&Value::Null).await.unwrap();

        assert_eq!(paged, json!([{"id": 1, "nombre": "Centro"}]));
        assert_eq!(plain, json!([{"id": 2}]));
        assert_eq!(transport.sent()[0].query, vec![("page_size".to_string(), "100".to_string())]);
    }

    #[tokio::test]
    async fn test_lookups_hit_their_endpoints() {
        let transport = Arc::new(ScriptedTransport::default());
        for _ in 0..5 {
            transport.push(Ok(ResponseSpec::json(200, &json!([]))));
        }
        let catalog = catalog(transport.clone());

        catalog.empresas().await.unwrap();
        catalog.rubros().await.unwrap();
        catalog.tareas().await.unwrap();
        catalog.usuarios_asignados().await.unwrap();
        catalog.motivos_ausencia().await.unwrap();

        let paths: Vec<_> = transport.sent().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            ["/empresas/", "/rubros/", "/tareas/", "/usuarios-asignados/", "/motivos-ausencia/"]
        );
        assert!(transport.sent().iter().all(|r| r.bearer().is_none()));
    }
}
