//! Wiring and command handlers.

use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use nimbus_application::{
    AuthenticatedClient, ExportService, MemoryTokenStore, NavigationGuard, ResourceService,
    SessionEvent, SessionManager, SessionState, TokenStore,
};
use nimbus_domain::{ExportKind, NavigationDecision, RouteTable, TokenPair};
use nimbus_infrastructure::{
    ClientConfig, FileTokenStore, ReqwestTransport, SystemClock, TracingNotifier,
};
use serde_json::{Map, Value};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{info, warn};

use crate::cli::{Command, Resource};

type CliResult = Result<(), Box<dyn Error>>;

/// The session and everything built on it for one invocation.
pub struct App {
    config: ClientConfig,
    session: Arc<SessionManager>,
    files: Arc<ReqwestTransport>,
    routes: RouteTable,
}

impl App {
    /// Builds the transport, token store and session from `config`.
    pub fn connect(config: ClientConfig) -> Result<Self, Box<dyn Error>> {
        let transport = Arc::new(ReqwestTransport::new(
            &config.base_url,
            config.request_timeout(),
        )?);
        let tokens: Arc<dyn TokenStore> = match config.token_path() {
            Some(path) => Arc::new(FileTokenStore::open(path)?),
            None => {
                warn!("no config directory available, tokens will not be persisted");
                Arc::new(MemoryTokenStore::new())
            }
        };
        let state = Arc::new(SessionState::new(tokens, Arc::new(SystemClock::new())));
        let client = AuthenticatedClient::new(transport.clone(), state, config.refresh_config());

        Ok(Self {
            session: SessionManager::init(client),
            files: transport,
            routes: RouteTable::default(),
            config,
        })
    }

    /// Runs one command.
    pub async fn run(&self, command: Command) -> CliResult {
        let mut events = self.session.state().events();
        let result = self.dispatch(command).await;
        self.session.shutdown();

        // A refresh failure during the command ended the session.
        loop {
            match events.try_recv() {
                Ok(SessionEvent::LoggedOut { reason }) => {
                    if let Some(route) = reason.redirect() {
                        eprintln!("Session ended, redirecting to {route}. Run `nimbus login` to sign in again.");
                    }
                }
                Ok(_) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        result
    }

    async fn dispatch(&self, command: Command) -> CliResult {
        match command {
            Command::Login { access, refresh } => self.login(TokenPair::new(access, refresh)).await,
            Command::Logout => {
                self.session.logout()?;
                println!("Logged out.");
                Ok(())
            }
            Command::Whoami => self.whoami().await,
            Command::Navigate { path } => self.navigate(&path).await,
            Command::Records { resource, params } => self.records(resource, params).await,
            Command::Export {
                kind,
                generate,
                filters,
                output,
            } => self.export(kind, generate, filters, &output).await,
        }
    }

    async fn login(&self, pair: TokenPair) -> CliResult {
        let mut snapshots = self.session.state().subscribe();
        self.session.login(&pair, None)?;
        println!("{}", self.config.branding.banner());

        let loaded = tokio::time::timeout(
            self.config.request_timeout(),
            snapshots.wait_for(|s| s.user.is_some() || !s.is_logged_in),
        )
        .await;
        match self.session.state().user() {
            Some(user) => println!(
                "Logged in as {}",
                user.display_name().unwrap_or_else(|| "unknown user".to_string())
            ),
            None if loaded.is_err() => println!("Logged in; profile not available yet."),
            None => println!("Logged in."),
        }
        Ok(())
    }

    async fn whoami(&self) -> CliResult {
        if !self.session.state().is_logged_in() {
            println!("Not logged in.");
            return Ok(());
        }
        match self.session.load_profile().await? {
            Some(user) => {
                println!(
                    "{}",
                    user.display_name().unwrap_or_else(|| "unknown user".to_string())
                );
                println!("admin: {}", user.is_admin());
            }
            None => println!("Not logged in."),
        }
        Ok(())
    }

    async fn navigate(&self, path: &str) -> CliResult {
        let guard = NavigationGuard::new(self.session.clone(), Arc::new(TracingNotifier));
        let to = self.routes.resolve(path);
        match guard.before_each(to, None).await {
            NavigationDecision::Proceed => println!("{} -> {}", path, to.name),
            NavigationDecision::Redirect { to: redirect } => {
                let target = self.routes.by_name(redirect)?;
                println!("{path} -> redirected to {} ({})", target.name, target.path);
            }
        }
        Ok(())
    }

    async fn records(&self, resource: Resource, params: Vec<(String, String)>) -> CliResult {
        let client = self.session.client().clone();
        let service = match resource {
            Resource::Registros => ResourceService::registros(client),
            Resource::Ausencias => ResourceService::ausencias(client),
            Resource::ControlHoras => ResourceService::control_horas(client),
        };
        let page = service.list(&to_object(params)).await?;
        println!("{}", serde_json::to_string_pretty(&page)?);
        Ok(())
    }

    async fn export(
        &self,
        kind: ExportKind,
        generate: bool,
        filters: Vec<(String, String)>,
        output: &Path,
    ) -> CliResult {
        let service = ExportService::new(self.session.client().clone(), self.files.clone())
            .with_generation_timeout(self.config.generation_timeout());

        if generate {
            info!(export = %kind, "generating spreadsheet");
            service.generate(kind, &to_object(filters)).await?;
        }
        let file = service.download(kind).await?;
        tokio::fs::create_dir_all(output).await?;
        let path = output.join(&file.name);
        tokio::fs::write(&path, &file.bytes).await?;
        println!("Saved {} ({} bytes)", path.display(), file.bytes.len());
        Ok(())
    }
}

/// Builds a JSON object from `key=value` pairs. Values that parse as JSON
/// scalars (`2024`, `true`) keep their type; anything else is a string.
fn to_object(pairs: Vec<(String, String)>) -> Value {
    Value::Object(
        pairs
            .into_iter()
            .map(|(key, raw)| {
                let value = match serde_json::from_str::<Value>(&raw) {
                    Ok(parsed) if !parsed.is_object() && !parsed.is_array() => parsed,
                    _ => Value::String(raw),
                };
                (key, value)
            })
            .collect::<Map<String, Value>>(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_to_object_keeps_scalar_types() {
        let object = to_object(vec![
            ("ano_contable".to_string(), "2024".to_string()),
            ("activo".to_string(), "true".to_string()),
            ("fecha_desde".to_string(), "2024-01-01".to_string()),
            ("nombre".to_string(), "[1]".to_string()),
        ]);

        assert_eq!(
            object,
            json!({
                "ano_contable": 2024,
                "activo": true,
                "fecha_desde": "2024-01-01",
                "nombre": "[1]",
            })
        );
    }
}
