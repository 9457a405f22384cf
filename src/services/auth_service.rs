// ============================================================================
// AUTH SERVICE - Máquina de estados de la sesión
// ============================================================================
// Dueño único de la mitad de escritura de la sesión. Las transiciones:
//   Unresolved -> {Unauthenticated, Pending} -> Authenticated
//   Authenticated -> Unauthenticated (logout)
//   Pending -> Unauthenticated (resolución fallida)
// El resto de la app solo lee la sesión a través de SessionReader.
// ============================================================================

use crate::services::account_api;
use crate::services::api_client::UnaryClient;
use crate::services::push_service;
use crate::services::rpc_error::{RpcCode, RpcError};
use crate::services::secure_store::{read_or_absent, KeyValueStore};
use crate::state::session_state::{Session, SessionCell, SessionReader};
use crate::utils::constants::SESSION_TOKEN_KEY;

pub struct AuthService<C: UnaryClient, S: KeyValueStore> {
    session: SessionCell,
    client: C,
    store: S,
}

impl<C: UnaryClient, S: KeyValueStore> AuthService<C, S> {
    /// La celda se crea en el bootstrap (el transporte necesita el reader
    /// antes de que exista el servicio) y la mitad de escritura queda acá.
    pub fn new(session: SessionCell, client: C, store: S) -> Self {
        Self {
            session,
            client,
            store,
        }
    }

    pub fn reader(&self) -> SessionReader {
        self.session.reader()
    }

    /// Resuelve la sesión guardada al arranque. Idempotente: solo opera
    /// desde `Unresolved`; llamadas repetidas son no-op.
    pub async fn resolve_stored_session(&self) {
        if self.session.snapshot() != Session::Unresolved {
            log::warn!("⚠️ resolve_stored_session called more than once, ignoring");
            return;
        }

        let token = read_or_absent(&self.store, SESSION_TOKEN_KEY).filter(|t| !t.is_empty());
        let Some(token) = token else {
            log::info!("ℹ️ No stored session token");
            self.session.set(Session::Unauthenticated);
            return;
        };

        self.session.set(Session::Pending {
            token: token.clone(),
        });

        // El bearer viaja solo: el transporte lee el token del estado Pending
        match account_api::get_me(&self.client).await {
            Ok(me) => {
                log::info!("✅ Stored session resolved for user {}", me.id);
                self.session.set(Session::Authenticated {
                    token,
                    user_id: me.id,
                });
                self.register_push().await;
            }
            Err(e) if e.is_unauthenticated() => {
                // Token muerto: se limpia el slot persistido
                log::warn!("⚠️ Stored token rejected by the server, clearing it");
                if let Err(err) = self.store.remove(SESSION_TOKEN_KEY) {
                    log::warn!("⚠️ Could not clear stored token: {}", err);
                }
                self.session.set(Session::Unauthenticated);
            }
            Err(e) => {
                // Fallo de transporte: el token queda guardado para que el
                // próximo arranque reintente la resolución
                log::warn!("⚠️ Could not resolve stored session: {}", e);
                self.session.set(Session::Unauthenticated);
            }
        }
    }

    /// Login con email/contraseña. El token se persiste recién cuando el
    /// "quién soy" posterior confirma la identidad. Los errores vuelven como
    /// código estructurado, nunca cruzan el borde como excepción.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), RpcError> {
        if !matches!(self.session.snapshot(), Session::Unauthenticated) {
            return Err(RpcError::new(
                RpcCode::FailedPrecondition,
                "login requires an unauthenticated session",
            ));
        }

        let response = match account_api::login(&self.client, email, password).await {
            Ok(response) => response,
            Err(e) => {
                // Credenciales inválidas o red caída: seguimos Unauthenticated
                log::error!("❌ Login failed: {}", e);
                return Err(e);
            }
        };

        let token = response.session_id;
        self.session.set(Session::Pending {
            token: token.clone(),
        });

        match account_api::get_me(&self.client).await {
            Ok(me) => {
                if let Err(e) = self.store.set(SESSION_TOKEN_KEY, &token) {
                    log::warn!("⚠️ Could not persist session token: {}", e);
                }
                log::info!("✅ Login OK: user {}", me.id);
                self.session.set(Session::Authenticated {
                    token,
                    user_id: me.id,
                });
                self.register_push().await;
                Ok(())
            }
            Err(e) => {
                log::error!("❌ Identity fetch after login failed: {}", e);
                self.session.set(Session::Unauthenticated);
                Err(e)
            }
        }
    }

    /// Logout incondicional desde cualquier estado
    pub fn logout(&self) {
        if let Err(e) = self.store.remove(SESSION_TOKEN_KEY) {
            log::warn!("⚠️ Could not clear stored token: {}", e);
        }
        log::info!("👋 Logout");
        self.session.set(Session::Unauthenticated);
    }

    /// Registro push: best-effort, jamás bloquea la autenticación
    async fn register_push(&self) {
        push_service::register_web_device(&self.client, &self.store).await;
    }
}
