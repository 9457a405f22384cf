// ============================================================================
// API CLIENT - Transporte RPC unario (stateless)
// ============================================================================
// NO tiene lógica de negocio: POST JSON a {base_url}{method}. El token se lee
// de la sesión EN CADA llamada (no en la construcción), así una rotación de
// token aplica a la llamada siguiente sin reconstruir el cliente.
// ============================================================================

use gloo_net::http::Request;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::CONFIG;
use crate::services::rpc_error::{RpcCode, RpcError};
use crate::state::session_state::SessionReader;

/// Seam del transporte: una llamada unaria por método RPC.
#[allow(async_fn_in_trait)]
pub trait UnaryClient {
    async fn unary(&self, method: &'static str, request: Value) -> Result<Value, RpcError>;
}

/// Cliente HTTP real sobre fetch (gloo)
#[derive(Clone)]
pub struct HttpClient {
    base_url: String,
    session: SessionReader,
}

impl HttpClient {
    pub fn new(session: SessionReader) -> Self {
        Self {
            base_url: CONFIG.api_base_url().to_string(),
            session,
        }
    }

    pub fn with_base_url(base_url: impl Into<String>, session: SessionReader) -> Self {
        Self {
            base_url: base_url.into(),
            session,
        }
    }
}

impl UnaryClient for HttpClient {
    async fn unary(&self, method: &'static str, request: Value) -> Result<Value, RpcError> {
        let url = format!("{}{}", self.base_url, method);

        let mut builder = Request::post(&url).header("Content-Type", "application/json");
        // Interceptor de credenciales: token vigente al momento de la llamada
        if let Some(token) = self.session.token() {
            builder = builder.header("Authorization", &format!("Bearer {}", token));
        }

        let response = builder
            .json(&request)
            .map_err(|e| RpcError::new(RpcCode::Internal, format!("request build error: {}", e)))?
            .send()
            .await
            .map_err(|e| RpcError::transport(format!("network error: {}", e)))?;

        if response.ok() {
            response
                .json::<Value>()
                .await
                .map_err(|e| RpcError::new(RpcCode::Internal, format!("parse error: {}", e)))
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(RpcError::from_response_body(status, &body))
        }
    }
}

/// Decodifica una respuesta JSON al modelo tipado
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, RpcError> {
    serde_json::from_value(value)
        .map_err(|e| RpcError::new(RpcCode::Internal, format!("response decode error: {}", e)))
}

/// Codifica un request tipado a JSON
pub fn encode<T: serde::Serialize>(request: &T) -> Result<Value, RpcError> {
    serde_json::to_value(request)
        .map_err(|e| RpcError::new(RpcCode::Internal, format!("request encode error: {}", e)))
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    type Responses = HashMap<&'static str, Vec<Result<Value, RpcError>>>;

    /// Cliente de mentira: respuestas pre-programadas por método + registro
    /// de las llamadas hechas (método, request, header de autorización).
    #[derive(Clone, Default)]
    pub struct MockClient {
        responses: Rc<RefCell<Responses>>,
        pub calls: Rc<RefCell<Vec<RecordedCall>>>,
        session: Option<SessionReader>,
    }

    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub method: &'static str,
        pub request: Value,
        pub bearer: Option<String>,
    }

    impl MockClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// El mock imita al interceptor real: lee el token de la sesión en
        /// cada llamada y lo deja registrado.
        pub fn with_session(session: SessionReader) -> Self {
            Self {
                session: Some(session),
                ..Self::default()
            }
        }

        pub fn respond(&self, method: &'static str, response: Result<Value, RpcError>) {
            self.responses
                .borrow_mut()
                .entry(method)
                .or_default()
                .push(response);
        }

        pub fn calls_to(&self, method: &'static str) -> usize {
            self.calls
                .borrow()
                .iter()
                .filter(|c| c.method == method)
                .count()
        }

        pub fn last_bearer(&self, method: &'static str) -> Option<String> {
            self.calls
                .borrow()
                .iter()
                .rev()
                .find(|c| c.method == method)
                .and_then(|c| c.bearer.clone())
        }
    }

    impl UnaryClient for MockClient {
        async fn unary(&self, method: &'static str, request: Value) -> Result<Value, RpcError> {
            self.calls.borrow_mut().push(RecordedCall {
                method,
                request,
                bearer: self.session.as_ref().and_then(|s| s.token()),
            });
            let mut responses = self.responses.borrow_mut();
            match responses.get_mut(method) {
                Some(queue) if !queue.is_empty() => queue.remove(0),
                _ => Err(RpcError::new(
                    RpcCode::Unimplemented,
                    format!("no scripted response for {}", method),
                )),
            }
        }
    }
}
