// ============================================================================
// SESSION STATE - Estado de sesión/autenticación (máquina de estados)
// ============================================================================
// La celda de escritura (SessionCell) vive DENTRO del AuthService; el resto
// de la app solo recibe SessionReader (lectura + subscripción). Así las
// transiciones quedan confinadas al módulo de auth por construcción.
// ============================================================================

use crate::state::reactivity::{ReactiveState, SubscriptionId};

/// Estado de autenticación del cliente.
///
/// `Pending` y `Authenticated` siempre llevan un token no vacío; la única
/// ruta hacia `Authenticated` pasa por `Pending` (lo garantiza el AuthService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    /// Arranque: todavía no se consultó el almacenamiento seguro
    Unresolved,
    Unauthenticated,
    /// Hay token pero la identidad aún no fue confirmada por el servidor
    Pending { token: String },
    Authenticated { token: String, user_id: String },
}

impl Session {
    /// Token actual, si el estado lleva uno
    pub fn token(&self) -> Option<&str> {
        match self {
            Session::Pending { token } => Some(token),
            Session::Authenticated { token, .. } => Some(token),
            Session::Unresolved | Session::Unauthenticated => None,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            Session::Authenticated { user_id, .. } => Some(user_id),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}

/// Mitad de escritura de la sesión. Solo el AuthService la posee.
pub struct SessionCell {
    inner: ReactiveState<Session>,
}

impl SessionCell {
    /// Una sesión por proceso; nace como `Unresolved`
    pub fn new() -> Self {
        Self {
            inner: ReactiveState::new(Session::Unresolved),
        }
    }

    /// Mitad de lectura, clonable y repartible a toda la app
    pub fn reader(&self) -> SessionReader {
        SessionReader {
            inner: self.inner.clone(),
        }
    }

    pub(crate) fn snapshot(&self) -> Session {
        self.inner.get()
    }

    pub(crate) fn set(&self, next: Session) {
        debug_assert!(
            !matches!(&next, Session::Pending { token } | Session::Authenticated { token, .. } if token.is_empty()),
            "session token must not be empty"
        );
        self.inner.set(next);
    }
}

impl Default for SessionCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Acceso de solo lectura a la sesión (el transporte lee el token de acá
/// en el momento de cada llamada, nunca en la construcción del cliente).
#[derive(Clone)]
pub struct SessionReader {
    inner: ReactiveState<Session>,
}

impl SessionReader {
    pub fn snapshot(&self) -> Session {
        self.inner.get()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.with(|s| s.token().map(str::to_owned))
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.with(Session::is_authenticated)
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn() + 'static,
    {
        self.inner.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unresolved() {
        let cell = SessionCell::new();
        assert_eq!(cell.reader().snapshot(), Session::Unresolved);
        assert_eq!(cell.reader().token(), None);
    }

    #[test]
    fn reader_sees_writes_and_notifies() {
        let cell = SessionCell::new();
        let reader = cell.reader();

        cell.set(Session::Pending {
            token: "tok-1".into(),
        });
        assert_eq!(reader.token().as_deref(), Some("tok-1"));
        assert!(!reader.is_authenticated());

        cell.set(Session::Authenticated {
            token: "tok-1".into(),
            user_id: "u-9".into(),
        });
        assert!(reader.is_authenticated());
        assert_eq!(reader.snapshot().user_id(), Some("u-9"));
    }
}
