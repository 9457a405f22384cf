// ============================================================================
// SECURE STORE - Slots persistentes clave/valor
// ============================================================================
// Dos slots de string (token de sesión, installation id) más el estado de UI
// por equipo. Un fallo del almacenamiento NUNCA es fatal: se loguea y se
// trata como ausencia.
// ============================================================================

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage read failed for '{0}'")]
    Read(String),
    #[error("storage write failed for '{0}'")]
    Write(String),
}

/// Seam sobre el almacenamiento del navegador (localStorage) para poder
/// testear los servicios sin un browser.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Lectura "fail open": error de storage => None (se loguea)
pub fn read_or_absent<S: KeyValueStore>(store: &S, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("⚠️ Storage read failed for '{}', treating as absent: {}", key, e);
            None
        }
    }
}

/// Guarda un valor serializable como JSON
pub fn save_json<S: KeyValueStore, T: Serialize>(store: &S, key: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => {
            if let Err(e) = store.set(key, &json) {
                log::warn!("⚠️ Storage write failed for '{}': {}", key, e);
            }
        }
        Err(e) => log::warn!("⚠️ Serialization failed for '{}': {}", key, e),
    }
}

/// Carga un valor JSON; cualquier fallo (storage o parseo) => None
pub fn load_json<S: KeyValueStore, T: DeserializeOwned>(store: &S, key: &str) -> Option<T> {
    let json = read_or_absent(store, key)?;
    match serde_json::from_str(&json) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("⚠️ Stored value for '{}' is corrupt, discarding: {}", key, e);
            None
        }
    }
}

/// Implementación real sobre localStorage
#[derive(Clone, Default)]
pub struct BrowserStore;

impl BrowserStore {
    pub fn new() -> Self {
        Self
    }

    fn storage(&self) -> Result<web_sys::Storage, StoreError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or(StoreError::Unavailable)
    }
}

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage()?
            .get_item(key)
            .map_err(|_| StoreError::Read(key.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage()?
            .set_item(key, value)
            .map_err(|_| StoreError::Write(key.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.storage()?
            .remove_item(key)
            .map_err(|_| StoreError::Write(key.to_string()))
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    /// Almacenamiento en memoria para tests
    #[derive(Clone, Default)]
    pub struct MemoryStore {
        slots: Rc<RefCell<HashMap<String, String>>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seeded(key: &str, value: &str) -> Self {
            let store = Self::new();
            store.slots.borrow_mut().insert(key.into(), value.into());
            store
        }
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Ok(self.slots.borrow().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.slots.borrow_mut().insert(key.into(), value.into());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.slots.borrow_mut().remove(key);
            Ok(())
        }
    }

    /// Almacenamiento que siempre falla (para verificar el "fail open")
    #[derive(Clone, Default)]
    pub struct FailingStore;

    impl KeyValueStore for FailingStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }

        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
    }
}
