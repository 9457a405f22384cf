// ============================================================================
// PUSH SERVICE - Registro del dispositivo para notificaciones
// ============================================================================
// Best-effort de punta a punta: pedir permiso, suscribirse al push del
// service worker y asociar (token, installation id) a la cuenta. Cualquier
// fallo loguea y corta; NUNCA bloquea la autenticación.
// ============================================================================

use crate::config::CONFIG;
use crate::services::account_api;
use crate::services::api_client::UnaryClient;
use crate::services::secure_store::{read_or_absent, KeyValueStore};
use crate::utils::constants::INSTALLATION_ID_KEY;

pub async fn register_web_device<C: UnaryClient, S: KeyValueStore>(client: &C, store: &S) {
    if !CONFIG.push_config.enabled {
        log::info!("ℹ️ Push registration disabled by config");
        return;
    }

    let Some(device_token) = browser_push_token().await else {
        log::info!("ℹ️ No push subscription available, skipping device registration");
        return;
    };

    let installation_id = fetch_or_create_installation_id(store);
    match account_api::attach_web_device(client, device_token, installation_id).await {
        Ok(()) => log::info!("✅ Device registered for push notifications"),
        Err(e) => log::warn!("⚠️ Device registration failed (non-blocking): {}", e),
    }
}

/// Installation id estable por instalación (uuid v4 persistido)
pub fn fetch_or_create_installation_id<S: KeyValueStore>(store: &S) -> String {
    if let Some(id) = read_or_absent(store, INSTALLATION_ID_KEY).filter(|id| !id.is_empty()) {
        return id;
    }
    let id = uuid::Uuid::new_v4().to_string();
    if let Err(e) = store.set(INSTALLATION_ID_KEY, &id) {
        log::warn!("⚠️ Could not persist installation id: {}", e);
    }
    id
}

/// Permiso + suscripción push del navegador; el endpoint de la suscripción
/// hace de token de dispositivo.
#[cfg(target_arch = "wasm32")]
async fn browser_push_token() -> Option<String> {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window()?;

    let permission = JsFuture::from(web_sys::Notification::request_permission().ok()?)
        .await
        .ok()?;
    if permission.as_string().as_deref() != Some("granted") {
        log::info!("ℹ️ Notifications permission not granted");
        return None;
    }

    let container = window.navigator().service_worker();
    let registration = JsFuture::from(container.ready().ok()?).await.ok()?;
    let registration: web_sys::ServiceWorkerRegistration = registration.dyn_into().ok()?;
    let manager = registration.push_manager().ok()?;

    let options = web_sys::PushSubscriptionOptionsInit::new();
    options.set_user_visible_only(true);
    let server_key = &CONFIG.push_config.application_server_key;
    if !server_key.is_empty() {
        options.set_application_server_key(Some(&JsValue::from_str(server_key)));
    }

    let subscription = JsFuture::from(manager.subscribe_with_options(&options).ok()?)
        .await
        .ok()?;
    let subscription: web_sys::PushSubscription = subscription.dyn_into().ok()?;
    Some(subscription.endpoint())
}

#[cfg(not(target_arch = "wasm32"))]
async fn browser_push_token() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api_client::testing::MockClient;
    use crate::services::secure_store::testing::{FailingStore, MemoryStore};
    use futures::executor::block_on;

    #[test]
    fn installation_id_is_stable_across_calls() {
        let store = MemoryStore::new();
        let first = fetch_or_create_installation_id(&store);
        let second = fetch_or_create_installation_id(&store);

        assert_eq!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn installation_id_survives_storage_failure() {
        // Sin persistencia igual se genera un id utilizable
        let id = fetch_or_create_installation_id(&FailingStore);
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn registration_without_push_support_makes_no_rpc() {
        let mock = MockClient::new();
        let store = MemoryStore::new();

        // En el host no hay navegador: el token es None y no se llama al RPC
        block_on(register_web_device(&mock, &store));

        assert_eq!(mock.calls_to(account_api::ATTACH_WEB_DEVICE), 0);
    }
}
