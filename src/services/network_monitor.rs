// ============================================================================
// MONITOR DE EVENTOS DE RED Y FOCO
// ============================================================================
// Detecta reconexión (evento "online") y retorno de foco de la ventana para
// disparar los refetch del caché de queries (refetch-on-reconnect /
// refetch-on-focus). El refetch por foco se debouncea: alt-tabear rápido no
// debe bombardear el backend.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Event};

use crate::services::api_client::UnaryClient;
use crate::services::query_client::QueryClient;

const FOCUS_REFETCH_DEBOUNCE_MS: u32 = 300;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NetworkStatus {
    Online,
    Offline,
    Unknown,
}

/// Monitor de red/foco con listeners de ventana.
/// Previene registros duplicados: los listeners se instalan una sola vez.
pub struct NetworkMonitor {
    status: Rc<RefCell<NetworkStatus>>,
    monitoring_started: Rc<RefCell<bool>>,
}

impl NetworkMonitor {
    pub fn new() -> Self {
        let status = Rc::new(RefCell::new(NetworkStatus::Unknown));

        // Estado inicial desde navigator.onLine
        if let Some(window) = window() {
            let navigator = js_sys::Reflect::get(&window, &JsValue::from_str("navigator")).ok();
            if let Some(nav) = navigator {
                let on_line = js_sys::Reflect::get(&nav, &JsValue::from_str("onLine"))
                    .ok()
                    .and_then(|v| v.as_bool());
                if let Some(is_online) = on_line {
                    *status.borrow_mut() = if is_online {
                        NetworkStatus::Online
                    } else {
                        NetworkStatus::Offline
                    };
                }
            }
        }

        Self {
            status,
            monitoring_started: Rc::new(RefCell::new(false)),
        }
    }

    /// Instala los listeners y los conecta al caché de queries.
    /// Ignora llamadas repetidas.
    pub fn start_monitoring<C>(&mut self, queries: QueryClient<C>)
    where
        C: UnaryClient + Clone + 'static,
    {
        {
            let mut started = self.monitoring_started.borrow_mut();
            if *started {
                log::warn!("⚠️ NetworkMonitor: start_monitoring already called, ignoring");
                return;
            }
            *started = true;
        }

        let window = match window() {
            Some(w) => w,
            None => return,
        };

        let status = self.status.clone();

        // Evento "online": reconexión -> refetch de las queries suscriptas
        let online_closure = Closure::wrap(Box::new({
            let status = status.clone();
            let queries = queries.clone();
            move |_event: Event| {
                log::info!("🌐 Network: ONLINE");
                *status.borrow_mut() = NetworkStatus::Online;
                let queries = queries.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    queries.on_reconnect().await;
                });
            }
        }) as Box<dyn FnMut(Event)>);

        // Evento "offline": solo actualiza el estado
        let offline_closure = Closure::wrap(Box::new({
            let status = status.clone();
            move |_event: Event| {
                log::warn!("📴 Network: OFFLINE");
                *status.borrow_mut() = NetworkStatus::Offline;
            }
        }) as Box<dyn FnMut(Event)>);

        // Foco de la ventana: refetch debounced
        let pending_focus: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));
        let focus_closure = Closure::wrap(Box::new({
            let queries = queries.clone();
            let pending_focus = pending_focus.clone();
            move |_event: Event| {
                let queries = queries.clone();
                // Reemplazar el timeout pendiente lo cancela (drop)
                *pending_focus.borrow_mut() = Some(Timeout::new(FOCUS_REFETCH_DEBOUNCE_MS, move || {
                    wasm_bindgen_futures::spawn_local(async move {
                        queries.on_focus().await;
                    });
                }));
            }
        }) as Box<dyn FnMut(Event)>);

        let _ = window
            .add_event_listener_with_callback("online", online_closure.as_ref().unchecked_ref());
        let _ = window
            .add_event_listener_with_callback("offline", offline_closure.as_ref().unchecked_ref());
        let _ = window
            .add_event_listener_with_callback("focus", focus_closure.as_ref().unchecked_ref());

        // Los listeners globales viven tanto como la app: forget() es seguro
        // porque este método solo corre una vez.
        online_closure.forget();
        offline_closure.forget();
        focus_closure.forget();

        log::info!("✅ NetworkMonitor: listeners registered (once)");
    }

    pub fn current_status(&self) -> NetworkStatus {
        *self.status.borrow()
    }

    pub fn is_online(&self) -> bool {
        matches!(self.current_status(), NetworkStatus::Online)
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.current_status(), NetworkStatus::Offline)
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}
