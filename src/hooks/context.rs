// ============================================================================
// APP CONTEXT - Servicios compartidos vía Context API de Yew
// ============================================================================
// Se arma UNA sola vez en el provider raíz: celda de sesión -> transporte
// (que lee el token de la celda) -> auth service (que posee la celda) ->
// caché de queries. Al montar, resuelve la sesión guardada y engancha el
// monitor de red/foco.
// ============================================================================

use std::cell::RefCell;
use std::ops::Deref;
use std::rc::Rc;

use yew::prelude::*;

use crate::services::api_client::HttpClient;
use crate::services::auth_service::AuthService;
use crate::services::network_monitor::NetworkMonitor;
use crate::services::query_client::QueryClient;
use crate::services::secure_store::BrowserStore;
use crate::state::nomination_state::NominationState;
use crate::state::screen_state::ScreenStack;
use crate::state::session_state::SessionCell;
use crate::state::team_state::TeamUiState;

pub type AppAuthService = AuthService<HttpClient, BrowserStore>;
pub type AppQueryClient = QueryClient<HttpClient>;

pub struct AppContextInner {
    pub auth: AppAuthService,
    pub queries: AppQueryClient,
    pub store: BrowserStore,
    pub nominations: RefCell<NominationState>,
    pub screens: RefCell<ScreenStack>,
    pub team_ui: RefCell<TeamUiState>,
}

#[derive(Clone)]
pub struct AppContext(Rc<AppContextInner>);

impl Deref for AppContext {
    type Target = AppContextInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for AppContext {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

pub fn build_app_context() -> AppContext {
    let session = SessionCell::new();
    let client = HttpClient::new(session.reader());
    let store = BrowserStore::new();
    let queries = QueryClient::new(client.clone());
    let team_ui = TeamUiState::load(&store);
    let auth = AuthService::new(session, client, store.clone());

    AppContext(Rc::new(AppContextInner {
        auth,
        queries,
        store,
        nominations: RefCell::new(NominationState::new()),
        screens: RefCell::new(ScreenStack::new()),
        team_ui: RefCell::new(team_ui),
    }))
}

#[derive(Properties, PartialEq)]
pub struct AppContextProviderProps {
    pub children: Children,
}

#[function_component(AppContextProvider)]
pub fn app_context_provider(props: &AppContextProviderProps) -> Html {
    let context = use_memo((), |_| build_app_context());

    {
        let context = context.clone();
        use_effect_with((), move |_| {
            let ctx = (*context).clone();
            wasm_bindgen_futures::spawn_local(async move {
                ctx.auth.resolve_stored_session().await;
            });

            let mut monitor = NetworkMonitor::new();
            monitor.start_monitoring((*context).queries.clone());
            move || drop(monitor)
        });
    }

    html! {
        <ContextProvider<AppContext> context={(*context).clone()}>
            {props.children.clone()}
        </ContextProvider<AppContext>>
    }
}

#[hook]
pub fn use_app_context() -> AppContext {
    use_context::<AppContext>().expect("AppContext not found: missing AppContextProvider")
}
