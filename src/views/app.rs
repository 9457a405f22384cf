// ============================================================================
// APP VIEW - Componente raíz
// ============================================================================
// Match EXHAUSTIVO sobre la máquina de estados de sesión: cada variante
// tiene su pantalla. El provider arma los servicios y resuelve la sesión
// guardada una sola vez.
// ============================================================================

use yew::prelude::*;

use crate::hooks::context::AppContextProvider;
use crate::hooks::use_session::use_session;
use crate::state::session_state::Session;
use crate::views::login_view::LoginView;
use crate::views::team_home::TeamHome;

#[function_component(App)]
pub fn app() -> Html {
    html! {
        <AppContextProvider>
            <Root />
        </AppContextProvider>
    }
}

#[function_component(Root)]
fn root() -> Html {
    let session = use_session();

    match &session.session {
        Session::Unresolved => html! {
            <div class="splash">{"Loading..."}</div>
        },
        Session::Pending { .. } => html! {
            <div class="splash">{"Signing in..."}</div>
        },
        Session::Unauthenticated => html! {
            <LoginView />
        },
        Session::Authenticated { user_id, .. } => html! {
            <TeamHome user_id={user_id.clone()} />
        },
    }
}
