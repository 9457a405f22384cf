// ============================================================================
// USE SESSION HOOK - Sesión reactiva + login/logout
// ============================================================================
// Se suscribe al SessionReader y re-renderiza en cada transición de la
// máquina de estados. Los errores de login quedan en el handle como
// RpcError estructurado para que la vista los mapee.
// ============================================================================

use yew::prelude::*;

use crate::hooks::context::use_app_context;
use crate::services::rpc_error::RpcError;
use crate::state::session_state::Session;

#[derive(Clone, PartialEq)]
pub struct UseSessionHandle {
    pub session: Session,
    pub login: Callback<(String, String)>,
    pub logout: Callback<()>,
    pub login_error: Option<RpcError>,
    pub login_busy: bool,
}

#[hook]
pub fn use_session() -> UseSessionHandle {
    let ctx = use_app_context();
    let snapshot = use_state(|| ctx.auth.reader().snapshot());
    let login_error = use_state(|| None::<RpcError>);
    let login_busy = use_state(|| false);

    // Suscripción a la celda de sesión (baja al desmontar)
    {
        let snapshot = snapshot.clone();
        let reader = ctx.auth.reader();
        use_effect_with((), move |_| {
            let notify_reader = reader.clone();
            let snapshot = snapshot.clone();
            let id = reader.subscribe(move || snapshot.set(notify_reader.snapshot()));
            move || reader.unsubscribe(id)
        });
    }

    let login = {
        let ctx = ctx.clone();
        let login_error = login_error.clone();
        let login_busy = login_busy.clone();
        Callback::from(move |(email, password): (String, String)| {
            let ctx = ctx.clone();
            let login_error = login_error.clone();
            let login_busy = login_busy.clone();
            login_busy.set(true);
            wasm_bindgen_futures::spawn_local(async move {
                match ctx.auth.login(&email, &password).await {
                    Ok(()) => login_error.set(None),
                    Err(e) => {
                        log::error!("❌ Login error: {}", e);
                        login_error.set(Some(e));
                    }
                }
                login_busy.set(false);
            });
        })
    };

    let logout = {
        let ctx = ctx.clone();
        Callback::from(move |_| ctx.auth.logout())
    };

    UseSessionHandle {
        session: (*snapshot).clone(),
        login,
        logout,
        login_error: (*login_error).clone(),
        login_busy: *login_busy,
    }
}
