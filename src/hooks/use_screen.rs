// ============================================================================
// USE SCREEN HOOK - Back-stack de navegación
// ============================================================================

use yew::prelude::*;

use crate::hooks::context::use_app_context;
use crate::state::screen_state::BackBehavior;

#[derive(Clone, PartialEq)]
pub struct UseScreenHandle {
    /// Destino efectivo de "volver" (None = botón oculto)
    pub back_target: Option<String>,
    /// Configuración por pantalla: (comportamiento, fallback)
    pub configure: Callback<(BackBehavior, Option<String>)>,
    /// Navegación hacia adelante; el payload es la ubicación que se abandona
    pub navigate_from: Callback<Option<String>>,
    /// Navegación hacia atrás (gesto/botón); idem payload
    pub pop_from: Callback<Option<String>>,
}

#[hook]
pub fn use_screen() -> UseScreenHandle {
    let ctx = use_app_context();
    let version = use_state(|| 0u32);

    let configure = {
        let ctx = ctx.clone();
        let version = version.clone();
        Callback::from(move |(behavior, fallback): (BackBehavior, Option<String>)| {
            ctx.screens.borrow_mut().configure(behavior, fallback);
            version.set(*version + 1);
        })
    };

    let navigate_from = {
        let ctx = ctx.clone();
        let version = version.clone();
        Callback::from(move |from: Option<String>| {
            ctx.screens.borrow_mut().after_navigate(from.as_deref());
            version.set(*version + 1);
        })
    };

    let pop_from = {
        let ctx = ctx.clone();
        let version = version.clone();
        Callback::from(move |from: Option<String>| {
            let mut screens = ctx.screens.borrow_mut();
            screens.begin_pop();
            screens.after_navigate(from.as_deref());
            version.set(*version + 1);
        })
    };

    let back_target = ctx.screens.borrow().back_target().map(str::to_owned);
    UseScreenHandle {
        back_target,
        configure,
        navigate_from,
        pop_from,
    }
}
