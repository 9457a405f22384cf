// ============================================================================
// USE NOMINATIONS HOOK - Selección de nominados compartida
// ============================================================================
// La selección vive en el AppContext (sobrevive la ida y vuelta al selector
// de personas) pero es efímera: nunca se persiste.
// ============================================================================

use yew::prelude::*;

use crate::hooks::context::use_app_context;
use crate::state::nomination_state::{NominationMode, NominationState};

#[derive(Clone, PartialEq)]
pub struct UseNominationsHandle {
    /// Snapshot del estado al momento del render
    pub state: NominationState,
    pub toggle: Callback<(NominationMode, String)>,
    pub bulk_set: Callback<(NominationMode, Vec<String>)>,
    pub reset: Callback<NominationMode>,
}

#[hook]
pub fn use_nominations() -> UseNominationsHandle {
    let ctx = use_app_context();
    let version = use_state(|| 0u32);

    let toggle = {
        let ctx = ctx.clone();
        let version = version.clone();
        Callback::from(move |(mode, person_id): (NominationMode, String)| {
            ctx.nominations.borrow_mut().toggle(mode, &person_id);
            version.set(*version + 1);
        })
    };

    let bulk_set = {
        let ctx = ctx.clone();
        let version = version.clone();
        Callback::from(move |(mode, ids): (NominationMode, Vec<String>)| {
            ctx.nominations.borrow_mut().bulk_set(mode, ids);
            version.set(*version + 1);
        })
    };

    let reset = {
        let ctx = ctx.clone();
        let version = version.clone();
        Callback::from(move |mode: NominationMode| {
            ctx.nominations.borrow_mut().reset(mode);
            version.set(*version + 1);
        })
    };

    let state = ctx.nominations.borrow().clone();
    UseNominationsHandle {
        state,
        toggle,
        bulk_set,
        reset,
    }
}
