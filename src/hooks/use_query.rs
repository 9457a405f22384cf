// ============================================================================
// USE QUERY HOOK - Suscripción tipada al caché de queries
// ============================================================================
// Al montar: suscribe (refcount + flags de refetch), pinta lo cacheado al
// instante y dispara el fetch/revalidación en background. Al desmontar:
// baja el watcher y suelta el interés (la respuesta en vuelo se cachea
// igual, solo deja de renderizarse).
// ============================================================================

use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use yew::prelude::*;

use crate::hooks::context::use_app_context;
use crate::services::query_client::{ProvidesFn, QueryOptions};
use crate::services::rpc_error::RpcError;

#[derive(PartialEq)]
pub struct QueryState<T: PartialEq> {
    pub data: Option<Rc<T>>,
    pub loading: bool,
    pub error: Option<RpcError>,
    pub stale: bool,
}

// Manual `Clone` impl: cloning only moves `Rc<T>` handles, so it must not
// require `T: Clone` (the derive would add that spurious bound).
impl<T: PartialEq> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
            stale: self.stale,
        }
    }
}

impl<T: PartialEq> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
            stale: false,
        }
    }
}

#[hook]
pub fn use_query<T>(
    endpoint: &'static str,
    params: Value,
    options: QueryOptions,
    provides: ProvidesFn,
) -> QueryState<T>
where
    T: DeserializeOwned + PartialEq + 'static,
{
    let ctx = use_app_context();
    let state = use_state(QueryState::<T>::default);

    {
        let state = state.clone();
        let queries = ctx.queries.clone();
        let params_key = params.to_string();
        let params = params.clone();
        use_effect_with((endpoint, params_key), move |_| {
            queries.subscribe(endpoint, &params, options);

            // Pintar el dato cacheado al instante (stale-while-revalidate)
            let apply_cached = {
                let queries = queries.clone();
                let params = params.clone();
                let state = state.clone();
                move || {
                    if let Some((value, stale)) = queries.cached(endpoint, &params) {
                        match serde_json::from_value::<T>(value) {
                            Ok(data) => state.set(QueryState {
                                data: Some(Rc::new(data)),
                                loading: false,
                                error: None,
                                stale,
                            }),
                            Err(e) => {
                                log::error!("❌ Query decode failed for {}: {}", endpoint, e)
                            }
                        }
                    }
                }
            };
            apply_cached();

            let watch_id = queries.watch(endpoint, &params, apply_cached.clone());

            // Fetch o revalidación en background
            {
                let queries = queries.clone();
                let params = params.clone();
                let state = state.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = queries.ensure(endpoint, params, options, provides).await {
                        // El dato previo (si lo hay) se conserva en pantalla
                        let mut next = (*state).clone();
                        next.loading = false;
                        next.error = Some(e);
                        state.set(next);
                    }
                });
            }

            let queries = queries.clone();
            let params = params.clone();
            move || {
                queries.unwatch(endpoint, &params, watch_id);
                queries.unsubscribe(endpoint, &params);
            }
        });
    }

    (*state).clone()
}
