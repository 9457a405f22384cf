// ============================================================================
// QUERY CLIENT - Caché de queries con invalidación por tags
// ============================================================================
// Componente genérico, sin framework: un mapa de clave de query ->
// (payload, tags, subscribers) más un índice inverso tag -> claves.
// Invalidar un tag recorre el índice inverso: las entradas con subscribers
// se marcan stale y se refetchean; las huérfanas se descartan y se
// recomputan lazy en la próxima suscripción.
//
// Reglas de concurrencia (un solo hilo, múltiples requests en vuelo):
//   - dedupe por clave: mientras hay un request en vuelo no se lanza otro
//     (las invalidaciones que llegan en el medio se coalescen)
//   - gana el request INICIADO más recientemente, no el que termina último
//   - stale-while-revalidate: el dato viejo nunca se borra durante un refetch
// ============================================================================

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use futures::channel::oneshot;
use serde_json::Value;

use crate::config::CONFIG;
use crate::services::api_client::UnaryClient;
use crate::services::rpc_error::{RpcCode, RpcError};

/// Etiqueta de invalidación (type, id) adjunta a resultados cacheados
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub kind: &'static str,
    pub id: String,
}

impl Tag {
    pub fn new(kind: &'static str, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }
}

/// Clave de caché: (endpoint, parámetros canonicalizados)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub endpoint: &'static str,
    params: String,
}

impl QueryKey {
    // serde_json ordena las claves de los objetos, así que la
    // representación es canónica y sirve como clave de mapa.
    pub fn new(endpoint: &'static str, params: &Value) -> Self {
        Self {
            endpoint,
            params: params.to_string(),
        }
    }

    fn params_value(&self) -> Value {
        serde_json::from_str(&self.params).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryOptions {
    pub refetch_on_mount: bool,
    pub refetch_on_focus: bool,
    pub refetch_on_reconnect: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefetchTrigger {
    Focus,
    Reconnect,
}

/// Tags que un resultado "provee", calculados sobre la respuesta
pub type ProvidesFn = fn(&Value) -> Vec<Tag>;

pub fn provides_nothing(_response: &Value) -> Vec<Tag> {
    Vec::new()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Fresh(Value),
    Stale(Value),
    Miss,
}

struct Entry {
    data: Option<Value>,
    fetched_at: Option<DateTime<Utc>>,
    stale: bool,
    tags: HashSet<Tag>,
    subscribers: usize,
    options: QueryOptions,
    provides: ProvidesFn,
    /// Seq del último request INICIADO para esta clave
    latest_seq: u64,
    inflight: u32,
    waiters: Vec<oneshot::Sender<Result<Value, RpcError>>>,
}

impl Entry {
    fn new() -> Self {
        Self {
            data: None,
            fetched_at: None,
            stale: false,
            tags: HashSet::new(),
            subscribers: 0,
            options: QueryOptions::default(),
            provides: provides_nothing,
            latest_seq: 0,
            inflight: 0,
            waiters: Vec::new(),
        }
    }
}

pub struct InvalidateOutcome {
    /// Claves con subscribers activos: hay que refetchearlas
    pub refetch: Vec<QueryKey>,
    /// Claves que cambiaron de estado (para notificar watchers)
    pub changed: Vec<QueryKey>,
}

/// Bookkeeping puro y síncrono del caché. No hace red ni I/O.
pub struct QueryCore {
    entries: HashMap<QueryKey, Entry>,
    by_tag: HashMap<Tag, HashSet<QueryKey>>,
    watchers: HashMap<QueryKey, Vec<(usize, Rc<dyn Fn()>)>>,
    next_seq: u64,
    next_watch_id: usize,
}

impl QueryCore {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            by_tag: HashMap::new(),
            watchers: HashMap::new(),
            next_seq: 0,
            next_watch_id: 0,
        }
    }

    pub fn subscribe(&mut self, key: &QueryKey, options: QueryOptions) {
        let entry = self.entries.entry(key.clone()).or_insert_with(Entry::new);
        entry.subscribers += 1;
        entry.options.refetch_on_mount |= options.refetch_on_mount;
        entry.options.refetch_on_focus |= options.refetch_on_focus;
        entry.options.refetch_on_reconnect |= options.refetch_on_reconnect;
    }

    /// Soltar interés no cancela un request en vuelo ni descarta el dato:
    /// la entrada huérfana se reclama lazy cuando una invalidación la toca.
    pub fn unsubscribe(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.subscribers = entry.subscribers.saturating_sub(1);
        }
    }

    pub fn subscriber_count(&self, key: &QueryKey) -> usize {
        self.entries.get(key).map(|e| e.subscribers).unwrap_or(0)
    }

    pub fn lookup(&self, key: &QueryKey) -> Lookup {
        match self.entries.get(key) {
            Some(entry) => match (&entry.data, entry.stale) {
                (Some(data), false) => Lookup::Fresh(data.clone()),
                (Some(data), true) => Lookup::Stale(data.clone()),
                (None, _) => Lookup::Miss,
            },
            None => Lookup::Miss,
        }
    }

    pub fn fetched_at(&self, key: &QueryKey) -> Option<DateTime<Utc>> {
        self.entries.get(key).and_then(|e| e.fetched_at)
    }

    /// Reserva un turno de fetch. `None` = ya hay uno en vuelo y no se
    /// fuerza: el pedido se coalesce con el existente.
    pub fn begin_fetch(&mut self, key: &QueryKey, provides: ProvidesFn, force: bool) -> Option<u64> {
        let entry = self.entries.entry(key.clone()).or_insert_with(Entry::new);
        entry.provides = provides;
        if entry.inflight > 0 && !force {
            return None;
        }
        self.next_seq += 1;
        entry.latest_seq = self.next_seq;
        entry.inflight += 1;
        Some(self.next_seq)
    }

    /// Colgarse del request en vuelo para compartir su respuesta
    pub fn join_inflight(
        &mut self,
        key: &QueryKey,
    ) -> Option<oneshot::Receiver<Result<Value, RpcError>>> {
        let entry = self.entries.get_mut(key)?;
        if entry.inflight == 0 {
            return None;
        }
        let (sender, receiver) = oneshot::channel();
        entry.waiters.push(sender);
        Some(receiver)
    }

    /// Aplica el resultado de un fetch. Solo se aplica si `seq` corresponde
    /// al request iniciado más recientemente (last-started-wins).
    pub fn complete_fetch(
        &mut self,
        key: &QueryKey,
        seq: u64,
        result: &Result<Value, RpcError>,
    ) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        entry.inflight = entry.inflight.saturating_sub(1);

        let is_latest = seq == entry.latest_seq;
        if !is_latest {
            return false;
        }

        match result {
            Ok(value) => {
                let new_tags: HashSet<Tag> = (entry.provides)(value).into_iter().collect();
                let old_tags = std::mem::replace(&mut entry.tags, new_tags.clone());
                entry.data = Some(value.clone());
                entry.fetched_at = Some(Utc::now());
                entry.stale = false;

                for tag in old_tags.difference(&new_tags) {
                    if let Some(keys) = self.by_tag.get_mut(tag) {
                        keys.remove(key);
                        if keys.is_empty() {
                            self.by_tag.remove(tag);
                        }
                    }
                }
                for tag in new_tags {
                    self.by_tag.entry(tag).or_default().insert(key.clone());
                }
            }
            Err(_) => {
                // El dato viejo se conserva; queda stale para reintentar
                // en el próximo acceso.
                if let Some(entry) = self.entries.get_mut(key) {
                    entry.stale = true;
                }
            }
        }

        if let Some(entry) = self.entries.get_mut(key) {
            for waiter in entry.waiters.drain(..) {
                let _ = waiter.send(result.clone());
            }
        }
        true
    }

    /// Marca como stale toda entrada que provea el tag. Las entradas sin
    /// subscribers (y sin request en vuelo) se descartan directamente.
    pub fn invalidate(&mut self, tag: &Tag) -> InvalidateOutcome {
        let keys: Vec<QueryKey> = self
            .by_tag
            .get(tag)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();

        let mut outcome = InvalidateOutcome {
            refetch: Vec::new(),
            changed: Vec::new(),
        };

        for key in keys {
            let Some(entry) = self.entries.get_mut(&key) else {
                continue;
            };
            if entry.subscribers == 0 && entry.inflight == 0 {
                self.drop_entry(&key);
            } else {
                entry.stale = true;
                if entry.subscribers > 0 {
                    outcome.refetch.push(key.clone());
                }
                outcome.changed.push(key);
            }
        }
        outcome
    }

    fn drop_entry(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.remove(key) {
            for tag in entry.tags {
                if let Some(keys) = self.by_tag.get_mut(&tag) {
                    keys.remove(key);
                    if keys.is_empty() {
                        self.by_tag.remove(&tag);
                    }
                }
            }
        }
        self.watchers.remove(key);
    }

    pub fn provides_of(&self, key: &QueryKey) -> ProvidesFn {
        self.entries
            .get(key)
            .map(|e| e.provides)
            .unwrap_or(provides_nothing)
    }

    /// Claves suscriptas que piden refetch ante el trigger dado
    pub fn keys_to_refetch_on(&self, trigger: RefetchTrigger) -> Vec<QueryKey> {
        self.entries
            .iter()
            .filter(|(_, entry)| {
                entry.subscribers > 0
                    && match trigger {
                        RefetchTrigger::Focus => entry.options.refetch_on_focus,
                        RefetchTrigger::Reconnect => entry.options.refetch_on_reconnect,
                    }
            })
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn watch(&mut self, key: &QueryKey, callback: Rc<dyn Fn()>) -> usize {
        self.next_watch_id += 1;
        self.watchers
            .entry(key.clone())
            .or_default()
            .push((self.next_watch_id, callback));
        self.next_watch_id
    }

    pub fn unwatch(&mut self, key: &QueryKey, id: usize) {
        if let Some(list) = self.watchers.get_mut(key) {
            list.retain(|(wid, _)| *wid != id);
        }
    }

    pub fn watchers_of(&self, key: &QueryKey) -> Vec<Rc<dyn Fn()>> {
        self.watchers
            .get(key)
            .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default()
    }
}

impl Default for QueryCore {
    fn default() -> Self {
        Self::new()
    }
}

const RETRY_BACKOFF_MS: u32 = 400;

#[cfg(target_arch = "wasm32")]
async fn backoff_delay() {
    gloo_timers::future::TimeoutFuture::new(RETRY_BACKOFF_MS).await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn backoff_delay() {}

/// Cáscara async del caché: fetch/mutación/invalidación contra el transporte
#[derive(Clone)]
pub struct QueryClient<C: UnaryClient> {
    core: Rc<RefCell<QueryCore>>,
    client: C,
    retry_limit: u32,
}

impl<C: UnaryClient + Clone> QueryClient<C> {
    pub fn new(client: C) -> Self {
        Self {
            core: Rc::new(RefCell::new(QueryCore::new())),
            client,
            retry_limit: CONFIG.retry_attempts,
        }
    }

    pub fn with_retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    pub fn subscribe(&self, endpoint: &'static str, params: &Value, options: QueryOptions) {
        self.core
            .borrow_mut()
            .subscribe(&QueryKey::new(endpoint, params), options);
    }

    pub fn unsubscribe(&self, endpoint: &'static str, params: &Value) {
        self.core
            .borrow_mut()
            .unsubscribe(&QueryKey::new(endpoint, params));
    }

    /// Lectura instantánea: (dato, está_stale)
    pub fn cached(&self, endpoint: &'static str, params: &Value) -> Option<(Value, bool)> {
        self.cached_key(&QueryKey::new(endpoint, params))
    }

    fn cached_key(&self, key: &QueryKey) -> Option<(Value, bool)> {
        match self.core.borrow().lookup(key) {
            Lookup::Fresh(value) => Some((value, false)),
            Lookup::Stale(value) => Some((value, true)),
            Lookup::Miss => None,
        }
    }

    pub fn watch(&self, endpoint: &'static str, params: &Value, callback: impl Fn() + 'static) -> usize {
        self.core
            .borrow_mut()
            .watch(&QueryKey::new(endpoint, params), Rc::new(callback))
    }

    pub fn unwatch(&self, endpoint: &'static str, params: &Value, id: usize) {
        self.core
            .borrow_mut()
            .unwatch(&QueryKey::new(endpoint, params), id);
    }

    /// Contrato de query: sirve del caché si está fresco; si no, hace el RPC
    /// y cachea bajo (endpoint, params). Con dato stale revalida pero NUNCA
    /// descarta lo que ya se mostraba (stale-while-revalidate).
    pub async fn ensure(
        &self,
        endpoint: &'static str,
        params: Value,
        options: QueryOptions,
        provides: ProvidesFn,
    ) -> Result<Value, RpcError> {
        let key = QueryKey::new(endpoint, &params);
        let lookup = { self.core.borrow().lookup(&key) };
        match lookup {
            Lookup::Fresh(value) => {
                if options.refetch_on_mount {
                    match self.fetch_into_cache(key, provides, false).await {
                        Ok(fresh) => Ok(fresh),
                        Err(e) => {
                            log::warn!("⚠️ Background refetch failed for {}: {}", endpoint, e);
                            Ok(value)
                        }
                    }
                } else {
                    Ok(value)
                }
            }
            Lookup::Stale(value) => match self.fetch_into_cache(key, provides, false).await {
                Ok(fresh) => Ok(fresh),
                Err(e) => {
                    log::warn!("⚠️ Revalidation failed for {}, serving stale: {}", endpoint, e);
                    Ok(value)
                }
            },
            Lookup::Miss => self.fetch_into_cache(key, provides, false).await,
        }
    }

    /// Refetch explícito (fuerza un request nuevo aunque haya uno en vuelo;
    /// gana el iniciado más recientemente)
    pub async fn refetch(
        &self,
        endpoint: &'static str,
        params: Value,
        provides: ProvidesFn,
    ) -> Result<Value, RpcError> {
        let key = QueryKey::new(endpoint, &params);
        self.fetch_into_cache(key, provides, true).await
    }

    /// Mutación: nunca se cachea como query; al completar invalida los tags
    /// que declare el caller.
    pub async fn mutate(
        &self,
        endpoint: &'static str,
        params: Value,
        invalidates: Vec<Tag>,
    ) -> Result<Value, RpcError> {
        let result = self.run_rpc(endpoint, params, false).await?;
        self.invalidate_tags(&invalidates).await;
        Ok(result)
    }

    /// Invalida cada tag: entradas suscriptas se refetchean, huérfanas se
    /// descartan. Si ya hay un refetch en vuelo para una clave, se coalesce.
    pub async fn invalidate_tags(&self, tags: &[Tag]) {
        let mut refetch: Vec<QueryKey> = Vec::new();
        let mut changed: Vec<QueryKey> = Vec::new();
        {
            let mut core = self.core.borrow_mut();
            for tag in tags {
                let outcome = core.invalidate(tag);
                for key in outcome.refetch {
                    if !refetch.contains(&key) {
                        refetch.push(key);
                    }
                }
                for key in outcome.changed {
                    if !changed.contains(&key) {
                        changed.push(key);
                    }
                }
            }
        }

        for key in &changed {
            self.notify_key(key);
        }

        for key in refetch {
            let provides = self.core.borrow().provides_of(&key);
            if let Err(e) = self.fetch_into_cache(key.clone(), provides, false).await {
                log::warn!("⚠️ Refetch after invalidation failed for {}: {}", key.endpoint, e);
            }
        }
    }

    pub async fn on_focus(&self) {
        self.refetch_flagged(RefetchTrigger::Focus).await;
    }

    pub async fn on_reconnect(&self) {
        log::info!("🌐 Reconnected, refetching subscribed queries");
        self.refetch_flagged(RefetchTrigger::Reconnect).await;
    }

    async fn refetch_flagged(&self, trigger: RefetchTrigger) {
        let keys = { self.core.borrow().keys_to_refetch_on(trigger) };
        for key in keys {
            let provides = self.core.borrow().provides_of(&key);
            if let Err(e) = self.fetch_into_cache(key.clone(), provides, false).await {
                log::warn!("⚠️ {:?} refetch failed for {}: {}", trigger, key.endpoint, e);
            }
        }
    }

    async fn fetch_into_cache(
        &self,
        key: QueryKey,
        provides: ProvidesFn,
        force: bool,
    ) -> Result<Value, RpcError> {
        let begun = self.core.borrow_mut().begin_fetch(&key, provides, force);
        match begun {
            Some(seq) => {
                let result = self.run_rpc(key.endpoint, key.params_value(), true).await;
                let applied = self.core.borrow_mut().complete_fetch(&key, seq, &result);
                if applied {
                    self.notify_key(&key);
                }
                result
            }
            None => {
                // Dedupe: hay un request en vuelo para la misma clave
                if let Some((data, _)) = self.cached_key(&key) {
                    return Ok(data);
                }
                let receiver = self.core.borrow_mut().join_inflight(&key);
                match receiver {
                    Some(rx) => rx.await.unwrap_or_else(|_| {
                        Err(RpcError::new(RpcCode::Canceled, "in-flight request dropped"))
                    }),
                    None => self
                        .cached_key(&key)
                        .map(|(data, _)| Ok(data))
                        .unwrap_or_else(|| {
                            Err(RpcError::new(RpcCode::Unknown, "cache entry vanished"))
                        }),
                }
            }
        }
    }

    /// RPC con reintento acotado para lecturas (solo `unavailable`);
    /// las mutaciones jamás se reintentan.
    async fn run_rpc(
        &self,
        endpoint: &'static str,
        params: Value,
        retry: bool,
    ) -> Result<Value, RpcError> {
        let mut attempt = 0;
        loop {
            match self.client.unary(endpoint, params.clone()).await {
                Err(e) if retry && e.code == RpcCode::Unavailable && attempt < self.retry_limit => {
                    attempt += 1;
                    log::warn!("🔁 {} unavailable, retry {}/{}", endpoint, attempt, self.retry_limit);
                    backoff_delay().await;
                }
                other => return other,
            }
        }
    }

    fn notify_key(&self, key: &QueryKey) {
        let callbacks = { self.core.borrow().watchers_of(key) };
        for callback in callbacks {
            (*callback)();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::api_client::testing::MockClient;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;
    use serde_json::json;

    const TEAM_HOME: &str = "/test.TeamService/GetMyTeamHome";
    const MEMBERS: &str = "/test.TeamService/ListTeamMembers";
    const SCHEDULE: &str = "/test.TeamService/ScheduleTraining";

    fn team_tags(response: &Value) -> Vec<Tag> {
        response
            .get("teamId")
            .and_then(Value::as_str)
            .map(|id| vec![Tag::new("team", id)])
            .unwrap_or_default()
    }

    fn client_with(mock: &MockClient) -> QueryClient<MockClient> {
        QueryClient::new(mock.clone()).with_retry_limit(1)
    }

    #[test]
    fn serves_from_cache_after_first_fetch() {
        let mock = MockClient::new();
        mock.respond(TEAM_HOME, Ok(json!({"teamId": "T1", "teamName": "Lions"})));
        let queries = client_with(&mock);

        let params = json!({"teamId": "T1"});
        let first = block_on(queries.ensure(
            TEAM_HOME,
            params.clone(),
            QueryOptions::default(),
            team_tags,
        ))
        .unwrap();
        let second = block_on(queries.ensure(
            TEAM_HOME,
            params.clone(),
            QueryOptions::default(),
            team_tags,
        ))
        .unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.calls_to(TEAM_HOME), 1);

        // Metadata de frescura presente tras el primer fetch
        let key = QueryKey::new(TEAM_HOME, &params);
        assert!(queries.core.borrow().fetched_at(&key).is_some());
    }

    #[test]
    fn refetch_on_mount_refreshes_fresh_entries() {
        let mock = MockClient::new();
        mock.respond(TEAM_HOME, Ok(json!({"teamId": "T1", "v": 1})));
        mock.respond(TEAM_HOME, Ok(json!({"teamId": "T1", "v": 2})));
        let queries = client_with(&mock);

        let params = json!({"teamId": "T1"});
        let opts = QueryOptions {
            refetch_on_mount: true,
            ..QueryOptions::default()
        };
        block_on(queries.ensure(TEAM_HOME, params.clone(), opts, team_tags)).unwrap();
        let second = block_on(queries.ensure(TEAM_HOME, params.clone(), opts, team_tags)).unwrap();

        assert_eq!(second["v"], 2);
        assert_eq!(mock.calls_to(TEAM_HOME), 2);
    }

    #[test]
    fn invalidation_hits_only_entries_providing_the_tag() {
        let mock = MockClient::new();
        mock.respond(TEAM_HOME, Ok(json!({"teamId": "T1", "v": 1})));
        mock.respond(MEMBERS, Ok(json!({"teamId": "OTHER", "v": 1})));
        // Refetch de la entrada invalidada
        mock.respond(TEAM_HOME, Ok(json!({"teamId": "T1", "v": 2})));
        let queries = client_with(&mock);

        let home_params = json!({"teamId": "T1"});
        let member_params = json!({"teamId": "OTHER"});
        queries.subscribe(TEAM_HOME, &home_params, QueryOptions::default());
        queries.subscribe(MEMBERS, &member_params, QueryOptions::default());

        block_on(queries.ensure(
            TEAM_HOME,
            home_params.clone(),
            QueryOptions::default(),
            team_tags,
        ))
        .unwrap();
        block_on(queries.ensure(
            MEMBERS,
            member_params.clone(),
            QueryOptions::default(),
            team_tags,
        ))
        .unwrap();

        block_on(queries.invalidate_tags(&[Tag::new("team", "T1")]));

        // La entrada taggeada se refetcheó; la otra quedó intacta y fresca
        assert_eq!(mock.calls_to(TEAM_HOME), 2);
        assert_eq!(mock.calls_to(MEMBERS), 1);
        let (home, stale) = queries.cached(TEAM_HOME, &home_params).unwrap();
        assert_eq!(home["v"], 2);
        assert!(!stale);
        let (_, stale) = queries.cached(MEMBERS, &member_params).unwrap();
        assert!(!stale);
    }

    #[test]
    fn invalidation_drops_entries_without_subscribers() {
        let mock = MockClient::new();
        mock.respond(TEAM_HOME, Ok(json!({"teamId": "T1", "v": 1})));
        let queries = client_with(&mock);

        let params = json!({"teamId": "T1"});
        // Cacheado sin ningún subscriber activo
        block_on(queries.ensure(
            TEAM_HOME,
            params.clone(),
            QueryOptions::default(),
            team_tags,
        ))
        .unwrap();

        block_on(queries.invalidate_tags(&[Tag::new("team", "T1")]));

        // Descartada, no refetcheada: se recomputa lazy la próxima vez
        assert!(queries.cached(TEAM_HOME, &params).is_none());
        assert_eq!(mock.calls_to(TEAM_HOME), 1);
    }

    #[test]
    fn mutation_invalidates_but_is_not_cached() {
        let mock = MockClient::new();
        mock.respond(TEAM_HOME, Ok(json!({"teamId": "T1", "v": 1})));
        mock.respond(SCHEDULE, Ok(json!({"id": "tr-1"})));
        mock.respond(TEAM_HOME, Ok(json!({"teamId": "T1", "v": 2})));
        let queries = client_with(&mock);

        let params = json!({"teamId": "T1"});
        queries.subscribe(TEAM_HOME, &params, QueryOptions::default());
        block_on(queries.ensure(
            TEAM_HOME,
            params.clone(),
            QueryOptions::default(),
            team_tags,
        ))
        .unwrap();

        let schedule_params = json!({"teamId": "T1", "scheduledAt": "2026-08-10T18:00:00Z"});
        let result = block_on(queries.mutate(
            SCHEDULE,
            schedule_params.clone(),
            vec![Tag::new("team", "T1")],
        ))
        .unwrap();

        assert_eq!(result["id"], "tr-1");
        // El resultado de la mutación no entra al caché de queries
        assert!(queries.cached(SCHEDULE, &schedule_params).is_none());
        // Y la query del equipo se refetcheó
        assert_eq!(mock.calls_to(TEAM_HOME), 2);
        let (home, _) = queries.cached(TEAM_HOME, &params).unwrap();
        assert_eq!(home["v"], 2);
    }

    #[test]
    fn stale_data_is_served_when_revalidation_fails() {
        let mock = MockClient::new();
        mock.respond(TEAM_HOME, Ok(json!({"teamId": "T1", "v": 1})));
        mock.respond(
            TEAM_HOME,
            Err(RpcError::new(RpcCode::Internal, "boom")),
        );
        let queries = client_with(&mock).with_retry_limit(0);

        let params = json!({"teamId": "T1"});
        queries.subscribe(TEAM_HOME, &params, QueryOptions::default());
        block_on(queries.ensure(
            TEAM_HOME,
            params.clone(),
            QueryOptions::default(),
            team_tags,
        ))
        .unwrap();

        // Invalidación: el refetch falla pero el dato viejo sobrevive
        block_on(queries.invalidate_tags(&[Tag::new("team", "T1")]));
        let (data, stale) = queries.cached(TEAM_HOME, &params).unwrap();
        assert_eq!(data["v"], 1);
        assert!(stale);
    }

    #[test]
    fn queries_retry_once_on_unavailable_mutations_never() {
        let mock = MockClient::new();
        mock.respond(TEAM_HOME, Err(RpcError::transport("down")));
        mock.respond(TEAM_HOME, Ok(json!({"teamId": "T1", "v": 1})));
        mock.respond(SCHEDULE, Err(RpcError::transport("down")));
        let queries = client_with(&mock);

        let params = json!({"teamId": "T1"});
        let result = block_on(queries.ensure(
            TEAM_HOME,
            params.clone(),
            QueryOptions::default(),
            team_tags,
        ));
        assert!(result.is_ok());
        assert_eq!(mock.calls_to(TEAM_HOME), 2);

        let result = block_on(queries.mutate(SCHEDULE, json!({}), vec![]));
        assert_eq!(result.unwrap_err().code, RpcCode::Unavailable);
        assert_eq!(mock.calls_to(SCHEDULE), 1);
    }

    #[test]
    fn reconnect_refetches_only_flagged_subscribed_entries() {
        let mock = MockClient::new();
        mock.respond(TEAM_HOME, Ok(json!({"teamId": "T1", "v": 1})));
        mock.respond(MEMBERS, Ok(json!({"teamId": "T2", "v": 1})));
        mock.respond(TEAM_HOME, Ok(json!({"teamId": "T1", "v": 2})));
        let queries = client_with(&mock);

        let home_params = json!({"teamId": "T1"});
        let member_params = json!({"teamId": "T2"});
        queries.subscribe(
            TEAM_HOME,
            &home_params,
            QueryOptions {
                refetch_on_reconnect: true,
                ..QueryOptions::default()
            },
        );
        queries.subscribe(MEMBERS, &member_params, QueryOptions::default());

        block_on(queries.ensure(
            TEAM_HOME,
            home_params.clone(),
            QueryOptions::default(),
            team_tags,
        ))
        .unwrap();
        block_on(queries.ensure(
            MEMBERS,
            member_params.clone(),
            QueryOptions::default(),
            team_tags,
        ))
        .unwrap();

        block_on(queries.on_reconnect());

        assert_eq!(mock.calls_to(TEAM_HOME), 2);
        assert_eq!(mock.calls_to(MEMBERS), 1);
    }

    #[test]
    fn last_started_request_wins_regardless_of_completion_order() {
        let mut core = QueryCore::new();
        let key = QueryKey::new(TEAM_HOME, &json!({"teamId": "T1"}));

        let seq1 = core.begin_fetch(&key, provides_nothing, false).unwrap();
        let seq2 = core.begin_fetch(&key, provides_nothing, true).unwrap();
        assert!(seq2 > seq1);

        // El request viejo termina último: igual pierde
        let applied = core.complete_fetch(&key, seq2, &Ok(json!({"v": "new"})));
        assert!(applied);
        let applied = core.complete_fetch(&key, seq1, &Ok(json!({"v": "old"})));
        assert!(!applied);

        match core.lookup(&key) {
            Lookup::Fresh(value) => assert_eq!(value["v"], "new"),
            other => panic!("unexpected lookup: {:?}", other),
        }
    }

    #[test]
    fn concurrent_invalidations_coalesce_into_one_request() {
        // Cliente "con compuerta": el request queda en vuelo hasta soltarlo
        #[derive(Clone, Default)]
        struct GatedClient {
            gates: Rc<RefCell<Vec<oneshot::Sender<Value>>>>,
            calls: Rc<RefCell<usize>>,
        }

        impl UnaryClient for GatedClient {
            async fn unary(
                &self,
                _method: &'static str,
                _request: Value,
            ) -> Result<Value, RpcError> {
                *self.calls.borrow_mut() += 1;
                let (sender, receiver) = oneshot::channel();
                self.gates.borrow_mut().push(sender);
                receiver
                    .await
                    .map_err(|_| RpcError::new(RpcCode::Canceled, "gate dropped"))
            }
        }

        let gated = GatedClient::default();
        let queries = QueryClient::new(gated.clone()).with_retry_limit(0);
        let params = json!({"teamId": "T1"});
        queries.subscribe(TEAM_HOME, &params, QueryOptions::default());

        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        // Carga inicial
        {
            let queries = queries.clone();
            let params = params.clone();
            spawner
                .spawn_local(async move {
                    let _ = queries
                        .ensure(TEAM_HOME, params, QueryOptions::default(), team_tags)
                        .await;
                })
                .unwrap();
        }
        pool.run_until_stalled();
        gated
            .gates
            .borrow_mut()
            .remove(0)
            .send(json!({"teamId": "T1", "v": 1}))
            .unwrap();
        pool.run_until_stalled();
        assert_eq!(*gated.calls.borrow(), 1);

        // Dos invalidaciones del mismo tag mientras el refetch está en vuelo
        for _ in 0..2 {
            let queries = queries.clone();
            spawner
                .spawn_local(async move {
                    queries.invalidate_tags(&[Tag::new("team", "T1")]).await;
                })
                .unwrap();
        }
        pool.run_until_stalled();

        // Exactamente UN request nuevo en vuelo (el segundo se coalesció)
        assert_eq!(*gated.calls.borrow(), 2);

        gated
            .gates
            .borrow_mut()
            .remove(0)
            .send(json!({"teamId": "T1", "v": 2}))
            .unwrap();
        pool.run_until_stalled();

        assert_eq!(*gated.calls.borrow(), 2);
        let (data, stale) = queries.cached(TEAM_HOME, &params).unwrap();
        assert_eq!(data["v"], 2);
        assert!(!stale);
    }

    #[test]
    fn unsubscribed_inflight_response_is_cached_but_kept_orphan() {
        let mock = MockClient::new();
        mock.respond(TEAM_HOME, Ok(json!({"teamId": "T1", "v": 1})));
        let queries = client_with(&mock);

        let params = json!({"teamId": "T1"});
        queries.subscribe(TEAM_HOME, &params, QueryOptions::default());
        queries.unsubscribe(TEAM_HOME, &params);
        let key = QueryKey::new(TEAM_HOME, &params);
        assert_eq!(queries.core.borrow().subscriber_count(&key), 0);

        block_on(queries.ensure(
            TEAM_HOME,
            params.clone(),
            QueryOptions::default(),
            team_tags,
        ))
        .unwrap();

        // El dato quedó cacheado aunque nadie lo mire
        assert!(queries.cached(TEAM_HOME, &params).is_some());
        // Una invalidación lo descarta en lugar de refetchearlo
        block_on(queries.invalidate_tags(&[Tag::new("team", "T1")]));
        assert!(queries.cached(TEAM_HOME, &params).is_none());
        assert_eq!(mock.calls_to(TEAM_HOME), 1);
    }
}
