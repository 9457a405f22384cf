// ============================================================================
// TEAM UI STATE - Estado de UI por equipo (persistido)
// ============================================================================
// Única porción de UI-state que se persiste: el hint para padres se descarta
// una sola vez por equipo y la marca sobrevive reinicios.
// ============================================================================

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::services::secure_store::{load_json, save_json, KeyValueStore};
use crate::utils::constants::TEAM_UI_STATE_KEY;

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug, Default)]
struct TeamDetails {
    parent_hint_read: bool,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug, Default)]
pub struct TeamUiState {
    teams: HashMap<String, TeamDetails>,
}

impl TeamUiState {
    /// Carga el estado persistido; cualquier fallo => estado limpio
    pub fn load<S: KeyValueStore>(store: &S) -> Self {
        load_json(store, TEAM_UI_STATE_KEY).unwrap_or_default()
    }

    /// Marca el hint de padres como leído para un equipo y persiste
    pub fn mark_parent_hint_read<S: KeyValueStore>(&mut self, team_id: &str, store: &S) {
        self.teams
            .entry(team_id.to_string())
            .or_default()
            .parent_hint_read = true;
        save_json(store, TEAM_UI_STATE_KEY, self);
    }

    pub fn parent_hint_read(&self, team_id: &str) -> bool {
        self.teams
            .get(team_id)
            .map(|details| details.parent_hint_read)
            .unwrap_or(false)
    }
}
