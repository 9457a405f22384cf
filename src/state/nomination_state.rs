// ============================================================================
// NOMINATION STATE - Selección de nominados (jugadores / staff)
// ============================================================================
// Estado efímero: vive solo mientras se compone una convocatoria. Nunca se
// persiste. Dos listas paralelas con flag de "dirty" cada una.
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum NominationMode {
    Player,
    Staff,
}

#[derive(Clone, PartialEq, Debug, Default)]
struct NominationList {
    ids: Vec<String>,
    dirty: bool,
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct NominationState {
    player: NominationList,
    staff: NominationList,
}

impl NominationState {
    pub fn new() -> Self {
        Self::default()
    }

    fn list(&self, mode: NominationMode) -> &NominationList {
        match mode {
            NominationMode::Player => &self.player,
            NominationMode::Staff => &self.staff,
        }
    }

    fn list_mut(&mut self, mode: NominationMode) -> &mut NominationList {
        match mode {
            NominationMode::Player => &mut self.player,
            NominationMode::Staff => &mut self.staff,
        }
    }

    /// Alterna la pertenencia de `person_id`: si no estaba se agrega al final,
    /// si estaba se quita. Nunca hay duplicados.
    pub fn toggle(&mut self, mode: NominationMode, person_id: &str) {
        let list = self.list_mut(mode);
        if let Some(index) = list.ids.iter().position(|id| id == person_id) {
            list.ids.remove(index);
        } else {
            list.ids.push(person_id.to_string());
        }
        list.dirty = true;
    }

    /// Reemplaza la lista completa (siembra de la selección por defecto)
    pub fn bulk_set(&mut self, mode: NominationMode, ids: Vec<String>) {
        let list = self.list_mut(mode);
        list.ids.clear();
        for id in ids {
            if !list.ids.contains(&id) {
                list.ids.push(id);
            }
        }
        list.dirty = true;
    }

    /// Limpia la lista y su flag de dirty
    pub fn reset(&mut self, mode: NominationMode) {
        let list = self.list_mut(mode);
        list.ids.clear();
        list.dirty = false;
    }

    pub fn ids(&self, mode: NominationMode) -> &[String] {
        &self.list(mode).ids
    }

    pub fn is_dirty(&self, mode: NominationMode) -> bool {
        self.list(mode).dirty
    }

    /// Selección efectiva: la lista del usuario si la tocó, si no la
    /// selección por defecto calculada a partir del roster del equipo.
    pub fn selection_or_default(&self, mode: NominationMode, default_ids: &[String]) -> Vec<String> {
        let list = self.list(mode);
        if list.dirty {
            list.ids.clone()
        } else {
            default_ids.to_vec()
        }
    }
}
