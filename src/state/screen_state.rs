// ============================================================================
// SCREEN STATE - Back-stack de pantallas visitadas
// ============================================================================
// Calcula el destino efectivo de "volver" independientemente del historial
// del navegador: en cada navegación hacia adelante se apila la ubicación
// ANTERIOR; en una navegación hacia atrás se desapila una entrada antes de
// recalcular. Cada pantalla puede fijar su propio destino, ocultar el botón
// o definir un fallback para stack vacío.
// ============================================================================

/// Comportamiento del botón "volver" configurado por pantalla
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum BackBehavior {
    /// Usar el tope del stack (o el fallback si está vacío)
    #[default]
    Computed,
    /// Destino fijo que ignora el stack
    Pinned(String),
    /// Botón suprimido
    Hidden,
}

#[derive(Debug, Default)]
pub struct ScreenStack {
    stack: Vec<String>,
    behavior: BackBehavior,
    fallback: Option<String>,
    popping: bool,
}

impl ScreenStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuración por pantalla; dura hasta la próxima navegación
    pub fn configure(&mut self, behavior: BackBehavior, fallback: Option<String>) {
        self.behavior = behavior;
        self.fallback = fallback;
    }

    /// Marca que la navegación en curso es hacia atrás (gesto/botón físico)
    pub fn begin_pop(&mut self) {
        self.popping = true;
    }

    /// Se completó una navegación; `from` es la ubicación que se abandona.
    pub fn after_navigate(&mut self, from: Option<&str>) {
        // La configuración de la pantalla anterior caduca al navegar
        self.behavior = BackBehavior::Computed;
        self.fallback = None;

        if !self.popping {
            if let Some(from) = from {
                self.stack.push(from.to_string());
            }
        } else {
            self.stack.pop();
        }
        self.popping = false;
    }

    /// Destino efectivo de "volver"; `None` = sin botón
    pub fn back_target(&self) -> Option<&str> {
        match &self.behavior {
            BackBehavior::Hidden => None,
            BackBehavior::Pinned(target) => Some(target),
            BackBehavior::Computed => self
                .stack
                .last()
                .map(String::as_str)
                .or(self.fallback.as_deref()),
        }
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
