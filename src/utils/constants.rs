/// Claves de almacenamiento persistente (secure storage slots)
pub const SESSION_TOKEN_KEY: &str = "tp_session_token";
pub const INSTALLATION_ID_KEY: &str = "tp_installation_id";
pub const TEAM_UI_STATE_KEY: &str = "tp_team_ui_state";

/// Rol que distingue jugadores del resto del equipo (staff)
pub const PLAYER_ROLE_NAME: &str = "PLAYER";
pub const COACH_ROLE_NAME: &str = "COACH";
