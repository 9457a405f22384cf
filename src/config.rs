use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_base_url_development: String,
    pub api_base_url_production: String,
    pub environment: String,
    pub enable_logging: bool,
    pub network_timeout_seconds: u32,
    pub retry_attempts: u32,
    pub push_config: PushConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url_development: "http://localhost:8080".to_string(),
            api_base_url_production: "https://api.teamplanner.app".to_string(),
            environment: "development".to_string(),
            enable_logging: true,
            network_timeout_seconds: 30,
            retry_attempts: 1,
            push_config: PushConfig::default(),
        }
    }
}

/// Configuración de notificaciones push (Web Push)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    pub enabled: bool,
    pub application_server_key: String,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            application_server_key: String::new(),
        }
    }
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno en tiempo de compilación
    pub fn from_env() -> Self {
        Self {
            api_base_url_development: option_env!("API_BASE_URL_DEVELOPMENT")
                .unwrap_or("http://localhost:8080").to_string(),
            api_base_url_production: option_env!("API_BASE_URL_PRODUCTION")
                .unwrap_or("https://api.teamplanner.app").to_string(),
            environment: option_env!("ENVIRONMENT")
                .unwrap_or("development").to_string(),
            enable_logging: option_env!("ENABLE_LOGGING")
                .unwrap_or("true").parse().unwrap_or(true),
            network_timeout_seconds: option_env!("NETWORK_TIMEOUT_SECONDS")
                .unwrap_or("30").parse().unwrap_or(30),
            retry_attempts: option_env!("RETRY_ATTEMPTS")
                .unwrap_or("1").parse().unwrap_or(1),
            push_config: PushConfig {
                enabled: option_env!("PUSH_ENABLED")
                    .unwrap_or("true").parse().unwrap_or(true),
                application_server_key: option_env!("PUSH_APPLICATION_SERVER_KEY")
                    .unwrap_or("").to_string(),
            },
        }
    }

    /// Obtiene la URL base del API RPC según el entorno actual
    pub fn api_base_url(&self) -> &str {
        match self.environment.as_str() {
            "production" => &self.api_base_url_production,
            _ => &self.api_base_url_development,
        }
    }

    /// Verifica si el modo de logging está habilitado
    pub fn is_logging_enabled(&self) -> bool {
        self.enable_logging
    }
}

// Configuración global estática
lazy_static::lazy_static! {
    pub static ref CONFIG: AppConfig = AppConfig::from_env();
}
