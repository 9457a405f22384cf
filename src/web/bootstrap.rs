// ============================================================================
// WEB BOOTSTRAP - Hooks del shell server-rendered
// ============================================================================
// Al abrir la web desde la app nativa no hay cookie de sesión previa: el
// token de arranque llega por query param. El hook de respuesta lo baja a
// una cookie (el backend la valida siempre) y el hook de fetch lo propaga
// como bearer en las llamadas al API durante la vida de ese request.
// ============================================================================

use http::header::{HeaderMap, HeaderValue, AUTHORIZATION, SET_COOKIE};
use http::Uri;

pub const BOOTSTRAP_TOKEN_PARAM: &str = "initToken";
const SESSION_COOKIE_NAME: &str = "SID";
const API_PATH_PREFIX: &str = "/api";

/// Extrae el token de arranque del query string
pub fn bootstrap_token(uri: &Uri) -> Option<String> {
    let query = uri.query()?;
    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        if key == BOOTSTRAP_TOKEN_PARAM && !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

/// Hook de respuesta: anexa el Set-Cookie con el token de arranque, SOLO
/// para rutas que no son del API.
pub fn append_bootstrap_cookie(uri: &Uri, headers: &mut HeaderMap) {
    let Some(token) = bootstrap_token(uri) else {
        return;
    };
    if uri.path().starts_with(API_PATH_PREFIX) {
        return;
    }

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict",
        SESSION_COOKIE_NAME, token
    );
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(e) => log::warn!("⚠️ Bootstrap token not cookie-safe, skipping: {}", e),
    }
}

/// Hook de fetch: agrega el bearer a las llamadas salientes al API mientras
/// dure el request de página que trajo el token.
pub fn authorize_outgoing(page_uri: &Uri, headers: &mut HeaderMap) {
    let Some(token) = bootstrap_token(page_uri) else {
        return;
    };
    match HeaderValue::from_str(&format!("Bearer {}", token)) {
        Ok(value) => {
            headers.insert(AUTHORIZATION, value);
        }
        Err(e) => log::warn!("⚠️ Bootstrap token not header-safe, skipping: {}", e),
    }
}
