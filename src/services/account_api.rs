// Endpoints del AccountService (stubs unarios sobre el transporte)

use serde_json::{json, Value};

use crate::models::account::{AttachWebDeviceRequest, GetMeResponse, LoginRequest, LoginResponse};
use crate::services::api_client::{decode, encode, UnaryClient};
use crate::services::rpc_error::RpcError;

pub const LOGIN: &str = "/teamplanner.account.v1.AccountService/Login";
pub const GET_ME: &str = "/teamplanner.account.v1.AccountService/GetMe";
pub const ATTACH_WEB_DEVICE: &str = "/teamplanner.account.v1.AccountService/AttachWebDevice";

/// Login con credenciales; devuelve el token de sesión
pub async fn login<C: UnaryClient>(
    client: &C,
    email: &str,
    password: &str,
) -> Result<LoginResponse, RpcError> {
    let request = encode(&LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    })?;
    decode(client.unary(LOGIN, request).await?)
}

/// "Quién soy": confirma la identidad del token vigente
pub async fn get_me<C: UnaryClient>(client: &C) -> Result<GetMeResponse, RpcError> {
    decode(client.unary(GET_ME, json!({})).await?)
}

/// Asocia el dispositivo a la cuenta para notificaciones push
pub async fn attach_web_device<C: UnaryClient>(
    client: &C,
    device_notification_token: String,
    installation_id: String,
) -> Result<(), RpcError> {
    let request = encode(&AttachWebDeviceRequest {
        device_notification_token,
        installation_id,
    })?;
    client.unary(ATTACH_WEB_DEVICE, request).await?;
    Ok(())
}

/// Parámetros canónicos de la query cacheada de GetMe
pub fn get_me_params() -> Value {
    json!({})
}
