// Espejos escritos a mano de los mensajes del AccountService (esquema externo,
// JSON en camelCase como lo emite el transporte RPC).

use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session_id: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetMeResponse {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub linked_persons: Vec<LinkedPerson>,
}

/// Persona vinculada a la cuenta (uno mismo o un hijo, para padres)
#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LinkedPerson {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub linked_as: AccountLink,
    #[serde(default)]
    pub team_memberships: Vec<TeamMembership>,
}

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Debug)]
pub enum AccountLink {
    #[serde(rename = "LINKED_AS_SELF")]
    LinkedAsSelf,
    #[serde(rename = "LINKED_AS_PARENT")]
    LinkedAsParent,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TeamMembership {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub role: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AttachWebDeviceRequest {
    pub device_notification_token: String,
    pub installation_id: String,
}
