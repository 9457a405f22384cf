// Espejos escritos a mano de los mensajes del TeamService (esquema externo).

use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GetMyTeamHomeResponse {
    pub team_id: String,
    pub team_name: String,
    #[serde(default)]
    pub trainings: Vec<TrainingSummary>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TrainingSummary {
    pub id: String,
    pub scheduled_at: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub nominated_count: u32,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListTeamMembersResponse {
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}
