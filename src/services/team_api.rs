// Endpoints del TeamService sobre el caché de queries, más los selectores
// derivados de las respuestas (roster, hint de padres, permisos de edición).

use serde_json::{json, Value};

use crate::models::account::{AccountLink, GetMeResponse, LinkedPerson};
use crate::models::team::{GetMyTeamHomeResponse, ListTeamMembersResponse, Member};
use crate::models::training::{ScheduleTrainingRequest, ScheduleTrainingResponse};
use crate::services::api_client::{decode, encode, UnaryClient};
use crate::services::query_client::{QueryClient, QueryOptions, Tag};
use crate::services::rpc_error::RpcError;
use crate::state::nomination_state::NominationMode;
use crate::utils::constants::{COACH_ROLE_NAME, PLAYER_ROLE_NAME};

pub const GET_MY_TEAM_HOME: &str = "/teamplanner.team.v1.TeamService/GetMyTeamHome";
pub const LIST_TEAM_MEMBERS: &str = "/teamplanner.team.v1.TeamService/ListTeamMembers";
pub const SCHEDULE_TRAINING: &str = "/teamplanner.team.v1.TeamService/ScheduleTraining";

/// Tags que provee GetMyTeamHome: el equipo completo
pub fn team_home_tags(response: &Value) -> Vec<Tag> {
    response
        .get("teamId")
        .and_then(Value::as_str)
        .map(|id| vec![Tag::new("team", id)])
        .unwrap_or_default()
}

/// Tags que provee ListTeamMembers: un tag por integrante
pub fn team_member_tags(response: &Value) -> Vec<Tag> {
    response
        .get("members")
        .and_then(Value::as_array)
        .map(|members| {
            members
                .iter()
                .filter_map(|m| m.get("id").and_then(Value::as_str))
                .map(|id| Tag::new("team-members", id))
                .collect()
        })
        .unwrap_or_default()
}

pub fn team_home_params(team_id: &str) -> Value {
    json!({ "teamId": team_id })
}

pub fn team_members_params(team_id: &str) -> Value {
    json!({ "teamId": team_id })
}

pub async fn get_my_team_home<C: UnaryClient + Clone>(
    queries: &QueryClient<C>,
    team_id: &str,
    options: QueryOptions,
) -> Result<GetMyTeamHomeResponse, RpcError> {
    decode(
        queries
            .ensure(GET_MY_TEAM_HOME, team_home_params(team_id), options, team_home_tags)
            .await?,
    )
}

pub async fn list_team_members<C: UnaryClient + Clone>(
    queries: &QueryClient<C>,
    team_id: &str,
    options: QueryOptions,
) -> Result<ListTeamMembersResponse, RpcError> {
    decode(
        queries
            .ensure(
                LIST_TEAM_MEMBERS,
                team_members_params(team_id),
                options,
                team_member_tags,
            )
            .await?,
    )
}

/// Agenda un entrenamiento; al confirmar invalida el tag del equipo para que
/// toda vista suscripta se refetchee.
pub async fn schedule_training<C: UnaryClient + Clone>(
    queries: &QueryClient<C>,
    request: &ScheduleTrainingRequest,
) -> Result<ScheduleTrainingResponse, RpcError> {
    let params = encode(request)?;
    decode(
        queries
            .mutate(
                SCHEDULE_TRAINING,
                params,
                vec![Tag::new("team", request.team_id.clone())],
            )
            .await?,
    )
}

// ----------------------------------------------------------------------------
// Selectores
// ----------------------------------------------------------------------------

/// Personas vinculadas a la cuenta con membresía en el equipo dado
pub fn persons_in_team<'a>(me: &'a GetMeResponse, team_id: &str) -> Vec<&'a LinkedPerson> {
    me.linked_persons
        .iter()
        .filter(|person| {
            person
                .team_memberships
                .iter()
                .any(|team| team.id == team_id)
        })
        .collect()
}

/// Persona vinculada como padre SOLO cuando no hay vínculo propio.
/// Asumimos que los padres no siempre conocen el nombre del equipo de sus
/// hijos, de ahí el hint.
pub fn parent_link_only_person<'a>(
    me: &'a GetMeResponse,
    team_id: &str,
) -> Option<&'a LinkedPerson> {
    let persons = persons_in_team(me, team_id);
    let has_self_link = persons
        .iter()
        .any(|person| person.linked_as == AccountLink::LinkedAsSelf);
    if has_self_link {
        return None;
    }
    persons
        .into_iter()
        .find(|person| person.linked_as == AccountLink::LinkedAsParent)
}

/// Si alguna persona vinculada tiene permiso de edición (rol COACH)
pub fn has_edit_allowance(me: &GetMeResponse, team_id: &str) -> bool {
    persons_in_team(me, team_id).iter().any(|person| {
        person
            .team_memberships
            .iter()
            .any(|team| team.id == team_id && team.role == COACH_ROLE_NAME)
    })
}

fn matches_mode(member: &Member, mode: NominationMode) -> bool {
    match mode {
        NominationMode::Player => member.role == PLAYER_ROLE_NAME,
        NominationMode::Staff => member.role != PLAYER_ROLE_NAME,
    }
}

/// Integrantes del roster para un modo, ordenados por nombre
pub fn members_by_mode<'a>(
    response: &'a ListTeamMembersResponse,
    mode: NominationMode,
) -> Vec<&'a Member> {
    let mut members: Vec<&Member> = response
        .members
        .iter()
        .filter(|member| matches_mode(member, mode))
        .collect();
    members.sort_by(|a, b| a.first_name.cmp(&b.first_name));
    members
}

/// Selección por defecto para sembrar las nominaciones de un modo
pub fn default_nominations(response: &ListTeamMembersResponse, mode: NominationMode) -> Vec<String> {
    members_by_mode(response, mode)
        .into_iter()
        .map(|member| member.id.clone())
        .collect()
}

pub fn member_initials(member: &Member) -> String {
    let first = member.first_name.chars().next();
    let last = member.last_name.chars().next();
    first.into_iter().chain(last).collect()
}

pub fn member_full_name(member: &Member) -> String {
    format!("{} {}", member.first_name, member.last_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::TeamMembership;
    use crate::services::api_client::testing::MockClient;
    use futures::executor::block_on;

    fn linked(id: &str, linked_as: AccountLink, team_id: &str, role: &str) -> LinkedPerson {
        LinkedPerson {
            id: id.to_string(),
            first_name: "Pat".to_string(),
            last_name: "Doe".to_string(),
            linked_as,
            team_memberships: vec![TeamMembership {
                id: team_id.to_string(),
                name: None,
                role: role.to_string(),
            }],
        }
    }

    fn member(id: &str, first: &str, last: &str, role: &str) -> Member {
        Member {
            id: id.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn persons_in_team_filters_by_membership() {
        let me = GetMeResponse {
            id: "u-1".into(),
            email: None,
            linked_persons: vec![
                linked("p-1", AccountLink::LinkedAsSelf, "T1", PLAYER_ROLE_NAME),
                linked("p-2", AccountLink::LinkedAsSelf, "T2", PLAYER_ROLE_NAME),
            ],
        };
        let in_team = persons_in_team(&me, "T1");
        assert_eq!(in_team.len(), 1);
        assert_eq!(in_team[0].id, "p-1");
    }

    #[test]
    fn parent_hint_only_without_self_link() {
        let mut me = GetMeResponse {
            id: "u-1".into(),
            email: None,
            linked_persons: vec![linked(
                "child-1",
                AccountLink::LinkedAsParent,
                "T1",
                PLAYER_ROLE_NAME,
            )],
        };
        assert_eq!(parent_link_only_person(&me, "T1").map(|p| p.id.as_str()), Some("child-1"));

        // Con un vínculo propio el hint desaparece
        me.linked_persons
            .push(linked("self-1", AccountLink::LinkedAsSelf, "T1", PLAYER_ROLE_NAME));
        assert!(parent_link_only_person(&me, "T1").is_none());
    }

    #[test]
    fn edit_allowance_requires_coach_role_in_that_team() {
        let me = GetMeResponse {
            id: "u-1".into(),
            email: None,
            linked_persons: vec![
                linked("p-1", AccountLink::LinkedAsSelf, "T1", COACH_ROLE_NAME),
                linked("p-2", AccountLink::LinkedAsSelf, "T2", PLAYER_ROLE_NAME),
            ],
        };
        assert!(has_edit_allowance(&me, "T1"));
        assert!(!has_edit_allowance(&me, "T2"));
    }

    #[test]
    fn members_by_mode_splits_players_from_staff() {
        let response = ListTeamMembersResponse {
            members: vec![
                member("m-1", "Zoe", "Keeper", PLAYER_ROLE_NAME),
                member("m-2", "Alex", "Coach", COACH_ROLE_NAME),
                member("m-3", "Ben", "Striker", PLAYER_ROLE_NAME),
            ],
        };

        let players = members_by_mode(&response, NominationMode::Player);
        assert_eq!(
            players.iter().map(|m| m.id.as_str()).collect::<Vec<_>>(),
            ["m-3", "m-1"],
        );

        let staff = members_by_mode(&response, NominationMode::Staff);
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].id, "m-2");

        assert_eq!(
            default_nominations(&response, NominationMode::Player),
            vec!["m-3".to_string(), "m-1".to_string()],
        );
    }

    #[test]
    fn member_display_helpers() {
        let m = member("m-1", "Ada", "Lovelace", PLAYER_ROLE_NAME);
        assert_eq!(member_initials(&m), "AL");
        assert_eq!(member_full_name(&m), "Ada Lovelace");
    }

    #[test]
    fn schedule_training_invalidates_team_tag() {
        let mock = MockClient::new();
        mock.respond(GET_MY_TEAM_HOME, Ok(json!({"teamId": "T1", "teamName": "Lions"})));
        mock.respond(SCHEDULE_TRAINING, Ok(json!({"id": "tr-9"})));
        mock.respond(
            GET_MY_TEAM_HOME,
            Ok(json!({"teamId": "T1", "teamName": "Lions", "trainings": [{"id": "tr-9", "scheduledAt": "2026-08-10T18:00:00Z"}]})),
        );
        let queries = QueryClient::new(mock.clone()).with_retry_limit(0);

        queries.subscribe(GET_MY_TEAM_HOME, &team_home_params("T1"), QueryOptions::default());
        block_on(get_my_team_home(&queries, "T1", QueryOptions::default())).unwrap();

        let request = ScheduleTrainingRequest {
            team_id: "T1".into(),
            scheduled_at: "2026-08-10T18:00:00Z".into(),
            nominated_players: vec!["m-1".into()],
            ..ScheduleTrainingRequest::default()
        };
        let response = block_on(schedule_training(&queries, &request)).unwrap();
        assert_eq!(response.id, "tr-9");

        // La mutación disparó el refetch del home del equipo
        assert_eq!(mock.calls_to(GET_MY_TEAM_HOME), 2);
        let home = block_on(get_my_team_home(&queries, "T1", QueryOptions::default())).unwrap();
        assert_eq!(home.trainings.len(), 1);
    }
}
