// ============================================================================
// TEAM HOME VIEW - Home del equipo + selector de nominados
// ============================================================================
// Pantalla protegida: solo se llega con sesión Authenticated. Exercita el
// caché de queries (home + roster), el hint para padres, la selección de
// nominados con ida y vuelta al selector y la mutación de agendar
// entrenamiento (que invalida el tag del equipo).
// ============================================================================

use std::rc::Rc;

use yew::prelude::*;

use crate::hooks::context::use_app_context;
use crate::hooks::use_nominations::use_nominations;
use crate::hooks::use_query::use_query;
use crate::hooks::use_screen::use_screen;
use crate::hooks::use_session::use_session;
use crate::models::account::GetMeResponse;
use crate::models::team::{GetMyTeamHomeResponse, ListTeamMembersResponse};
use crate::models::training::ScheduleTrainingRequest;
use crate::services::account_api;
use crate::services::query_client::{provides_nothing, QueryOptions};
use crate::services::rpc_error::{RpcCode, RpcError};
use crate::services::team_api;
use crate::state::nomination_state::NominationMode;

const HOME_LOCATION: &str = "/team";
const SELECTOR_LOCATION: &str = "/team/nominate";

fn live_query_options() -> QueryOptions {
    QueryOptions {
        refetch_on_mount: true,
        refetch_on_focus: true,
        refetch_on_reconnect: true,
    }
}

/// Errores de página (not-found / permission-denied / resto)
fn page_error(error: &RpcError) -> String {
    match error.code {
        RpcCode::NotFound => "Team not found".to_string(),
        RpcCode::PermissionDenied => "You don't have access to this team".to_string(),
        RpcCode::Unauthenticated => "Session expired, please sign in again".to_string(),
        _ => format!("Something went wrong ({})", error.code),
    }
}

#[derive(Properties, PartialEq)]
pub struct TeamHomeProps {
    pub user_id: String,
}

#[function_component(TeamHome)]
pub fn team_home(props: &TeamHomeProps) -> Html {
    let session = use_session();
    let me = use_query::<GetMeResponse>(
        account_api::GET_ME,
        account_api::get_me_params(),
        QueryOptions::default(),
        provides_nothing,
    );

    // Primer equipo con membresía de alguna persona vinculada
    let team_id = me.data.as_ref().and_then(|me| {
        me.linked_persons
            .iter()
            .flat_map(|person| person.team_memberships.iter())
            .map(|team| team.id.clone())
            .next()
    });

    html! {
        <div class="team-home">
            <header>
                <span class="user">{format!("Signed in as {}", props.user_id)}</span>
                <button onclick={session.logout.reform(|_| ())}>{"Sign out"}</button>
            </header>
            {
                match (&me.error, team_id, &me.data) {
                    (Some(error), _, _) => html! { <p class="error-banner">{page_error(error)}</p> },
                    (None, Some(team_id), Some(me)) => html! {
                        <TeamPanel team_id={team_id} me={me.clone()} />
                    },
                    (None, None, Some(_)) => html! { <p>{"No team memberships yet"}</p> },
                    _ => html! { <p>{"Loading..."}</p> },
                }
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct TeamPanelProps {
    team_id: String,
    me: Rc<GetMeResponse>,
}

#[function_component(TeamPanel)]
fn team_panel(props: &TeamPanelProps) -> Html {
    let ctx = use_app_context();
    let screens = use_screen();
    let nominations = use_nominations();
    let selector_open = use_state(|| false);
    let schedule_busy = use_state(|| false);
    let schedule_result = use_state(|| None::<Result<String, RpcError>>);
    let hint_version = use_state(|| 0u32);

    let home = use_query::<GetMyTeamHomeResponse>(
        team_api::GET_MY_TEAM_HOME,
        team_api::team_home_params(&props.team_id),
        live_query_options(),
        team_api::team_home_tags,
    );
    let members = use_query::<ListTeamMembersResponse>(
        team_api::LIST_TEAM_MEMBERS,
        team_api::team_members_params(&props.team_id),
        live_query_options(),
        team_api::team_member_tags,
    );

    // Hint para cuentas vinculadas solo como padre/madre
    let parent_hint = team_api::parent_link_only_person(&props.me, &props.team_id)
        .filter(|_| !ctx.team_ui.borrow().parent_hint_read(&props.team_id))
        .map(|person| {
            format!(
                "You see this team because {} {} plays here",
                person.first_name, person.last_name
            )
        });

    let dismiss_hint = {
        let ctx = ctx.clone();
        let team_id = props.team_id.clone();
        let hint_version = hint_version.clone();
        Callback::from(move |_| {
            ctx.team_ui
                .borrow_mut()
                .mark_parent_hint_read(&team_id, &ctx.store);
            hint_version.set(*hint_version + 1);
        })
    };

    let can_edit = team_api::has_edit_allowance(&props.me, &props.team_id);

    let open_selector = {
        let selector_open = selector_open.clone();
        let navigate_from = screens.navigate_from.clone();
        Callback::from(move |_| {
            navigate_from.emit(Some(HOME_LOCATION.to_string()));
            selector_open.set(true);
        })
    };

    let close_selector = {
        let selector_open = selector_open.clone();
        let pop_from = screens.pop_from.clone();
        Callback::from(move |_| {
            pop_from.emit(Some(SELECTOR_LOCATION.to_string()));
            selector_open.set(false);
        })
    };

    let refresh = {
        let ctx = ctx.clone();
        let team_id = props.team_id.clone();
        Callback::from(move |_| {
            let queries = ctx.queries.clone();
            let team_id = team_id.clone();
            wasm_bindgen_futures::spawn_local(async move {
                if let Err(e) = queries
                    .refetch(
                        team_api::GET_MY_TEAM_HOME,
                        team_api::team_home_params(&team_id),
                        team_api::team_home_tags,
                    )
                    .await
                {
                    log::warn!("⚠️ Manual refresh failed: {}", e);
                }
            });
        })
    };

    let schedule = {
        let ctx = ctx.clone();
        let team_id = props.team_id.clone();
        let nominations = nominations.clone();
        let members = members.data.clone();
        let schedule_busy = schedule_busy.clone();
        let schedule_result = schedule_result.clone();
        Callback::from(move |_| {
            let Some(roster) = members.clone() else {
                return;
            };
            let queries = ctx.queries.clone();
            let request = ScheduleTrainingRequest {
                team_id: team_id.clone(),
                scheduled_at: chrono::Utc::now().to_rfc3339(),
                nominated_players: nominations.state.selection_or_default(
                    NominationMode::Player,
                    &team_api::default_nominations(&roster, NominationMode::Player),
                ),
                nominated_staff: nominations.state.selection_or_default(
                    NominationMode::Staff,
                    &team_api::default_nominations(&roster, NominationMode::Staff),
                ),
                ..ScheduleTrainingRequest::default()
            };

            let reset = nominations.reset.clone();
            let schedule_busy = schedule_busy.clone();
            let schedule_result = schedule_result.clone();
            schedule_busy.set(true);
            wasm_bindgen_futures::spawn_local(async move {
                match team_api::schedule_training(&queries, &request).await {
                    Ok(response) => {
                        log::info!("✅ Training scheduled: {}", response.id);
                        reset.emit(NominationMode::Player);
                        reset.emit(NominationMode::Staff);
                        schedule_result.set(Some(Ok(response.id)));
                    }
                    Err(e) => {
                        log::error!("❌ Could not schedule training: {}", e);
                        schedule_result.set(Some(Err(e)));
                    }
                }
                schedule_busy.set(false);
            });
        })
    };

    if *selector_open {
        return html! {
            <NominationSelector
                members={members.data.clone()}
                back_target={screens.back_target.clone()}
                on_back={close_selector}
            />
        };
    }

    html! {
        <div class="team-panel">
            {
                match (&home.error, &home.data) {
                    (Some(error), None) => html! { <p class="error-banner">{page_error(error)}</p> },
                    (_, Some(team)) => html! {
                        <>
                            <h2>{team.team_name.clone()}</h2>
                            <button onclick={refresh}>{"Refresh"}</button>
                            if home.stale {
                                <span class="refreshing">{"Refreshing..."}</span>
                            }
                            if let Some(hint) = parent_hint {
                                <div class="parent-hint">
                                    <p>{hint}</p>
                                    <button onclick={dismiss_hint}>{"Got it"}</button>
                                </div>
                            }
                            <h3>{format!("Trainings ({})", team.trainings.len())}</h3>
                            <ul>
                                { for team.trainings.iter().map(|training| html! {
                                    <li key={training.id.clone()}>
                                        {training.scheduled_at.clone()}
                                        {" "}
                                        {training.location.clone().unwrap_or_default()}
                                    </li>
                                }) }
                            </ul>
                            if can_edit {
                                <button onclick={open_selector}>{"Edit nominations"}</button>
                                <button onclick={schedule} disabled={*schedule_busy}>
                                    { if *schedule_busy { "Scheduling..." } else { "Schedule training" } }
                                </button>
                            }
                            if let Some(result) = &*schedule_result {
                                {
                                    match result {
                                        Ok(id) => html! { <p class="ok-banner">{format!("Training {} scheduled", id)}</p> },
                                        Err(e) => html! { <p class="error-banner">{page_error(e)}</p> },
                                    }
                                }
                            }
                        </>
                    },
                    _ => html! { <p>{"Loading team..."}</p> },
                }
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct NominationSelectorProps {
    members: Option<Rc<ListTeamMembersResponse>>,
    back_target: Option<String>,
    on_back: Callback<()>,
}

/// Selector de personas a pantalla completa: la selección sobrevive la ida
/// y vuelta porque vive en el AppContext, no en esta vista.
#[function_component(NominationSelector)]
fn nomination_selector(props: &NominationSelectorProps) -> Html {
    let nominations = use_nominations();

    let Some(roster) = props.members.clone() else {
        return html! { <p>{"Loading roster..."}</p> };
    };

    let section = |mode: NominationMode, title: &str| {
        let defaults = team_api::default_nominations(&roster, mode);
        let selected = nominations.state.selection_or_default(mode, &defaults);
        html! {
            <section>
                <h3>{title.to_string()}</h3>
                <ul>
                    { for team_api::members_by_mode(&roster, mode).into_iter().map(|member| {
                        let checked = selected.contains(&member.id);
                        let toggle = nominations.toggle.clone();
                        let member_id = member.id.clone();
                        let bulk_seed = {
                            // Antes del primer toque hay que materializar la
                            // selección por defecto para poder alterarla
                            let dirty = nominations.state.is_dirty(mode);
                            let defaults = defaults.clone();
                            let bulk_set = nominations.bulk_set.clone();
                            move || {
                                if !dirty {
                                    bulk_set.emit((mode, defaults.clone()));
                                }
                            }
                        };
                        let onclick = Callback::from(move |_| {
                            bulk_seed();
                            toggle.emit((mode, member_id.clone()));
                        });
                        html! {
                            <li key={member.id.clone()}>
                                <button class={if checked { "chip selected" } else { "chip" }} {onclick}>
                                    <span class="initials">{team_api::member_initials(member)}</span>
                                    {team_api::member_full_name(member)}
                                </button>
                            </li>
                        }
                    }) }
                </ul>
            </section>
        }
    };

    html! {
        <div class="nomination-selector">
            <header>
                if let Some(target) = &props.back_target {
                    <button onclick={props.on_back.reform(|_| ())}>
                        {format!("← {}", target)}
                    </button>
                }
                <h2>{"Nominations"}</h2>
            </header>
            { section(NominationMode::Player, "Players") }
            { section(NominationMode::Staff, "Staff") }
        </div>
    }
}
