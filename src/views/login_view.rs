// ============================================================================
// LOGIN VIEW - Formulario de ingreso
// ============================================================================

use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::hooks::use_session::use_session;
use crate::services::rpc_error::{RpcCode, RpcError};

/// Mapeo de código estructurado -> mensaje para el usuario
fn error_message(error: &RpcError) -> String {
    match error.code {
        RpcCode::Unauthenticated => "Invalid email or password".to_string(),
        RpcCode::Unavailable | RpcCode::DeadlineExceeded => {
            "Network error, please try again".to_string()
        }
        RpcCode::InvalidArgument => "Please check the highlighted fields".to_string(),
        _ => format!("Unexpected error ({})", error.code),
    }
}

#[function_component(LoginView)]
pub fn login_view() -> Html {
    let session = use_session();
    let email = use_state(String::new);
    let password = use_state(String::new);

    let on_email_change = {
        let email = email.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            email.set(input.value());
        })
    };

    let on_password_change = {
        let password = password.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            password.set(input.value());
        })
    };

    let on_submit = {
        let email = email.clone();
        let password = password.clone();
        let login = session.login.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();

            let email_val = (*email).clone();
            let password_val = (*password).clone();
            if email_val.is_empty() || password_val.is_empty() {
                return;
            }
            login.emit((email_val, password_val));
        })
    };

    // Violaciones por campo del detalle estructurado (si las hay)
    let field_errors = session
        .login_error
        .as_ref()
        .map(|e| e.violations_by_field())
        .unwrap_or_default();

    html! {
        <div class="login">
            <h1>{"Team Planner"}</h1>
            <form onsubmit={on_submit}>
                <label for="email">{"Email"}</label>
                <input
                    id="email"
                    type="email"
                    value={(*email).clone()}
                    oninput={on_email_change}
                    disabled={session.login_busy}
                />
                if let Some(error) = field_errors.get("email") {
                    <p class="field-error">{error.clone()}</p>
                }

                <label for="password">{"Password"}</label>
                <input
                    id="password"
                    type="password"
                    value={(*password).clone()}
                    oninput={on_password_change}
                    disabled={session.login_busy}
                />
                if let Some(error) = field_errors.get("password") {
                    <p class="field-error">{error.clone()}</p>
                }

                if let Some(error) = &session.login_error {
                    <p class="error-banner">{error_message(error)}</p>
                }

                <button type="submit" disabled={session.login_busy}>
                    { if session.login_busy { "Signing in..." } else { "Sign in" } }
                </button>
            </form>
        </div>
    }
}
