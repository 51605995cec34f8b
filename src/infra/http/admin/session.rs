//! Admin sign-in, sign-out and the cookie guard in front of every other admin route.

use axum::{
    Form,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use askama::Template;
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use tracing::{debug, error};

use crate::application::error::{AppError, ErrorReport};
use crate::application::session::{IdentityError, SessionToken};
use crate::config::SessionSettings;
use crate::presentation::views::AdminLoginTemplate;

use super::super::api::models::LoginForm;
use super::AdminState;

const SOURCE: &str = "infra::http::admin::session";

pub(super) const LOGIN_PATH: &str = "/admin/login";
const LANDING_PATH: &str = "/admin/products";

/// Session cookie carrying the identity token.
pub(super) fn session_cookie(settings: &SessionSettings, token: &SessionToken) -> Cookie<'static> {
    let max_age = i64::try_from(settings.max_age.as_secs()).unwrap_or(i64::MAX);
    Cookie::build((settings.cookie_name.clone(), token.as_str().to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age))
        .secure(settings.secure)
        .build()
}

fn cleared_cookie(settings: &SessionSettings) -> Cookie<'static> {
    Cookie::build((settings.cookie_name.clone(), ""))
        .path("/")
        .build()
}

pub(super) fn read_session(jar: &CookieJar, settings: &SessionSettings) -> Option<SessionToken> {
    jar.get(&settings.cookie_name)
        .and_then(|cookie| SessionToken::new(cookie.value()))
}

/// Redirect to the login form unless the request carries a session cookie.
///
/// The token is handed to handlers as a request extension.
pub(super) async fn require_session(
    State(state): State<AdminState>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if request.uri().path() == LOGIN_PATH {
        return next.run(request).await;
    }

    match read_session(&jar, &state.session_settings) {
        Some(token) => {
            request.extensions_mut().insert(token);
            next.run(request).await
        }
        None => {
            debug!(
                target = "butik::http::admin",
                path = %request.uri().path(),
                "no session; redirecting to login"
            );
            Redirect::to(LOGIN_PATH).into_response()
        }
    }
}

pub(super) async fn login_form(State(state): State<AdminState>, jar: CookieJar) -> Response {
    if read_session(&jar, &state.session_settings).is_some() {
        return Redirect::to(LANDING_PATH).into_response();
    }
    login_page(StatusCode::OK, None)
}

pub(super) async fn login_submit(
    State(state): State<AdminState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.session.login(&form.email, &form.password).await {
        Ok(signed_in) => {
            let jar = jar.add(session_cookie(&state.session_settings, &signed_in.token));
            (jar, Redirect::to(LANDING_PATH)).into_response()
        }
        Err(err) => {
            let status = match err {
                IdentityError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                IdentityError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            };
            let report = ErrorReport::from_error(SOURCE, status, &err);
            let message = AppError::from(err).form_message();
            let mut response = login_page(status, Some(&message));
            report.attach(&mut response);
            response
        }
    }
}

pub(super) async fn logout(State(state): State<AdminState>, jar: CookieJar) -> Response {
    let jar = jar.remove(cleared_cookie(&state.session_settings));
    (jar, Redirect::to(LOGIN_PATH)).into_response()
}

/// Render the sign-in form, optionally with a notice above it.
fn login_page(status: StatusCode, error: Option<&str>) -> Response {
    let template = AdminLoginTemplate {
        action: LOGIN_PATH,
        error,
    };
    match template.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(err) => {
            error!(
                target = SOURCE,
                template = "templates/admin/login.html",
                error = %err,
                "template rendering failed"
            );
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            let mut response = (status, "Template rendering failed").into_response();
            ErrorReport::from_error(SOURCE, status, &err).attach(&mut response);
            response
        }
    }
}
