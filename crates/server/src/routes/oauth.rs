use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use service::auth::AuthError;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use super::auth::ServerState;
use crate::errors::ApiError;

const STATE_COOKIE: &str = "oauth_state";

#[derive(Debug, Serialize, ToSchema)]
pub struct Welcome {
    pub title: &'static str,
    pub authorize: &'static str,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SignedIn {
    pub name: String,
    pub subject: String,
    pub id_token: String,
}

fn state_cookie(value: String) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, value)).path("/").http_only(true).same_site(SameSite::Lax).build()
}

#[utoipa::path(get, path = "/", tag = "oauth", responses((status = 200, description = "Landing", body = Welcome)))]
pub async fn index() -> Json<Welcome> {
    Json(Welcome { title: "Welcome", authorize: "/authorize" })
}

#[utoipa::path(get, path = "/authorize", tag = "oauth", responses((status = 303, description = "Redirect to the identity provider")))]
pub async fn authorize(State(state): State<ServerState>, jar: CookieJar) -> Result<(CookieJar, Redirect), ApiError> {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    let url = state.login.authorization_url(&nonce)?;
    Ok((jar.add(state_cookie(nonce)), Redirect::to(&url)))
}

#[utoipa::path(
    get, path = "/oauth", tag = "oauth",
    params(CallbackParams),
    responses(
        (status = 200, description = "Signed in", body = SignedIn),
        (status = 400, description = "State mismatch or code exchange failed"),
        (status = 401, description = "Profile lookup failed")
    )
)]
pub async fn callback(
    State(state): State<ServerState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Json<SignedIn>), ApiError> {
    if let Some(err) = params.error.as_deref() {
        warn!(error = err, "identity provider refused authorization");
        return Err(ApiError::BadRequest("Authorization was not granted".into()));
    }
    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    if expected.is_none() || expected != params.state {
        return Err(AuthError::StateMismatch.into());
    }
    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("The authorization code is missing".into()))?;

    let outcome = state.login.complete_login(&code).await?;
    info!(user_id = outcome.user_id, created = outcome.created, "signed in");
    let jar = jar.remove(Cookie::build(STATE_COOKIE).path("/"));
    Ok((jar, Json(SignedIn { name: outcome.name, subject: outcome.subject, id_token: outcome.id_token })))
}
