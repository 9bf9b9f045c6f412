use actix_web::{get, http::header, web, HttpResponse, Result as WebResult};
use serde::Deserialize;
use tracing::error;

use crate::oauth::WikiOAuth;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[get("/oauth/login")]
pub async fn login(oauth: web::Data<WikiOAuth>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, oauth.authorize_url()))
        .finish()
}

#[get("/oauth/callback")]
pub async fn callback(oauth: web::Data<WikiOAuth>, query: web::Query<CallbackQuery>) -> WebResult<HttpResponse> {
    if let Some(err) = &query.error {
        error!("OAuth error from provider: {}", err);
        return Ok(HttpResponse::BadRequest().body(format!("OAuth error: {}", err)));
    }

    match oauth
        .complete_login(query.code.as_deref(), query.state.as_deref())
        .await
    {
        Ok(content) => Ok(HttpResponse::Ok()
            .content_type("text/plain; charset=utf-8")
            .body(format!("Fetched content:\n\n{}", content))),
        Err(e) if e.is_client_error() => Ok(HttpResponse::BadRequest().body(e.to_string())),
        Err(e) => {
            error!("OAuth callback failed: {}", e);
            Ok(HttpResponse::InternalServerError().body(e.to_string()))
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login).service(callback);
}
