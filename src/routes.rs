use crate::catalog::CatalogService;
use crate::database::EntityStore;
use crate::error::CatalogError;
use crate::model::*;
use crate::social::SocialGraphService;
use actix_web::error::{InternalError, JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse, ResponseError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub social: Arc<SocialGraphService>,
}

impl AppState {
    pub fn in_memory() -> Self {
        let social = Arc::new(SocialGraphService::new(Arc::new(
            EntityStore::<User>::new(),
        )));
        let catalog = Arc::new(CatalogService::new(
            Arc::new(EntityStore::<Film>::new()),
            Arc::clone(&social),
        ));
        AppState { catalog, social }
    }
}

type State = web::Data<AppState>;

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    description: String,
}

impl ResponseError for CatalogError {
    fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::Validation(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound { .. } => StatusCode::NOT_FOUND,
        }
    }

    fn error_response(&self) -> HttpResponse {
        warn!("{}", self);
        let error = match self {
            CatalogError::Validation(_) => "Validation failed",
            CatalogError::NotFound { .. } => "Not found",
        };
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error,
            description: self.to_string(),
        })
    }
}

/// Rejects requests whose body, query or path could not be decoded.
fn malformed_request<E>(err: E, req: &HttpRequest) -> actix_web::Error
where
    E: fmt::Debug + fmt::Display + 'static,
{
    warn!("Malformed request to {}: {}", req.path(), err);
    let response = HttpResponse::BadRequest().json(ErrorBody {
        error: "Malformed request",
        description: err.to_string(),
    });
    InternalError::from_response(err, response).into()
}

async fn unknown_route(req: HttpRequest) -> HttpResponse {
    warn!("No route for {} {}", req.method(), req.path());
    HttpResponse::NotFound().json(ErrorBody {
        error: "Not found",
        description: format!("No route for {} {}", req.method(), req.path()),
    })
}

#[derive(Deserialize)]
struct PopularParams {
    count: Option<i64>,
}

async fn all_films(state: State) -> HttpResponse {
    HttpResponse::Ok().json(state.catalog.get_all_films())
}

async fn create_film(state: State, film: web::Json<Film>) -> Result<HttpResponse, CatalogError> {
    info!("Create film: {:?}", film);
    let film = state.catalog.create_film(film.into_inner())?;
    Ok(HttpResponse::Created().json(film))
}

async fn update_film(state: State, film: web::Json<Film>) -> Result<HttpResponse, CatalogError> {
    info!("Update film: {:?}", film);
    let film = state.catalog.update_film(film.into_inner())?;
    Ok(HttpResponse::Ok().json(film))
}

async fn film_by_id(state: State, id: web::Path<Id>) -> Result<HttpResponse, CatalogError> {
    let film = state.catalog.get_film_by_id(id.into_inner())?;
    Ok(HttpResponse::Ok().json(film))
}

async fn popular_films(state: State, params: web::Query<PopularParams>) -> HttpResponse {
    HttpResponse::Ok().json(state.catalog.get_popular_films(params.count))
}

async fn add_like(state: State, path: web::Path<(Id, Id)>) -> Result<HttpResponse, CatalogError> {
    let (film_id, user_id) = path.into_inner();
    state.catalog.add_like(film_id, user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

async fn remove_like(
    state: State,
    path: web::Path<(Id, Id)>,
) -> Result<HttpResponse, CatalogError> {
    let (film_id, user_id) = path.into_inner();
    state.catalog.remove_like(film_id, user_id)?;
    Ok(HttpResponse::NoContent().finish())
}

async fn all_users(state: State) -> HttpResponse {
    HttpResponse::Ok().json(state.social.get_all_users())
}

async fn create_user(state: State, user: web::Json<User>) -> Result<HttpResponse, CatalogError> {
    info!("Create user: {:?}", user);
    let user = state.social.create_user(user.into_inner())?;
    Ok(HttpResponse::Created().json(user))
}

async fn update_user(state: State, user: web::Json<User>) -> Result<HttpResponse, CatalogError> {
    info!("Update user: {:?}", user);
    let user = state.social.update_user(user.into_inner())?;
    Ok(HttpResponse::Ok().json(user))
}

async fn user_by_id(state: State, id: web::Path<Id>) -> Result<HttpResponse, CatalogError> {
    let user = state.social.get_user_by_id(id.into_inner())?;
    Ok(HttpResponse::Ok().json(user))
}

async fn add_friend(state: State, path: web::Path<(Id, Id)>) -> Result<HttpResponse, CatalogError> {
    let (user_id, friend_id) = path.into_inner();
    state.social.add_friend(user_id, friend_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn remove_friend(
    state: State,
    path: web::Path<(Id, Id)>,
) -> Result<HttpResponse, CatalogError> {
    let (user_id, friend_id) = path.into_inner();
    state.social.remove_friend(user_id, friend_id)?;
    Ok(HttpResponse::Ok().finish())
}

async fn friends(state: State, id: web::Path<Id>) -> Result<HttpResponse, CatalogError> {
    let friends = state.social.get_friends(id.into_inner())?;
    Ok(HttpResponse::Ok().json(friends))
}

async fn common_friends(
    state: State,
    path: web::Path<(Id, Id)>,
) -> Result<HttpResponse, CatalogError> {
    let (user_id, other_id) = path.into_inner();
    let common = state.social.get_common_friends(user_id, other_id)?;
    Ok(HttpResponse::Ok().json(common))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default().error_handler(malformed_request::<JsonPayloadError>),
    )
    .app_data(web::QueryConfig::default().error_handler(malformed_request::<QueryPayloadError>))
    .app_data(web::PathConfig::default().error_handler(malformed_request::<PathError>))
    .service(
        web::resource("/films")
            .route(web::get().to(all_films))
            .route(web::post().to(create_film))
            .route(web::put().to(update_film)),
    )
    // Must come before /films/{id}.
    .service(web::resource("/films/popular").route(web::get().to(popular_films)))
    .service(web::resource("/films/{id}").route(web::get().to(film_by_id)))
    .service(
        web::resource("/films/{id}/like/{user_id}")
            .route(web::put().to(add_like))
            .route(web::delete().to(remove_like)),
    )
    .service(
        web::resource("/users")
            .route(web::get().to(all_users))
            .route(web::post().to(create_user))
            .route(web::put().to(update_user)),
    )
    .service(web::resource("/users/{id}").route(web::get().to(user_by_id)))
    .service(web::resource("/users/{id}/friends").route(web::get().to(friends)))
    .service(
        web::resource("/users/{id}/friends/common/{other_id}")
            .route(web::get().to(common_friends)),
    )
    .service(
        web::resource("/users/{id}/friends/{friend_id}")
            .route(web::put().to(add_friend))
            .route(web::delete().to(remove_friend)),
    )
    .default_service(web::to(unknown_route));
}
