use crate::auth::AccessLevel;
use crate::error::GitWireError;
use crate::http::{authorize, no_cache};
use crate::serve::AppCore;
use crate::service::{Service, ServiceKind};
use actix_web::web::{Data, Path};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct RefsQuery {
    service: ServiceKind,
}

pub async fn info_refs(
    req: HttpRequest,
    path: Path<(String, String)>,
    app: Data<AppCore>,
    query: web::Query<RefsQuery>,
) -> impl Responder {
    let (namespace, repo_name) = path.into_inner();
    let kind = query.service;
    if let Err(resp) = authorize(&req, &app, &namespace, &repo_name, kind.required_access()).await
    {
        return resp;
    }
    let agent = match app.repo_store.attach(&namespace, &repo_name).await {
        Ok(agent) => agent,
        Err(GitWireError::RepoNotFound) => return HttpResponse::NotFound().body("Repo not found"),
        Err(err) => return HttpResponse::InternalServerError().body(err.to_string()),
    };
    let mut service = Service::new(kind, agent).with_observer(app.observer.clone());
    let body = match service.advertise_http().await {
        Ok(body) => body,
        Err(err) => {
            error!("advertisement error: {}", err);
            return HttpResponse::InternalServerError().body(err.to_string());
        }
    };
    no_cache(&mut HttpResponse::Ok())
        .content_type(kind.advertisement_content_type())
        .body(body)
}

pub async fn head(
    req: HttpRequest,
    path: Path<(String, String)>,
    app: Data<AppCore>,
) -> impl Responder {
    let (namespace, repo_name) = path.into_inner();
    if let Err(resp) = authorize(&req, &app, &namespace, &repo_name, AccessLevel::Read).await {
        return resp;
    }
    let agent = match app.repo_store.attach(&namespace, &repo_name).await {
        Ok(agent) => agent,
        Err(GitWireError::RepoNotFound) => return HttpResponse::NotFound().body("Repo not found"),
        Err(err) => return HttpResponse::InternalServerError().body(err.to_string()),
    };
    match agent.head().await {
        Ok(Some(item)) => no_cache(&mut HttpResponse::Ok())
            .content_type("text/plain")
            .body(format!("ref: {}", item.full_name())),
        Ok(None) => HttpResponse::NotFound().body("No HEAD"),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}
