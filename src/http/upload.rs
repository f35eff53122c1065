use crate::error::GitWireError;
use crate::http::body::collect_body;
use crate::http::{authorize, no_cache};
use crate::serve::AppCore;
use crate::service::{Service, ServiceKind};
use actix_web::web::{Data, Path, Payload};
use actix_web::{HttpRequest, HttpResponse, Responder};
use tracing::error;

pub async fn upload_pack(
    req: HttpRequest,
    payload: Payload,
    path: Path<(String, String)>,
    app: Data<AppCore>,
) -> impl Responder {
    let (namespace, repo_name) = path.into_inner();
    let kind = ServiceKind::UploadPack;
    if let Err(resp) = authorize(&req, &app, &namespace, &repo_name, kind.required_access()).await
    {
        return resp;
    }
    let agent = match app.repo_store.attach(&namespace, &repo_name).await {
        Ok(agent) => agent,
        Err(GitWireError::RepoNotFound) => return HttpResponse::NotFound().body("Repo not found"),
        Err(err) => return HttpResponse::InternalServerError().body(err.to_string()),
    };
    let body = match collect_body(&req, payload).await {
        Ok(body) => body,
        Err(err) => return HttpResponse::InternalServerError().body(err.to_string()),
    };
    let mut service = Service::new(kind, agent).with_observer(app.observer.clone());
    match service.run(body).await {
        Ok(reply) => no_cache(&mut HttpResponse::Ok())
            .content_type(kind.result_content_type())
            .body(reply),
        Err(err) => {
            error!("upload-pack error: {}", err);
            HttpResponse::InternalServerError().body(err.to_string())
        }
    }
}
