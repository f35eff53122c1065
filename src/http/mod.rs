use crate::auth::{AccessLevel, BasicCredentials};
use crate::config::AppConfig;
use crate::error::GitWireError;
use crate::serve::AppCore;
use actix_web::http::header;
use actix_web::web::{get, post, scope, Data};
use actix_web::{web, App, HttpRequest, HttpResponse};

pub mod body;
pub mod receive;
pub mod refs;
pub mod upload;

#[derive(Clone)]
pub struct HttpServer {
    pub addr: String,
    pub port: u16,
    pub core: AppCore,
}

impl HttpServer {
    pub fn new(addr: String, port: u16, core: AppCore) -> Self {
        Self { addr, port, core }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.addr, self.port)
    }

    pub async fn run(&self) -> std::io::Result<()> {
        let core = self.core.clone();
        actix_web::HttpServer::new(move || {
            App::new()
                .app_data(Data::new(core.clone()))
                .wrap(actix_web::middleware::Logger::new(
                    "%a %r %s %b bytes in %D microseconds",
                ))
                .configure(routes)
        })
        .bind(self.bind_addr())?
        .run()
        .await
    }
}

/// Smart HTTP route table, shared between the server and the tests.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        scope("/{namespace}/{repo_name}")
            .route("/info/refs", get().to(refs::info_refs))
            .route("/HEAD", get().to(refs::head))
            .route("/git-upload-pack", post().to(upload::upload_pack))
            .route("/git-receive-pack", post().to(receive::receive_pack)),
    );
}

/// Gate a request on the collaborator's decision. Both missing and
/// rejected credentials answer 401 with the Basic challenge so the client
/// can (re-)authenticate.
pub(crate) async fn authorize(
    req: &HttpRequest,
    core: &AppCore,
    namespace: &str,
    repo: &str,
    level: AccessLevel,
) -> Result<(), HttpResponse> {
    let credentials = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| BasicCredentials::from_header(value).ok());
    match core
        .access
        .authorize(credentials.as_ref(), namespace, repo, level)
        .await
    {
        Ok(()) => Ok(()),
        Err(GitWireError::Unauthenticated) | Err(GitWireError::Unauthorized) => {
            Err(HttpResponse::Unauthorized()
                .insert_header((
                    header::WWW_AUTHENTICATE,
                    format!("Basic realm=\"{}\"", AppConfig::http().realm),
                ))
                .finish())
        }
        Err(err) => Err(HttpResponse::InternalServerError().body(err.to_string())),
    }
}

pub(crate) fn no_cache(builder: &mut actix_web::HttpResponseBuilder) -> &mut actix_web::HttpResponseBuilder {
    builder
        .insert_header(("Pragma", "no-cache"))
        .insert_header(("Cache-Control", "no-cache, max-age=0, must-revalidate"))
        .insert_header(("Expires", "Fri, 01 Jan 1980 00:00:00 GMT"))
}
