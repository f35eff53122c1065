use git_wire::agent::memory::MemoryRepoStore;
use git_wire::auth::OpenAccess;
use git_wire::config::AppConfig;
use git_wire::http::HttpServer;
use git_wire::oid::Oid;
use git_wire::serve::AppCore;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let store = MemoryRepoStore::new();
    seed_demo_repo(&store).await?;

    let core = AppCore::new(Arc::new(store), Arc::new(OpenAccess));
    let http = AppConfig::http();
    HttpServer::new(http.addr.clone(), http.port, core).run().await?;
    Ok(())
}

/// A small clonable repository so the server does something out of the box.
async fn seed_demo_repo(store: &MemoryRepoStore) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let root = Oid::from_hex("1111111111111111111111111111111111111111")?;
    let tip = Oid::from_hex("2222222222222222222222222222222222222222")?;
    let tagged = Oid::from_hex("3333333333333333333333333333333333333333")?;

    let repo = store.create("demo", "sample").await;
    repo.put_object(root, &[]).await;
    repo.put_object(tip, &[root]).await;
    repo.put_object(tagged, &[root]).await;
    repo.set_ref("refs/heads/main", tip).await;
    repo.set_ref("refs/tags/v0.1.0", tagged).await;
    repo.set_head("refs/heads/main").await;
    Ok(())
}
