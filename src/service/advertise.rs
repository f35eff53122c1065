use crate::agent::RepoAgent;
use crate::capability::GitCapability;
use crate::error::GitWireError;
use crate::oid::Oid;
use crate::pkt_line::{flush_pkt, write_pkt_line};
use crate::refs::{RefItem, RefPrefix};
use crate::service::ServiceKind;
use bytes::{Bytes, BytesMut};

/// Build the ref advertisement: HEAD first, then branches, then tags, in
/// agent order, terminated by a flush. The capability list rides on the
/// first line after a NUL; an empty repository advertises the zero-oid
/// `capabilities^{}` placeholder so clients still see capabilities.
pub(crate) async fn advertise_refs(
    agent: &dyn RepoAgent,
    kind: ServiceKind,
) -> Result<Bytes, GitWireError> {
    let caps = GitCapability::join(&kind.advertised());
    // The agent reports the real target ref; on the wire it is renamed.
    let head = agent
        .head()
        .await?
        .map(|item| RefItem::new(RefPrefix::Head, "HEAD", item.oid));
    let branches = agent.branches().await?;
    let tags = agent.tags().await?;

    let mut out = BytesMut::new();
    let mut caps = Some(caps);
    for item in head.iter().chain(branches.iter()).chain(tags.iter()) {
        match caps.take() {
            Some(caps) => write_pkt_line(
                &mut out,
                format!("{}\0{}", item.advertised_line(), caps).as_bytes(),
            ),
            None => write_pkt_line(&mut out, item.advertised_line().as_bytes()),
        }
    }
    if let Some(caps) = caps.take() {
        write_pkt_line(
            &mut out,
            format!("{} capabilities^{{}}\0{}", Oid::ZERO, caps).as_bytes(),
        );
    }
    flush_pkt(&mut out);
    Ok(out.freeze())
}

/// Prefix an advertisement with the smart HTTP service header.
pub(crate) fn with_http_prelude(kind: ServiceKind, refs: Bytes) -> Bytes {
    let mut out = BytesMut::new();
    write_pkt_line(&mut out, format!("# service={}", kind.wire_name()).as_bytes());
    flush_pkt(&mut out);
    out.extend_from_slice(&refs);
    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::memory::MemoryRepoStore;
    use crate::oid::Oid;

    fn oid(fill: u8) -> Oid {
        Oid::from_bytes(&[fill; 20]).unwrap()
    }

    #[tokio::test]
    async fn test_head_precedes_branches_and_tags() {
        let store = MemoryRepoStore::new();
        let agent = store.create("u", "r").await;
        agent.put_object(oid(0xaa), &[]).await;
        agent.put_object(oid(0xbb), &[]).await;
        agent.set_ref("refs/heads/main", oid(0xaa)).await;
        agent.set_ref("refs/tags/v1", oid(0xbb)).await;
        agent.set_head("refs/heads/main").await;

        let body = advertise_refs(&agent, ServiceKind::UploadPack).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();
        let head_at = text.find(" HEAD\0").unwrap();
        let branch_at = text.find("refs/heads/main").unwrap();
        let tag_at = text.find("refs/tags/v1").unwrap();
        assert!(head_at < branch_at && branch_at < tag_at);
        assert!(text.ends_with("0000"));
    }

    #[tokio::test]
    async fn test_capabilities_attach_once_on_first_line() {
        let store = MemoryRepoStore::new();
        let agent = store.create("u", "r").await;
        agent.put_object(oid(0xaa), &[]).await;
        agent.set_ref("refs/heads/main", oid(0xaa)).await;
        agent.set_ref("refs/heads/dev", oid(0xaa)).await;
        agent.set_head("refs/heads/main").await;

        let body = advertise_refs(&agent, ServiceKind::ReceivePack).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();
        assert_eq!(text.matches('\0').count(), 1);
        assert!(text.contains("HEAD\0report-status delete-refs"));
    }

    #[tokio::test]
    async fn test_unresolvable_head_attaches_caps_to_first_ref() {
        let store = MemoryRepoStore::new();
        let agent = store.create("u", "r").await;
        agent.put_object(oid(0xaa), &[]).await;
        agent.set_ref("refs/heads/main", oid(0xaa)).await;

        let body = advertise_refs(&agent, ServiceKind::UploadPack).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();
        assert!(!text.contains("HEAD"));
        assert!(text.contains("refs/heads/main\0thin-pack multi_ack multi_ack_detailed"));
    }

    #[tokio::test]
    async fn test_empty_repo_placeholder() {
        let store = MemoryRepoStore::new();
        let agent = store.create("u", "r").await;
        let body = advertise_refs(&agent, ServiceKind::UploadPack).await.unwrap();
        let text = String::from_utf8_lossy(&body).to_string();
        assert!(text.contains(
            "0000000000000000000000000000000000000000 capabilities^{}\0thin-pack multi_ack multi_ack_detailed"
        ));
        assert!(text.ends_with("0000"));
    }

    #[tokio::test]
    async fn test_http_prelude() {
        let store = MemoryRepoStore::new();
        let agent = store.create("u", "r").await;
        let refs = advertise_refs(&agent, ServiceKind::UploadPack).await.unwrap();
        let body = with_http_prelude(ServiceKind::UploadPack, refs);
        assert!(body.starts_with(b"001e# service=git-upload-pack\n0000"));
    }
}
