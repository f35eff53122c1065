use crate::agent::{ApplyReport, CommandStatus, RepoAgent, UnpackStatus};
use crate::error::GitWireError;
use crate::oid::Oid;
use crate::refs::RefItem;
use crate::serve::RepoStore;
use crate::service::command::RefUpdate;
use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use flate2::write::ZlibEncoder;
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct MemoryRepo {
    head: Option<String>,
    refs: Vec<(String, Oid)>,
    objects: HashMap<Oid, Vec<Oid>>,
}

/// In-memory repository agent: an ordered ref table plus a parent-edge
/// graph. Backs the demo binary and the protocol tests; every handle
/// clones the same shared repo, and each request gets its own handle.
#[derive(Clone)]
pub struct MemoryAgent {
    repo: Arc<Mutex<MemoryRepo>>,
}

impl MemoryAgent {
    fn new() -> Self {
        Self {
            repo: Arc::new(Mutex::new(MemoryRepo::default())),
        }
    }

    pub async fn put_object(&self, oid: Oid, parents: &[Oid]) {
        self.repo.lock().await.objects.insert(oid, parents.to_vec());
    }

    pub async fn set_ref(&self, full_name: &str, oid: Oid) {
        let mut repo = self.repo.lock().await;
        match repo.refs.iter_mut().find(|(name, _)| name == full_name) {
            Some(entry) => entry.1 = oid,
            None => repo.refs.push((full_name.to_string(), oid)),
        }
    }

    pub async fn set_head(&self, full_name: &str) {
        self.repo.lock().await.head = Some(full_name.to_string());
    }

    pub async fn ref_value(&self, full_name: &str) -> Option<Oid> {
        self.repo
            .lock()
            .await
            .refs
            .iter()
            .find(|(name, _)| name == full_name)
            .map(|(_, oid)| *oid)
    }
}

#[async_trait]
impl RepoAgent for MemoryAgent {
    async fn head(&self) -> Result<Option<RefItem>, GitWireError> {
        let repo = self.repo.lock().await;
        let target = match &repo.head {
            Some(target) => target,
            None => return Ok(None),
        };
        Ok(repo
            .refs
            .iter()
            .find(|(name, _)| name == target)
            .and_then(|(name, oid)| RefItem::from_full(name, *oid)))
    }

    async fn branches(&self) -> Result<Vec<RefItem>, GitWireError> {
        let repo = self.repo.lock().await;
        Ok(repo
            .refs
            .iter()
            .filter(|(name, _)| name.starts_with("refs/heads/"))
            .filter_map(|(name, oid)| RefItem::from_full(name, *oid))
            .collect())
    }

    async fn tags(&self) -> Result<Vec<RefItem>, GitWireError> {
        let repo = self.repo.lock().await;
        Ok(repo
            .refs
            .iter()
            .filter(|(name, _)| name.starts_with("refs/tags/"))
            .filter_map(|(name, oid)| RefItem::from_full(name, *oid))
            .collect())
    }

    async fn object_exists(&self, oid: &Oid) -> Result<bool, GitWireError> {
        Ok(self.repo.lock().await.objects.contains_key(oid))
    }

    async fn revwalk(&self, wants: &[Oid], haves: &[Oid]) -> Result<Vec<Oid>, GitWireError> {
        let repo = self.repo.lock().await;
        let mut hidden = HashSet::new();
        let mut stack: Vec<Oid> = haves.to_vec();
        while let Some(oid) = stack.pop() {
            if !hidden.insert(oid) {
                continue;
            }
            if let Some(parents) = repo.objects.get(&oid) {
                stack.extend(parents.iter().copied());
            }
        }
        let mut walk = vec![];
        let mut visited = HashSet::new();
        let mut queue: Vec<Oid> = wants.to_vec();
        let mut at = 0;
        while at < queue.len() {
            let oid = queue[at];
            at += 1;
            if !visited.insert(oid) || hidden.contains(&oid) {
                continue;
            }
            walk.push(oid);
            if let Some(parents) = repo.objects.get(&oid) {
                queue.extend(parents.iter().copied());
            }
        }
        Ok(walk)
    }

    async fn build_pack(&self, walk: &[Oid]) -> Result<Bytes, GitWireError> {
        let mut pack = BytesMut::new();
        pack.extend_from_slice(b"PACK");
        pack.put_u32(2);
        pack.put_u32(walk.len() as u32);
        for oid in walk {
            entry_header(&mut pack, 1, oid.as_bytes().len());
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder
                .write_all(oid.as_bytes())
                .map_err(|e| GitWireError::AgentError(e.to_string()))?;
            let compressed = encoder
                .finish()
                .map_err(|e| GitWireError::AgentError(e.to_string()))?;
            pack.extend_from_slice(&compressed);
        }
        let digest = sha1_smol::Sha1::from(&pack[..]).digest().bytes();
        pack.extend_from_slice(&digest);
        Ok(pack.freeze())
    }

    async fn apply_updates(
        &self,
        commands: &[RefUpdate],
        pack: Bytes,
    ) -> Result<ApplyReport, GitWireError> {
        let mut repo = self.repo.lock().await;
        if !pack.is_empty() && !pack.starts_with(b"PACK") {
            return Ok(ApplyReport {
                unpack: UnpackStatus::Error("bad pack signature".to_string()),
                commands: commands
                    .iter()
                    .map(|c| {
                        (
                            c.ref_name.clone(),
                            CommandStatus::Rejected("unpacker error".to_string()),
                        )
                    })
                    .collect(),
            });
        }

        // Validate and apply against a scratch copy; the shared table is
        // replaced only once every command has an outcome.
        let mut scratch = repo.refs.clone();
        let mut ingested = vec![];
        let mut statuses = vec![];
        for command in commands {
            let current = scratch
                .iter()
                .position(|(name, _)| name == &command.ref_name);
            let status = if command.is_delete() {
                match current {
                    Some(idx) if scratch[idx].1 == command.old => {
                        scratch.remove(idx);
                        CommandStatus::Ok
                    }
                    Some(_) => CommandStatus::Rejected("stale info".to_string()),
                    None => CommandStatus::Rejected("no such ref".to_string()),
                }
            } else if command.is_create() {
                match current {
                    Some(_) => CommandStatus::Rejected("ref already exists".to_string()),
                    None => {
                        scratch.push((command.ref_name.clone(), command.new));
                        ingested.push(command.new);
                        CommandStatus::Ok
                    }
                }
            } else {
                match current {
                    Some(idx) if scratch[idx].1 == command.old => {
                        scratch[idx].1 = command.new;
                        ingested.push(command.new);
                        CommandStatus::Ok
                    }
                    Some(_) => CommandStatus::Rejected("stale info".to_string()),
                    None => CommandStatus::Rejected("no such ref".to_string()),
                }
            };
            statuses.push((command.ref_name.clone(), status));
        }
        repo.refs = scratch;
        for oid in ingested {
            repo.objects.entry(oid).or_default();
        }
        Ok(ApplyReport {
            unpack: UnpackStatus::Ok,
            commands: statuses,
        })
    }
}

/// Pack entry header: 3-bit type and size as the usual 4+7 bit varint.
fn entry_header(buf: &mut BytesMut, type_num: u8, size: usize) {
    let mut first = (type_num << 4) | (size as u8 & 0x0f);
    let mut remaining = size >> 4;
    if remaining > 0 {
        first |= 0x80;
    }
    buf.put_u8(first);
    while remaining > 0 {
        let mut byte = (remaining & 0x7f) as u8;
        remaining >>= 7;
        if remaining > 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
    }
}

/// Repo lookup table for the demo server and tests.
#[derive(Clone, Default)]
pub struct MemoryRepoStore {
    repos: Arc<Mutex<HashMap<(String, String), MemoryAgent>>>,
}

impl MemoryRepoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, namespace: &str, name: &str) -> MemoryAgent {
        let agent = MemoryAgent::new();
        self.repos
            .lock()
            .await
            .insert((namespace.to_string(), name.to_string()), agent.clone());
        agent
    }
}

#[async_trait]
impl RepoStore for MemoryRepoStore {
    async fn attach(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Box<dyn RepoAgent>, GitWireError> {
        self.repos
            .lock()
            .await
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .map(|agent| Box::new(agent) as Box<dyn RepoAgent>)
            .ok_or(GitWireError::RepoNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(fill: u8) -> Oid {
        Oid::from_bytes(&[fill; 20]).unwrap()
    }

    #[tokio::test]
    async fn test_revwalk_hides_have_closure() {
        let agent = MemoryAgent::new();
        agent.put_object(oid(1), &[]).await;
        agent.put_object(oid(2), &[oid(1)]).await;
        agent.put_object(oid(3), &[oid(2)]).await;
        let walk = agent.revwalk(&[oid(3)], &[oid(2)]).await.unwrap();
        assert_eq!(walk, vec![oid(3)]);
        let full = agent.revwalk(&[oid(3)], &[]).await.unwrap();
        assert_eq!(full, vec![oid(3), oid(2), oid(1)]);
    }

    #[tokio::test]
    async fn test_pack_has_magic_header_and_trailer() {
        let agent = MemoryAgent::new();
        agent.put_object(oid(1), &[]).await;
        let pack = agent.build_pack(&[oid(1)]).await.unwrap();
        assert_eq!(&pack[..4], b"PACK");
        assert_eq!(&pack[4..8], &2u32.to_be_bytes());
        assert_eq!(&pack[8..12], &1u32.to_be_bytes());
        assert!(pack.len() > 12 + 20);
    }

    #[tokio::test]
    async fn test_apply_updates_is_all_or_outcome() {
        let agent = MemoryAgent::new();
        agent.put_object(oid(1), &[]).await;
        agent.set_ref("refs/heads/main", oid(1)).await;
        let commands = vec![
            RefUpdate {
                old: Oid::ZERO,
                new: oid(2),
                ref_name: "refs/heads/topic".to_string(),
            },
            RefUpdate {
                old: oid(9),
                new: oid(3),
                ref_name: "refs/heads/main".to_string(),
            },
        ];
        let report = agent
            .apply_updates(&commands, Bytes::new())
            .await
            .unwrap();
        assert!(report.unpack.is_ok());
        assert_eq!(report.commands[0].1, CommandStatus::Ok);
        assert!(matches!(report.commands[1].1, CommandStatus::Rejected(_)));
        assert_eq!(agent.ref_value("refs/heads/topic").await, Some(oid(2)));
        assert_eq!(agent.ref_value("refs/heads/main").await, Some(oid(1)));
    }

    #[tokio::test]
    async fn test_bad_pack_signature_rejects_everything() {
        let agent = MemoryAgent::new();
        let commands = vec![RefUpdate {
            old: Oid::ZERO,
            new: oid(2),
            ref_name: "refs/heads/topic".to_string(),
        }];
        let report = agent
            .apply_updates(&commands, Bytes::from_static(b"not a pack"))
            .await
            .unwrap();
        assert!(!report.unpack.is_ok());
        assert!(matches!(report.commands[0].1, CommandStatus::Rejected(_)));
        assert_eq!(agent.ref_value("refs/heads/topic").await, None);
    }

    #[tokio::test]
    async fn test_store_attach() {
        let store = MemoryRepoStore::new();
        store.create("u", "r").await;
        assert!(store.attach("u", "r").await.is_ok());
        assert_eq!(
            store.attach("u", "missing").await.err(),
            Some(GitWireError::RepoNotFound)
        );
    }
}
