//! 会话存储
//!
//! 会话 id → 文档句柄。Map 本身由 RwLock 保护，只在增删查时短暂持锁；
//! 每个文档另有自己的 Mutex，同一会话的并发请求在文档锁上排队，不会阻塞 Map 操作。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};

use crate::engine::Document;

/// 会话 ID（uuid v4 文本）
pub type SessionId = String;

/// 会话独占的文档句柄
pub type SharedDocument = Arc<Mutex<Box<dyn Document>>>;

/// 会话存储接口
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 插入文档并分配新 id；id 不会重复
    async fn create(&self, document: Box<dyn Document>) -> SessionId;

    async fn get(&self, session_id: &str) -> Option<SharedDocument>;

    /// 移除并返回是否存在
    async fn remove(&self, session_id: &str) -> bool;

    /// 当前会话 id 快照（按字典序）
    async fn list_ids(&self) -> Vec<SessionId>;

    /// 清空全部会话，返回清除数量（关闭时调用）
    async fn clear(&self) -> usize;
}

/// 内存会话存储
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SharedDocument>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, document: Box<dyn Document>) -> SessionId {
        let handle = Arc::new(Mutex::new(document));
        let mut sessions = self.sessions.write().await;
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if !sessions.contains_key(&id) {
                sessions.insert(id.clone(), handle);
                return id;
            }
        }
    }

    async fn get(&self, session_id: &str) -> Option<SharedDocument> {
        self.sessions.read().await.get(session_id).cloned()
    }

    async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id).is_some()
    }

    async fn list_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<SessionId> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn clear(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        sessions.clear();
        count
    }
}

/// 创建默认会话存储
pub fn create_session_store() -> Arc<dyn SessionStore> {
    Arc::new(MemorySessionStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DocumentEngine, SnapshotEngine};
    use crate::handlers::testing;

    fn document() -> Box<dyn Document> {
        let bytes = serde_json::to_vec(&testing::snapshot()).unwrap();
        SnapshotEngine::new().load(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_create_then_get_returns_same_handle() {
        let store = MemorySessionStore::new();
        let id = store.create(document()).await;

        let first = store.get(&id).await.unwrap();
        let second = store.get(&id).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.lock().await.summary().trainer_name, "HILDA");
    }

    #[tokio::test]
    async fn test_remove_is_idempotent_negative() {
        let store = MemorySessionStore::new();
        let id = store.create(document()).await;

        assert!(store.remove(&id).await);
        assert!(store.get(&id).await.is_none());
        assert!(!store.remove(&id).await);
    }

    #[tokio::test]
    async fn test_list_ids_matches_creates() {
        let store = MemorySessionStore::new();
        let mut created = Vec::new();
        for _ in 0..5 {
            created.push(store.create(document()).await);
        }
        created.sort();
        created.dedup();
        assert_eq!(created.len(), 5);
        assert_eq!(store.list_ids().await, created);

        assert_eq!(store.clear().await, 5);
        assert!(store.list_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_unique() {
        let store = Arc::new(MemorySessionStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move { store.create(document()).await }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 16);
        assert_eq!(store.list_ids().await.len(), 16);
    }
}
