use crate::StoreError;
use async_trait::async_trait;
use domain::{Status, Todo, TodoId};

/// 新規作成する Todo（ID はバックエンドが採番する）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub owner_id: String,
    pub description: String,
    pub status: Status,
}

/// 所有者を意識しない素の CRUD バックエンド
///
/// 所有者によるアクセス制御は `OwnedTodoStore` が行う。
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// ID を採番して保存
    async fn insert(&self, todo: NewTodo) -> Result<Todo, StoreError>;

    /// 既存レコードの説明と状態を置き換える。所有者は保存済みの値を維持する。
    async fn update(&self, todo: &Todo) -> Result<Todo, StoreError>;

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, StoreError>;

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Todo>, StoreError>;
}
