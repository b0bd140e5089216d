//! 所有者によるフィルタを強制する Todo ストア
//!
//! すべての読み書きは呼び出し元の ID で絞り込まれる。他人の Todo は
//! 読み取り時には「存在しない」ものとして扱い、存在の有無を漏らさない。

use crate::{NewTodo, StoreError, TodoRepository};
use domain::{Todo, TodoId};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct OwnedTodoStore {
    repository: Arc<dyn TodoRepository>,
}

impl OwnedTodoStore {
    pub fn new(repository: Arc<dyn TodoRepository>) -> Self {
        Self { repository }
    }

    /// Todo を保存する
    ///
    /// 所有者が未設定なら `caller` を所有者にする。設定済みで `caller` と
    /// 異なる場合は `StoreError::Authorization`。新規なら ID を採番し、
    /// 既存なら ID と所有者を維持したまま説明と状態を更新する。
    pub async fn save(&self, mut todo: Todo, caller: &str) -> Result<Todo, StoreError> {
        todo.claim(caller).map_err(|e| {
            warn!(caller = %caller, error = %e, "他人の Todo の保存を拒否");
            StoreError::from(e)
        })?;

        let Some(id) = todo.id().cloned() else {
            let saved = self
                .repository
                .insert(NewTodo {
                    owner_id: caller.to_string(),
                    description: todo.description().to_string(),
                    status: todo.status(),
                })
                .await?;
            info!(owner = %caller, todo_id = ?saved.id(), "Todo を作成");
            return Ok(saved);
        };

        // 保存済みの所有者と照合する（渡された Todo の owner_id は信用しない）
        let existing = self
            .repository
            .get(&id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(owner) = existing.owner_id().filter(|owner| *owner != caller) {
            warn!(caller = %caller, todo_id = %id, "他人の Todo の更新を拒否");
            return Err(StoreError::Authorization {
                owner: owner.to_string(),
                caller: caller.to_string(),
            });
        }

        let saved = self.repository.update(&todo).await?;
        info!(owner = %caller, todo_id = %id, "Todo を更新");
        Ok(saved)
    }

    /// 呼び出し元が所有する Todo のみを返す。他人の Todo は `None`
    pub async fn find_by_id(&self, id: &TodoId, caller: &str) -> Result<Option<Todo>, StoreError> {
        let found = self
            .repository
            .get(id)
            .await?
            .filter(|todo| todo.owner_id() == Some(caller));
        debug!(caller = %caller, todo_id = %id, found = found.is_some(), "Todo を検索");
        Ok(found)
    }

    /// 呼び出し元が所有する Todo の一覧（順序は不定）
    pub async fn find_all_for_caller(&self, caller: &str) -> Result<Vec<Todo>, StoreError> {
        let mut todos = self.repository.list_by_owner(caller).await?;
        // バックエンドの絞り込み結果に他人の Todo が混ざっても返さない
        todos.retain(|todo| todo.owner_id() == Some(caller));
        Ok(todos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryTodoRepository;
    use domain::Status;

    fn store_with(todos: impl IntoIterator<Item = Todo>) -> OwnedTodoStore {
        OwnedTodoStore::new(Arc::new(InMemoryTodoRepository::with_todos(todos)))
    }

    fn empty_store() -> OwnedTodoStore {
        OwnedTodoStore::new(Arc::new(InMemoryTodoRepository::new()))
    }

    fn id(s: &str) -> TodoId {
        TodoId::from_string(s.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_save_new_todo_assigns_owner_and_id() {
        let store = empty_store();
        let saved = store
            .save(Todo::new("Buy milk", Status::Open), "alice")
            .await
            .unwrap();

        assert!(saved.id().is_some());
        assert_eq!(saved.owner_id(), Some("alice"));
        assert_eq!(saved.description(), "Buy milk");
        assert_eq!(saved.status(), Status::Open);
    }

    #[tokio::test]
    async fn test_save_with_foreign_owner_is_rejected() {
        let store = store_with([Todo::restore(id("23"), "alice", "x", Status::Open)]);
        let todo = Todo::restore(id("23"), "alice", "hijack", Status::Done);

        let err = store.save(todo, "bob").await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Authorization {
                owner: "alice".into(),
                caller: "bob".into(),
            }
        );
        let stored = store.find_by_id(&id("23"), "alice").await.unwrap().unwrap();
        assert_eq!(stored.description(), "x");
    }

    #[tokio::test]
    async fn test_save_with_forged_owner_matching_caller_is_rejected() {
        // owner_id を呼び出し元に偽装しても保存済みの所有者で判定する
        let store = store_with([Todo::restore(id("23"), "alice", "x", Status::Open)]);
        let forged = Todo::restore(id("23"), "bob", "hijack", Status::Done);

        let err = store.save(forged, "bob").await.unwrap_err();
        assert!(matches!(err, StoreError::Authorization { .. }));
    }

    #[tokio::test]
    async fn test_save_unknown_id_is_not_found() {
        let store = empty_store();
        let todo = Todo::restore(id("404"), "alice", "x", Status::Open);
        let err = store.save(todo, "alice").await.unwrap_err();
        assert_eq!(err, StoreError::NotFound("404".into()));
    }

    #[tokio::test]
    async fn test_find_by_id_hides_foreign_todos() {
        let store = store_with([Todo::restore(id("23"), "alice", "x", Status::Open)]);
        assert!(store.find_by_id(&id("23"), "alice").await.unwrap().is_some());
        assert!(store.find_by_id(&id("23"), "bob").await.unwrap().is_none());
        assert!(store.find_by_id(&id("24"), "alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_all_for_caller_returns_only_own_todos() {
        let store = store_with([
            Todo::restore(id("1"), "alice", "a1", Status::Open),
            Todo::restore(id("2"), "bob", "b1", Status::Open),
            Todo::restore(id("3"), "alice", "a2", Status::Done),
        ]);

        let mut descriptions: Vec<String> = store
            .find_all_for_caller("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.description().to_string())
            .collect();
        descriptions.sort();
        assert_eq!(descriptions, vec!["a1", "a2"]);
    }
}
