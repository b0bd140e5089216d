use crate::{NewTodo, StoreError, TodoRepository};
use async_trait::async_trait;
use domain::{Todo, TodoId};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// 開発/テスト用のインメモリ実装
#[derive(Default)]
pub struct InMemoryTodoRepository {
    todos: Mutex<HashMap<TodoId, Todo>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済みの Todo で初期化する。ID を持たない Todo は無視する
    pub fn with_todos(todos: impl IntoIterator<Item = Todo>) -> Self {
        let todos = todos
            .into_iter()
            .filter_map(|todo| todo.id().cloned().map(|id| (id, todo)))
            .collect();
        Self {
            todos: Mutex::new(todos),
        }
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<TodoId, Todo>>, StoreError> {
        self.todos
            .lock()
            .map_err(|_| StoreError::Internal("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn insert(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        let mut todos = self.lock()?;
        let mut id = TodoId::new();
        while todos.contains_key(&id) {
            id = TodoId::new();
        }
        let stored = Todo::restore(id.clone(), todo.owner_id, todo.description, todo.status);
        todos.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, todo: &Todo) -> Result<Todo, StoreError> {
        let id = todo
            .id()
            .ok_or_else(|| StoreError::Internal("update without id".to_string()))?;
        let mut todos = self.lock()?;
        let existing = todos
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let owner_id = existing.owner_id().unwrap_or_default().to_string();
        *existing = Todo::restore(id.clone(), owner_id, todo.description(), todo.status());
        Ok(existing.clone())
    }

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, StoreError> {
        Ok(self.lock()?.get(id).cloned())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Todo>, StoreError> {
        Ok(self
            .lock()?
            .values()
            .filter(|todo| todo.owner_id() == Some(owner_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Status;

    fn new_todo(owner: &str, description: &str) -> NewTodo {
        NewTodo {
            owner_id: owner.to_string(),
            description: description.to_string(),
            status: Status::Open,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_distinct_ids() {
        let repo = InMemoryTodoRepository::new();
        let a = repo.insert(new_todo("alice", "A")).await.unwrap();
        let b = repo.insert(new_todo("alice", "B")).await.unwrap();
        assert_ne!(a.id(), b.id());
        assert_eq!(repo.len().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_update_keeps_stored_owner() {
        let id = TodoId::from_string("23".to_string()).unwrap();
        let repo = InMemoryTodoRepository::with_todos([Todo::restore(
            id.clone(),
            "alice",
            "old",
            Status::Open,
        )]);

        // 所有者欄を偽った Todo を渡しても保存済みの所有者が残る
        let forged = Todo::restore(id.clone(), "mallory", "new", Status::Done);
        let updated = repo.update(&forged).await.unwrap();

        assert_eq!(updated.owner_id(), Some("alice"));
        assert_eq!(updated.description(), "new");
        assert_eq!(updated.status(), Status::Done);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let repo = InMemoryTodoRepository::new();
        let todo = Todo::restore(TodoId::new(), "alice", "x", Status::Open);
        assert!(matches!(repo.update(&todo).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_by_owner_filters() {
        let repo = InMemoryTodoRepository::new();
        repo.insert(new_todo("alice", "A")).await.unwrap();
        repo.insert(new_todo("bob", "B")).await.unwrap();

        let alice = repo.list_by_owner("alice").await.unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].description(), "A");
        assert!(repo.list_by_owner("carol").await.unwrap().is_empty());
    }

    #[test]
    fn test_with_todos_skips_unsaved() {
        let repo = InMemoryTodoRepository::with_todos([Todo::new("unsaved", Status::Open)]);
        assert!(repo.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_poisoned_lock_is_reported_as_error() {
        let repo = InMemoryTodoRepository::with_todos([Todo::restore(
            TodoId::from_string("23".to_string()).unwrap(),
            "alice",
            "x",
            Status::Open,
        )]);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = repo.todos.lock().unwrap();
            panic!("poison");
        }));
        assert!(result.is_err());

        assert!(matches!(repo.len(), Err(StoreError::Internal(_))));
        assert!(matches!(repo.is_empty(), Err(StoreError::Internal(_))));
        assert!(matches!(
            repo.list_by_owner("alice").await,
            Err(StoreError::Internal(_))
        ));
    }
}
