use crate::models::{
    item_to_todo, todo_to_item, TodoKeys, ATTR_DESCRIPTION, ATTR_OWNER_ID, ATTR_STATUS,
    OWNER_INDEX,
};
use crate::{
    retry_dynamodb_operation, DynamoDbClient, NewTodo, RetryConfig, StoreError, TodoRepository,
    CONDITIONAL_CHECK_FAILED,
};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::ProvideErrorMetadata;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use domain::{Todo, TodoId};
use std::collections::HashMap;
use tracing::{debug, info};

/// DynamoDB をバックエンドとする Todo リポジトリ
#[derive(Clone)]
pub struct DynamoTodoRepository {
    db: DynamoDbClient,
    retry: RetryConfig,
}

impl DynamoTodoRepository {
    pub fn new(db: DynamoDbClient, retry: RetryConfig) -> Self {
        Self { db, retry }
    }
}

#[async_trait]
impl TodoRepository for DynamoTodoRepository {
    async fn insert(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        let id = TodoId::new();
        let item = todo_to_item(&id, &todo.owner_id, &todo.description, todo.status);
        info!(todo_id = %id, owner = %todo.owner_id, "Todo を保存中");

        retry_dynamodb_operation(
            || async {
                self.db
                    .client()
                    .put_item()
                    .table_name(self.db.table_name())
                    .set_item(Some(item.clone()))
                    .condition_expression("attribute_not_exists(PK)")
                    .send()
                    .await
                    .map_err(|e| self.db.convert_error(e))
            },
            &self.retry,
        )
        .await?;

        Ok(Todo::restore(id, todo.owner_id, todo.description, todo.status))
    }

    async fn update(&self, todo: &Todo) -> Result<Todo, StoreError> {
        let id = todo
            .id()
            .ok_or_else(|| StoreError::Internal("update without id".to_string()))?;
        let keys = TodoKeys::for_todo(id);
        info!(todo_id = %id, "Todo を更新中");

        // 所有者は書き換えない。説明と状態のみ SET する
        let output = retry_dynamodb_operation(
            || async {
                self.db
                    .client()
                    .update_item()
                    .table_name(self.db.table_name())
                    .set_key(Some(keys.to_key()))
                    .update_expression("SET #d = :d, #s = :s")
                    .expression_attribute_names("#d", ATTR_DESCRIPTION)
                    .expression_attribute_names("#s", ATTR_STATUS)
                    .expression_attribute_values(
                        ":d",
                        AttributeValue::S(todo.description().to_string()),
                    )
                    .expression_attribute_values(
                        ":s",
                        AttributeValue::S(todo.status().as_str().to_string()),
                    )
                    .condition_expression("attribute_exists(PK)")
                    .return_values(ReturnValue::AllNew)
                    .send()
                    .await
                    .map_err(|e| {
                        if e.code() == Some(CONDITIONAL_CHECK_FAILED) {
                            StoreError::NotFound(id.to_string())
                        } else {
                            self.db.convert_error(e)
                        }
                    })
            },
            &self.retry,
        )
        .await?;

        let item = output
            .attributes()
            .ok_or_else(|| StoreError::Serialization("update returned no attributes".into()))?;
        item_to_todo(item)
    }

    async fn get(&self, id: &TodoId) -> Result<Option<Todo>, StoreError> {
        let keys = TodoKeys::for_todo(id);

        let output = retry_dynamodb_operation(
            || async {
                self.db
                    .client()
                    .get_item()
                    .table_name(self.db.table_name())
                    .set_key(Some(keys.to_key()))
                    .consistent_read(true)
                    .send()
                    .await
                    .map_err(|e| self.db.convert_error(e))
            },
            &self.retry,
        )
        .await?;

        output.item().map(item_to_todo).transpose()
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Todo>, StoreError> {
        let mut todos = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let output = retry_dynamodb_operation(
                || async {
                    self.db
                        .client()
                        .query()
                        .table_name(self.db.table_name())
                        .index_name(OWNER_INDEX)
                        .key_condition_expression("#o = :o")
                        .expression_attribute_names("#o", ATTR_OWNER_ID)
                        .expression_attribute_values(":o", AttributeValue::S(owner_id.to_string()))
                        .set_exclusive_start_key(start_key.clone())
                        .send()
                        .await
                        .map_err(|e| self.db.convert_error(e))
                },
                &self.retry,
            )
            .await?;

            for item in output.items() {
                todos.push(item_to_todo(item)?);
            }

            match output.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        debug!(owner = %owner_id, count = todos.len(), "Todo 一覧を取得");
        Ok(todos)
    }
}
