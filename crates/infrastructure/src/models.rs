use crate::StoreError;
use aws_sdk_dynamodb::types::AttributeValue;
use domain::{Status, Todo, TodoId};
use std::collections::HashMap;

pub const OWNER_INDEX: &str = "OwnerIndex";

pub const ATTR_PK: &str = "PK";
pub const ATTR_SK: &str = "SK";
pub const ATTR_ID: &str = "Id";
pub const ATTR_OWNER_ID: &str = "OwnerId";
pub const ATTR_DESCRIPTION: &str = "Description";
pub const ATTR_STATUS: &str = "Status";

const TODO_SK: &str = "META";

/// Single Table Design のキー構造
/// `PK = TODO#{id}`, `SK = META`。所有者ごとの一覧は `OwnerIndex`（PK: OwnerId）で引く
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoKeys {
    pub pk: String,
    pub sk: String,
}

impl TodoKeys {
    pub fn for_todo(id: &TodoId) -> Self {
        Self {
            pk: format!("TODO#{}", id.as_str()),
            sk: TODO_SK.to_string(),
        }
    }

    pub fn to_key(&self) -> HashMap<String, AttributeValue> {
        HashMap::from([
            (ATTR_PK.to_string(), AttributeValue::S(self.pk.clone())),
            (ATTR_SK.to_string(), AttributeValue::S(self.sk.clone())),
        ])
    }
}

/// 保存済み Todo を DynamoDB アイテムに変換
pub fn todo_to_item(
    id: &TodoId,
    owner_id: &str,
    description: &str,
    status: Status,
) -> HashMap<String, AttributeValue> {
    let mut item = TodoKeys::for_todo(id).to_key();
    item.insert(ATTR_ID.to_string(), AttributeValue::S(id.to_string()));
    item.insert(
        ATTR_OWNER_ID.to_string(),
        AttributeValue::S(owner_id.to_string()),
    );
    item.insert(
        ATTR_DESCRIPTION.to_string(),
        AttributeValue::S(description.to_string()),
    );
    item.insert(
        ATTR_STATUS.to_string(),
        AttributeValue::S(status.as_str().to_string()),
    );
    item
}

/// DynamoDB アイテムから Todo を復元
pub fn item_to_todo(item: &HashMap<String, AttributeValue>) -> Result<Todo, StoreError> {
    let id = TodoId::from_string(string_attr(item, ATTR_ID)?)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    let status = Status::from_string(&string_attr(item, ATTR_STATUS)?)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;

    Ok(Todo::restore(
        id,
        string_attr(item, ATTR_OWNER_ID)?,
        string_attr(item, ATTR_DESCRIPTION)?,
        status,
    ))
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Result<String, StoreError> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| StoreError::Serialization(format!("missing string attribute {name}")))
}
