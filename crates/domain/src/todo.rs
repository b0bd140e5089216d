use crate::errors::DomainError;
use crate::validation::{validate, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const MAX_TODO_ID_LEN: usize = 64;

/// Todo の識別子
///
/// ストアが新規作成時に ULID で採番する。既存データや外部ストアから
/// 復元する場合は `from_string` で英数字と `-` `_` のみを受け付ける。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    pub fn from_string(id: String) -> Result<Self, DomainError> {
        if id.is_empty() || id.len() > MAX_TODO_ID_LEN {
            return Err(DomainError::InvalidTodoId(id));
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::InvalidTodoId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ULID で採番された ID ならその生成時刻（ミリ秒）
    pub fn timestamp_ms(&self) -> Option<u64> {
        ulid::Ulid::from_string(&self.0)
            .ok()
            .map(|ulid| ulid.timestamp_ms())
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for TodoId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s.to_string())
    }
}

impl std::fmt::Display for TodoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Todo の状態。ワイヤ上は常に `OPEN` / `DONE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[default]
    Open,
    Done,
}

impl Status {
    /// フォームで選択可能な全状態（表示順）
    pub const ALL: [Status; 2] = [Status::Open, Status::Done];

    /// 文字列から状態を作成（大文字小文字は区別しない）
    pub fn from_string(status: &str) -> Result<Self, DomainError> {
        match status.trim().to_uppercase().as_str() {
            "OPEN" => Ok(Status::Open),
            "DONE" => Ok(Status::Done),
            _ => Err(DomainError::InvalidStatus(status.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "OPEN",
            Status::Done => "DONE",
        }
    }
}

impl FromStr for Status {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_string(s)
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// ユーザーごとに所有される Todo
///
/// `id` と `owner_id` は外部から直接書き換えられない。`id` はストアが
/// 採番し、`owner_id` は `claim` によって一度だけ確定する。
/// シリアライズのみ。復元は `restore` を経由する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Todo {
    id: Option<TodoId>,
    owner_id: Option<String>,
    description: String,
    status: Status,
}

impl Todo {
    /// 未保存の Todo を作成
    pub fn new(description: impl Into<String>, status: Status) -> Self {
        Self {
            id: None,
            owner_id: None,
            description: description.into(),
            status,
        }
    }

    /// 永続化層から読み出したレコードを復元
    pub fn restore(
        id: TodoId,
        owner_id: impl Into<String>,
        description: impl Into<String>,
        status: Status,
    ) -> Self {
        Self {
            id: Some(id),
            owner_id: Some(owner_id.into()),
            description: description.into(),
            status,
        }
    }

    pub fn id(&self) -> Option<&TodoId> {
        self.id.as_ref()
    }

    pub fn owner_id(&self) -> Option<&str> {
        self.owner_id.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// 所有者を確定する
    ///
    /// 未設定なら `caller` を所有者にする。設定済みなら `caller` と一致する
    /// 場合のみ成功し、所有者は変更されない。
    pub fn claim(&mut self, caller: &str) -> Result<(), DomainError> {
        if caller.trim().is_empty() {
            return Err(DomainError::InvalidOwnerId(caller.to_string()));
        }
        match self.owner_id.as_deref() {
            None => {
                self.owner_id = Some(caller.to_string());
                Ok(())
            }
            Some(owner) if owner == caller => Ok(()),
            Some(owner) => Err(DomainError::OwnerMismatch {
                owner: owner.to_string(),
                caller: caller.to_string(),
            }),
        }
    }

    /// フォーム入力を検証し、説明と状態だけをコピーする
    ///
    /// 検証に失敗した場合は何も変更しない。
    pub fn update_from(&mut self, draft: TodoDraft) -> Result<(), ValidationErrors> {
        let (description, status) = draft.into_fields()?;
        self.description = description;
        self.status = status;
        Ok(())
    }
}

/// フォームなどから組み立てた、部分的に埋まった Todo の候補
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoDraft {
    pub description: Option<String>,
    pub status: Option<Status>,
}

impl TodoDraft {
    pub fn new(description: Option<String>, status: Option<Status>) -> Self {
        Self {
            description,
            status,
        }
    }

    /// 検証を通過した場合のみ未保存の Todo に変換
    pub fn into_todo(self) -> Result<Todo, ValidationErrors> {
        let (description, status) = self.into_fields()?;
        Ok(Todo::new(description, status))
    }

    fn into_fields(self) -> Result<(String, Status), ValidationErrors> {
        let errors = validate(&self);
        match (self.description, self.status) {
            (Some(description), Some(status)) if errors.is_empty() => Ok((description, status)),
            _ => Err(errors),
        }
    }
}

impl From<&Todo> for TodoDraft {
    fn from(todo: &Todo) -> Self {
        Self {
            description: Some(todo.description.clone()),
            status: Some(todo.status),
        }
    }
}
