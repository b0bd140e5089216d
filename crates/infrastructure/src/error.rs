use thiserror::Error;

/// 永続化層のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// 呼び出し元が所有者ではない Todo を保存しようとした
    #[error("Authorization failed: todo is owned by {owner}, caller is {caller}")]
    Authorization { owner: String, caller: String },

    #[error("Todo not found: {0}")]
    NotFound(String),

    /// スロットリングや一時的な障害（リトライ可能）
    #[error("Transient store error: {0}")]
    Transient(String),

    #[error("DynamoDB error: {0}")]
    DynamoDb(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl From<domain::DomainError> for StoreError {
    fn from(e: domain::DomainError) -> Self {
        match e {
            domain::DomainError::OwnerMismatch { owner, caller } => {
                StoreError::Authorization { owner, caller }
            }
            other => StoreError::Internal(other.to_string()),
        }
    }
}
