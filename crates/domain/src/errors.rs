use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid TodoId: {0}")]
    InvalidTodoId(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid owner id: {0}")]
    InvalidOwnerId(String),

    /// 所有者が既に確定している Todo を別のユーザーが保存しようとした
    #[error("Todo is owned by {owner}, not {caller}")]
    OwnerMismatch { owner: String, caller: String },
}
