pub mod dynamodb;
pub mod error;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod retry;
pub mod store;
pub mod todo_repository;

pub use dynamodb::*;
pub use error::*;
pub use memory::*;
pub use repositories::*;
pub use retry::*;
pub use store::*;
pub use todo_repository::*;
