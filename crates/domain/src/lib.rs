pub mod errors;
pub mod todo;
pub mod validation;

pub use errors::*;
pub use todo::*;
pub use validation::*;
