mod client_state;
mod schema;
mod types;

pub use schema::{Database, IN_MEMORY};
pub use types::DatabaseError;
