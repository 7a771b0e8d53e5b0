pub mod index;
pub mod query;

pub use index::{Hit, InMemoryIndex};
pub use query::{compile_query, compile_with_mode, CompiledQuery, QueryMode, SearchBody};
