pub mod events;
pub mod mapper;
pub mod query;

pub use events::{create_event, delete_event, get_event, search_events, update_event, EventPage};
pub use query::{compile, CompiledQuery, CompiledSearch, SearchStrategy};
