pub mod event;
pub mod patch;
pub mod requests;

pub use event::{
    Category, Event, EventChanges, EventFilter, EventQuery, NewEvent, Page, SortOrder,
};
pub use patch::Patch;
pub use requests::{CreateEventRequest, SearchParams, UpdateEventRequest, ValidationError};
