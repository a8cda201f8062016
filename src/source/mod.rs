pub mod message;
pub mod slack;
pub mod traits;

pub use message::{Message, Reaction};
pub use slack::{SlackClient, HISTORY_PAGE_LIMIT};
pub use traits::{MessageSource, SourceError};
