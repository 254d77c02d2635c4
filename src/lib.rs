pub mod event;
pub mod snippet;
pub mod symbols;
pub mod alignment;
pub mod ngram;
pub mod candidates;
pub mod promotion;
pub mod results;
pub mod config;
pub mod parallel;
pub mod engine;
pub mod loader;

pub use config::MatchConfig;
pub use engine::{SearchError, SearchIndex};
pub use event::{Event, EventSource};
pub use results::{ResultSet, UberResultSet};
pub use snippet::{Snippet, SubSequence};
