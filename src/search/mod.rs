pub mod index;
pub mod worker;

pub use index::{SearchIndex, SearchRef, SearchResults};
pub use worker::{IndexState, IndexWorker};
