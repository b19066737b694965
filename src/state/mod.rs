//! State module for tracking crawl progress
//!
//! Every route the crawl learns about moves through the [`PageState`]
//! machine: `Queued → InFlight → {Completed | Failed}`. A route that has
//! never been seen is implicitly undiscovered and has no state at all.

mod page_state;

pub use page_state::PageState;
