//! Trip-suggestion pipeline: validate the request, ask the upstream model,
//! normalize costs, and fall back to mock suggestions whenever a stage fails.

pub mod engine;
pub mod error;
pub mod merge;
pub mod mock;
pub mod normalize;
pub mod upstream;
pub mod validate;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::SuggestionEngine;
pub use error::SuggestionFailure;
