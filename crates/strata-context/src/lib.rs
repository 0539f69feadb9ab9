//! Context assembly for Strata
//!
//! Turns a unit and its call-graph neighbourhood into a [`Bundle`] of code
//! excerpts, then compresses it level by level until it fits a size budget.

pub mod budget;
pub mod builder;
pub mod bundle;
pub mod error;
pub mod measure;
pub mod prompt;
pub mod rank;
pub mod snippet;


#[cfg(test)]
pub mod test_utils;

pub use budget::{BudgetCompressor, Compressed, CompressionLevel};
pub use builder::{Assembly, BuiltBundle, ContextBuilder};
pub use bundle::{Bundle, CallerEntry, InferredEntry};
pub use error::{ContextError, ContextResult};
pub use measure::{CharEstimate, MeasureError, SizeMeasure, measure_for};
#[cfg(feature = "tiktoken")]
pub use measure::TiktokenMeasure;
pub use prompt::render_context;
pub use rank::RelevanceRanker;
pub use snippet::{ELLIPSIS, Snippet, SnippetExtractor};
