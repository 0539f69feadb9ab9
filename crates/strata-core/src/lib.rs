//! Strata Core: code-unit registry, call graph, inference and API surface rules

pub mod config;
pub mod error;
pub mod graph;
pub mod infer;
pub mod model;
pub mod registry;
pub mod surface;


#[cfg(test)]
pub mod test_utils;

pub use config::{
    BudgetConfig, InferenceConfig, MeasureKind, RankingConfig, SnippetConfig, StrataConfig,
    SurfaceConfig,
};
pub use error::{StrataError, StrataResult};
pub use graph::{CallGraph, DirectRelations};
pub use infer::{
    CallableArity, InferredLink, InferredRelations, RelationshipInferencer, parse_callable_arity,
};
pub use model::{CodeUnit, Edge, EdgeKind, UnitId};
pub use registry::Registry;
pub use surface::{ApiSurfaceClassifier, SurfaceVerdict};
