//! Per-unit bundle assembly over a read-only registry

use std::path::PathBuf;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use regex::Regex;
use strata_core::{
    ApiSurfaceClassifier, CallGraph, CodeUnit, DirectRelations, Edge, InferredRelations,
    Registry, RelationshipInferencer, StrataConfig, SurfaceVerdict, UnitId,
};
use tracing::debug;

use crate::budget::{BudgetCompressor, Compressed};
use crate::bundle::{Bundle, CallerEntry, InferredEntry};
use crate::error::{ContextError, ContextResult};
use crate::measure::{SizeMeasure, measure_for};
use crate::rank::RelevanceRanker;
use crate::snippet::SnippetExtractor;

/// Uncompressed view of one unit and its neighbourhood.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub target: UnitId,
    pub direct: DirectRelations,
    pub inferred: InferredRelations,
    pub surface: SurfaceVerdict,
    pub bundle: Bundle,
}

/// A compressed bundle together with the unit it describes.
#[derive(Debug, Clone)]
pub struct BuiltBundle {
    pub target: UnitId,
    pub unit: String,
    pub file_path: PathBuf,
    pub compressed: Compressed,
}

/// Owns every per-session component; shared by reference across threads.
#[derive(Debug)]
pub struct ContextBuilder<'r> {
    registry: &'r Registry,
    graph: CallGraph,
    inferencer: RelationshipInferencer<'r>,
    classifier: ApiSurfaceClassifier,
    ranker: RelevanceRanker,
    compressor: BudgetCompressor,
    time_limit: Option<Duration>,
}

impl<'r> ContextBuilder<'r> {
    /// Build with the size measure selected in `config.budget.measure`.
    pub fn new(registry: &'r Registry, config: &StrataConfig) -> ContextResult<Self> {
        let measure = measure_for(config.budget.measure)?;
        Self::with_measure(registry, config, measure)
    }

    pub fn with_measure(
        registry: &'r Registry,
        config: &StrataConfig,
        measure: Box<dyn SizeMeasure>,
    ) -> ContextResult<Self> {
        config.validate()?;
        let extractor = SnippetExtractor::new(&config.snippet);
        Ok(ContextBuilder {
            registry,
            graph: CallGraph::build(registry),
            inferencer: RelationshipInferencer::new(registry, &config.inference),
            classifier: ApiSurfaceClassifier::new(&config.surface)?,
            ranker: RelevanceRanker::new(&config.ranking),
            compressor: BudgetCompressor::new(&config.budget, extractor, measure),
            time_limit: None,
        })
    }

    /// Fail any single build that takes longer than `limit`.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn graph(&self) -> &CallGraph {
        &self.graph
    }

    pub fn compressor(&self) -> &BudgetCompressor {
        &self.compressor
    }

    fn unit(&self, target: UnitId) -> ContextResult<&'r CodeUnit> {
        self.registry
            .get(target)
            .ok_or_else(|| ContextError::UnknownUnit(format!("#{}", target.0)))
    }

    /// Collect relations and build the raw, uncompressed bundle.
    pub fn assemble(&self, target: UnitId) -> ContextResult<Assembly> {
        let unit = self.unit(target)?;
        let direct = self.graph.direct(target);
        let inferred = self.inferencer.infer(target);
        let surface = self
            .classifier
            .verdict(unit, direct.callers.len(), !inferred.callers.is_empty());
        let is_public_api = surface.is_public();

        let call_site = CallSite::new(&unit.name);
        let callers = direct
            .callers
            .iter()
            .map(|&id| {
                let caller = self.registry.unit(id);
                CallerEntry::new(caller, &call_site.lines(caller))
            })
            .collect();
        let callers = self.ranker.rank(callers, is_public_api);

        let inferred_callers = inferred
            .callers
            .iter()
            .map(|link| {
                let unit = self.registry.unit(link.unit);
                InferredEntry::new(unit, &link.highlight_lines, link.hint.clone())
            })
            .collect();

        debug!(
            "Assembled {}: {} callers, {} inferred, {:?}",
            unit.name,
            direct.callers.len(),
            inferred.callers.len(),
            surface
        );

        Ok(Assembly {
            target,
            direct,
            inferred,
            surface,
            bundle: Bundle {
                primary_text: unit.code.clone(),
                is_public_api,
                callers,
                inferred_callers,
            },
        })
    }

    /// Assemble and compress the bundle for `target`.
    pub fn build(&self, target: UnitId) -> ContextResult<BuiltBundle> {
        let deadline = self.time_limit.map(|limit| Instant::now() + limit);
        let unit = self.unit(target)?;
        let assembly = self.assemble(target)?;
        let compressed = self.compressor.compress(&assembly.bundle, deadline)?;

        Ok(BuiltBundle {
            target,
            unit: unit.name.clone(),
            file_path: unit.file_path.clone(),
            compressed,
        })
    }

    /// Build for the first unit registered under `name`.
    pub fn build_named(&self, name: &str) -> ContextResult<BuiltBundle> {
        let target = self
            .registry
            .resolve(name)
            .ok_or_else(|| ContextError::UnknownUnit(name.to_string()))?;
        self.build(target)
    }

    /// Build every target in parallel. Output order follows `targets`; the
    /// first error aborts the whole scan.
    pub fn build_all(&self, targets: &[UnitId]) -> ContextResult<Vec<BuiltBundle>> {
        targets.par_iter().map(|&target| self.build(target)).collect()
    }

    /// Direct and inferred edges touching `target`.
    pub fn relations(&self, target: UnitId) -> ContextResult<Vec<Edge>> {
        self.unit(target)?;
        let mut edges = self.graph.direct(target).edges(target);
        edges.extend(self.inferencer.infer(target).edges(target));
        Ok(edges)
    }
}

/// Lines of a caller that invoke the target by name.
struct CallSite {
    name: String,
    pattern: Option<Regex>,
}

impl CallSite {
    fn new(name: &str) -> Self {
        CallSite {
            name: name.to_string(),
            pattern: Regex::new(&format!(r"\b{}\s*\(", regex::escape(name))).ok(),
        }
    }

    fn matches(&self, line: &str) -> bool {
        match &self.pattern {
            Some(re) => re.is_match(line),
            None => line.contains(&format!("{}(", self.name)),
        }
    }

    /// Absolute line numbers inside `caller` containing a call.
    fn lines(&self, caller: &CodeUnit) -> Vec<u32> {
        caller
            .code
            .split('\n')
            .enumerate()
            .filter(|(_, line)| self.matches(line))
            .map(|(idx, _)| caller.absolute_line(idx as u32 + 1))
            .collect()
    }
}
