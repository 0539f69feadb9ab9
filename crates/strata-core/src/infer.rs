//! Heuristic relationship inference beyond direct calls
//!
//! Two independent rules add low-confidence edges:
//!
//! - decorator chains: a unit decorated with `@name` is linked to the unit
//!   registered as `name`;
//! - callable parameters: a parameter annotated as a callable with a known
//!   arity is linked to units taking that many parameters.

use std::collections::HashMap;

use crate::config::InferenceConfig;
use crate::model::{CodeUnit, Edge, EdgeKind, UnitId};
use crate::registry::Registry;

const CALLABLE_MARKER: &str = "callable";

/// Expected parameter count of a callable-typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallableArity {
    /// No usable parameter list; matches any unit.
    Any,
    Exact(usize),
}

impl CallableArity {
    pub fn matches(self, param_count: usize) -> bool {
        match self {
            CallableArity::Any => true,
            CallableArity::Exact(n) => n == param_count,
        }
    }
}

/// Parse a parameter annotation.
///
/// Returns `None` when the annotation is not a callable type. For
/// `Callable[[int, str], None]` the arity is `Exact(2)`; a bare `Callable`,
/// `Callable[..., T]` or unbalanced brackets give `Any`.
pub fn parse_callable_arity(annotation: &str) -> Option<CallableArity> {
    let marker = annotation.to_ascii_lowercase().find(CALLABLE_MARKER)?;
    let rest = annotation[marker + CALLABLE_MARKER.len()..].trim_start();

    let Some(outer) = bracket_group(rest) else {
        return Some(CallableArity::Any);
    };
    let Some(params) = bracket_group(outer.trim_start()) else {
        return Some(CallableArity::Any);
    };

    Some(CallableArity::Exact(count_entries(params)))
}

/// Inner text of the `[...]` group that `text` starts with.
fn bracket_group(text: &str) -> Option<&str> {
    if !text.starts_with('[') {
        return None;
    }
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[1..idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Count top-level comma-separated, non-empty entries.
fn count_entries(list: &str) -> usize {
    let mut count = 0;
    let mut depth = 0usize;
    let mut current_empty = true;
    for ch in list.chars() {
        match ch {
            '[' | '(' => {
                depth += 1;
                current_empty = false;
            }
            ']' | ')' => {
                depth = depth.saturating_sub(1);
                current_empty = false;
            }
            ',' if depth == 0 => {
                if !current_empty {
                    count += 1;
                }
                current_empty = true;
            }
            c if !c.is_whitespace() => current_empty = false,
            _ => {}
        }
    }
    if !current_empty {
        count += 1;
    }
    count
}

/// One inferred neighbour of a subject unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredLink {
    pub unit: UnitId,
    /// Explanation of the rule that produced this link.
    pub hint: String,
    /// Absolute source lines of `unit` worth highlighting.
    pub highlight_lines: Vec<u32>,
}

/// Inferred callers and callees of one unit, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InferredRelations {
    pub callers: Vec<InferredLink>,
    pub callees: Vec<InferredLink>,
}

impl InferredRelations {
    pub fn is_empty(&self) -> bool {
        self.callers.is_empty() && self.callees.is_empty()
    }

    /// Edges as seen from `target`.
    pub fn edges(&self, target: UnitId) -> Vec<Edge> {
        let callers = self.callers.iter().map(|link| {
            Edge::inferred(EdgeKind::InferredCaller, link.unit, target, link.hint.clone())
        });
        let callees = self.callees.iter().map(|link| {
            Edge::inferred(EdgeKind::InferredCallee, target, link.unit, link.hint.clone())
        });
        callers.chain(callees).collect()
    }

    fn push_caller(&mut self, link: InferredLink) {
        push_unique(&mut self.callers, link);
    }

    fn push_callee(&mut self, link: InferredLink) {
        push_unique(&mut self.callees, link);
    }
}

fn push_unique(links: &mut Vec<InferredLink>, link: InferredLink) {
    if !links.iter().any(|l| l.unit == link.unit && l.hint == link.hint) {
        links.push(link);
    }
}

/// A parameter whose annotation parses as a callable.
#[derive(Debug, Clone)]
struct CallableParam {
    name: String,
    annotation: String,
    arity: CallableArity,
}

/// Applies the decorator and callable-parameter rules over a registry.
///
/// Callable annotations are parsed once at construction; queries only read
/// the resulting indexes.
#[derive(Debug, Clone)]
pub struct RelationshipInferencer<'r> {
    registry: &'r Registry,
    enabled: bool,
    /// Callable parameters per unit, indexed by `UnitId`.
    callables: Vec<Vec<CallableParam>>,
    /// Units with at least one callable parameter, in registry order.
    accepting_units: Vec<UnitId>,
    /// Parameter count -> units with that many parameters, in registry order.
    by_param_count: HashMap<usize, Vec<UnitId>>,
}

impl<'r> RelationshipInferencer<'r> {
    pub fn new(registry: &'r Registry, config: &InferenceConfig) -> Self {
        let mut inferencer = RelationshipInferencer {
            registry,
            enabled: config.enabled,
            callables: Vec::new(),
            accepting_units: Vec::new(),
            by_param_count: HashMap::new(),
        };
        if !config.enabled {
            return inferencer;
        }

        for (id, unit) in registry.iter() {
            let params: Vec<CallableParam> = unit
                .annotated_params()
                .filter_map(|(name, annotation)| {
                    parse_callable_arity(annotation).map(|arity| CallableParam {
                        name: name.to_string(),
                        annotation: annotation.to_string(),
                        arity,
                    })
                })
                .collect();
            if !params.is_empty() {
                inferencer.accepting_units.push(id);
            }
            inferencer.callables.push(params);
            inferencer
                .by_param_count
                .entry(unit.param_count())
                .or_default()
                .push(id);
        }

        tracing::debug!(
            "Indexed {} units with callable parameters",
            inferencer.accepting_units.len()
        );
        inferencer
    }

    pub fn infer(&self, target: UnitId) -> InferredRelations {
        let mut relations = InferredRelations::default();
        if !self.enabled {
            return relations;
        }
        let Some(subject) = self.registry.get(target) else {
            return relations;
        };

        self.infer_decorators(subject, &mut relations);
        self.infer_callable_params(target, subject, &mut relations);

        tracing::debug!(
            "Inferred {} callers, {} callees for {}",
            relations.callers.len(),
            relations.callees.len(),
            subject.name
        );
        relations
    }

    fn infer_decorators(&self, subject: &CodeUnit, relations: &mut InferredRelations) {
        // Units this subject decorates.
        for &decorated in self.registry.decorated_by(&subject.name) {
            let unit = self.registry.unit(decorated);
            relations.push_callee(InferredLink {
                unit: decorated,
                hint: format!("@{} decorator", subject.name),
                highlight_lines: vec![unit.start_line],
            });
        }

        // Decorators applied to this subject; every unit carrying the name.
        for decorator in &subject.decorators {
            for &id in self.registry.lookup_all(decorator) {
                let unit = self.registry.unit(id);
                relations.push_caller(InferredLink {
                    unit: id,
                    hint: format!("@{decorator} decorator"),
                    highlight_lines: vec![unit.start_line],
                });
            }
        }
    }

    fn infer_callable_params(
        &self,
        target: UnitId,
        subject: &CodeUnit,
        relations: &mut InferredRelations,
    ) {
        // Forward: one candidate per callable parameter of the subject.
        for param in self.callables_of(target) {
            if let Some(id) = self.first_candidate(param.arity, &subject.name) {
                relations.push_callee(InferredLink {
                    unit: id,
                    hint: format!(
                        "may be passed as argument '{}: {}'",
                        param.name, param.annotation
                    ),
                    highlight_lines: vec![self.registry.unit(id).start_line],
                });
            }
        }

        // Reverse: other units whose callable parameter could receive the subject.
        let param_count = subject.param_count();
        for &id in &self.accepting_units {
            let unit = self.registry.unit(id);
            if unit.name == subject.name {
                continue;
            }
            let accepting = self
                .callables_of(id)
                .iter()
                .find(|param| param.arity.matches(param_count));
            if let Some(param) = accepting {
                relations.push_caller(InferredLink {
                    unit: id,
                    hint: format!(
                        "may be passed as argument '{}: {}' to {}",
                        param.name, param.annotation, unit.name
                    ),
                    highlight_lines: param_lines(unit, &param.name),
                });
            }
        }
    }

    fn callables_of(&self, id: UnitId) -> &[CallableParam] {
        self.callables.get(id.0).map(Vec::as_slice).unwrap_or_default()
    }

    /// First unit in registry order, not named `exclude`, that `arity` accepts.
    fn first_candidate(&self, arity: CallableArity, exclude: &str) -> Option<UnitId> {
        let not_excluded = |id: &UnitId| self.registry.unit(*id).name != exclude;
        match arity {
            CallableArity::Any => self.registry.ids().find(not_excluded),
            CallableArity::Exact(count) => self
                .by_param_count
                .get(&count)?
                .iter()
                .copied()
                .find(not_excluded),
        }
    }
}

/// Lines declaring `param`, falling back to the unit's first line.
fn param_lines(unit: &CodeUnit, param: &str) -> Vec<u32> {
    let lines: Vec<u32> = unit
        .code
        .split('\n')
        .enumerate()
        .filter(|(_, line)| line.contains(param) && (line.contains(':') || line.contains("def ")))
        .map(|(idx, _)| unit.absolute_line(idx as u32 + 1))
        .collect();
    if lines.is_empty() {
        vec![unit.start_line]
    } else {
        lines
    }
}
