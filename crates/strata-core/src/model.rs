//! Core data structures for a scan session

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Position of a unit inside the registry arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct UnitId(pub usize);

/// A single code unit (function or method) as produced by the parser.
///
/// `code` starts at `start_line`, so line `n` of `code` (1-based) is line
/// `start_line + n - 1` of the source file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeUnit {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
    /// Decorator names in source order.
    #[serde(default)]
    pub decorators: Vec<String>,
    /// Parameter name -> annotation text.
    #[serde(default)]
    pub param_types: BTreeMap<String, String>,
    #[serde(default)]
    pub is_async: bool,
    /// Names referenced in call position.
    #[serde(default)]
    pub calls: BTreeSet<String>,
    #[serde(default)]
    pub file_path: PathBuf,
    #[serde(default = "first_line")]
    pub start_line: u32,
    #[serde(default)]
    pub end_line: u32,
    #[serde(default)]
    pub start_col: u32,
    #[serde(default)]
    pub end_col: u32,
    pub code: String,
    #[serde(default)]
    pub doc: String,
}

fn first_line() -> u32 {
    1
}

impl CodeUnit {
    /// Minimal unit starting at line 1 of an unnamed file.
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        let code = code.into();
        let end_line = code.split('\n').count() as u32;
        CodeUnit {
            name: name.into(),
            params: Vec::new(),
            decorators: Vec::new(),
            param_types: BTreeMap::new(),
            is_async: false,
            calls: BTreeSet::new(),
            file_path: PathBuf::new(),
            start_line: 1,
            end_line,
            start_col: 0,
            end_col: 0,
            code,
            doc: String::new(),
        }
    }

    pub fn with_params(mut self, params: &[&str]) -> Self {
        self.params = params.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_param_type(mut self, param: &str, annotation: &str) -> Self {
        self.param_types.insert(param.to_string(), annotation.to_string());
        self
    }

    pub fn with_decorators(mut self, decorators: &[&str]) -> Self {
        self.decorators = decorators.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_calls(mut self, calls: &[&str]) -> Self {
        self.calls = calls.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Place the unit in `file_path` starting at `start_line`.
    pub fn located(mut self, file_path: impl Into<PathBuf>, start_line: u32) -> Self {
        self.file_path = file_path.into();
        self.end_line = start_line + self.line_count() as u32 - 1;
        self.start_line = start_line;
        self
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Number of lines in `code`, counting a trailing empty line.
    pub fn line_count(&self) -> usize {
        self.code.split('\n').count()
    }

    /// Convert a 1-based line of `code` into an absolute source line.
    pub fn absolute_line(&self, relative: u32) -> u32 {
        self.start_line + relative.saturating_sub(1)
    }

    /// Annotated parameters in declaration order, followed by any annotated
    /// names that are not in `params` (keyword-only, varargs).
    pub fn annotated_params(&self) -> impl Iterator<Item = (&str, &str)> {
        let declared = self
            .params
            .iter()
            .filter_map(move |p| self.param_types.get(p).map(|t| (p.as_str(), t.as_str())));
        let extra = self
            .param_types
            .iter()
            .filter(move |(name, _)| !self.params.iter().any(|p| p == *name))
            .map(|(n, t)| (n.as_str(), t.as_str()));
        declared.chain(extra)
    }
}

/// What kind of relationship an edge represents, from the subject's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    // ── Structural (call-set name matching) ─────────────────
    DirectCaller,
    DirectCallee,

    // ── Heuristic (decorators, callable parameters) ─────────
    InferredCaller,
    InferredCallee,
}

impl EdgeKind {
    pub fn is_inferred(self) -> bool {
        matches!(self, EdgeKind::InferredCaller | EdgeKind::InferredCallee)
    }
}

/// A derived relationship between two units.
///
/// Caller kinds point `source = caller` to `target = subject`; callee kinds
/// point `source = subject` to `target = callee`. Self-loops are allowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub kind: EdgeKind,
    pub source: UnitId,
    pub target: UnitId,
    /// Explanation of the inference rule, absent for direct edges.
    pub hint: Option<String>,
}

impl Edge {
    pub fn direct(kind: EdgeKind, source: UnitId, target: UnitId) -> Self {
        Edge {
            kind,
            source,
            target,
            hint: None,
        }
    }

    pub fn inferred(
        kind: EdgeKind,
        source: UnitId,
        target: UnitId,
        hint: impl Into<String>,
    ) -> Self {
        Edge {
            kind,
            source,
            target,
            hint: Some(hint.into()),
        }
    }
}
