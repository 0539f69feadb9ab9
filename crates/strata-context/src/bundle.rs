//! Context bundles handed to analyzers

use std::path::PathBuf;

use serde::Serialize;
use strata_core::CodeUnit;

use crate::snippet::{Snippet, SnippetExtractor};

/// One direct caller of the unit under analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerEntry {
    #[serde(flatten)]
    pub snippet: Snippet,
    pub source_unit: String,
    pub source_file: PathBuf,
    /// Complete caller code; every window is cut from this.
    #[serde(skip)]
    pub full_text: String,
    #[serde(skip)]
    pub score: u32,
}

impl CallerEntry {
    /// Entry showing the whole of `caller`.
    pub fn new(caller: &CodeUnit, highlight_lines: &[u32]) -> Self {
        CallerEntry {
            snippet: Snippet::full(&caller.code, caller.start_line, highlight_lines),
            source_unit: caller.name.clone(),
            source_file: caller.file_path.clone(),
            full_text: caller.code.clone(),
            score: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.snippet.text
    }

    /// Re-window around the highlights, keeping the result only when it is
    /// shorter than what the entry shows now.
    pub fn shrink(&mut self, extractor: &SnippetExtractor, context_lines: u32) {
        let windowed = extractor.window(
            &self.full_text,
            self.snippet.start_line,
            &self.snippet.highlight_lines,
            context_lines,
        );
        if windowed.char_count() < self.snippet.char_count() {
            self.snippet = windowed;
        }
    }
}

/// A caller found by inference rather than by name matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferredEntry {
    #[serde(flatten)]
    pub caller: CallerEntry,
    #[serde(rename = "hint_text")]
    pub hint: String,
}

impl InferredEntry {
    pub fn new(caller: &CodeUnit, highlight_lines: &[u32], hint: impl Into<String>) -> Self {
        InferredEntry {
            caller: CallerEntry::new(caller, highlight_lines),
            hint: hint.into(),
        }
    }

    pub fn text(&self) -> &str {
        self.caller.text()
    }
}

/// Everything an analyzer sees about one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bundle {
    /// Full code of the unit under analysis; never altered by compression.
    pub primary_text: String,
    pub is_public_api: bool,
    pub callers: Vec<CallerEntry>,
    pub inferred_callers: Vec<InferredEntry>,
}

impl Bundle {
    pub fn new(primary_text: impl Into<String>, is_public_api: bool) -> Self {
        Bundle {
            primary_text: primary_text.into(),
            is_public_api,
            callers: Vec::new(),
            inferred_callers: Vec::new(),
        }
    }

    /// The same bundle without any caller context.
    pub fn minimal(&self) -> Self {
        Bundle::new(self.primary_text.clone(), self.is_public_api)
    }

    pub fn is_minimal(&self) -> bool {
        self.callers.is_empty() && self.inferred_callers.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
