//! Windowed excerpts of code units
//!
//! An excerpt always keeps the unit's signature, then the lines around each
//! highlight. Gaps are marked with [`ELLIPSIS`]. Highlight lines stay absolute
//! source line numbers; [`Snippet::line_at`] maps them back into the excerpt.

use serde::Serialize;
use strata_core::SnippetConfig;

/// Marker line standing in for omitted lines.
pub const ELLIPSIS: &str = "    ...";

/// Excerpt of a code unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    #[serde(rename = "snippet_text")]
    pub text: String,
    /// Absolute source lines, ascending.
    pub highlight_lines: Vec<u32>,
    /// Absolute source line of the unit's first line.
    #[serde(skip)]
    pub start_line: u32,
    /// Absolute source line of each excerpt line; `None` for ellipsis lines.
    #[serde(skip)]
    origins: Vec<Option<u32>>,
}

impl Snippet {
    /// The whole unit, unmodified.
    pub fn full(code: &str, start_line: u32, highlight_lines: &[u32]) -> Self {
        let line_count = code.split('\n').count() as u32;
        Snippet {
            text: code.to_string(),
            highlight_lines: clip_highlights(highlight_lines, start_line, line_count),
            start_line,
            origins: (0..line_count).map(|offset| Some(start_line + offset)).collect(),
        }
    }

    /// Excerpt line showing absolute source line `line`, if it was kept.
    pub fn line_at(&self, line: u32) -> Option<&str> {
        let position = self.origins.iter().position(|origin| *origin == Some(line))?;
        self.text.split('\n').nth(position)
    }

    /// Whether any source line was left out.
    pub fn is_windowed(&self) -> bool {
        self.origins.iter().any(Option::is_none)
            || self.origins.len() < self.text.split('\n').count()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Highlights inside the unit, ascending and deduplicated.
fn clip_highlights(highlight_lines: &[u32], start_line: u32, line_count: u32) -> Vec<u32> {
    let end_line = start_line + line_count.saturating_sub(1);
    let mut lines: Vec<u32> = highlight_lines
        .iter()
        .copied()
        .filter(|&line| line >= start_line && line <= end_line)
        .collect();
    lines.sort_unstable();
    lines.dedup();
    lines
}

/// Produces signature-anchored excerpts.
#[derive(Debug, Clone)]
pub struct SnippetExtractor {
    terminators: Vec<String>,
    scan_limit: usize,
}

impl Default for SnippetExtractor {
    fn default() -> Self {
        Self::new(&SnippetConfig::default())
    }
}

impl SnippetExtractor {
    pub fn new(config: &SnippetConfig) -> Self {
        SnippetExtractor {
            terminators: config.signature_terminators.clone(),
            scan_limit: config.signature_scan_limit.max(1),
        }
    }

    /// Number of leading lines forming the signature; 1 when no terminator
    /// shows up within the scan limit.
    pub fn signature_len(&self, lines: &[&str]) -> usize {
        lines
            .iter()
            .take(self.scan_limit)
            .position(|line| {
                let trimmed = line.trim();
                self.terminators.iter().any(|t| trimmed.ends_with(t.as_str()))
            })
            .map_or(1, |idx| idx + 1)
    }

    /// Keep the signature plus `context_lines` around every highlight.
    ///
    /// `code` begins at absolute line `start_line`; `highlight_lines` are
    /// absolute. With no highlights inside the unit only the signature is kept.
    pub fn window(
        &self,
        code: &str,
        start_line: u32,
        highlight_lines: &[u32],
        context_lines: u32,
    ) -> Snippet {
        let lines: Vec<&str> = code.split('\n').collect();
        let last = lines.len() as u32;
        let highlights = clip_highlights(highlight_lines, start_line, last);
        let signature = self.signature_len(&lines) as u32;

        let mut ranges: Vec<(u32, u32)> = Vec::new();
        for &absolute in &highlights {
            let relative = absolute - start_line + 1;
            let range = (
                relative.saturating_sub(context_lines).max(1),
                relative.saturating_add(context_lines).min(last),
            );
            match ranges.last_mut() {
                Some(previous) if range.0 <= previous.1 + 1 => previous.1 = previous.1.max(range.1),
                _ => ranges.push(range),
            }
        }

        let mut text: Vec<&str> = Vec::new();
        let mut origins: Vec<Option<u32>> = Vec::new();
        for relative in 1..=signature {
            text.push(lines[relative as usize - 1]);
            origins.push(Some(start_line + relative - 1));
        }

        let mut emitted = signature;
        for (from, to) in ranges {
            if to <= emitted {
                continue;
            }
            if from > emitted + 1 {
                text.push(ELLIPSIS);
                origins.push(None);
            }
            for relative in from.max(emitted + 1)..=to {
                text.push(lines[relative as usize - 1]);
                origins.push(Some(start_line + relative - 1));
            }
            emitted = to;
        }

        Snippet {
            text: text.join("\n"),
            highlight_lines: highlights,
            start_line,
            origins,
        }
    }
}
