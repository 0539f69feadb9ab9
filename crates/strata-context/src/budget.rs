//! Graduated compression of bundles to a size budget
//!
//! Levels are cumulative: level N applies every transformation of the levels
//! below it. Caller-facing context is given up in order of least value first,
//! inferred callers before direct ones, and the primary text never changes.

use std::fmt;
use std::time::Instant;

use strata_core::BudgetConfig;
use tracing::{debug, info, warn};

use crate::bundle::Bundle;
use crate::error::{ContextError, ContextResult};
use crate::measure::{MeasureError, SizeMeasure};
use crate::prompt::render_context;
use crate::snippet::SnippetExtractor;

/// Position in the compression cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompressionLevel {
    Full,
    InferredWide,
    InferredNarrow,
    InferredTruncated,
    InferredDropped,
    CallersWide,
    CallersNarrow,
    CallersTruncated,
    Minimal,
}

impl CompressionLevel {
    pub const ALL: [CompressionLevel; 9] = [
        CompressionLevel::Full,
        CompressionLevel::InferredWide,
        CompressionLevel::InferredNarrow,
        CompressionLevel::InferredTruncated,
        CompressionLevel::InferredDropped,
        CompressionLevel::CallersWide,
        CompressionLevel::CallersNarrow,
        CompressionLevel::CallersTruncated,
        CompressionLevel::Minimal,
    ];

    pub fn ordinal(self) -> u8 {
        self as u8
    }

    pub fn describe(self) -> &'static str {
        match self {
            CompressionLevel::Full => "full bundle",
            CompressionLevel::InferredWide => "inferred callers windowed wide",
            CompressionLevel::InferredNarrow => "inferred callers windowed narrow",
            CompressionLevel::InferredTruncated => "inferred callers truncated",
            CompressionLevel::InferredDropped => "inferred callers dropped",
            CompressionLevel::CallersWide => "callers windowed wide",
            CompressionLevel::CallersNarrow => "callers windowed narrow",
            CompressionLevel::CallersTruncated => "callers truncated",
            CompressionLevel::Minimal => "primary only",
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.ordinal())
    }
}

/// Result of running the cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compressed {
    pub bundle: Bundle,
    pub level: CompressionLevel,
    /// Measured size of the returned bundle.
    pub size: usize,
    /// Set when no level fits the budget.
    pub over_budget: bool,
}

pub struct BudgetCompressor {
    measure: Box<dyn SizeMeasure>,
    extractor: SnippetExtractor,
    budget: usize,
    max_callers: usize,
    max_inferred: usize,
    wide_context: u32,
    narrow_context: u32,
}

impl fmt::Debug for BudgetCompressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BudgetCompressor")
            .field("measure", &self.measure.name())
            .field("budget", &self.budget)
            .field("max_callers", &self.max_callers)
            .field("max_inferred", &self.max_inferred)
            .finish()
    }
}

impl BudgetCompressor {
    pub fn new(
        config: &BudgetConfig,
        extractor: SnippetExtractor,
        measure: Box<dyn SizeMeasure>,
    ) -> Self {
        BudgetCompressor {
            measure,
            extractor,
            budget: config.budget,
            max_callers: config.max_callers,
            max_inferred: config.max_inferred,
            wide_context: config.wide_context,
            narrow_context: config.narrow_context,
        }
    }

    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn measure_name(&self) -> &'static str {
        self.measure.name()
    }

    /// Measured size of the rendered bundle.
    pub fn measure(&self, bundle: &Bundle) -> Result<usize, MeasureError> {
        self.measure.measure(&render_context(bundle))
    }

    /// Apply every transformation up to and including `level` to `raw`.
    pub fn apply(&self, raw: &Bundle, level: CompressionLevel) -> Bundle {
        use CompressionLevel::*;

        if level >= Minimal {
            return raw.minimal();
        }
        let mut bundle = raw.clone();

        // ── Inferred callers ────────────────────────────────────
        if level >= InferredDropped {
            bundle.inferred_callers.clear();
        } else {
            if level >= InferredWide {
                for entry in &mut bundle.inferred_callers {
                    entry.caller.shrink(&self.extractor, self.wide_context);
                }
            }
            if level >= InferredNarrow {
                for entry in &mut bundle.inferred_callers {
                    entry.caller.shrink(&self.extractor, self.narrow_context);
                }
            }
            if level >= InferredTruncated {
                bundle.inferred_callers.truncate(self.max_inferred);
            }
        }

        // ── Direct callers ──────────────────────────────────────
        if level >= CallersWide {
            for entry in &mut bundle.callers {
                entry.shrink(&self.extractor, self.wide_context);
            }
        }
        if level >= CallersNarrow {
            for entry in &mut bundle.callers {
                entry.shrink(&self.extractor, self.narrow_context);
            }
        }
        if level >= CallersTruncated {
            bundle.callers.truncate(self.max_callers);
        }

        bundle
    }

    /// Walk the cascade and return the first level that fits the budget.
    ///
    /// `deadline` is checked before each level. A level that would measure
    /// larger than the one before it is skipped in favour of the previous
    /// bundle and its level, so the returned size never exceeds any earlier
    /// level's size and the reported level is the one actually applied.
    pub fn compress(&self, raw: &Bundle, deadline: Option<Instant>) -> ContextResult<Compressed> {
        let mut current: Option<Compressed> = None;

        for level in CompressionLevel::ALL {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(ContextError::DeadlineExceeded { level });
            }

            let candidate = match level {
                CompressionLevel::Full => raw.clone(),
                _ => self.apply(raw, level),
            };
            let size = self.measure(&candidate)?;

            let step = match current.take() {
                Some(previous) if size > previous.size => {
                    debug!(
                        "{level} measured {size} > {}, keeping {}",
                        previous.size, previous.level
                    );
                    previous
                }
                _ => Compressed {
                    bundle: candidate,
                    level,
                    size,
                    over_budget: false,
                },
            };
            debug!(
                "{level} ({}): size {}, budget {}",
                level.describe(),
                step.size,
                self.budget
            );

            if step.size <= self.budget {
                if step.level > CompressionLevel::Full {
                    info!(
                        "Compressed bundle to {} ({}): {}/{}",
                        step.level,
                        step.level.describe(),
                        step.size,
                        self.budget
                    );
                }
                return Ok(step);
            }
            current = Some(step);
        }

        let mut last = match current {
            Some(last) => last,
            None => {
                let bundle = raw.minimal();
                let size = self.measure(&bundle)?;
                Compressed {
                    bundle,
                    level: CompressionLevel::Minimal,
                    size,
                    over_budget: false,
                }
            }
        };
        warn!(
            "Bundle exceeds budget after every level: {} > {} at {} ({})",
            last.size,
            self.budget,
            last.level,
            self.measure.name()
        );
        last.over_budget = true;
        Ok(last)
    }
}
