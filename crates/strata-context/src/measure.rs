//! Size measures for rendered context
//!
//! The compressor only relies on one property: removing or shortening text
//! never makes the measure larger.

use strata_core::MeasureKind;

#[derive(Debug, thiserror::Error)]
pub enum MeasureError {
    #[error("Size measure '{0}' is unavailable: {1}")]
    Unavailable(&'static str, String),

    #[error("Size measure failed: {0}")]
    Failed(String),
}

/// Pluggable size function over rendered text.
pub trait SizeMeasure: Send + Sync {
    fn name(&self) -> &'static str;

    fn measure(&self, text: &str) -> Result<usize, MeasureError>;
}

/// Rough token estimate: characters divided by a fixed ratio.
#[derive(Debug, Clone, Copy)]
pub struct CharEstimate {
    chars_per_token: usize,
}

impl CharEstimate {
    pub fn new(chars_per_token: usize) -> Self {
        Self {
            chars_per_token: chars_per_token.max(1),
        }
    }
}

impl Default for CharEstimate {
    fn default() -> Self {
        Self::new(4)
    }
}

impl SizeMeasure for CharEstimate {
    fn name(&self) -> &'static str {
        "chars"
    }

    fn measure(&self, text: &str) -> Result<usize, MeasureError> {
        Ok(text.chars().count() / self.chars_per_token)
    }
}

/// Exact cl100k_base token count.
#[cfg(feature = "tiktoken")]
pub struct TiktokenMeasure {
    bpe: tiktoken_rs::CoreBPE,
}

#[cfg(feature = "tiktoken")]
impl TiktokenMeasure {
    pub fn new() -> Result<Self, MeasureError> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| MeasureError::Unavailable("tiktoken", e.to_string()))?;
        Ok(Self { bpe })
    }
}

#[cfg(feature = "tiktoken")]
impl SizeMeasure for TiktokenMeasure {
    fn name(&self) -> &'static str {
        "tiktoken"
    }

    fn measure(&self, text: &str) -> Result<usize, MeasureError> {
        Ok(self.bpe.encode_with_special_tokens(text).len())
    }
}

/// Build the measure selected in configuration.
pub fn measure_for(kind: MeasureKind) -> Result<Box<dyn SizeMeasure>, MeasureError> {
    match kind {
        MeasureKind::Chars => Ok(Box::new(CharEstimate::default())),
        #[cfg(feature = "tiktoken")]
        MeasureKind::Tiktoken => Ok(Box::new(TiktokenMeasure::new()?)),
        #[cfg(not(feature = "tiktoken"))]
        MeasureKind::Tiktoken => Err(MeasureError::Unavailable(
            "tiktoken",
            "built without the `tiktoken` feature".into(),
        )),
    }
}
