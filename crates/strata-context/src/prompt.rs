//! Text rendering of a bundle
//!
//! The rendered text is what the size measure sees. A bundle without caller
//! context renders as exactly its primary text.

use crate::bundle::Bundle;

pub const CALLERS_HEADER: &str = "Callers:";
pub const INFERRED_HEADER: &str = "Possible callers (inferred):";

/// Render `bundle` as the text an analyzer would receive.
pub fn render_context(bundle: &Bundle) -> String {
    let mut out = bundle.primary_text.clone();

    if !bundle.callers.is_empty() {
        out.push_str(&format!("\n\n{CALLERS_HEADER}\n"));
        for entry in &bundle.callers {
            out.push_str(&format!(
                "\n# {} ({})\n{}\n",
                entry.source_unit,
                entry.source_file.display(),
                entry.text()
            ));
        }
    }

    if !bundle.inferred_callers.is_empty() {
        out.push_str(&format!("\n\n{INFERRED_HEADER}\n"));
        for entry in &bundle.inferred_callers {
            out.push_str(&format!(
                "\n# {} ({}): {}\n{}\n",
                entry.caller.source_unit,
                entry.caller.source_file.display(),
                entry.hint,
                entry.text()
            ));
        }
    }

    out
}
