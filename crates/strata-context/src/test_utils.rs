//! Test utilities for strata-context

use strata_core::{CodeUnit, Registry};

/// `def name():` followed by `body_lines` filler lines, with a call to
/// `callee` on relative line `call_at`.
pub fn caller_unit(name: &str, callee: &str, body_lines: usize, call_at: usize) -> CodeUnit {
    let mut lines = vec![format!("def {name}():")];
    for i in 2..=body_lines + 1 {
        if i == call_at {
            lines.push(format!("    result = {callee}(value_{i})"));
        } else {
            lines.push(format!("    value_{i} = prepare_{i}()"));
        }
    }
    CodeUnit::new(name, lines.join("\n")).with_calls(&[callee])
}

/// A short `target` unit with `callers` long callers and one long decorator.
pub fn create_fan_in_registry(callers: usize, body_lines: usize) -> Registry {
    let mut units = vec![
        CodeUnit::new("target", "@traced\ndef target(value):\n    return value * 2")
            .with_params(&["value"])
            .with_decorators(&["traced"])
            .located("pkg/core.py", 1),
        caller_unit("traced", "fn", body_lines, 2)
            .with_params(&["fn"])
            .located("pkg/tracing.py", 1),
    ];
    for k in 0..callers {
        units.push(
            caller_unit(&format!("caller_{k}"), "target", body_lines, body_lines / 2)
                .located(format!("pkg/caller_{k}.py"), 10),
        );
    }
    Registry::new(units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_unit_shape() {
        let unit = caller_unit("main", "target", 4, 3);
        assert_eq!(unit.line_count(), 5);
        assert!(unit.code.contains("    result = target(value_3)"));
        assert!(unit.calls.contains("target"));
    }

    #[test]
    fn test_fan_in_registry() {
        let registry = create_fan_in_registry(4, 20);
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.lookup_all("caller_3").len(), 1);
    }
}
