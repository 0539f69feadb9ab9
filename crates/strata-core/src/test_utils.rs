//! Test utilities for strata-core

use crate::model::CodeUnit;
use crate::registry::Registry;

/// A unit with a one-line body calling each of `calls`.
pub fn unit(name: &str, calls: &[&str]) -> CodeUnit {
    let body: String = if calls.is_empty() {
        "    pass".to_string()
    } else {
        calls
            .iter()
            .map(|c| format!("    {c}()"))
            .collect::<Vec<_>>()
            .join("\n")
    };
    CodeUnit::new(name, format!("def {name}():\n{body}")).with_calls(calls)
}

/// A small web service: a decorator, two routes, a callback runner and helpers.
pub fn create_service_registry() -> Registry {
    Registry::new(vec![
        CodeUnit::new(
            "login_required",
            "def login_required(view):\n    def wrapper(*args):\n        \
             return view(*args)\n    return wrapper",
        )
        .with_params(&["view"])
        .located("app/auth.py", 1),
        CodeUnit::new(
            "profile",
            "@login_required\ndef profile(user_id):\n    \
             user = load_user(user_id)\n    return render(user)",
        )
        .with_params(&["user_id"])
        .with_decorators(&["login_required"])
        .with_calls(&["load_user", "render"])
        .located("app/views/profile.py", 10),
        CodeUnit::new(
            "load_user",
            "def load_user(user_id):\n    return db.get(user_id)",
        )
        .with_params(&["user_id"])
        .located("app/models.py", 3),
        CodeUnit::new(
            "run_hooks",
            "def run_hooks(hook: Callable[[int, int], None]):\n    hook(1, 2)",
        )
        .with_params(&["hook"])
        .with_param_type("hook", "Callable[[int, int], None]")
        .located("app/hooks.py", 1),
        CodeUnit::new("on_resize", "def on_resize(width, height):\n    pass")
            .with_params(&["width", "height"])
            .located("app/hooks.py", 20),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_fixture() {
        let unit = unit("a", &["b", "c"]);
        assert_eq!(unit.code, "def a():\n    b()\n    c()");
        assert_eq!(unit.calls.len(), 2);
        assert_eq!(unit.end_line, 3);
    }

    #[test]
    fn test_service_registry_locations() {
        let registry = create_service_registry();
        let profile = registry.resolve("profile").map(|id| registry.unit(id)).unwrap();
        assert_eq!(profile.start_line, 10);
        assert_eq!(profile.end_line, 13);
    }
}
