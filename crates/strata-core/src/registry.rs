//! Name-indexed snapshot of the code units of one scan session

use std::collections::HashMap;

use crate::error::StrataResult;
use crate::model::{CodeUnit, UnitId};

/// Immutable arena of code units with name and decorator indexes.
///
/// Built once per scan and only read afterwards, so a `&Registry` can be
/// shared freely across worker threads.
#[derive(Debug, Default)]
pub struct Registry {
    units: Vec<CodeUnit>,
    /// Unit name -> every unit carrying that name, in registration order.
    by_name: HashMap<String, Vec<UnitId>>,
    /// Decorator name -> units decorated with it, in registration order.
    by_decorator: HashMap<String, Vec<UnitId>>,
}

impl Registry {
    pub fn new(mut units: Vec<CodeUnit>) -> Self {
        let mut by_name: HashMap<String, Vec<UnitId>> = HashMap::new();
        let mut by_decorator: HashMap<String, Vec<UnitId>> = HashMap::new();

        for unit in &mut units {
            // Parsers may omit the end line; derive it from the code.
            if unit.end_line < unit.start_line {
                unit.end_line = unit.absolute_line(unit.line_count() as u32);
            }
        }

        for (idx, unit) in units.iter().enumerate() {
            let id = UnitId(idx);
            by_name.entry(unit.name.clone()).or_default().push(id);
            for decorator in &unit.decorators {
                let decorated = by_decorator.entry(decorator.clone()).or_default();
                if decorated.last() != Some(&id) {
                    decorated.push(id);
                }
            }
        }

        let duplicates = by_name.values().filter(|ids| ids.len() > 1).count();
        if duplicates > 0 {
            tracing::debug!("{} unit names are shared by more than one unit", duplicates);
        }
        tracing::debug!("Registry built with {} units", units.len());

        Registry {
            units,
            by_name,
            by_decorator,
        }
    }

    /// Parse a JSON array of parser records.
    pub fn from_json_str(json: &str) -> StrataResult<Self> {
        let units: Vec<CodeUnit> = serde_json::from_str(json)?;
        Ok(Self::new(units))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Get a unit by ID.
    ///
    /// Panics if `id` was not issued by this registry.
    pub fn unit(&self, id: UnitId) -> &CodeUnit {
        &self.units[id.0]
    }

    pub fn get(&self, id: UnitId) -> Option<&CodeUnit> {
        self.units.get(id.0)
    }

    /// Iterate over all units in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &CodeUnit)> {
        self.units.iter().enumerate().map(|(idx, unit)| (UnitId(idx), unit))
    }

    pub fn ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        (0..self.units.len()).map(UnitId)
    }

    /// Resolve a name to its first registered unit.
    pub fn resolve(&self, name: &str) -> Option<UnitId> {
        self.by_name.get(name).and_then(|ids| ids.first().copied())
    }

    /// All units registered under `name`.
    pub fn lookup_all(&self, name: &str) -> &[UnitId] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Units whose decorator list contains `decorator`.
    pub fn decorated_by(&self, decorator: &str) -> &[UnitId] {
        self.by_decorator
            .get(decorator)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_stay_distinct() {
        let mut first = CodeUnit::new("load", "def load():\n    pass");
        first.file_path = "a.py".into();
        let mut second = CodeUnit::new("load", "def load(path):\n    pass");
        second.file_path = "b.py".into();

        let registry = Registry::new(vec![first, second]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup_all("load"), &[UnitId(0), UnitId(1)]);
        assert_eq!(registry.resolve("load"), Some(UnitId(0)));
        assert_eq!(registry.unit(UnitId(1)).file_path.to_str(), Some("b.py"));
    }

    #[test]
    fn test_decorator_index() {
        let mut view = CodeUnit::new("view", "@login\n@login\ndef view():\n    pass");
        view.decorators = vec!["login".into(), "login".into()];
        let login = CodeUnit::new("login", "def login(f):\n    return f");
        let registry = Registry::new(vec![login, view]);

        assert_eq!(registry.decorated_by("login"), &[UnitId(1)]);
        assert!(registry.decorated_by("cached").is_empty());
    }

    #[test]
    fn test_from_json_defaults_optional_fields() {
        let json = r#"[{"name": "main", "code": "def main():\n    run()", "calls": ["run"]}]"#;
        let registry = Registry::from_json_str(json).unwrap();
        let unit = registry.unit(UnitId(0));

        assert_eq!(unit.start_line, 1);
        assert_eq!(unit.end_line, 2);
        assert!(unit.params.is_empty());
        assert!(unit.calls.contains("run"));
    }

    #[test]
    fn test_empty_registry() {
        let registry = Registry::new(Vec::new());
        assert!(registry.is_empty());
        assert_eq!(registry.resolve("anything"), None);
        assert!(registry.lookup_all("anything").is_empty());
    }
}
