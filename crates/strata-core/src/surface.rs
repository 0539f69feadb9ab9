//! Public API surface classification

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::SurfaceConfig;
use crate::error::{StrataError, StrataResult};
use crate::model::CodeUnit;

/// Which rule decided the classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceVerdict {
    /// A decorator contains a configured indicator.
    Decorator(String),
    /// The file path matches a configured glob.
    FilePattern,
    /// The name starts with a configured prefix.
    NamePrefix(String),
    /// Nothing calls it directly but something reaches it indirectly.
    ExternallyReachable,
    Internal,
}

impl SurfaceVerdict {
    pub fn is_public(&self) -> bool {
        !matches!(self, SurfaceVerdict::Internal)
    }
}

/// Ordered decision list; the first matching rule wins.
#[derive(Debug, Clone)]
pub struct ApiSurfaceClassifier {
    decorator_indicators: Vec<String>,
    file_patterns: GlobSet,
    name_prefixes: Vec<String>,
    private_prefix: String,
}

impl ApiSurfaceClassifier {
    pub fn new(config: &SurfaceConfig) -> StrataResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &config.api_file_patterns {
            let glob = Glob::new(pattern).map_err(|source| StrataError::Glob {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let file_patterns = builder.build().map_err(|source| StrataError::Glob {
            pattern: config.api_file_patterns.join(", "),
            source,
        })?;

        Ok(ApiSurfaceClassifier {
            decorator_indicators: config
                .api_decorators
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
            file_patterns,
            name_prefixes: config.api_name_prefixes.clone(),
            private_prefix: config.private_prefix.clone(),
        })
    }

    pub fn classify(
        &self,
        unit: &CodeUnit,
        direct_caller_count: usize,
        has_inferred_callers: bool,
    ) -> bool {
        self.verdict(unit, direct_caller_count, has_inferred_callers)
            .is_public()
    }

    pub fn verdict(
        &self,
        unit: &CodeUnit,
        direct_caller_count: usize,
        has_inferred_callers: bool,
    ) -> SurfaceVerdict {
        for decorator in &unit.decorators {
            let lowered = decorator.to_lowercase();
            if self
                .decorator_indicators
                .iter()
                .any(|indicator| lowered.contains(indicator.as_str()))
            {
                return SurfaceVerdict::Decorator(decorator.clone());
            }
        }

        if !unit.file_path.as_os_str().is_empty() && self.file_patterns.is_match(&unit.file_path) {
            return SurfaceVerdict::FilePattern;
        }

        if let Some(prefix) = self
            .name_prefixes
            .iter()
            .find(|prefix| unit.name.starts_with(prefix.as_str()))
        {
            return SurfaceVerdict::NamePrefix(prefix.clone());
        }

        let private =
            !self.private_prefix.is_empty() && unit.name.starts_with(&self.private_prefix);
        if !private && direct_caller_count == 0 && has_inferred_callers {
            return SurfaceVerdict::ExternallyReachable;
        }

        SurfaceVerdict::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ApiSurfaceClassifier {
        ApiSurfaceClassifier::new(&SurfaceConfig::default()).unwrap()
    }

    #[test]
    fn test_route_decorator_is_public() {
        let mut unit = CodeUnit::new(
            "handle_request",
            "@route('/api')\ndef handle_request(request):\n    pass",
        );
        unit.decorators = vec!["Route".into()];

        assert_eq!(
            classifier().verdict(&unit, 3, false),
            SurfaceVerdict::Decorator("Route".into())
        );
    }

    #[test]
    fn test_file_pattern_is_public() {
        let mut unit = CodeUnit::new("list_users", "def list_users():\n    pass");
        unit.file_path = "app/api/users.py".into();

        assert_eq!(classifier().verdict(&unit, 1, false), SurfaceVerdict::FilePattern);
    }

    #[test]
    fn test_name_prefix_is_public() {
        let unit = CodeUnit::new("api_get_users", "def api_get_users():\n    pass");
        assert!(classifier().classify(&unit, 0, false));
    }

    #[test]
    fn test_called_helper_is_internal() {
        let unit = CodeUnit::new("helper_function", "def helper_function(data):\n    pass");
        assert!(!classifier().classify(&unit, 1, false));
    }

    #[test]
    fn test_indirectly_reached_unit_is_public() {
        let unit = CodeUnit::new("on_event", "def on_event(evt):\n    pass");
        assert_eq!(
            classifier().verdict(&unit, 0, true),
            SurfaceVerdict::ExternallyReachable
        );
        assert!(!classifier().classify(&unit, 1, true));
    }

    #[test]
    fn test_private_unit_never_reachability_public() {
        let unit = CodeUnit::new("_on_event", "def _on_event(evt):\n    pass");
        assert!(!classifier().classify(&unit, 0, true));
    }

    #[test]
    fn test_invalid_glob_is_config_error() {
        let config = SurfaceConfig {
            api_file_patterns: vec!["src/[".into()],
            ..SurfaceConfig::default()
        };
        let err = ApiSurfaceClassifier::new(&config).unwrap_err();
        assert!(matches!(err, StrataError::Glob { .. }));
    }
}
