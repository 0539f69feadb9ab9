//! Relevance ordering of direct callers

use strata_core::RankingConfig;

use crate::bundle::CallerEntry;

#[derive(Debug, Clone)]
pub struct RelevanceRanker {
    api_patterns: Vec<String>,
    error_markers: Vec<String>,
}

impl Default for RelevanceRanker {
    fn default() -> Self {
        Self::new(&RankingConfig::default())
    }
}

impl RelevanceRanker {
    pub fn new(config: &RankingConfig) -> Self {
        RelevanceRanker {
            api_patterns: config.api_patterns.iter().map(|p| p.to_lowercase()).collect(),
            error_markers: config.error_markers.clone(),
        }
    }

    /// Score one caller's text.
    ///
    /// +10 when the unit is public and the text carries an API pattern,
    /// +5 under 10 lines or +3 under 20, +3 with an error-handling marker.
    pub fn score(&self, text: &str, is_public_api: bool) -> u32 {
        let mut score = 0;

        if is_public_api {
            let lowered = text.to_lowercase();
            if self.api_patterns.iter().any(|p| lowered.contains(p.as_str())) {
                score += 10;
            }
        }

        let lines = text.split('\n').count();
        if lines < 10 {
            score += 5;
        } else if lines < 20 {
            score += 3;
        }

        if self.error_markers.iter().any(|m| text.contains(m.as_str())) {
            score += 3;
        }

        score
    }

    /// Order callers by descending score; ties keep their input order.
    pub fn rank(&self, mut entries: Vec<CallerEntry>, is_public_api: bool) -> Vec<CallerEntry> {
        for entry in &mut entries {
            entry.score = self.score(&entry.full_text, is_public_api);
        }
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::CodeUnit;

    fn long_body(lines: usize) -> String {
        (0..lines).map(|i| format!("    x{i} = {i}")).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_api_pattern_only_counts_for_public_units() {
        let ranker = RelevanceRanker::default();
        let text = format!("@Route('/users')\ndef users():\n{}", long_body(30));

        assert_eq!(ranker.score(&text, true), 10);
        assert_eq!(ranker.score(&text, false), 0);
    }

    #[test]
    fn test_length_and_error_handling() {
        let ranker = RelevanceRanker::default();

        assert_eq!(ranker.score("def a():\n    pass", false), 5);
        assert_eq!(ranker.score(&format!("def a():\n{}", long_body(14)), false), 3);

        let guarded = format!(
            "def a():\n    try:\n{}\n    except ValueError:\n        pass",
            long_body(30)
        );
        assert_eq!(ranker.score(&guarded, false), 3);
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let ranker = RelevanceRanker::default();
        let long = CodeUnit::new("long", format!("def long():\n{}", long_body(40)));
        let first = CodeUnit::new("first", "def first():\n    target()");
        let second = CodeUnit::new("second", "def second():\n    target()");

        let ranked = ranker.rank(
            vec![
                CallerEntry::new(&long, &[]),
                CallerEntry::new(&first, &[]),
                CallerEntry::new(&second, &[]),
            ],
            false,
        );

        let names: Vec<&str> = ranked.iter().map(|e| e.source_unit.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "long"]);
        assert_eq!(ranked[0].score, 5);
        assert_eq!(ranked[2].score, 0);
    }
}
