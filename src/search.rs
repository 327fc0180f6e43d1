use std::cmp::Ordering;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::store::CommandRecord;

/// One ranked view of a stored command, rebuilt from scratch on every query
/// change and discarded after the render cycle.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub record: CommandRecord,
    pub score: i64,
    pub source_index: usize,
}

pub struct Ranker {
    matcher: SkimMatcherV2,
    fuzzy: bool,
}

impl Ranker {
    pub fn new(fuzzy: bool) -> Self {
        // Plain ignore_case rather than the matcher's default smart case:
        // an uppercase query must still match lowercase history.
        Self {
            matcher: SkimMatcherV2::default().ignore_case(),
            fuzzy,
        }
    }

    /// Ranks `commands` against `query`.
    ///
    /// An empty query skips matching entirely and passes the snapshot
    /// through unscored, so the caller's most-used-first order shows. A
    /// non-empty query keeps only commands the query fuzzy-matches
    /// (subsequence with contiguity and word-boundary bonuses), best score
    /// first with frequency breaking ties. The sort is stable, so identical
    /// inputs always rank identically.
    pub fn rank(&self, query: &str, commands: &[CommandRecord]) -> Vec<Candidate> {
        if query.is_empty() {
            return commands
                .iter()
                .enumerate()
                .map(|(index, record)| Candidate {
                    record: record.clone(),
                    score: 0,
                    source_index: index,
                })
                .collect();
        }

        if !self.fuzzy {
            let needle = query.to_lowercase();
            return commands
                .iter()
                .enumerate()
                .filter(|(_, record)| record.text.to_lowercase().contains(&needle))
                .map(|(index, record)| Candidate {
                    record: record.clone(),
                    score: 0,
                    source_index: index,
                })
                .collect();
        }

        let mut candidates: Vec<Candidate> = commands
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                self.matcher
                    .fuzzy_match(&record.text, query)
                    .map(|score| Candidate {
                        record: record.clone(),
                        score,
                        source_index: index,
                    })
            })
            .collect();

        candidates.sort_by(|a, b| match b.score.cmp(&a.score) {
            Ordering::Equal => b.record.frequency.cmp(&a.record.frequency),
            other => other,
        });

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, frequency: u64) -> CommandRecord {
        CommandRecord {
            text: text.to_string(),
            tags: Vec::new(),
            frequency,
            last_used: 0,
        }
    }

    fn sample_commands() -> Vec<CommandRecord> {
        vec![
            record("ls -la", 9),
            record("git status", 5),
            record("git commit", 2),
        ]
    }

    fn is_subsequence(needle: &str, haystack: &str) -> bool {
        let haystack = haystack.to_lowercase();
        let mut chars = haystack.chars();
        needle
            .to_lowercase()
            .chars()
            .all(|wanted| chars.any(|ch| ch == wanted))
    }

    #[test]
    fn empty_query_returns_snapshot_order_unscored() {
        let ranker = Ranker::new(true);
        let candidates = ranker.rank("", &sample_commands());

        let texts: Vec<&str> = candidates
            .iter()
            .map(|candidate| candidate.record.text.as_str())
            .collect();
        assert_eq!(texts, vec!["ls -la", "git status", "git commit"]);
        assert!(candidates.iter().all(|candidate| candidate.score == 0));
        assert_eq!(
            candidates
                .iter()
                .map(|candidate| candidate.source_index)
                .collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn non_matches_are_excluded_entirely() {
        let ranker = Ranker::new(true);
        let candidates = ranker.rank("xyz", &sample_commands());
        assert!(candidates.is_empty());
    }

    #[test]
    fn every_match_contains_the_query_as_subsequence() {
        let ranker = Ranker::new(true);
        for query in ["gt", "git", "ls", "commit", "GIT ST"] {
            for candidate in ranker.rank(query, &sample_commands()) {
                assert!(
                    is_subsequence(query, &candidate.record.text),
                    "{query:?} should be a subsequence of {:?}",
                    candidate.record.text
                );
            }
        }
    }

    #[test]
    fn matching_is_case_insensitive() {
        let ranker = Ranker::new(true);
        let candidates = ranker.rank("GIT", &sample_commands());
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn scores_descend_with_frequency_tiebreak() {
        let ranker = Ranker::new(true);
        let candidates = ranker.rank("git", &sample_commands());

        for pair in candidates.windows(2) {
            let better_score = pair[0].score > pair[1].score;
            let tied_with_frequency_order = pair[0].score == pair[1].score
                && pair[0].record.frequency >= pair[1].record.frequency;
            assert!(better_score || tied_with_frequency_order);
        }
    }

    #[test]
    fn equal_scores_prefer_higher_frequency() {
        let ranker = Ranker::new(true);
        let candidates = ranker.rank("git", &[record("git a", 1), record("git b", 7)]);

        assert_eq!(candidates.len(), 2);
        if candidates[0].score == candidates[1].score {
            assert_eq!(candidates[0].record.text, "git b");
        }
    }

    #[test]
    fn ranking_is_deterministic() {
        let ranker = Ranker::new(true);
        let commands = sample_commands();

        let first: Vec<(String, i64)> = ranker
            .rank("git", &commands)
            .into_iter()
            .map(|candidate| (candidate.record.text, candidate.score))
            .collect();
        let second: Vec<(String, i64)> = ranker
            .rank("git", &commands)
            .into_iter()
            .map(|candidate| (candidate.record.text, candidate.score))
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn substring_mode_filters_without_scoring() {
        let ranker = Ranker::new(false);

        let candidates = ranker.rank("git", &sample_commands());
        let texts: Vec<&str> = candidates
            .iter()
            .map(|candidate| candidate.record.text.as_str())
            .collect();
        assert_eq!(texts, vec!["git status", "git commit"]);
        assert!(candidates.iter().all(|candidate| candidate.score == 0));

        // A scattered subsequence is not a substring.
        assert!(ranker.rank("gt", &sample_commands()).is_empty());
    }
}
