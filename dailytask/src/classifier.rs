//! Keyword-based trigger detection for free-text mood input.
//!
//! The rule table maps each [`TriggerTag`] to a keyword list and is plain
//! data: it can be replaced from configuration without touching the rest
//! of the workflow.

use std::collections::BTreeMap;

use dailytask_proto::tag::{TagSet, TriggerTag};

/// Built-in keyword table.
const DEFAULT_RULES: &[(TriggerTag, &[&str])] = &[
    (TriggerTag::Substance, &["smoke", "drink", "craving"]),
    (TriggerTag::Angry, &["angry", "mad", "frustrated"]),
    (TriggerTag::Anxious, &["anxious", "nervous", "panic"]),
    (TriggerTag::Stress, &["stress", "overwhelm"]),
    (TriggerTag::Sad, &["sad", "depressed", "cry"]),
];

/// Tag -> keyword rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRules {
    rules: BTreeMap<TriggerTag, Vec<String>>,
}

impl Default for KeywordRules {
    fn default() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|(tag, words)| (*tag, words.iter().map(|w| (*w).to_string()).collect()))
            .collect();
        Self { rules }
    }
}

impl KeywordRules {
    /// A table with no rules; every text classifies as `default`.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Replaces the keyword list for `tag`.
    ///
    /// Keywords are lowercased and trimmed; empty ones are dropped since
    /// they would match every input. `default` cannot carry keywords.
    #[must_use]
    pub fn with_keywords<I, S>(mut self, tag: TriggerTag, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if tag == TriggerTag::Default {
            return self;
        }
        let words: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self.rules.insert(tag, words);
        self
    }

    /// Keywords configured for `tag`.
    #[must_use]
    pub fn keywords(&self, tag: TriggerTag) -> &[String] {
        self.rules.get(&tag).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Maps mood text to trigger tags. Pure and total.
#[derive(Debug, Clone, Default)]
pub struct IssueClassifier {
    rules: KeywordRules,
}

impl IssueClassifier {
    /// Creates a classifier over the given rule table.
    #[must_use]
    pub const fn new(rules: KeywordRules) -> Self {
        Self { rules }
    }

    /// Returns every tag with at least one keyword contained in `text`
    /// (case-insensitive), or `{default}` if none match.
    #[must_use]
    pub fn classify(&self, text: &str) -> TagSet {
        let lower = text.to_lowercase();
        let mut tags: TagSet = self
            .rules
            .rules
            .iter()
            .filter(|(_, words)| words.iter().any(|w| lower.contains(w.as_str())))
            .map(|(tag, _)| *tag)
            .collect();
        if tags.is_empty() {
            tags.insert(TriggerTag::Default);
        }
        tags
    }
}
