//! Keyword policies - ordered hint lists resolved by first match
//!
//! Asset naming varies wildly between models, so intent ("talk", "happy")
//! is mapped onto concrete names by case-insensitive substring match. The
//! candidate order decides: the first candidate containing any hint wins.

use serde::{Deserialize, Serialize};

use crate::Mood;

/// Ordered, case-insensitive substring hints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct KeywordPolicy {
    hints: Vec<String>,
}

impl KeywordPolicy {
    pub fn new<I, S>(hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hints: hints
                .into_iter()
                .map(|h| h.as_ref().trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    /// Does `name` contain any hint?
    pub fn matches(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.hints.iter().any(|h| lower.contains(h.as_str()))
    }

    /// First candidate, in candidate order, that contains any hint
    pub fn first_match<'a, I>(&self, candidates: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        candidates.into_iter().find(|c| self.matches(c))
    }
}

impl From<Vec<String>> for KeywordPolicy {
    fn from(hints: Vec<String>) -> Self {
        KeywordPolicy::new(hints)
    }
}

impl From<KeywordPolicy> for Vec<String> {
    fn from(policy: KeywordPolicy) -> Self {
        policy.hints
    }
}

/// Expression-name hints for every mood
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodHints {
    pub neutral: KeywordPolicy,
    pub happy: KeywordPolicy,
    pub angry: KeywordPolicy,
    pub sad: KeywordPolicy,
    pub surprised: KeywordPolicy,
    pub thinking: KeywordPolicy,
}

impl Default for MoodHints {
    fn default() -> Self {
        // Pinyin synonyms cover the stock Chinese-named model packs
        MoodHints {
            neutral: KeywordPolicy::new(["neutral", "default"]),
            happy: KeywordPolicy::new(["happy", "smile", "joy", "wenroudexiao", "hahadadxiao"]),
            angry: KeywordPolicy::new(["angry", "mad", "shengqi"]),
            sad: KeywordPolicy::new(["sad", "sorrow", "weiqu", "luolei"]),
            surprised: KeywordPolicy::new(["surprise", "wow", "jingya", "jingxi"]),
            thinking: KeywordPolicy::new(["serious", "blinkless", "think", "tuosai"]),
        }
    }
}

impl MoodHints {
    pub fn for_mood(&self, mood: Mood) -> &KeywordPolicy {
        match mood {
            Mood::Neutral => &self.neutral,
            Mood::Happy => &self.happy,
            Mood::Angry => &self.angry,
            Mood::Sad => &self.sad,
            Mood::Surprised => &self.surprised,
            Mood::Thinking => &self.thinking,
        }
    }

    /// Best-matching expression name for a mood, in expression order
    pub fn expression_for<'a, I>(&self, mood: Mood, expression_names: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.for_mood(mood).first_match(expression_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_follows_candidate_order() {
        let policy = KeywordPolicy::new(["talk", "tap"]);
        let groups = ["Idle", "TapBody", "Talk"];
        assert_eq!(policy.first_match(groups), Some("TapBody"));
    }

    #[test]
    fn test_case_insensitive() {
        let policy = KeywordPolicy::new(["IDLE"]);
        assert!(policy.matches("motion_idle_01"));
        assert!(!policy.matches("TapHead"));
    }

    #[test]
    fn test_no_match() {
        let policy = KeywordPolicy::new(["speak"]);
        assert_eq!(policy.first_match(["Idle", "TapBody"]), None);
        assert_eq!(KeywordPolicy::default().first_match(["Idle"]), None);
    }

    #[test]
    fn test_mood_to_expression() {
        let hints = MoodHints::default();
        let names = ["smile", "angry"];
        assert_eq!(hints.expression_for(Mood::Happy, names), Some("smile"));
        assert_eq!(hints.expression_for(Mood::Angry, names), Some("angry"));
        assert_eq!(hints.expression_for(Mood::Sad, names), None);
    }

    #[test]
    fn test_pinyin_synonyms() {
        let hints = MoodHints::default();
        let names = ["aojiao", "shengqi", "wenroudexiao"];
        assert_eq!(hints.expression_for(Mood::Happy, names), Some("wenroudexiao"));
        assert_eq!(hints.expression_for(Mood::Angry, names), Some("shengqi"));
    }

    #[test]
    fn test_policy_serde() {
        let policy: KeywordPolicy = serde_json::from_str(r#"["Talk", " gesture "]"#).unwrap();
        assert_eq!(policy.hints(), &["talk".to_string(), "gesture".to_string()]);
    }
}
