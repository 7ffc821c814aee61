//! Keyword-based intent classifier for concierge requests.

use async_trait::async_trait;

use concierge_core::{traits::IntentClassifier, types::IntentResult, Result};

/// Label returned when nothing matches.
pub const UNKNOWN_INTENT: &str = "unknown";

/// Built-in intents, in tie-break order.
const DEFAULT_INTENTS: &[(&str, &[&str])] = &[
    (
        "room_service",
        &[
            "room service",
            "housekeeping",
            "clean",
            "cleaning",
            "towel",
            "towels",
            "laundry",
            "pillow",
            "maintenance",
            "broken",
            "repair",
        ],
    ),
    (
        "booking_status",
        &[
            "my booking",
            "my reservation",
            "booking status",
            "check out",
            "checkout",
            "bill",
            "invoice",
            "cancel",
        ],
    ),
    (
        "book_room",
        &[
            "book",
            "book a room",
            "reserve",
            "reservation",
            "available rooms",
            "vacancy",
            "suite",
            "check in",
        ],
    ),
    (
        "order_meal",
        &[
            "order",
            "meal",
            "breakfast",
            "lunch",
            "dinner",
            "menu",
            "food",
            "hungry",
            "eat",
        ],
    ),
    (
        "greeting",
        &["hello", "hi", "hey", "good morning", "good afternoon", "good evening"],
    ),
    ("farewell", &["bye", "goodbye", "thanks", "thank you", "see you"]),
];

/// Keyword classifier.
///
/// Each keyword is matched on whole words, so "hi" does not fire inside
/// "this". The label with the most matching keywords wins; confidence is
/// `matches / (matches + 1)`, capped at 0.99.
pub struct KeywordIntentClassifier {
    intents: Vec<(String, Vec<String>)>,
}

impl KeywordIntentClassifier {
    /// Create a classifier with the built-in concierge intents.
    pub fn new() -> Self {
        Self {
            intents: DEFAULT_INTENTS
                .iter()
                .map(|(label, keywords)| {
                    (
                        label.to_string(),
                        keywords.iter().map(|k| k.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Add a keyword to an intent, creating the intent if needed.
    pub fn with_keyword(mut self, label: impl Into<String>, keyword: impl Into<String>) -> Self {
        let label = label.into();
        let keyword = keyword.into().to_lowercase();
        match self.intents.iter_mut().find(|(l, _)| *l == label) {
            Some((_, keywords)) => keywords.push(keyword),
            None => self.intents.push((label, vec![keyword])),
        }
        self
    }

    /// Pad words with single spaces so phrases match on word boundaries.
    fn normalize(text: &str) -> String {
        let words: Vec<&str> = text
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|w| !w.is_empty())
            .collect();
        format!(" {} ", words.join(" "))
    }

    fn score(normalized: &str, keywords: &[String]) -> usize {
        keywords
            .iter()
            .filter(|k| normalized.contains(&format!(" {} ", k)))
            .count()
    }
}

impl Default for KeywordIntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(&self, text: &str) -> Result<IntentResult> {
        let normalized = Self::normalize(&text.to_lowercase());

        let mut best: Option<(&str, usize)> = None;
        for (label, keywords) in &self.intents {
            let score = Self::score(&normalized, keywords);
            if score > 0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((label.as_str(), score));
            }
        }

        let result = match best {
            Some((label, matches)) => {
                let m = matches as f64;
                IntentResult::new(label, (m / (m + 1.0)).min(0.99))
            }
            None => IntentResult::new(UNKNOWN_INTENT, 0.0),
        };

        tracing::debug!(
            intent = %result.label,
            confidence = result.confidence,
            "Classified intent"
        );

        Ok(result)
    }
}
