//! Regex entity extraction for concierge requests.

use async_trait::async_trait;
use regex::Regex;

use concierge_core::{traits::EntityExtractor, types::EntityMap, Result};

/// Entity extractor using regex patterns. First match per entity type wins.
pub struct RegexEntityExtractor {
    patterns: Vec<(String, Regex)>,
}

impl RegexEntityExtractor {
    /// Create an extractor with the default concierge patterns.
    pub fn new() -> Self {
        let patterns = vec![
            ("room_number".to_string(), Regex::new(r"\broom\s*(?:number\s*|no\.?\s*|#\s*)?(\d{1,4})\b").unwrap()),
            ("date".to_string(), Regex::new(r"\b(\d{4}-\d{2}-\d{2}|today|tonight|tomorrow)\b").unwrap()),
            ("time".to_string(), Regex::new(r"\b(\d{1,2}(?::\d{2})?\s*(?:am|pm)|\d{1,2}:\d{2})\b").unwrap()),
            ("quantity".to_string(), Regex::new(r"\b(\d{1,3})\s+(?:people|persons|guests|nights|rooms|portions|towels|plates)\b").unwrap()),
            ("meal_type".to_string(), Regex::new(r"\b(breakfast|brunch|lunch|dinner|snack)\b").unwrap()),
        ];
        Self { patterns }
    }

    /// Add a pattern. Group 1 is the value when present, else the whole match.
    pub fn with_pattern(mut self, kind: impl Into<String>, regex: Regex) -> Self {
        self.patterns.push((kind.into(), regex));
        self
    }

    /// Extract entities synchronously.
    pub fn scan(&self, text: &str) -> EntityMap {
        let mut found = EntityMap::new();
        for (kind, regex) in &self.patterns {
            if let Some(caps) = regex.captures(text) {
                let value = caps.get(1).or_else(|| caps.get(0)).map(|m| m.as_str().trim());
                if let Some(value) = value {
                    found.insert(kind.clone(), value.to_string());
                }
            }
        }
        found
    }
}

impl Default for RegexEntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityExtractor for RegexEntityExtractor {
    async fn extract(&self, text: &str) -> Result<EntityMap> {
        Ok(self.scan(text))
    }
}
