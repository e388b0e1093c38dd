//! The string-keyed facts a [`crate::Rule`] predicate reads.
//!
//! `Info` and `Rules` model the A2S INFO and RULES responses as tagged
//! structs: a fixed, documented set of required fields plus an overflow
//! map for anything else the query returned. Predicates read fields
//! through named accessors; an absent overflow key silently evaluates to
//! "missing" rather than panicking, so predicates stay pure.

use std::collections::HashMap;

/// The subset of an A2S INFO response the tagger cares about.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Info {
    pub app_id: i64,
    pub map: String,
    pub player_count: u32,
    pub max_players: u32,
    pub bot_count: u32,
    pub overflow: HashMap<String, String>,
}

impl Info {
    pub fn overflow(&self, key: &str) -> Option<&str> {
        self.overflow.get(key).map(String::as_str)
    }
}

/// The A2S RULES response: a flat string-to-string map (e.g.
/// `tf_gamemode_ctf` → `"1"`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rules {
    pub rules: HashMap<String, String>,
}

impl Rules {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.rules.get(key).map(String::as_str)
    }

    pub fn is(&self, key: &str, value: &str) -> bool {
        self.get(key) == Some(value)
    }
}
