//! Typed views over A2S responses, with conversions into the shapes the
//! tagger and cache expect.

use std::collections::HashMap;

use gsd_protocol::{PlayerScore, Players};
use gsd_tagger::{Info as TaggerInfo, Rules as TaggerRules};

/// The fields of an INFO response the rest of the system consumes, plus
/// an overflow map for everything else (version, keywords, folder, ...)
/// so nothing is silently discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct A2sInfo {
    pub server_name: String,
    pub map: String,
    pub app_id: i64,
    pub player_count: u32,
    pub max_players: u32,
    pub bot_count: u32,
    pub overflow: HashMap<String, String>,
}

impl From<a2s::info::Info> for A2sInfo {
    fn from(info: a2s::info::Info) -> Self {
        let mut overflow = HashMap::new();
        overflow.insert("folder".to_owned(), info.folder.clone());
        overflow.insert("game".to_owned(), info.game.clone());
        overflow.insert("version".to_owned(), info.version.clone());
        if let Some(keywords) = &info.keywords {
            overflow.insert("keywords".to_owned(), keywords.clone());
        }
        Self {
            server_name: info.name,
            map: info.map,
            app_id: i64::from(info.app_id),
            player_count: u32::from(info.players),
            max_players: u32::from(info.max_players),
            bot_count: u32::from(info.bots),
            overflow,
        }
    }
}

impl A2sInfo {
    pub fn to_tagger_info(&self) -> TaggerInfo {
        TaggerInfo {
            app_id: self.app_id,
            map: self.map.clone(),
            player_count: self.player_count,
            max_players: self.max_players,
            bot_count: self.bot_count,
            overflow: self.overflow.clone(),
        }
    }
}

/// One entry in a PLAYERS response.
#[derive(Debug, Clone, PartialEq)]
pub struct A2sPlayerEntry {
    pub name: String,
    pub score: i64,
    pub duration_secs: f64,
}

/// A full PLAYERS response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct A2sPlayers {
    pub entries: Vec<A2sPlayerEntry>,
}

impl From<Vec<a2s::players::Player>> for A2sPlayers {
    fn from(players: Vec<a2s::players::Player>) -> Self {
        Self {
            entries: players
                .into_iter()
                .map(|p| A2sPlayerEntry {
                    name: p.name,
                    score: i64::from(p.score),
                    duration_secs: f64::from(p.duration),
                })
                .collect(),
        }
    }
}

impl A2sPlayers {
    /// Build a [`Players`] snapshot, dropping entries with empty names
    /// (fresh connections that haven't published one yet) and treating
    /// `current`/`bots` as derived from the entry count plus the INFO
    /// response's counters.
    pub fn to_players(&self, current: u32, max: u32, bots: u32) -> Players {
        let scores = self
            .entries
            .iter()
            .filter(|p| !p.name.is_empty())
            .map(|p| PlayerScore {
                name: p.name.clone(),
                score: p.score,
                duration_secs: p.duration_secs,
            })
            .collect();
        Players {
            current,
            max,
            bots,
            scores,
        }
    }
}

/// A RULES response: a flat string-to-string map of cvars.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct A2sRules {
    pub rules: HashMap<String, String>,
}

impl From<HashMap<String, String>> for A2sRules {
    fn from(rules: HashMap<String, String>) -> Self {
        Self { rules }
    }
}

impl A2sRules {
    pub fn to_tagger_rules(&self) -> TaggerRules {
        TaggerRules {
            rules: self.rules.clone(),
        }
    }
}
