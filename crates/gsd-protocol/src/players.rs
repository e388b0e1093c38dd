//! Immutable player-roster snapshots.

use serde::{Deserialize, Serialize};

/// One entry in a server's roster: display name, score and connection
/// duration. The duration is stored in whole seconds as a float, matching
/// the wire format's `[name, score, duration-seconds]` triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub name: String,
    pub score: i64,
    pub duration_secs: f64,
}

/// An immutable snapshot of a server's player roster.
///
/// `scores.len()` may diverge from `current`: freshly connected players
/// who haven't yet published a name are counted in `current` but omitted
/// from `scores`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Players {
    pub current: u32,
    pub max: u32,
    pub bots: u32,
    pub scores: Vec<PlayerScore>,
}

impl Players {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Serialize to the wire JSON form: `{current, max, bots, scores}` where
    /// `scores` is an array of `[name, score, duration_secs]` triples.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "current": self.current,
            "max": self.max,
            "bots": self.bots,
            "scores": self.scores.iter().map(|p| {
                serde_json::json!([p.name, p.score, p.duration_secs])
            }).collect::<Vec<_>>(),
        })
    }

    /// Parse the wire JSON form. Malformed input yields `None`; callers are
    /// expected to log and fall back to an empty roster, per the cache's
    /// "malformed `players` JSON is logged and returned as an empty
    /// `Players`" contract.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        let current = obj.get("current")?.as_u64()? as u32;
        let max = obj.get("max")?.as_u64()? as u32;
        let bots = obj.get("bots")?.as_u64()? as u32;
        let scores_raw = obj.get("scores")?.as_array()?;
        let mut scores = Vec::with_capacity(scores_raw.len());
        for entry in scores_raw {
            let triple = entry.as_array()?;
            if triple.len() != 3 {
                return None;
            }
            let name = triple[0].as_str()?.to_owned();
            let score = triple[1].as_i64()?;
            let duration_secs = triple[2].as_f64()?;
            if !duration_secs.is_finite() || duration_secs < 0.0 {
                return None;
            }
            scores.push(PlayerScore {
                name,
                score,
                duration_secs,
            });
        }
        Some(Self {
            current,
            max,
            bots,
            scores,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Players {
        Players {
            current: 2,
            max: 24,
            bots: 1,
            scores: vec![
                PlayerScore {
                    name: "Alice".to_owned(),
                    score: 10,
                    duration_secs: 123.5,
                },
                PlayerScore {
                    name: "Bob".to_owned(),
                    score: 0,
                    duration_secs: 0.0,
                },
            ],
        }
    }

    #[test]
    fn json_round_trips() {
        let players = sample();
        let json = players.to_json();
        let parsed = Players::from_json(&json).unwrap();
        assert_eq!(parsed, players);
    }

    #[test]
    fn empty_round_trips() {
        let players = Players::empty();
        assert_eq!(Players::from_json(&players.to_json()).unwrap(), players);
    }

    #[test]
    fn missing_fields_fail_to_parse() {
        let value = serde_json::json!({"current": 1});
        assert!(Players::from_json(&value).is_none());
    }

    #[test]
    fn non_finite_duration_is_rejected() {
        let value = serde_json::json!({
            "current": 0, "max": 0, "bots": 0,
            "scores": [["x", 0, f64::NAN]]
        });
        assert!(Players::from_json(&value).is_none());
    }

    #[test]
    fn wrong_shaped_score_tuple_is_rejected() {
        let value = serde_json::json!({
            "current": 0, "max": 0, "bots": 0,
            "scores": [["x", 0]]
        });
        assert!(Players::from_json(&value).is_none());
    }
}
