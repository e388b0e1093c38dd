//! The stock tag rule set: which game, which mode, how populated.
//!
//! Ported from the tag predicates shipped with the original
//! implementation (`tf2`/`csgo`, the TF2 `mode:*` family, and the three
//! `population:*` thresholds). Registration is explicit here rather than
//! scanned, per the workspace's design note on replacing plugin-style
//! discovery with a registry built at construction.

use crate::rule::Rule;

/// Build the default rule set. Feed the result straight into
/// [`crate::Tagger::new`]; it is acyclic and every dependency resolves by
/// construction, so registering it can't fail.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new("tf2", [] as [&str; 0], |info, _, _, _| info.app_id == 440),
        Rule::new("csgo", [] as [&str; 0], |info, _, _, _| info.app_id == 730),
        Rule::new("mode:arena", ["tf2"], |_, _, rules, tags| {
            tags.contains("tf2") && rules.is("tf_gamemode_arena", "1")
        }),
        Rule::new("mode:cp", ["tf2"], |_, _, rules, tags| {
            tags.contains("tf2") && rules.is("tf_gamemode_cp", "1")
        }),
        Rule::new("mode:ctf", ["tf2"], |_, _, rules, tags| {
            tags.contains("tf2") && rules.is("tf_gamemode_ctf", "1")
        }),
        Rule::new("mode:koth", ["tf2", "mode:cp"], |info, _, _, tags| {
            tags.contains("tf2")
                && tags.contains("mode:cp")
                && info.map.to_lowercase().starts_with("koth_")
        }),
        Rule::new("mode:mvm", ["tf2"], |_, _, rules, tags| {
            tags.contains("tf2") && rules.is("tf_gamemode_mvm", "1")
        }),
        Rule::new("mode:payload", ["tf2"], |_, _, rules, tags| {
            tags.contains("tf2") && rules.is("tf_gamemode_payload", "1")
        }),
        Rule::new("mode:sd", ["tf2"], |_, _, rules, tags| {
            tags.contains("tf2") && rules.is("tf_gamemode_sd", "1")
        }),
        Rule::new("mode:rd", ["tf2"], |_, _, rules, tags| {
            tags.contains("tf2") && rules.is("tf_gamemode_rd", "1")
        }),
        Rule::new("mode:medieval", ["tf2"], |_, _, rules, tags| {
            tags.contains("tf2") && rules.is("tf_medieval", "1")
        }),
        Rule::new("mode:sb", ["tf2", "mode:arena"], |info, _, _, tags| {
            tags.contains("tf2")
                && tags.contains("mode:arena")
                && info.map.to_lowercase().starts_with("sb_")
        }),
        Rule::new("mode:vsh", ["tf2", "mode:arena"], |info, _, _, tags| {
            tags.contains("tf2")
                && tags.contains("mode:arena")
                && info.map.to_lowercase().starts_with("vsh_")
        }),
        Rule::new("mode:dr", ["tf2", "mode:arena"], |info, _, _, tags| {
            tags.contains("tf2")
                && tags.contains("mode:arena")
                && info.map.to_lowercase().starts_with("dr_")
        }),
        Rule::new("mode:surf", ["tf2"], |info, _, _, tags| {
            tags.contains("tf2") && info.map.to_lowercase().starts_with("surf_")
        }),
        Rule::new("mode:mge", ["tf2"], |info, _, _, tags| {
            tags.contains("tf2") && info.map.to_lowercase().starts_with("mge_")
        }),
        Rule::new("population:full", [] as [&str; 0], |info, _, _, _| {
            info.player_count.saturating_sub(info.bot_count) >= info.max_players
        }),
        Rule::new("population:empty", [] as [&str; 0], |info, _, _, _| {
            info.player_count.saturating_sub(info.bot_count) == 0
        }),
        Rule::new("population:active", [] as [&str; 0], |info, _, _, _| {
            let active = info.player_count.saturating_sub(info.bot_count);
            let threshold = (f64::from(info.max_players) * 0.6).floor() as u32;
            active >= threshold
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{Info, Rules};
    use crate::Tagger;
    use gsd_protocol::Players;
    use std::collections::HashMap;

    fn tagger() -> Tagger {
        Tagger::new(default_rules()).unwrap()
    }

    #[test]
    fn default_rules_form_an_acyclic_registrable_set() {
        let _ = tagger();
    }

    #[test]
    fn tf2_koth_map_gets_full_ancestry_of_tags() {
        let info = Info {
            app_id: 440,
            map: "koth_viaduct".to_owned(),
            player_count: 10,
            max_players: 24,
            bot_count: 0,
            overflow: HashMap::new(),
        };
        let rules = Rules {
            rules: HashMap::from([("tf_gamemode_cp".to_owned(), "1".to_owned())]),
        };
        let applied = tagger().evaluate(&info, &Players::empty(), &rules);
        assert!(applied.contains("tf2"));
        assert!(applied.contains("mode:cp"));
        assert!(applied.contains("mode:koth"));
        assert!(!applied.contains("csgo"));
    }

    #[test]
    fn population_thresholds() {
        let mut info = Info {
            app_id: 440,
            map: "cp_dustbowl".to_owned(),
            player_count: 0,
            max_players: 24,
            bot_count: 0,
            overflow: HashMap::new(),
        };
        let rules = Rules::default();
        let players = Players::empty();

        assert!(tagger()
            .evaluate(&info, &players, &rules)
            .contains("population:empty"));

        info.player_count = 24;
        assert!(tagger()
            .evaluate(&info, &players, &rules)
            .contains("population:full"));

        info.player_count = 15; // floor(24 * 0.6) == 14
        assert!(tagger()
            .evaluate(&info, &players, &rules)
            .contains("population:active"));
    }

    #[test]
    fn csgo_never_gets_tf2_modes() {
        let info = Info {
            app_id: 730,
            map: "de_dust2".to_owned(),
            player_count: 10,
            max_players: 10,
            bot_count: 0,
            overflow: HashMap::new(),
        };
        let applied = tagger().evaluate(&info, &Players::empty(), &Rules::default());
        assert!(applied.contains("csgo"));
        assert!(!applied.iter().any(|t| t.starts_with("mode:")));
    }
}
