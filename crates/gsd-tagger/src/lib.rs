//! Declarative tag-rule evaluation.
//!
//! A [`Tagger`] is built once from a fixed set of [`Rule`]s (registered
//! explicitly, not discovered by scanning — see the crate-level design
//! note in the workspace root about why). Construction resolves the
//! rules' prerequisite DAG into a topological order and rejects cycles;
//! `evaluate` then walks that order once per call, so it's cheap to
//! invoke per poll.

mod default_rules;
mod error;
mod facts;
mod rule;

pub use default_rules::default_rules;
pub use error::TaggerError;
pub use facts::{Info, Rules};
pub use rule::Rule;

use std::collections::{BTreeSet, HashMap, HashSet};

use gsd_protocol::Players;

/// An evaluator over a fixed, dependency-ordered set of [`Rule`]s.
pub struct Tagger {
    ordered: Vec<Rule>,
}

impl Tagger {
    /// Resolve `rules` into evaluation order.
    ///
    /// # Errors
    /// - [`TaggerError::DuplicateTag`] if two rules share a tag name.
    /// - [`TaggerError::UnresolvedDependency`] if a rule names a
    ///   dependency with no matching rule.
    /// - [`TaggerError::CyclicDependency`] if the dependency graph has a
    ///   cycle.
    pub fn new(rules: Vec<Rule>) -> Result<Self, TaggerError> {
        let mut by_tag: HashMap<String, usize> = HashMap::new();
        for (index, rule) in rules.iter().enumerate() {
            if by_tag.insert(rule.tag.clone(), index).is_some() {
                return Err(TaggerError::DuplicateTag(rule.tag.clone()));
            }
        }
        for rule in &rules {
            for dep in &rule.dependencies {
                if !by_tag.contains_key(dep) {
                    return Err(TaggerError::UnresolvedDependency {
                        tag: rule.tag.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        let order = topological_order(&rules, &by_tag)?;
        let mut slots: Vec<Option<Rule>> = rules.into_iter().map(Some).collect();
        let ordered = order
            .into_iter()
            .map(|index| slots[index].take().expect("each index visited once"))
            .collect();

        Ok(Self { ordered })
    }

    /// Evaluate every rule in dependency order, returning the set of tags
    /// whose predicate returned true.
    pub fn evaluate(&self, info: &Info, players: &Players, rules: &Rules) -> BTreeSet<String> {
        let mut applied = BTreeSet::new();
        for rule in &self.ordered {
            if rule.evaluate(info, players, rules, &applied) {
                applied.insert(rule.tag.clone());
            }
        }
        applied
    }
}

/// Depth-first topological sort with cycle detection, mirroring the
/// classic temp-marked/marked DFS: a node revisited while still on the
/// current recursion stack (`temp_marked`) indicates a cycle.
fn topological_order(
    rules: &[Rule],
    by_tag: &HashMap<String, usize>,
) -> Result<Vec<usize>, TaggerError> {
    let mut ordered = Vec::with_capacity(rules.len());
    let mut marked = HashSet::new();
    let mut temp_marked = HashSet::new();

    fn visit(
        index: usize,
        rules: &[Rule],
        by_tag: &HashMap<String, usize>,
        marked: &mut HashSet<usize>,
        temp_marked: &mut HashSet<usize>,
        ordered: &mut Vec<usize>,
    ) -> Result<(), TaggerError> {
        if temp_marked.contains(&index) {
            return Err(TaggerError::CyclicDependency(rules[index].tag.clone()));
        }
        if marked.contains(&index) {
            return Ok(());
        }
        temp_marked.insert(index);
        for dep in &rules[index].dependencies {
            let dep_index = by_tag[dep];
            visit(dep_index, rules, by_tag, marked, temp_marked, ordered)?;
        }
        temp_marked.remove(&index);
        marked.insert(index);
        ordered.push(index);
        Ok(())
    }

    for index in 0..rules.len() {
        if !marked.contains(&index) {
            visit(
                index,
                rules,
                by_tag,
                &mut marked,
                &mut temp_marked,
                &mut ordered,
            )?;
        }
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(app_id: i64, map: &str) -> Info {
        Info {
            app_id,
            map: map.to_owned(),
            player_count: 0,
            max_players: 0,
            bot_count: 0,
            overflow: HashMap::new(),
        }
    }

    fn rules_map(pairs: &[(&str, &str)]) -> Rules {
        Rules {
            rules: pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }

    #[test]
    fn duplicate_tag_names_are_rejected() {
        let rules = vec![
            Rule::new("tf2", Vec::<String>::new(), |_, _, _, _| true),
            Rule::new("tf2", Vec::<String>::new(), |_, _, _, _| false),
        ];
        assert_eq!(
            Tagger::new(rules).unwrap_err(),
            TaggerError::DuplicateTag("tf2".to_owned())
        );
    }

    #[test]
    fn unresolved_dependency_is_rejected() {
        let rules = vec![Rule::new("mode:cp", vec!["tf2"], |_, _, _, _| true)];
        assert_eq!(
            Tagger::new(rules).unwrap_err(),
            TaggerError::UnresolvedDependency {
                tag: "mode:cp".to_owned(),
                dependency: "tf2".to_owned(),
            }
        );
    }

    #[test]
    fn cyclic_dependencies_are_rejected() {
        let rules = vec![
            Rule::new("a", vec!["b"], |_, _, _, _| true),
            Rule::new("b", vec!["a"], |_, _, _, _| true),
        ];
        assert!(matches!(
            Tagger::new(rules).unwrap_err(),
            TaggerError::CyclicDependency(_)
        ));
    }

    #[test]
    fn scenario_four_tagger_evaluation() {
        let rules = vec![
            Rule::new("tf2", Vec::<String>::new(), |info, _, _, _| {
                info.app_id == 440
            }),
            Rule::new("mode:cp", vec!["tf2"], |_, _, rules, tags| {
                tags.contains("tf2") && rules.is("tf_gamemode_cp", "1")
            }),
            Rule::new("mode:koth", vec!["tf2", "mode:cp"], |info, _, _, tags| {
                tags.contains("tf2")
                    && tags.contains("mode:cp")
                    && info.map.starts_with("koth_")
            }),
        ];
        let tagger = Tagger::new(rules).unwrap();
        let result = tagger.evaluate(
            &info(440, "koth_viaduct"),
            &Players::empty(),
            &rules_map(&[("tf_gamemode_cp", "1")]),
        );
        assert_eq!(
            result,
            BTreeSet::from(["tf2".to_owned(), "mode:cp".to_owned(), "mode:koth".to_owned()])
        );
    }

    #[test]
    fn prerequisite_absence_means_predicate_sees_it_missing() {
        let rules = vec![
            Rule::new("tf2", Vec::<String>::new(), |info, _, _, _| {
                info.app_id == 440
            }),
            Rule::new("mode:cp", vec!["tf2"], |_, _, rules, tags| {
                tags.contains("tf2") && rules.is("tf_gamemode_cp", "1")
            }),
        ];
        let tagger = Tagger::new(rules).unwrap();
        let result = tagger.evaluate(&info(730, "de_dust2"), &Players::empty(), &Rules::default());
        assert!(result.is_empty());
    }
}
