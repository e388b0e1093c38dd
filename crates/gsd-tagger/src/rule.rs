use std::collections::BTreeSet;

use gsd_protocol::Players;

use crate::facts::{Info, Rules};

/// One rule: a tag name, the tag names it depends on for evaluation
/// order, and the predicate that decides whether the tag applies.
///
/// A listed dependency only guarantees evaluation order, not presence —
/// the predicate must check `already_applied` itself if it cares whether
/// the dependency actually fired.
pub struct Rule {
    pub(crate) tag: String,
    pub(crate) dependencies: Vec<String>,
    pub(crate) predicate: Box<Predicate>,
}

type Predicate = dyn Fn(&Info, &Players, &Rules, &BTreeSet<String>) -> bool + Send + Sync;

impl Rule {
    pub fn new(
        tag: impl Into<String>,
        dependencies: impl IntoIterator<Item = impl Into<String>>,
        predicate: impl Fn(&Info, &Players, &Rules, &BTreeSet<String>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            tag: tag.into(),
            dependencies: dependencies.into_iter().map(Into::into).collect(),
            predicate: Box::new(predicate),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub(crate) fn evaluate(
        &self,
        info: &Info,
        players: &Players,
        rules: &Rules,
        already_applied: &BTreeSet<String>,
    ) -> bool {
        (self.predicate)(info, players, rules, already_applied)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("tag", &self.tag)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}
