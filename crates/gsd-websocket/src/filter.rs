use std::collections::BTreeSet;

use gsd_protocol::Status;

/// The `include`/`exclude` tag sets recorded by a client's most recent
/// `query` message. Shared between the reader task (which writes it) and
/// the notifier task (which reads it to decide whether a TAG
/// notification produces a `match`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub include: BTreeSet<String>,
    pub exclude: BTreeSet<String>,
}

impl Filter {
    /// Whether `status` currently satisfies this filter: every `include`
    /// tag present, no `exclude` tag present.
    pub fn matches(&self, status: &Status) -> bool {
        self.include.is_subset(&status.tags) && self.exclude.is_disjoint(&status.tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsd_protocol::Address;
    use std::net::Ipv4Addr;

    fn status_with_tags(tags: &[&str]) -> Status {
        let addr = Address::new(Ipv4Addr::new(192, 0, 2, 1), 27015).unwrap();
        let mut status = Status::unknown(addr);
        status.tags = tags.iter().map(|t| (*t).to_owned()).collect();
        status
    }

    #[test]
    fn matches_requires_every_include_tag_and_no_exclude_tag() {
        let filter = Filter {
            include: BTreeSet::from(["tf2".to_owned(), "mode:cp".to_owned()]),
            exclude: BTreeSet::from(["population:empty".to_owned()]),
        };
        assert!(filter.matches(&status_with_tags(&["tf2", "mode:cp", "population:full"])));
        assert!(!filter.matches(&status_with_tags(&["tf2"])));
        assert!(!filter.matches(&status_with_tags(&["tf2", "mode:cp", "population:empty"])));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::default().matches(&status_with_tags(&[])));
    }
}
