use crate::{name::BlockEdge, store::RuleRef};

/// Filters a store listing down to block rules, sorted by namespace and name.
///
/// Rules whose names do not decode are skipped. Both halves of a block are
/// kept as separate entries.
pub fn block_rules(rules: impl IntoIterator<Item = RuleRef>) -> Vec<RuleRef> {
    let mut blocks = rules
        .into_iter()
        .filter(|rule| BlockEdge::from_rule_name(&rule.name).is_some())
        .collect::<Vec<_>>();
    blocks.sort();
    blocks
}

/// Decodes a store listing into block edges, in the same order as
/// [`block_rules`].
pub fn block_edges(rules: impl IntoIterator<Item = RuleRef>) -> Vec<BlockEdge> {
    let mut rules = rules.into_iter().collect::<Vec<_>>();
    rules.sort();
    rules
        .iter()
        .filter_map(|rule| BlockEdge::from_rule_name(&rule.name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn listing() -> Vec<RuleRef> {
        vec![
            RuleRef::new("ns-2", "block-app2-to-app1"),
            RuleRef::new("kube-system", "default-deny"),
            RuleRef::new("ns-1", "block-app1-to-app2"),
            RuleRef::new("ns-1", "block-"),
            RuleRef::new("ns-1", "allow-dns"),
        ]
    }

    #[test]
    fn filters_and_sorts_rules() {
        assert_eq!(
            block_rules(listing()),
            vec![
                RuleRef::new("ns-1", "block-app1-to-app2"),
                RuleRef::new("ns-2", "block-app2-to-app1"),
            ]
        );
    }

    #[test]
    fn decodes_edges_without_dedup() {
        assert_eq!(
            block_edges(listing()),
            vec![
                BlockEdge::new("app1", "app2"),
                BlockEdge::new("app2", "app1"),
            ]
        );
    }

    #[test]
    fn same_name_in_different_namespaces() {
        let rules = vec![
            RuleRef::new("ns-2", "block-web-to-web"),
            RuleRef::new("ns-1", "block-web-to-web"),
        ];
        assert_eq!(
            block_rules(rules.clone()),
            vec![
                RuleRef::new("ns-1", "block-web-to-web"),
                RuleRef::new("ns-2", "block-web-to-web"),
            ]
        );
        assert_eq!(block_edges(rules).len(), 2);
    }

    #[test]
    fn empty_listing() {
        assert!(block_rules(Vec::new()).is_empty());
        assert!(block_edges(Vec::new()).is_empty());
    }
}
