//! Lookup of the current server-default rules by id.

use indexmap::IndexMap;

use crate::ruleset::{AnnotatedPushRule, Ruleset, KIND_ORDER};

/// A map from rule id to the annotated rule, restricted to server-default
/// rules (ids starting with `.`). User-created rules are reconciled
/// separately.
pub type PushRuleMap = IndexMap<String, AnnotatedPushRule>;

/// Build a [`PushRuleMap`] from a server ruleset snapshot.
pub fn build_push_rule_map(ruleset: &Ruleset) -> PushRuleMap {
    let mut map = PushRuleMap::new();
    for kind in KIND_ORDER {
        for rule in ruleset.rules(kind) {
            if rule.rule_id.starts_with('.') {
                map.insert(
                    rule.rule_id.clone(),
                    AnnotatedPushRule { kind, rule: rule.clone() },
                );
            }
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::build_push_rule_map;
    use crate::ruleset::{Action, PushRule, RuleKind, Ruleset};

    #[test]
    fn test_map_skips_custom_rules() {
        let mut ruleset = Ruleset::default();
        ruleset.insert(RuleKind::Override, PushRule::new(".m.rule.master", false, vec![]));
        ruleset.insert(RuleKind::Content, PushRule::new("keyword", true, vec![Action::Notify]));
        ruleset.insert(RuleKind::Room, PushRule::new("!room:example.org", true, vec![]));

        let map = build_push_rule_map(&ruleset);
        assert_eq!(map.len(), 1);

        let master = &map[".m.rule.master"];
        assert_eq!(master.kind, RuleKind::Override);
        assert!(!master.rule.enabled);
    }
}
