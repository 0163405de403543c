//! Repair of companion rules that must mirror a primary rule.
//!
//! Some well-known rules travel in groups: the poll rules follow the message
//! rules they shadow, and the legacy mention rules follow their
//! intentional-mention replacements. Servers update these independently, so
//! after every rule change from sync the groups are checked and drifted
//! companions are pushed back in line with their primary.

use futures_util::future::join_all;
use tracing::{debug, error};

use crate::{
    client::PushRuleClient,
    definitions::{VectorPushRuleDefinition, VECTOR_PUSH_RULE_DEFINITIONS},
    error::NotificationSettingsError,
    ruleset::{Action, PushRule, RuleKind, Ruleset},
};

/// Check every rule group and repair drifted companion rules.
///
/// Groups are repaired independently: a failure in one group is logged and
/// does not stop the other groups. Within a group the repairs run one at a
/// time and stop at the first failure, so a partially repaired group is
/// always a prefix of the planned repairs.
pub async fn monitor_synced_push_rules<C: PushRuleClient + ?Sized>(client: &C, ruleset: &Ruleset) {
    let groups = VECTOR_PUSH_RULE_DEFINITIONS
        .iter()
        .filter(|(_, definition)| !definition.synced_rule_ids.is_empty())
        .map(|(&rule_id, definition)| async move {
            sync_rule_group(client, ruleset, rule_id, definition)
                .await
                .map_err(|error| (rule_id, error))
        });

    for result in join_all(groups).await {
        if let Err((rule_id, error)) = result {
            error!(rule_id, "Failed to sync companion push rules: {error}");
        }
    }
}

/// Bring the companions of one primary rule in line with it.
///
/// A companion is out of sync when its enabled state differs from the
/// primary's or when it classifies to a different [`VectorState`]. Repair
/// copies the primary's exact actions onto an enabled companion, so custom
/// sounds carry over; when the primary is disabled the companion is only
/// disabled, its actions are left alone.
///
/// Companions missing from the rule set are skipped, as is the whole group
/// when the primary itself is missing (e.g. intentional-mention rules on a
/// server without them).
///
/// [`VectorState`]: crate::vector_state::VectorState
async fn sync_rule_group<C: PushRuleClient + ?Sized>(
    client: &C,
    ruleset: &Ruleset,
    primary_rule_id: &str,
    definition: &VectorPushRuleDefinition,
) -> Result<(), NotificationSettingsError> {
    let Some(primary) = ruleset.get(definition.kind, primary_rule_id) else {
        return Ok(());
    };
    let primary_state = definition.rule_to_vector_state(primary);

    let out_of_sync: Vec<(RuleKind, &PushRule)> = definition
        .synced_rule_ids
        .iter()
        .filter_map(|synced_id| ruleset.get_any(synced_id))
        .filter(|(_, synced)| {
            synced.enabled != primary.enabled
                || definition.rule_to_vector_state(synced) != primary_state
        })
        .collect();

    if out_of_sync.is_empty() {
        return Ok(());
    }

    debug!(
        primary_rule_id,
        count = out_of_sync.len(),
        "Companion rules out of sync with their primary, repairing"
    );

    if primary.enabled {
        update_push_rules_with_actions(client, &out_of_sync, Some(primary.actions.clone())).await
    } else {
        update_push_rules_with_actions(client, &out_of_sync, None).await
    }
}

/// Enable a batch of rules, optionally replacing their actions first.
///
/// `actions: Some(..)` sets the actions and then enables each rule;
/// `actions: None` disables each rule instead, leaving its actions alone.
/// Rules are processed one at a time, stopping at the first failure, so a
/// partial batch is always a prefix of the input.
async fn update_push_rules_with_actions<C: PushRuleClient + ?Sized>(
    client: &C,
    rules: &[(RuleKind, &PushRule)],
    actions: Option<Vec<Action>>,
) -> Result<(), NotificationSettingsError> {
    for (kind, rule) in rules {
        match &actions {
            Some(actions) => {
                client.set_push_rule_actions(*kind, &rule.rule_id, actions.clone()).await?;
                client.set_push_rule_enabled(*kind, &rule.rule_id, true).await?;
            }
            None => {
                client.set_push_rule_enabled(*kind, &rule.rule_id, false).await?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::monitor_synced_push_rules;
    use crate::{
        actions::standard_actions,
        client::testing::MockClient,
        definitions::rule_ids,
        ruleset::{PushRule, RuleKind, Ruleset},
    };

    fn ruleset_with_dm_group(dm_enabled: bool, poll_enabled: bool) -> Ruleset {
        let mut ruleset = Ruleset::default();
        ruleset.insert(
            RuleKind::Underride,
            PushRule::new(rule_ids::DM, dm_enabled, standard_actions::notify_default_sound()),
        );
        ruleset.insert(
            RuleKind::Underride,
            PushRule::new(
                rule_ids::POLL_START_ONE_TO_ONE,
                poll_enabled,
                standard_actions::notify(),
            ),
        );
        ruleset
    }

    #[tokio::test]
    async fn test_in_sync_group_makes_no_calls() {
        let mut ruleset = Ruleset::default();
        ruleset.insert(
            RuleKind::Underride,
            PushRule::new(rule_ids::DM, true, standard_actions::notify()),
        );
        ruleset.insert(
            RuleKind::Underride,
            PushRule::new(rule_ids::POLL_START_ONE_TO_ONE, true, standard_actions::notify()),
        );

        let client = MockClient::default();
        monitor_synced_push_rules(&client, &ruleset).await;
        assert!(client.take_calls().is_empty());
    }

    #[tokio::test]
    async fn test_drifted_companion_gets_primary_actions() {
        // DM is Loud, the poll rule is only On.
        let ruleset = ruleset_with_dm_group(true, true);

        let client = MockClient::default();
        monitor_synced_push_rules(&client, &ruleset).await;

        assert_eq!(
            client.take_calls(),
            vec![
                format!("actions underride {}", rule_ids::POLL_START_ONE_TO_ONE),
                format!("enabled underride {} true", rule_ids::POLL_START_ONE_TO_ONE),
            ]
        );
    }

    #[tokio::test]
    async fn test_disabled_companion_of_enabled_primary_is_enabled() {
        let ruleset = ruleset_with_dm_group(true, false);

        let client = MockClient::default();
        monitor_synced_push_rules(&client, &ruleset).await;

        assert_eq!(
            client.take_calls(),
            vec![
                format!("actions underride {}", rule_ids::POLL_START_ONE_TO_ONE),
                format!("enabled underride {} true", rule_ids::POLL_START_ONE_TO_ONE),
            ]
        );
    }

    #[tokio::test]
    async fn test_disabled_primary_disables_companion() {
        let ruleset = ruleset_with_dm_group(false, true);

        let client = MockClient::default();
        monitor_synced_push_rules(&client, &ruleset).await;

        assert_eq!(
            client.take_calls(),
            vec![format!("enabled underride {} false", rule_ids::POLL_START_ONE_TO_ONE)]
        );
    }

    #[tokio::test]
    async fn test_missing_primary_skips_group() {
        let mut ruleset = Ruleset::default();
        ruleset.insert(
            RuleKind::Override,
            PushRule::new(rule_ids::AT_ROOM_NOTIFICATION, true, standard_actions::highlight()),
        );

        let client = MockClient::default();
        monitor_synced_push_rules(&client, &ruleset).await;
        assert!(client.take_calls().is_empty());
    }

    #[tokio::test]
    async fn test_within_group_repair_stops_at_first_failure() {
        // Both poll companions are disabled while DM is enabled.
        let mut ruleset = ruleset_with_dm_group(true, false);
        ruleset.insert(
            RuleKind::Underride,
            PushRule::new(rule_ids::POLL_END_ONE_TO_ONE, false, standard_actions::notify()),
        );

        let client = MockClient::default();
        *client.failing_rule.lock().unwrap() = Some(rule_ids::POLL_START_ONE_TO_ONE.to_owned());

        monitor_synced_push_rules(&client, &ruleset).await;

        // The first companion's repair failed, so the second one was never
        // attempted.
        assert!(client.take_calls().is_empty());
    }

    #[tokio::test]
    async fn test_group_failure_does_not_block_other_groups() {
        let mut ruleset = ruleset_with_dm_group(true, false);
        // A second drifted group: @room enabled while its primary is off.
        ruleset.insert(
            RuleKind::Override,
            PushRule::new(rule_ids::IS_ROOM_MENTION, false, vec![]),
        );
        ruleset.insert(
            RuleKind::Override,
            PushRule::new(rule_ids::AT_ROOM_NOTIFICATION, true, standard_actions::highlight()),
        );

        let client = MockClient::default();
        *client.failing_rule.lock().unwrap() = Some(rule_ids::POLL_START_ONE_TO_ONE.to_owned());

        monitor_synced_push_rules(&client, &ruleset).await;

        // The DM group failed at its first repair; the mention group was
        // still repaired.
        assert_eq!(
            client.take_calls(),
            vec![format!("enabled override {} false", rule_ids::AT_ROOM_NOTIFICATION)]
        );
    }
}
