//! The seam to the homeserver's push-rule endpoints.

use async_trait::async_trait;
use tracing::debug;

use crate::{
    error::NotificationSettingsError,
    reconcile::PushRuleDiff,
    ruleset::{Action, AnnotatedPushRule, RuleKind, Ruleset},
};

/// The push-rule operations this crate needs from a Matrix client.
///
/// All operations act on the user's `global` rule scope. Implementations map
/// these onto the corresponding `/pushrules` endpoints.
#[async_trait]
pub trait PushRuleClient: Send + Sync {
    /// Fetch the user's current rule set.
    async fn get_push_rules(&self) -> Result<Ruleset, NotificationSettingsError>;

    /// Enable or disable a rule.
    async fn set_push_rule_enabled(
        &self,
        kind: RuleKind,
        rule_id: &str,
        enabled: bool,
    ) -> Result<(), NotificationSettingsError>;

    /// Replace the actions of a rule.
    async fn set_push_rule_actions(
        &self,
        kind: RuleKind,
        rule_id: &str,
        actions: Vec<Action>,
    ) -> Result<(), NotificationSettingsError>;

    /// Create a new rule.
    async fn add_push_rule(
        &self,
        rule: AnnotatedPushRule,
    ) -> Result<(), NotificationSettingsError>;

    /// Delete a rule.
    async fn delete_push_rule(
        &self,
        kind: RuleKind,
        rule_id: &str,
    ) -> Result<(), NotificationSettingsError>;
}

/// Apply a diff to the server, one request at a time.
///
/// Deletions run first, then additions, then updates, each in the order the
/// diff lists them; within an update the enabled state is set before the
/// actions. The first failing request aborts the rest, leaving the already
/// applied prefix in place. Reconciliation is self-healing, so a partial
/// apply is corrected by the next one.
pub async fn apply_push_rule_diff<C: PushRuleClient + ?Sized>(
    client: &C,
    diff: PushRuleDiff,
) -> Result<(), NotificationSettingsError> {
    debug!(
        updated = diff.updated.len(),
        added = diff.added.len(),
        deleted = diff.deleted.len(),
        "Applying push rule diff"
    );

    for deletion in diff.deleted {
        client.delete_push_rule(deletion.kind, &deletion.rule_id).await?;
    }

    for added in diff.added {
        client.add_push_rule(added).await?;
    }

    for update in diff.updated {
        if let Some(enabled) = update.enabled {
            client.set_push_rule_enabled(update.kind, &update.rule_id, enabled).await?;
        }
        if let Some(actions) = update.actions {
            client.set_push_rule_actions(update.kind, &update.rule_id, actions).await?;
        }
    }

    Ok(())
}
