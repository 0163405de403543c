//! High-level entry point tying fetch, parse, reconcile and apply together.

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::{
    client::{apply_push_rule_diff, PushRuleClient},
    error::NotificationSettingsError,
    reconcile::reconcile_notification_settings,
    ruleset::Ruleset,
    settings::{to_notification_settings, NotificationSettings},
    synced::monitor_synced_push_rules,
};

/// Manages the user's notification settings on top of a [`PushRuleClient`].
///
/// Holds a cache of the server's rule set, updated after every apply and on
/// every push-rule change received from sync. The server stays the source of
/// truth: the settings model is recomputed from the cache on demand, never
/// stored.
#[derive(Debug)]
pub struct NotificationSettingsManager<C> {
    client: C,
    rules: RwLock<Ruleset>,
    supports_intentional_mentions: bool,
    /// Serializes `apply` calls so two concurrent applies can't diff against
    /// the same stale snapshot and interleave their requests.
    apply_lock: Mutex<()>,
}

impl<C: PushRuleClient> NotificationSettingsManager<C> {
    /// Build a manager by fetching the user's current rule set.
    ///
    /// `supports_intentional_mentions` reflects the homeserver's support for
    /// the `.m.rule.is_user_mention` and `.m.rule.is_room_mention` rules;
    /// when `false` those rules are never read or written.
    pub async fn new(
        client: C,
        supports_intentional_mentions: bool,
    ) -> Result<Self, NotificationSettingsError> {
        let rules = client.get_push_rules().await?;
        Ok(NotificationSettingsManager {
            client,
            rules: RwLock::new(rules),
            supports_intentional_mentions,
            apply_lock: Mutex::new(()),
        })
    }

    /// The settings model derived from the cached rule set.
    pub async fn settings(&self) -> NotificationSettings {
        to_notification_settings(&*self.rules.read().await, self.supports_intentional_mentions)
    }

    /// Push the desired settings to the server.
    ///
    /// Computes the diff against the cached rule set, applies it request by
    /// request and then refetches the rules, since the server may normalize
    /// what was sent. A diff that is empty makes no requests at all.
    pub async fn apply(
        &self,
        settings: &NotificationSettings,
    ) -> Result<(), NotificationSettingsError> {
        let _guard = self.apply_lock.lock().await;

        let diff = {
            let rules = self.rules.read().await;
            reconcile_notification_settings(&rules, settings, self.supports_intentional_mentions)
        };

        if diff.is_empty() {
            debug!("Notification settings already match, nothing to apply");
            return Ok(());
        }

        apply_push_rule_diff(&self.client, diff).await?;

        let rules = self.client.get_push_rules().await?;
        *self.rules.write().await = rules;

        Ok(())
    }

    /// Handle a push-rule update received from sync.
    ///
    /// Caches the new rule set and repairs any companion rules that have
    /// drifted from their primary. Repair failures are logged, not returned:
    /// the next sync will try again.
    pub async fn handle_push_rules_changed(&self, ruleset: Ruleset) {
        *self.rules.write().await = ruleset;

        let rules = self.rules.read().await;
        monitor_synced_push_rules(&self.client, &rules).await;
    }
}
