//! Diffing the desired settings model against the server's rule set.
//!
//! Reconciliation deliberately rebuilds the canonical rule state from the
//! model and diffs it against what the server has, instead of patching
//! incrementally. The rule set is small and enumerable, and full
//! recomputation is self-healing: drift from any source is corrected on the
//! next reconcile.

use std::collections::HashSet;

use crate::{
    actions::{decode_actions, encode_actions, PushRuleActions},
    definitions::rule_ids,
    rule_map::build_push_rule_map,
    ruleset::{Action, AnnotatedPushRule, PushRule, RuleKind, Ruleset},
    settings::{keyword_rules, NotificationLevel, NotificationSettings},
};

/// A requested change to an existing rule. A field left `None` requests no
/// change for that field.
#[derive(Debug, Clone, PartialEq)]
pub struct PushRuleUpdate {
    /// The rule to update.
    pub rule_id: String,
    /// The kind the rule lives under.
    pub kind: RuleKind,
    /// The new enabled state, if it should change.
    pub enabled: Option<bool>,
    /// The new actions, if they should change.
    pub actions: Option<Vec<Action>>,
}

/// A requested rule deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct PushRuleDeletion {
    /// The rule to delete.
    pub rule_id: String,
    /// The kind the rule lives under.
    pub kind: RuleKind,
}

/// The set of mutations needed to move the server to the desired state.
///
/// A (rule_id, kind) pair appears in at most one of the three lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushRuleDiff {
    /// Rules to update in place.
    pub updated: Vec<PushRuleUpdate>,
    /// Rules to create.
    pub added: Vec<AnnotatedPushRule>,
    /// Rules to delete.
    pub deleted: Vec<PushRuleDeletion>,
}

impl PushRuleDiff {
    /// Whether the diff requests no changes at all.
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.added.is_empty() && self.deleted.is_empty()
    }
}

fn update(
    rule_id: &str,
    kind: RuleKind,
    enabled: bool,
    actions: Option<Vec<Action>>,
) -> PushRuleUpdate {
    PushRuleUpdate { rule_id: rule_id.to_owned(), kind, enabled: Some(enabled), actions }
}

fn notify_actions(notify: bool, sound: Option<String>, highlight: bool) -> Vec<Action> {
    encode_actions(&PushRuleActions { notify, sound, highlight })
}

/// The canonical mention action shape: notify, highlight, mention sound.
fn mention_actions(settings: &NotificationSettings) -> Vec<Action> {
    notify_actions(true, settings.sound.mentions.clone(), true)
}

/// The fixed, ordered construction of the canonical default-rule updates,
/// derived purely from the model.
///
/// The intentional-mention rules are only produced when the server supports
/// them; on older servers those rule ids are never touched, neither added
/// nor removed.
fn desired_rules(
    settings: &NotificationSettings,
    supports_intentional_mentions: bool,
) -> Vec<PushRuleUpdate> {
    let room_notify = settings.default_levels.room == NotificationLevel::AllMessages;
    let dm_notify = settings.default_levels.dm == NotificationLevel::AllMessages;

    let mut rules = vec![
        // The master rule only toggles; its actions are left alone.
        PushRuleUpdate {
            rule_id: rule_ids::MASTER.to_owned(),
            kind: RuleKind::Override,
            enabled: Some(settings.global_mute),
            actions: None,
        },
        update(
            rule_ids::ENCRYPTED_MESSAGE,
            RuleKind::Underride,
            true,
            Some(notify_actions(room_notify, None, false)),
        ),
        update(
            rule_ids::MESSAGE,
            RuleKind::Underride,
            true,
            Some(notify_actions(room_notify, None, false)),
        ),
        update(
            rule_ids::ENCRYPTED_DM,
            RuleKind::Underride,
            true,
            Some(notify_actions(dm_notify, settings.sound.people.clone(), false)),
        ),
        update(
            rule_ids::DM,
            RuleKind::Underride,
            true,
            Some(notify_actions(dm_notify, settings.sound.people.clone(), false)),
        ),
        // Inverted semantics: the rule being enabled suppresses notices.
        update(
            rule_ids::SUPPRESS_NOTICES,
            RuleKind::Override,
            !settings.activity.bot_notices,
            Some(notify_actions(false, None, false)),
        ),
        update(
            rule_ids::INVITE_TO_SELF,
            RuleKind::Override,
            settings.activity.invite,
            Some(notify_actions(true, None, false)),
        ),
        update(
            rule_ids::MEMBER_EVENT,
            RuleKind::Override,
            settings.activity.status_event,
            Some(notify_actions(true, None, false)),
        ),
        update(
            rule_ids::TOMBSTONE,
            RuleKind::Override,
            settings.activity.status_event,
            Some(notify_actions(true, None, true)),
        ),
        update(
            rule_ids::INCOMING_CALL,
            RuleKind::Underride,
            true,
            Some(notify_actions(true, settings.sound.calls.clone(), false)),
        ),
        // The legacy mention rules are set on every server.
        update(
            rule_ids::CONTAINS_DISPLAY_NAME,
            RuleKind::Override,
            settings.mentions.user,
            Some(mention_actions(settings)),
        ),
        update(
            rule_ids::CONTAINS_USER_NAME,
            RuleKind::Content,
            settings.mentions.user,
            Some(mention_actions(settings)),
        ),
        update(
            rule_ids::AT_ROOM_NOTIFICATION,
            RuleKind::Override,
            settings.mentions.room,
            Some(notify_actions(true, None, true)),
        ),
    ];

    if supports_intentional_mentions {
        rules.push(update(
            rule_ids::IS_USER_MENTION,
            RuleKind::Override,
            settings.mentions.user,
            Some(mention_actions(settings)),
        ));
        rules.push(update(
            rule_ids::IS_ROOM_MENTION,
            RuleKind::Override,
            settings.mentions.room,
            Some(notify_actions(true, None, true)),
        ));
    }

    rules
}

/// Whether an update differs from the rule the server currently has.
///
/// A missing rule counts as changed, as does an action list that fails to
/// decode on either side (fail safe by updating).
fn rule_changed(old: Option<&PushRule>, new: &PushRuleUpdate) -> bool {
    let Some(old) = old else {
        return true;
    };

    if new.enabled.is_some_and(|enabled| enabled != old.enabled) {
        return true;
    }

    if let Some(actions) = &new.actions {
        let old_decoded = decode_actions(&old.actions);
        if old_decoded.is_none() || old_decoded != decode_actions(actions) {
            return true;
        }
    }

    false
}

/// Compute the diff that moves the server's rule set to the desired model.
///
/// Pure and side-effect-free; applying the diff is the caller's concern, see
/// [`apply_push_rule_diff`](crate::client::apply_push_rule_diff).
pub fn reconcile_notification_settings(
    ruleset: &Ruleset,
    settings: &NotificationSettings,
    supports_intentional_mentions: bool,
) -> PushRuleDiff {
    let mut diff = PushRuleDiff::default();
    let old_rules = build_push_rule_map(ruleset);

    for new_rule in desired_rules(settings, supports_intentional_mentions) {
        let old = old_rules.get(&new_rule.rule_id).map(|annotated| &annotated.rule);
        if rule_changed(old, &new_rule) {
            diff.updated.push(new_rule);
        }
    }

    // Keyword rules are user-created content rules, keyed by their exact
    // pattern string; case-variant patterns are distinct rules.
    let keyword_actions = mention_actions(settings);
    let keyword_decoded = decode_actions(&keyword_actions);
    let mut consumed: HashSet<&str> = HashSet::new();

    for rule in keyword_rules(ruleset) {
        let Some(pattern) = &rule.pattern else { continue };

        if !settings.keywords.contains(pattern) {
            diff.deleted.push(PushRuleDeletion {
                rule_id: rule.rule_id.clone(),
                kind: RuleKind::Content,
            });
            continue;
        }

        consumed.insert(pattern.as_str());

        let enabled_matches = rule.enabled == settings.mentions.keywords;
        let old_decoded = decode_actions(&rule.actions);
        let actions_match = old_decoded.is_some() && old_decoded == keyword_decoded;
        if !enabled_matches || !actions_match {
            diff.updated.push(PushRuleUpdate {
                rule_id: rule.rule_id.clone(),
                kind: RuleKind::Content,
                enabled: Some(settings.mentions.keywords),
                actions: Some(keyword_actions.clone()),
            });
        }
    }

    for pattern in &settings.keywords {
        if !consumed.contains(pattern.as_str()) {
            diff.added.push(AnnotatedPushRule {
                kind: RuleKind::Content,
                rule: PushRule {
                    rule_id: pattern.clone(),
                    default: false,
                    enabled: settings.mentions.keywords,
                    actions: keyword_actions.clone(),
                    conditions: None,
                    pattern: Some(pattern.clone()),
                },
            });
        }
    }

    diff
}
