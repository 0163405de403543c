//! The user-facing notification settings model and the parser building it
//! from a server push-rule snapshot.

use serde::{Deserialize, Serialize};

use crate::{
    actions::{decode_actions, PushRuleActions},
    definitions::rule_ids,
    ruleset::{PushRule, Ruleset},
};

/// Default notification level for a class of rooms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    /// Notify for every message.
    AllMessages,
    /// Only notify for mentions and keywords.
    MentionsOnly,
}

/// Default levels per room class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultLevels {
    /// Group chats.
    pub room: NotificationLevel,
    /// One-to-one chats.
    pub dm: NotificationLevel,
}

/// Notification sound choices. `None` means no sound.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sounds {
    /// Sound for one-to-one messages.
    pub people: Option<String>,
    /// Sound for mentions and keywords.
    pub mentions: Option<String>,
    /// Sound for incoming calls.
    pub calls: Option<String>,
}

/// Toggles for activity-style notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Invites addressed to this user.
    pub invite: bool,
    /// Membership, profile and room-upgrade events.
    pub status_event: bool,
    /// Messages sent by bots.
    pub bot_notices: bool,
}

/// Toggles for mention-style notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mentions {
    /// Mentions of this user.
    pub user: bool,
    /// `@room` mentions.
    pub room: bool,
    /// Custom keywords.
    pub keywords: bool,
}

/// What the user wants: the canonical in-memory reduction of the server's
/// push-rule set.
///
/// The server remains the source of truth; this model is rebuilt from a
/// snapshot on every load via [`to_notification_settings`] and pushed back
/// through [`reconcile_notification_settings`].
///
/// [`reconcile_notification_settings`]: crate::reconcile::reconcile_notification_settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Mute everything.
    pub global_mute: bool,
    /// Default levels per room class.
    pub default_levels: DefaultLevels,
    /// Sound choices.
    pub sound: Sounds,
    /// Activity toggles.
    pub activity: Activity,
    /// Mention toggles.
    pub mentions: Mentions,
    /// Custom keyword patterns, independent of server-assigned rule ids.
    pub keywords: Vec<String>,
}

/// The decoded state of a single well-known rule, if it exists and decodes.
fn decoded_rule(ruleset: &Ruleset, rule_id: &str) -> Option<(bool, PushRuleActions)> {
    let (_, rule) = ruleset.get_any(rule_id)?;
    Some((rule.enabled, decode_actions(&rule.actions)?))
}

fn rule_notifies(ruleset: &Ruleset, rule_id: &str) -> bool {
    decoded_rule(ruleset, rule_id).is_some_and(|(enabled, actions)| enabled && actions.notify)
}

fn rule_sound(ruleset: &Ruleset, rule_id: &str) -> Option<String> {
    decoded_rule(ruleset, rule_id).and_then(|(_, actions)| actions.sound)
}

fn is_keyword_rule(rule: &PushRule) -> bool {
    !rule.rule_id.starts_with('.') && rule.pattern.is_some()
}

/// Parse a server push-rule snapshot into the settings model.
///
/// This is the inverse direction of reconciliation: many rules reduce onto
/// one model field, e.g. both message rules onto `default_levels.room`.
pub fn to_notification_settings(
    ruleset: &Ruleset,
    supports_intentional_mentions: bool,
) -> NotificationSettings {
    let global_mute = ruleset
        .get_any(rule_ids::MASTER)
        .is_some_and(|(_, rule)| rule.enabled);

    let default_levels = DefaultLevels {
        room: if rule_notifies(ruleset, rule_ids::MESSAGE) {
            NotificationLevel::AllMessages
        } else {
            NotificationLevel::MentionsOnly
        },
        dm: if rule_notifies(ruleset, rule_ids::DM) {
            NotificationLevel::AllMessages
        } else {
            NotificationLevel::MentionsOnly
        },
    };

    let mention_sound_rule = if supports_intentional_mentions {
        rule_ids::IS_USER_MENTION
    } else {
        rule_ids::CONTAINS_DISPLAY_NAME
    };
    let sound = Sounds {
        people: rule_sound(ruleset, rule_ids::DM),
        mentions: rule_sound(ruleset, mention_sound_rule),
        calls: rule_sound(ruleset, rule_ids::INCOMING_CALL),
    };

    let activity = Activity {
        invite: rule_notifies(ruleset, rule_ids::INVITE_TO_SELF),
        status_event: rule_notifies(ruleset, rule_ids::MEMBER_EVENT),
        bot_notices: !ruleset
            .get_any(rule_ids::SUPPRESS_NOTICES)
            .is_some_and(|(_, rule)| rule.enabled),
    };

    let mentions = if supports_intentional_mentions {
        Mentions {
            user: ruleset
                .get_any(rule_ids::IS_USER_MENTION)
                .is_some_and(|(_, rule)| rule.enabled),
            room: ruleset
                .get_any(rule_ids::IS_ROOM_MENTION)
                .is_some_and(|(_, rule)| rule.enabled),
            keywords: keyword_rules(ruleset).any(|rule| rule.enabled),
        }
    } else {
        Mentions {
            user: rule_notifies(ruleset, rule_ids::CONTAINS_DISPLAY_NAME)
                || rule_notifies(ruleset, rule_ids::CONTAINS_USER_NAME),
            room: rule_notifies(ruleset, rule_ids::AT_ROOM_NOTIFICATION),
            keywords: keyword_rules(ruleset).any(|rule| rule.enabled),
        }
    };

    let mut keywords: Vec<String> = Vec::new();
    for rule in keyword_rules(ruleset) {
        if let Some(pattern) = &rule.pattern {
            if !keywords.contains(pattern) {
                keywords.push(pattern.clone());
            }
        }
    }

    NotificationSettings { global_mute, default_levels, sound, activity, mentions, keywords }
}

/// User-created content rules, i.e. the keyword rules.
pub(crate) fn keyword_rules(ruleset: &Ruleset) -> impl Iterator<Item = &PushRule> {
    ruleset.content.iter().filter(|rule| is_keyword_rule(rule))
}

#[cfg(test)]
mod tests {
    use super::{to_notification_settings, NotificationLevel};
    use crate::{
        actions::standard_actions,
        definitions::rule_ids,
        ruleset::{Action, PushRule, RuleKind, Ruleset, Tweak},
    };

    fn base_ruleset() -> Ruleset {
        let mut ruleset = Ruleset::default();
        ruleset.insert(RuleKind::Override, PushRule::new(rule_ids::MASTER, false, vec![]));
        ruleset.insert(
            RuleKind::Underride,
            PushRule::new(rule_ids::MESSAGE, true, standard_actions::notify()),
        );
        ruleset.insert(
            RuleKind::Underride,
            PushRule::new(
                rule_ids::DM,
                true,
                vec![
                    Action::Notify,
                    Action::SetTweak(Tweak::sound("default")),
                    Action::SetTweak(Tweak::highlight(false)),
                ],
            ),
        );
        ruleset.insert(
            RuleKind::Override,
            PushRule::new(rule_ids::SUPPRESS_NOTICES, true, standard_actions::dont_notify()),
        );
        ruleset.insert(
            RuleKind::Override,
            PushRule::new(rule_ids::IS_USER_MENTION, true, standard_actions::highlight_default_sound()),
        );
        ruleset.insert(
            RuleKind::Override,
            PushRule::new(rule_ids::IS_ROOM_MENTION, false, standard_actions::highlight()),
        );
        ruleset
    }

    #[test]
    fn test_parse_levels_and_sounds() {
        let settings = to_notification_settings(&base_ruleset(), true);

        assert!(!settings.global_mute);
        assert_eq!(settings.default_levels.room, NotificationLevel::AllMessages);
        assert_eq!(settings.default_levels.dm, NotificationLevel::AllMessages);
        assert_eq!(settings.sound.people.as_deref(), Some("default"));
        assert_eq!(settings.sound.mentions.as_deref(), Some("default"));
    }

    #[test]
    fn test_parse_suppress_notices_is_inverted() {
        let settings = to_notification_settings(&base_ruleset(), true);
        // The suppression rule is enabled, so notices are off.
        assert!(!settings.activity.bot_notices);
    }

    #[test]
    fn test_parse_mentions_with_capability() {
        let settings = to_notification_settings(&base_ruleset(), true);
        assert!(settings.mentions.user);
        assert!(!settings.mentions.room);
    }

    #[test]
    fn test_parse_mentions_legacy_fallback() {
        let mut ruleset = base_ruleset();
        ruleset.insert(
            RuleKind::Override,
            PushRule::new(rule_ids::CONTAINS_DISPLAY_NAME, true, standard_actions::highlight_default_sound()),
        );
        ruleset.insert(
            RuleKind::Override,
            PushRule::new(rule_ids::AT_ROOM_NOTIFICATION, true, standard_actions::dont_notify()),
        );

        let settings = to_notification_settings(&ruleset, false);
        assert!(settings.mentions.user);
        // Enabled but not notifying does not count.
        assert!(!settings.mentions.room);
    }

    #[test]
    fn test_parse_keywords() {
        let mut ruleset = base_ruleset();
        let mut rule = PushRule::new("jam", true, standard_actions::notify());
        rule.pattern = Some("jam".to_owned());
        ruleset.insert(RuleKind::Content, rule);
        let mut rule = PushRule::new("scone", false, standard_actions::notify());
        rule.pattern = Some("scone".to_owned());
        ruleset.insert(RuleKind::Content, rule);

        let settings = to_notification_settings(&ruleset, true);
        assert_eq!(settings.keywords, vec!["jam".to_owned(), "scone".to_owned()]);
        assert!(settings.mentions.keywords);
    }

    #[test]
    fn test_parse_missing_rules_defaults() {
        let settings = to_notification_settings(&Ruleset::default(), true);
        assert!(!settings.global_mute);
        assert_eq!(settings.default_levels.room, NotificationLevel::MentionsOnly);
        assert!(settings.activity.bot_notices);
        assert!(settings.keywords.is_empty());
    }
}
