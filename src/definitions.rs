//! Static metadata for the well-known push rules the settings UI exposes.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use tracing::error;

use crate::{
    actions::{decode_actions, standard_actions},
    ruleset::{Action, PushRule, RuleKind},
    vector_state::{VectorState, VECTOR_STATES},
};

/// The well-known rule ids this crate manages.
pub mod rule_ids {
    /// The master rule, which mutes everything when enabled.
    pub const MASTER: &str = ".m.rule.master";
    /// Intentional user mentions (MSC3952).
    pub const IS_USER_MENTION: &str = ".m.rule.is_user_mention";
    /// Intentional room mentions (MSC3952).
    pub const IS_ROOM_MENTION: &str = ".m.rule.is_room_mention";
    /// Legacy display-name mention rule.
    pub const CONTAINS_DISPLAY_NAME: &str = ".m.rule.contains_display_name";
    /// Legacy username mention rule.
    pub const CONTAINS_USER_NAME: &str = ".m.rule.contains_user_name";
    /// Legacy `@room` mention rule.
    pub const AT_ROOM_NOTIFICATION: &str = ".m.rule.roomnotif";
    /// Messages in one-to-one chats.
    pub const DM: &str = ".m.rule.room_one_to_one";
    /// Encrypted messages in one-to-one chats.
    pub const ENCRYPTED_DM: &str = ".m.rule.encrypted_room_one_to_one";
    /// Messages in group chats.
    pub const MESSAGE: &str = ".m.rule.message";
    /// Encrypted messages in group chats.
    pub const ENCRYPTED_MESSAGE: &str = ".m.rule.encrypted";
    /// Invites addressed to this user.
    pub const INVITE_TO_SELF: &str = ".m.rule.invite_for_me";
    /// Membership and profile events.
    pub const MEMBER_EVENT: &str = ".m.rule.member_event";
    /// Call invites.
    pub const INCOMING_CALL: &str = ".m.rule.call";
    /// Bot notices; enabling this rule silences them.
    pub const SUPPRESS_NOTICES: &str = ".m.rule.suppress_notices";
    /// Room upgrade (tombstone) events.
    pub const TOMBSTONE: &str = ".m.rule.tombstone";
    /// Poll start in group chats (MSC3930).
    pub const POLL_START: &str = ".org.matrix.msc3930.rule.poll_start";
    /// Poll start in one-to-one chats (MSC3930).
    pub const POLL_START_ONE_TO_ONE: &str = ".org.matrix.msc3930.rule.poll_start_one_to_one";
    /// Poll end in group chats (MSC3930).
    pub const POLL_END: &str = ".org.matrix.msc3930.rule.poll_end";
    /// Poll end in one-to-one chats (MSC3930).
    pub const POLL_END_ONE_TO_ONE: &str = ".org.matrix.msc3930.rule.poll_end_one_to_one";
}

/// Metadata describing how a well-known rule maps onto [`VectorState`].
#[derive(Debug, Clone)]
pub struct VectorPushRuleDefinition {
    /// The kind the rule lives under.
    pub kind: RuleKind,
    /// A short human description of the rule.
    pub description: &'static str,
    /// Canonical actions per state, indexed by `VectorState::index()`. A
    /// `None` entry means that state is represented by the rule being
    /// disabled.
    vector_state_to_actions: [Option<Vec<Action>>; 3],
    /// Rule ids that must mirror this rule's effective state.
    pub synced_rule_ids: &'static [&'static str],
}

impl VectorPushRuleDefinition {
    fn new(
        kind: RuleKind,
        description: &'static str,
        off: Option<Vec<Action>>,
        on: Option<Vec<Action>>,
        loud: Option<Vec<Action>>,
        synced_rule_ids: &'static [&'static str],
    ) -> Self {
        VectorPushRuleDefinition {
            kind,
            description,
            vector_state_to_actions: [off, on, loud],
            synced_rule_ids,
        }
    }

    /// The canonical actions for a state, or `None` when the state is
    /// represented by disabling the rule.
    pub fn actions_for(&self, state: VectorState) -> Option<&[Action]> {
        self.vector_state_to_actions[state.index()].as_deref()
    }

    /// Classify a rule against this definition.
    ///
    /// States are checked in enum order. A state without canonical actions
    /// matches a disabled rule; a state with actions matches an enabled rule
    /// whose decoded actions equal the decoded canonical ones. Returns `None`
    /// when the server's action shape isn't one this definition knows, which
    /// callers must treat as "unknown configuration", never as fatal.
    pub fn rule_to_vector_state(&self, rule: &PushRule) -> Option<VectorState> {
        for state in VECTOR_STATES {
            match self.actions_for(state) {
                None => {
                    if !rule.enabled {
                        return Some(state);
                    }
                }
                Some(canonical) => {
                    if rule.enabled {
                        let decoded = decode_actions(&rule.actions);
                        if decoded.is_some() && decoded == decode_actions(canonical) {
                            return Some(state);
                        }
                    }
                }
            }
        }

        error!(
            rule_id = %rule.rule_id,
            "Failed to classify rule: unknown combination of enabled state and actions"
        );
        None
    }
}

/// The definitions for every well-known rule, keyed by rule id.
pub static VECTOR_PUSH_RULE_DEFINITIONS: Lazy<IndexMap<&'static str, VectorPushRuleDefinition>> =
    Lazy::new(|| {
        use standard_actions as sa;

        IndexMap::from([
            (
                rule_ids::IS_USER_MENTION,
                VectorPushRuleDefinition::new(
                    RuleKind::Override,
                    "Messages containing my username or display name",
                    None,
                    Some(sa::notify()),
                    Some(sa::highlight_default_sound()),
                    &[rule_ids::CONTAINS_DISPLAY_NAME, rule_ids::CONTAINS_USER_NAME],
                ),
            ),
            (
                rule_ids::IS_ROOM_MENTION,
                VectorPushRuleDefinition::new(
                    RuleKind::Override,
                    "Messages containing @room",
                    None,
                    Some(sa::notify()),
                    Some(sa::highlight()),
                    &[rule_ids::AT_ROOM_NOTIFICATION],
                ),
            ),
            (
                rule_ids::CONTAINS_DISPLAY_NAME,
                VectorPushRuleDefinition::new(
                    RuleKind::Override,
                    "Messages containing my display name",
                    None,
                    Some(sa::notify()),
                    Some(sa::highlight_default_sound()),
                    &[],
                ),
            ),
            (
                rule_ids::CONTAINS_USER_NAME,
                VectorPushRuleDefinition::new(
                    RuleKind::Content,
                    "Messages containing my username",
                    None,
                    Some(sa::notify()),
                    Some(sa::highlight_default_sound()),
                    &[],
                ),
            ),
            (
                rule_ids::AT_ROOM_NOTIFICATION,
                VectorPushRuleDefinition::new(
                    RuleKind::Override,
                    "Messages containing @room",
                    None,
                    Some(sa::notify()),
                    Some(sa::highlight()),
                    &[],
                ),
            ),
            (
                rule_ids::DM,
                VectorPushRuleDefinition::new(
                    RuleKind::Underride,
                    "Messages in one-to-one chats",
                    Some(sa::dont_notify()),
                    Some(sa::notify()),
                    Some(sa::notify_default_sound()),
                    &[rule_ids::POLL_START_ONE_TO_ONE, rule_ids::POLL_END_ONE_TO_ONE],
                ),
            ),
            (
                rule_ids::ENCRYPTED_DM,
                VectorPushRuleDefinition::new(
                    RuleKind::Underride,
                    "Encrypted messages in one-to-one chats",
                    Some(sa::dont_notify()),
                    Some(sa::notify()),
                    Some(sa::notify_default_sound()),
                    &[],
                ),
            ),
            (
                rule_ids::MESSAGE,
                VectorPushRuleDefinition::new(
                    RuleKind::Underride,
                    "Messages in group chats",
                    Some(sa::dont_notify()),
                    Some(sa::notify()),
                    Some(sa::notify_default_sound()),
                    &[rule_ids::POLL_START, rule_ids::POLL_END],
                ),
            ),
            (
                rule_ids::ENCRYPTED_MESSAGE,
                VectorPushRuleDefinition::new(
                    RuleKind::Underride,
                    "Encrypted messages in group chats",
                    Some(sa::dont_notify()),
                    Some(sa::notify()),
                    Some(sa::notify_default_sound()),
                    &[],
                ),
            ),
            (
                rule_ids::INVITE_TO_SELF,
                VectorPushRuleDefinition::new(
                    RuleKind::Override,
                    "Invitations addressed to me",
                    None,
                    Some(sa::notify()),
                    Some(sa::notify_default_sound()),
                    &[],
                ),
            ),
            (
                rule_ids::MEMBER_EVENT,
                VectorPushRuleDefinition::new(
                    RuleKind::Override,
                    "Membership and profile changes",
                    None,
                    Some(sa::notify()),
                    Some(sa::notify_default_sound()),
                    &[],
                ),
            ),
            (
                rule_ids::INCOMING_CALL,
                VectorPushRuleDefinition::new(
                    RuleKind::Underride,
                    "Call invitations",
                    None,
                    Some(sa::notify()),
                    Some(sa::notify_ring_sound()),
                    &[],
                ),
            ),
            (
                rule_ids::SUPPRESS_NOTICES,
                VectorPushRuleDefinition::new(
                    RuleKind::Override,
                    // This is a suppression rule: "On" silences notices.
                    "Messages sent by bots",
                    None,
                    Some(sa::dont_notify()),
                    Some(sa::notify_default_sound()),
                    &[],
                ),
            ),
            (
                rule_ids::TOMBSTONE,
                VectorPushRuleDefinition::new(
                    RuleKind::Override,
                    "Room upgrades",
                    None,
                    Some(sa::notify()),
                    Some(sa::highlight()),
                    &[],
                ),
            ),
        ])
    });

#[cfg(test)]
mod tests {
    use super::{rule_ids, VECTOR_PUSH_RULE_DEFINITIONS};
    use crate::{
        actions::standard_actions,
        ruleset::{Action, PushRule, Tweak},
        vector_state::VectorState,
    };

    #[test]
    fn test_disabled_rule_matches_stateless_off() {
        let definition = &VECTOR_PUSH_RULE_DEFINITIONS[rule_ids::TOMBSTONE];
        let rule = PushRule::new(rule_ids::TOMBSTONE, false, standard_actions::notify());
        assert_eq!(definition.rule_to_vector_state(&rule), Some(VectorState::Off));
    }

    #[test]
    fn test_enabled_rule_matches_by_decoded_actions() {
        let definition = &VECTOR_PUSH_RULE_DEFINITIONS[rule_ids::DM];

        let on = PushRule::new(rule_ids::DM, true, standard_actions::notify());
        assert_eq!(definition.rule_to_vector_state(&on), Some(VectorState::On));

        let loud = PushRule::new(rule_ids::DM, true, standard_actions::notify_default_sound());
        assert_eq!(definition.rule_to_vector_state(&loud), Some(VectorState::Loud));

        let off = PushRule::new(rule_ids::DM, true, standard_actions::dont_notify());
        assert_eq!(definition.rule_to_vector_state(&off), Some(VectorState::Off));
    }

    #[test]
    fn test_comparison_is_canonicalized_not_structural() {
        let definition = &VECTOR_PUSH_RULE_DEFINITIONS[rule_ids::CONTAINS_DISPLAY_NAME];

        // Same semantics as highlight_default_sound but with a different
        // tweak order and a bare highlight tweak.
        let rule = PushRule::new(
            rule_ids::CONTAINS_DISPLAY_NAME,
            true,
            vec![
                Action::SetTweak(Tweak { set_tweak: "highlight".to_owned(), value: None }),
                Action::SetTweak(Tweak::sound("default")),
                Action::Notify,
            ],
        );
        assert_eq!(definition.rule_to_vector_state(&rule), Some(VectorState::Loud));
    }

    #[test]
    fn test_unknown_shape_is_unclassifiable() {
        let definition = &VECTOR_PUSH_RULE_DEFINITIONS[rule_ids::MESSAGE];

        // Sound-only is not one of the canonical shapes for this rule.
        let rule = PushRule::new(
            rule_ids::MESSAGE,
            true,
            vec![Action::Notify, Action::SetTweak(Tweak::sound("bird"))],
        );
        assert_eq!(definition.rule_to_vector_state(&rule), None);
    }

    #[test]
    fn test_synced_rule_groups() {
        assert_eq!(
            VECTOR_PUSH_RULE_DEFINITIONS[rule_ids::DM].synced_rule_ids,
            &[rule_ids::POLL_START_ONE_TO_ONE, rule_ids::POLL_END_ONE_TO_ONE]
        );
        assert_eq!(
            VECTOR_PUSH_RULE_DEFINITIONS[rule_ids::IS_USER_MENTION].synced_rule_ids,
            &[rule_ids::CONTAINS_DISPLAY_NAME, rule_ids::CONTAINS_USER_NAME]
        );
    }
}
