//! Encoding and decoding between the semantic action triple and the wire
//! action list.
//!
//! The decoded shape is what all comparisons in this crate operate on;
//! comparing raw action lists is wrong because equivalent semantics can be
//! serialized in several ways (tweak ordering, the bare highlight tweak).

use serde_json::Value;

use crate::ruleset::{Action, Tweak};

/// The decoded, canonical form of a rule's action list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushRuleActions {
    /// Whether the rule notifies at all.
    pub notify: bool,
    /// The notification sound, if any.
    pub sound: Option<String>,
    /// Whether the event is highlighted.
    pub highlight: bool,
}

/// Encode the semantic triple into a wire action list.
///
/// A non-notifying rule is just `[dont_notify]`; any sound or highlight is
/// dropped. A notifying rule always carries a highlight tweak, encoded as a
/// bare tweak for `true` and `value: false` otherwise, so that round-tripping
/// yields exactly one highlight tweak.
pub fn encode_actions(actions: &PushRuleActions) -> Vec<Action> {
    if !actions.notify {
        return vec![Action::DontNotify];
    }

    let mut encoded = vec![Action::Notify];
    if let Some(sound) = &actions.sound {
        encoded.push(Action::SetTweak(Tweak::sound(sound.clone())));
    }
    encoded.push(Action::SetTweak(Tweak::highlight(actions.highlight)));
    encoded
}

/// Decode a wire action list into the semantic triple.
///
/// Returns `None` for any action shape this crate doesn't understand
/// (unrecognized tweaks, `coalesce`, malformed values). Callers must treat
/// `None` as "cannot classify", not as an error.
///
/// The highlight value keeps the asymmetry of the wire format: a bare
/// highlight tweak means `true`, an explicit `value: false` means `false`,
/// and no highlight tweak at all means `false`.
pub fn decode_actions(actions: &[Action]) -> Option<PushRuleActions> {
    let mut notify = false;
    let mut sound = None;
    // `Some` carries an explicit value; `None` marks a bare highlight tweak.
    let mut highlight = Some(false);

    for action in actions {
        match action {
            Action::Notify => notify = true,
            Action::DontNotify => notify = false,
            Action::SetTweak(tweak) => match tweak.set_tweak.as_str() {
                "sound" => match &tweak.value {
                    Some(Value::String(value)) => sound = Some(value.clone()),
                    // A sound tweak without a value carries no sound.
                    None => {}
                    Some(_) => return None,
                },
                "highlight" => match &tweak.value {
                    None => highlight = None,
                    Some(Value::Bool(value)) => highlight = Some(*value),
                    Some(_) => return None,
                },
                _ => return None,
            },
            Action::Coalesce => return None,
        }
    }

    Some(PushRuleActions { notify, sound, highlight: highlight.unwrap_or(true) })
}

/// The well-known action shapes the rule definitions are built from.
pub mod standard_actions {
    use super::{encode_actions, PushRuleActions};
    use crate::ruleset::Action;

    /// Notify without any tweak.
    pub fn notify() -> Vec<Action> {
        encode_actions(&PushRuleActions { notify: true, sound: None, highlight: false })
    }

    /// Notify with the default sound.
    pub fn notify_default_sound() -> Vec<Action> {
        encode_actions(&PushRuleActions {
            notify: true,
            sound: Some("default".to_owned()),
            highlight: false,
        })
    }

    /// Notify with the ring sound, used for call invites.
    pub fn notify_ring_sound() -> Vec<Action> {
        encode_actions(&PushRuleActions {
            notify: true,
            sound: Some("ring".to_owned()),
            highlight: false,
        })
    }

    /// Notify and highlight, without a sound.
    pub fn highlight() -> Vec<Action> {
        encode_actions(&PushRuleActions { notify: true, sound: None, highlight: true })
    }

    /// Notify, highlight and play the default sound.
    pub fn highlight_default_sound() -> Vec<Action> {
        encode_actions(&PushRuleActions {
            notify: true,
            sound: Some("default".to_owned()),
            highlight: true,
        })
    }

    /// Don't notify.
    pub fn dont_notify() -> Vec<Action> {
        encode_actions(&PushRuleActions { notify: false, sound: None, highlight: false })
    }
}
