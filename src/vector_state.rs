//! The three-level simplification of a rule's notification volume.

use crate::{
    actions::{decode_actions, standard_actions},
    ruleset::{Action, PushRule},
};

/// Coarse classification of a push rule, as shown in the settings UI.
///
/// The variant order matters: [`rule_to_vector_state`] checks states in this
/// order.
///
/// [`rule_to_vector_state`]: crate::definitions::VectorPushRuleDefinition::rule_to_vector_state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorState {
    /// The rule is disabled.
    Off,
    /// The rule notifies without sound or highlight.
    On,
    /// The rule notifies with sound and highlight.
    Loud,
}

/// All states, in declaration order. Used to index fixed-size lookup tables.
pub(crate) const VECTOR_STATES: [VectorState; 3] =
    [VectorState::Off, VectorState::On, VectorState::Loud];

impl VectorState {
    pub(crate) fn index(self) -> usize {
        match self {
            VectorState::Off => 0,
            VectorState::On => 1,
            VectorState::Loud => 2,
        }
    }
}

/// Classify a content (keyword) rule by counting its tweaks.
///
/// No tweaks is [`VectorState::On`]; both a sound and a highlight is
/// [`VectorState::Loud`]. A single tweak, e.g. sound without highlight, is
/// deliberately unclassifiable and yields `None`, as does an action list
/// that doesn't decode.
pub fn content_rule_vector_state(rule: &PushRule) -> Option<VectorState> {
    let decoded = decode_actions(&rule.actions)?;

    let mut tweaks = 0;
    if decoded.sound.is_some() {
        tweaks += 1;
    }
    if decoded.highlight {
        tweaks += 1;
    }

    match tweaks {
        0 => Some(VectorState::On),
        2 => Some(VectorState::Loud),
        _ => None,
    }
}

/// The canonical actions for a keyword rule in the given state.
///
/// `Off` has no actions; the caller must disable the rule instead.
pub fn actions_for(state: VectorState) -> Option<Vec<Action>> {
    match state {
        VectorState::On => Some(standard_actions::notify()),
        VectorState::Loud => Some(standard_actions::highlight_default_sound()),
        VectorState::Off => None,
    }
}
