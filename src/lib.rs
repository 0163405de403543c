//! Management of a Matrix user's notification settings through push rules.
//!
//! Matrix stores notification preferences as an ordered set of push rules in
//! the user's account data. This crate reduces that rule set to a small
//! user-facing model ([`NotificationSettings`]), computes the minimal set of
//! rule mutations needed to realize a changed model
//! ([`reconcile_notification_settings`]), and keeps companion rules that must
//! mirror a primary rule from drifting apart
//! ([`monitor_synced_push_rules`]).
//!
//! The server remains the source of truth throughout: the model is rebuilt
//! from a rule snapshot on every read, and applying a model re-derives the
//! full canonical rule state instead of patching incrementally, so any drift
//! is corrected by the next apply.
//!
//! [`NotificationSettingsManager`] wires these pieces together on top of a
//! [`PushRuleClient`], the seam a Matrix client implements against its
//! `/pushrules` endpoints.

#![warn(missing_docs, missing_debug_implementations)]

pub mod actions;
pub mod client;
pub mod definitions;
mod error;
pub mod manager;
pub mod reconcile;
pub mod rule_map;
pub mod ruleset;
pub mod settings;
pub mod synced;
pub mod vector_state;

pub use self::{
    actions::{decode_actions, encode_actions, PushRuleActions},
    client::{apply_push_rule_diff, PushRuleClient},
    definitions::{rule_ids, VectorPushRuleDefinition, VECTOR_PUSH_RULE_DEFINITIONS},
    error::NotificationSettingsError,
    manager::NotificationSettingsManager,
    reconcile::{
        reconcile_notification_settings, PushRuleDeletion, PushRuleDiff, PushRuleUpdate,
    },
    rule_map::{build_push_rule_map, PushRuleMap},
    ruleset::{Action, AnnotatedPushRule, PushRule, RuleKind, Ruleset, Tweak},
    settings::{
        to_notification_settings, Activity, DefaultLevels, Mentions, NotificationLevel,
        NotificationSettings, Sounds,
    },
    synced::monitor_synced_push_rules,
    vector_state::{content_rule_vector_state, VectorState},
};
