//! Wire model for the `/pushrules` account data.
//!
//! This mirrors the structure of the Matrix client-server API push rule
//! document as far as this crate consumes it. Conditions are carried as raw
//! JSON since nothing here evaluates them.

use serde::{de::Error as _, Deserialize, Serialize};
use serde_json::Value;

/// The kind of a push rule, in descending priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Highest priority rules, evaluated first.
    Override,
    /// Rules matching on event content patterns (keywords).
    Content,
    /// Rules matching a whole room.
    Room,
    /// Rules matching all events from a sender.
    Sender,
    /// Lowest priority rules, evaluated last.
    Underride,
}

impl RuleKind {
    /// The wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::Override => "override",
            RuleKind::Content => "content",
            RuleKind::Room => "room",
            RuleKind::Sender => "sender",
            RuleKind::Underride => "underride",
        }
    }
}

/// A tweak attached to a `notify` action.
///
/// The tweak is kept generic at the wire level: unknown tweak names survive a
/// round trip, and it is up to [`decode_actions`](crate::actions::decode_actions)
/// to reject the ones this crate doesn't understand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweak {
    /// The tweak name, e.g. `sound` or `highlight`.
    pub set_tweak: String,
    /// The tweak value. A `highlight` tweak without a value means "on".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Tweak {
    /// A `sound` tweak with the given sound name.
    pub fn sound(value: impl Into<String>) -> Self {
        Tweak { set_tweak: "sound".to_owned(), value: Some(Value::String(value.into())) }
    }

    /// A `highlight` tweak. `true` is encoded as a bare tweak without a
    /// value, matching what servers send for the default highlight rules.
    pub fn highlight(value: bool) -> Self {
        Tweak {
            set_tweak: "highlight".to_owned(),
            value: if value { None } else { Some(Value::Bool(false)) },
        }
    }
}

/// A single push rule action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Notify the user.
    Notify,
    /// Don't notify the user.
    DontNotify,
    /// Mark as notifying but coalesce with similar events (historical).
    Coalesce,
    /// Attach a tweak to the notification.
    SetTweak(Tweak),
}

impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Action::Notify => serializer.serialize_str("notify"),
            Action::DontNotify => serializer.serialize_str("dont_notify"),
            Action::Coalesce => serializer.serialize_str("coalesce"),
            Action::SetTweak(tweak) => tweak.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActionDeserializeHelper {
    Str(String),
    SetTweak(Tweak),
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let helper: ActionDeserializeHelper = Deserialize::deserialize(deserializer)?;
        match helper {
            ActionDeserializeHelper::Str(s) => match &*s {
                "notify" => Ok(Action::Notify),
                "dont_notify" => Ok(Action::DontNotify),
                "coalesce" => Ok(Action::Coalesce),
                _ => Err(D::Error::custom("unrecognized action")),
            },
            ActionDeserializeHelper::SetTweak(tweak) => Ok(Action::SetTweak(tweak)),
        }
    }
}

/// A push rule as stored in the user's account data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushRule {
    /// The rule id. Server-default rules start with a `.`.
    pub rule_id: String,
    /// Whether this is a server-default rule.
    #[serde(default)]
    pub default: bool,
    /// Whether the rule is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// The actions to perform when the rule matches.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Conditions for `override`/`underride` rules, kept as raw JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,
    /// The glob pattern of a `content` rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

fn default_true() -> bool {
    true
}

impl PushRule {
    /// A minimal rule with the given id, enabled state and actions.
    pub fn new(rule_id: impl Into<String>, enabled: bool, actions: Vec<Action>) -> Self {
        PushRule {
            rule_id: rule_id.into(),
            default: false,
            enabled,
            actions,
            conditions: None,
            pattern: None,
        }
    }
}

/// A push rule together with the kind it was found under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPushRule {
    /// The kind of the rule.
    pub kind: RuleKind,
    /// The rule itself.
    #[serde(flatten)]
    pub rule: PushRule,
}

/// The `global` ruleset of the `/pushrules` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    /// The `override` rules.
    #[serde(rename = "override", default, skip_serializing_if = "Vec::is_empty")]
    pub override_: Vec<PushRule>,
    /// The `content` rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<PushRule>,
    /// The `room` rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub room: Vec<PushRule>,
    /// The `sender` rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sender: Vec<PushRule>,
    /// The `underride` rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub underride: Vec<PushRule>,
}

/// The kinds in evaluation order, which is also the lookup order used by
/// [`Ruleset::get_any`].
pub(crate) const KIND_ORDER: [RuleKind; 5] =
    [RuleKind::Override, RuleKind::Content, RuleKind::Room, RuleKind::Sender, RuleKind::Underride];

impl Ruleset {
    /// The rules of the given kind.
    pub fn rules(&self, kind: RuleKind) -> &[PushRule] {
        match kind {
            RuleKind::Override => &self.override_,
            RuleKind::Content => &self.content,
            RuleKind::Room => &self.room,
            RuleKind::Sender => &self.sender,
            RuleKind::Underride => &self.underride,
        }
    }

    fn rules_mut(&mut self, kind: RuleKind) -> &mut Vec<PushRule> {
        match kind {
            RuleKind::Override => &mut self.override_,
            RuleKind::Content => &mut self.content,
            RuleKind::Room => &mut self.room,
            RuleKind::Sender => &mut self.sender,
            RuleKind::Underride => &mut self.underride,
        }
    }

    /// Look up a rule by kind and id.
    pub fn get(&self, kind: RuleKind, rule_id: &str) -> Option<&PushRule> {
        self.rules(kind).iter().find(|rule| rule.rule_id == rule_id)
    }

    /// Look up a rule by id across all kinds, in evaluation order.
    pub fn get_any(&self, rule_id: &str) -> Option<(RuleKind, &PushRule)> {
        KIND_ORDER.iter().find_map(|&kind| {
            self.rules(kind).iter().find(|rule| rule.rule_id == rule_id).map(|rule| (kind, rule))
        })
    }

    /// Insert a rule, replacing an existing rule with the same id and kind.
    pub fn insert(&mut self, kind: RuleKind, rule: PushRule) {
        let rules = self.rules_mut(kind);
        if let Some(existing) = rules.iter_mut().find(|r| r.rule_id == rule.rule_id) {
            *existing = rule;
        } else {
            rules.push(rule);
        }
    }

    /// Remove a rule. Removing a missing rule is a no-op.
    pub fn remove(&mut self, kind: RuleKind, rule_id: &str) {
        self.rules_mut(kind).retain(|rule| rule.rule_id != rule_id);
    }

    /// Set whether a rule is enabled.
    pub fn set_enabled(&mut self, kind: RuleKind, rule_id: &str, enabled: bool) {
        if let Some(rule) = self.rules_mut(kind).iter_mut().find(|r| r.rule_id == rule_id) {
            rule.enabled = enabled;
        }
    }

    /// Set the actions of a rule.
    pub fn set_actions(&mut self, kind: RuleKind, rule_id: &str, actions: Vec<Action>) {
        if let Some(rule) = self.rules_mut(kind).iter_mut().find(|r| r.rule_id == rule_id) {
            rule.actions = actions;
        }
    }
}
