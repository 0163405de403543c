//! Error conditions.

use thiserror::Error;

/// Errors that can occur when manipulating push notification settings.
///
/// One variant per [`PushRuleClient`](crate::client::PushRuleClient)
/// operation; implementations map their transport failures onto these.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NotificationSettingsError {
    /// Unable to fetch the push rules.
    #[error("unable to load push rules")]
    UnableToLoadPushRules,

    /// Unable to add push rule.
    #[error("unable to add push rule")]
    UnableToAddPushRule,

    /// Unable to remove push rule.
    #[error("unable to remove push rule")]
    UnableToRemovePushRule,

    /// Unable to update push rule.
    #[error("unable to update push rule")]
    UnableToUpdatePushRule,
}
