//! Webhook event vocabulary
//!
//! The signing service only ever sends these names. The set is closed:
//! anything else is an input error, never a missing handler.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HrFlowError;

/// Event names carried in the `type` field of a webhook payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEvent {
    #[serde(rename = "profile.parse.success")]
    ProfileParseSuccess,
    #[serde(rename = "profile.parse.error")]
    ProfileParseError,
    #[serde(rename = "profile.score.success")]
    ProfileScoreSuccess,
    #[serde(rename = "profile.score.error")]
    ProfileScoreError,
    #[serde(rename = "job.train.success")]
    JobTrainSuccess,
    #[serde(rename = "job.train.error")]
    JobTrainError,
    #[serde(rename = "job.train.start")]
    JobTrainStart,
    #[serde(rename = "job.score.success")]
    JobScoreSuccess,
    #[serde(rename = "job.score.error")]
    JobScoreError,
    #[serde(rename = "job.score.start")]
    JobScoreStart,
    #[serde(rename = "action.stage.success")]
    ActionStageSuccess,
    #[serde(rename = "action.stage.error")]
    ActionStageError,
    #[serde(rename = "action.rating.success")]
    ActionRatingSuccess,
    #[serde(rename = "action.rating.error")]
    ActionRatingError,
}

impl WebhookEvent {
    /// Every known event, in wire order
    pub const ALL: [WebhookEvent; 14] = [
        WebhookEvent::ProfileParseSuccess,
        WebhookEvent::ProfileParseError,
        WebhookEvent::ProfileScoreSuccess,
        WebhookEvent::ProfileScoreError,
        WebhookEvent::JobTrainSuccess,
        WebhookEvent::JobTrainError,
        WebhookEvent::JobTrainStart,
        WebhookEvent::JobScoreSuccess,
        WebhookEvent::JobScoreError,
        WebhookEvent::JobScoreStart,
        WebhookEvent::ActionStageSuccess,
        WebhookEvent::ActionStageError,
        WebhookEvent::ActionRatingSuccess,
        WebhookEvent::ActionRatingError,
    ];

    /// Wire name, e.g. `profile.parse.success`
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::ProfileParseSuccess => "profile.parse.success",
            WebhookEvent::ProfileParseError => "profile.parse.error",
            WebhookEvent::ProfileScoreSuccess => "profile.score.success",
            WebhookEvent::ProfileScoreError => "profile.score.error",
            WebhookEvent::JobTrainSuccess => "job.train.success",
            WebhookEvent::JobTrainError => "job.train.error",
            WebhookEvent::JobTrainStart => "job.train.start",
            WebhookEvent::JobScoreSuccess => "job.score.success",
            WebhookEvent::JobScoreError => "job.score.error",
            WebhookEvent::JobScoreStart => "job.score.start",
            WebhookEvent::ActionStageSuccess => "action.stage.success",
            WebhookEvent::ActionStageError => "action.stage.error",
            WebhookEvent::ActionRatingSuccess => "action.rating.success",
            WebhookEvent::ActionRatingError => "action.rating.error",
        }
    }

    pub fn is_error(&self) -> bool {
        self.as_str().ends_with(".error")
    }
}

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookEvent {
    type Err = HrFlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WebhookEvent::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| HrFlowError::UnknownEvent(s.to_string()))
    }
}
