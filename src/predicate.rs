//! Redaction Predicate
//!
//! One completion call per piece of content: a system turn carrying the moderation
//! instructions with the current policy interpolated, and a user turn with the content.

use crate::error::{ApiError, ParseError};
use crate::policy::PolicyStore;
use crate::provider::{ChatMessage, CompletionClient};
use std::sync::Arc;
use tracing::{debug, warn};

const DROP_MARKER: &str = "DROP";
const FORWARD_MARKER: &str = "FORWARD";

/// Parsed classification decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Block the content
    Drop,
    /// Allow the content
    Forward,
}

impl Verdict {
    pub fn is_drop(self) -> bool {
        matches!(self, Verdict::Drop)
    }
}

/// System turn for a classification request.
pub fn moderation_prompt(policy: &str) -> String {
    format!(
        "Use the following guidelines to evaluate the user's message, and respond with a \
decision for blocking or allowing the content based on the following: {} To block, output \
'DROP'. To allow, output 'FORWARD'. Please be terse and output one of DROP or FORWARD.",
        policy
    )
}

/// Case-sensitive marker search. `DROP` wins when both markers appear.
pub fn parse_verdict(response: &str) -> Result<Verdict, ParseError> {
    if response.contains(DROP_MARKER) {
        Ok(Verdict::Drop)
    } else if response.contains(FORWARD_MARKER) {
        Ok(Verdict::Forward)
    } else {
        Err(ParseError::AmbiguousVerdict {
            response: response.to_string(),
        })
    }
}

/// Policy-driven binary classifier
pub struct RedactionPredicate {
    client: Arc<dyn CompletionClient>,
    policy: Arc<PolicyStore>,
    model: String,
}

impl RedactionPredicate {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        policy: Arc<PolicyStore>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            policy,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Issue the classification call and parse the verdict.
    ///
    /// Reads a snapshot of the policy at call time; a fold finishing mid-call is
    /// not observed.
    pub async fn classify(&self, content: &str) -> Result<Verdict, ApiError> {
        let messages = vec![
            ChatMessage::system(moderation_prompt(&self.policy.effective())),
            ChatMessage::user(content),
        ];
        let response = self.client.complete(messages, &self.model).await?;
        Ok(parse_verdict(&response)?)
    }

    /// True when the content should be redacted.
    ///
    /// Ambiguous responses allow the content and emit a diagnostic. Transport
    /// and configuration errors propagate to the caller.
    pub async fn should_redact(&self, content: &str) -> Result<bool, ApiError> {
        match self.classify(content).await {
            Ok(verdict) => {
                debug!(?verdict, content_len = content.chars().count(), "Classified");
                Ok(verdict.is_drop())
            }
            Err(ApiError::Parse(err)) => {
                warn!(error = %err, "Ambiguous classification response, allowing content");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}
