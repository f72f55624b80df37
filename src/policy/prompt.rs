//! Fold prompt construction and response parsing.

use crate::error::ParseError;

/// Policy used until the first successful fold.
pub const DEFAULT_POLICY: &str = "Please flag content that refers to holes. \
Please flag content that refers to squids. \
Please flag content that refers to large language models or AI.";

const FENCE: &str = "```";

/// Build the user turn asking the model to merge `sample` into `policy`.
pub fn build_fold_prompt(policy: &str, sample: &str) -> String {
    format!(
        "The following is a summary of the flagged content so far:\n\
{fence}\n{policy}\n{fence}\n\n\
The following new content was flagged:\n\
{fence}\n{sample}\n{fence}\n\n\
Update the summary to also flag the new content. Please keep the summary concise.\n\
You can drop sections if the newly added content will include it. \
Wrap your final summary in triple back quotes, like {fence}.\n\
Remember to output in the same format as the input.",
        fence = FENCE,
        policy = policy,
        sample = sample,
    )
}

/// Extract the new policy from a fold response.
///
/// The response is split on ``` fences; the first fenced block (segment 1) is the
/// policy, trimmed. Fewer than three segments means no complete block was emitted.
/// A block that is empty after trimming is rejected so a bad response cannot wipe
/// the policy.
pub fn parse_fenced_policy(response: &str) -> Result<String, ParseError> {
    let segments: Vec<&str> = response.split(FENCE).collect();
    if segments.len() < 3 {
        return Err(ParseError::MissingFence {
            segments: segments.len(),
        });
    }
    let policy = segments[1].trim();
    if policy.is_empty() {
        return Err(ParseError::EmptyFence);
    }
    Ok(policy.to_string())
}
