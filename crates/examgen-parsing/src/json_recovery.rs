//! Lenient JSON recovery for generative-backend output.
//!
//! Models asked for "strict JSON" still wrap answers in code fences or
//! prose often enough that a strict parse alone is not viable. The
//! strategy is: parse raw; on failure strip known wrapper patterns; on
//! failure slice the outermost braces; then give up. Never assume
//! well-formed output.

use serde_json::Value;

/// Try to recover a JSON value from raw model output.
///
/// Returns `None` when nothing parseable can be salvaged; callers treat
/// that as the "nothing detected" degraded state, not an error.
pub fn parse_lenient_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Some(inner) = strip_code_fence(trimmed)
        && let Ok(value) = serde_json::from_str(inner.trim())
    {
        return Some(value);
    }

    if let Some(slice) = outermost_braces(trimmed)
        && let Ok(value) = serde_json::from_str(slice)
    {
        return Some(value);
    }

    None
}

/// Strip a ``` or ```json fence pair, returning the interior.
fn strip_code_fence(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    // Skip an optional language tag on the fence line.
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let end = body.rfind("```")?;
    Some(&body[..end])
}

/// Slice from the first `{` to the last `}` inclusive.
fn outermost_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}
