use common::models::AdvisorAnalysis;

use crate::AdvisorError;

/// The model answers in prose with an embedded JSON object, often inside a
/// code fence. Take the span from the first `{` to the last `}` and parse
/// that; anything else is treated as unavailable.
pub fn parse_analysis(text: &str) -> Result<AdvisorAnalysis, AdvisorError> {
    let json = extract_object(text)
        .ok_or_else(|| AdvisorError::Unavailable("no JSON object in response".to_string()))?;

    serde_json::from_str(json).map_err(|e| AdvisorError::Unavailable(e.to_string()))
}

fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
