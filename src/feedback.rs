//! The feedback object returned by the model, and how a raw reply becomes one.
//!
//! Models are asked for bare JSON but regularly wrap it in ```json fences or
//! add a sentence before or after. [`parse_feedback`] strips that, parses the
//! remainder with serde and then checks that every score lies in 0–100.

use crate::error::ResumindError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize};

/// Upper bound for every score.
pub const MAX_SCORE: u32 = 100;

/// Whether a tip praises something or asks for a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TipKind {
    Good,
    Improve,
}

/// One piece of advice inside a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tip {
    #[serde(rename = "type")]
    pub kind: TipKind,
    /// Short title.
    pub tip: String,
    /// Longer explanation. ATS tips carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// A scored category with its tips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(deserialize_with = "whole_score")]
    pub score: u32,
    #[serde(default)]
    pub tips: Vec<Tip>,
}

/// Full scoring result for one resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    #[serde(deserialize_with = "whole_score")]
    pub overall_score: u32,
    #[serde(rename = "ATS")]
    pub ats: Category,
    pub tone_and_style: Category,
    pub content: Category,
    pub structure: Category,
    pub skills: Category,
}

/// Accept any non-negative JSON number and round it to the nearest integer.
/// Models sometimes answer `72.5` or `70.0`; the range check against
/// [`MAX_SCORE`] happens in [`Feedback::validate`].
fn whole_score<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if !value.is_finite() || value < 0.0 {
        return Err(de::Error::custom(format!(
            "score must be a number between 0 and {MAX_SCORE}, got {value}"
        )));
    }
    // Saturating cast; anything this large fails validation anyway.
    Ok(value.round() as u32)
}

impl Feedback {
    /// The four detail categories in display order, with their titles.
    pub fn categories(&self) -> [(&'static str, &Category); 4] {
        [
            ("Tone & Style", &self.tone_and_style),
            ("Content", &self.content),
            ("Structure", &self.structure),
            ("Skills", &self.skills),
        ]
    }

    /// Check every score is within `0..=MAX_SCORE`.
    pub fn validate(&self) -> Result<(), ResumindError> {
        let mut checks = vec![("overallScore", self.overall_score), ("ATS", self.ats.score)];
        checks.extend(self.categories().iter().map(|(name, c)| (*name, c.score)));

        for (name, score) in checks {
            if score > MAX_SCORE {
                return Err(ResumindError::InvalidFeedback {
                    detail: format!("{name} score {score} exceeds {MAX_SCORE}"),
                });
            }
        }
        Ok(())
    }
}

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[a-zA-Z]*\s*\n(.*)\n```\s*$").unwrap());

/// Reduce a model reply to the JSON object it contains.
///
/// Strips one pair of outer code fences, then keeps the text from the first
/// `{` to the last `}`. Returns the trimmed input when no braces are found so
/// the parse error points at the real reply.
pub fn extract_json(reply: &str) -> &str {
    let trimmed = reply.trim();
    let unfenced = match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps.get(1).map_or(trimmed, |m| m.as_str()),
        None => trimmed,
    };

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced.trim(),
    }
}

/// Parse and validate a model reply.
pub fn parse_feedback(reply: &str) -> Result<Feedback, ResumindError> {
    let json = extract_json(reply);
    if json.is_empty() {
        return Err(ResumindError::EmptyReply);
    }

    let feedback: Feedback =
        serde_json::from_str(json).map_err(|e| ResumindError::MalformedFeedback {
            detail: e.to_string(),
        })?;
    feedback.validate()?;
    Ok(feedback)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "overallScore": 78,
        "ATS": { "score": 72, "tips": [
            { "type": "good", "tip": "Standard section headings" },
            { "type": "improve", "tip": "Add keywords from the posting" }
        ]},
        "toneAndStyle": { "score": 80, "tips": [
            { "type": "good", "tip": "Confident voice", "explanation": "Action verbs lead every bullet." }
        ]},
        "content": { "score": 65, "tips": [] },
        "structure": { "score": 90, "tips": [] },
        "skills": { "score": 45, "tips": [
            { "type": "improve", "tip": "List cloud skills", "explanation": "The role asks for AWS." }
        ]}
    }"#;

    #[test]
    fn parses_plain_json() {
        let fb = parse_feedback(SAMPLE).unwrap();
        assert_eq!(fb.overall_score, 78);
        assert_eq!(fb.ats.tips.len(), 2);
        assert_eq!(fb.ats.tips[1].kind, TipKind::Improve);
        assert!(fb.ats.tips[0].explanation.is_none());
        assert_eq!(
            fb.tone_and_style.tips[0].explanation.as_deref(),
            Some("Action verbs lead every bullet.")
        );
    }

    #[test]
    fn strips_fences_and_chatter() {
        let fenced = format!("```json\n{SAMPLE}\n```");
        assert_eq!(parse_feedback(&fenced).unwrap().skills.score, 45);

        let chatty = format!("Here is the analysis:\n{SAMPLE}\nLet me know if you need more.");
        assert_eq!(parse_feedback(&chatty).unwrap().structure.score, 90);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = parse_feedback("{ \"overallScore\": 10, ").unwrap_err();
        assert!(matches!(err, ResumindError::MalformedFeedback { .. }));
    }

    #[test]
    fn rejects_missing_category() {
        let err = parse_feedback(r#"{ "overallScore": 10 }"#).unwrap_err();
        assert!(matches!(err, ResumindError::MalformedFeedback { .. }));
    }

    #[test]
    fn rejects_out_of_range_score() {
        let bad = SAMPLE.replace("\"score\": 90", "\"score\": 190");
        let err = parse_feedback(&bad).unwrap_err();
        match err {
            ResumindError::InvalidFeedback { detail } => assert!(detail.contains("Structure")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejects_negative_score() {
        let bad = SAMPLE.replace("\"overallScore\": 78", "\"overallScore\": -3");
        assert!(matches!(
            parse_feedback(&bad).unwrap_err(),
            ResumindError::MalformedFeedback { .. }
        ));
    }

    #[test]
    fn accepts_fractional_scores() {
        let fractional = SAMPLE
            .replace("\"overallScore\": 78", "\"overallScore\": 72.5")
            .replace("\"score\": 45", "\"score\": 70.0");
        let fb = parse_feedback(&fractional).unwrap();
        assert_eq!(fb.overall_score, 73);
        assert_eq!(fb.skills.score, 70);
    }

    #[test]
    fn rounds_before_range_check() {
        let edge = SAMPLE.replace("\"score\": 90", "\"score\": 100.4");
        assert_eq!(parse_feedback(&edge).unwrap().structure.score, 100);

        let over = SAMPLE.replace("\"score\": 90", "\"score\": 100.6");
        assert!(matches!(
            parse_feedback(&over).unwrap_err(),
            ResumindError::InvalidFeedback { .. }
        ));

        let negative = SAMPLE.replace("\"score\": 90", "\"score\": -0.2");
        assert!(matches!(
            parse_feedback(&negative).unwrap_err(),
            ResumindError::MalformedFeedback { .. }
        ));
    }

    #[test]
    fn empty_reply() {
        assert!(matches!(parse_feedback("   ").unwrap_err(), ResumindError::EmptyReply));
    }

    #[test]
    fn serialises_with_original_field_names() {
        let fb = parse_feedback(SAMPLE).unwrap();
        let v = serde_json::to_value(&fb).unwrap();
        assert!(v.get("ATS").is_some());
        assert!(v.get("toneAndStyle").is_some());
        assert_eq!(v["ATS"]["tips"][0]["type"], "good");
    }
}
