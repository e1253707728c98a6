//! Helpers over proposal text returned by the API.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Duration assumed when a proposal names none, in months.
pub const DEFAULT_DURATION_MONTHS: u32 = 3;

/// Title of the single section produced for a proposal without headings.
pub const FULL_PROPOSAL_TITLE: &str = "Full proposal";

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"###\s+").expect("Invalid heading regex"));

// Japanese month counts ("3ヶ月", "6カ月", "3-6ヶ月") are tried before English
// ones ("4 months", "2-4 months").
static DURATION_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"([0-9]+)[-〜～]?([0-9]+)?[ヶカか]?月").expect("Invalid duration regex"),
        Regex::new(r"(?i)([0-9]+)[-〜～]?([0-9]+)?\s*months?").expect("Invalid duration regex"),
    ]
});

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProposalSection {
    pub title: String,
    pub content: String,
}

/// Split a markdown proposal on `### ` headings.
///
/// Text before the first heading is dropped, as are sections with no body.
/// A proposal without headings becomes one section titled
/// [`FULL_PROPOSAL_TITLE`].
pub fn split_proposal_into_sections(proposal: &str) -> Vec<ProposalSection> {
    let mut pieces = HEADING.split(proposal);
    let _preamble = pieces.next();
    let sections: Vec<&str> = pieces.collect();

    if sections.is_empty() {
        return vec![ProposalSection {
            title: FULL_PROPOSAL_TITLE.to_string(),
            content: proposal.to_string(),
        }];
    }

    sections
        .into_iter()
        .filter_map(|section| {
            let section = section.trim();
            let (title, body) = section.split_once('\n').unwrap_or((section, ""));
            let content = body.trim();
            (!content.is_empty()).then(|| ProposalSection {
                title: title.trim().to_string(),
                content: content.to_string(),
            })
        })
        .collect()
}

/// First project duration mentioned in `text`, in months.
///
/// A range such as `3-6ヶ月` gives its rounded average. Falls back to
/// [`DEFAULT_DURATION_MONTHS`].
pub fn extract_duration_months(text: &str) -> u32 {
    DURATION_PATTERNS
        .iter()
        .find_map(|re| {
            let caps = re.captures(text)?;
            let low: u32 = caps.get(1)?.as_str().parse().ok()?;
            match caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) {
                // The average of two u32 values always fits back into u32.
                Some(high) => u32::try_from((u64::from(low) + u64::from(high)).div_ceil(2)).ok(),
                None => Some(low),
            }
        })
        .unwrap_or(DEFAULT_DURATION_MONTHS)
}
