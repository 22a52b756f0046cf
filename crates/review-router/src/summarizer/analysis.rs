//! Structured results of per-review analysis and the JSON reply parser.

use serde::{Deserialize, Serialize};

use super::gatekeeper::ReviewCategory;

pub const JSON_SYSTEM_PROMPT: &str =
    "You are a JSON-only response bot. Only output valid JSON.";

pub const NEGATIVE_PROMPT: &str = r#"You are an Amazon Platform Review Analyst. Analyze this negative review about Amazon's service/platform.

REVIEW:
{review}

TASK: Extract root cause and categorize the issue.

RESPOND IN JSON FORMAT ONLY:
{
    "main_issue": "Delivery|Customer Service|Account/Prime|Refund/Return|Website/App|Seller Issue|Other",
    "issue_detail": "Brief description of the specific problem (max 20 words)",
    "severity": "High|Medium|Low",
    "tags": ["tag1", "tag2"],
    "summary": "One sentence summary of the complaint"
}

ISSUE CATEGORIES:
- Delivery: Late, lost, damaged, wrong address, driver issues
- Customer Service: Unhelpful, rude, long wait, no resolution
- Account/Prime: Unauthorized charges, cancellation issues, locked account
- Refund/Return: Refund denied, slow refund, return problems
- Website/App: Technical issues, misleading info, checkout problems
- Seller Issue: Third-party seller problems, fake products
- Other: Job application, general complaints

SEVERITY GUIDE:
- High: Unauthorized charges, account locked, legal threat, safety issue
- Medium: Significant delay, poor service, partial refund
- Low: Minor inconvenience, slow response

TAGS: Use short actionable tags. Return plain text only, do NOT include square brackets [] or special characters.
Examples: Late Delivery, Lost Package, Rude Support, Refund Denied, Prime Cancelled, Account Locked, Wrong Item, Unauthorized Charge"#;

pub const MIXED_PROMPT: &str = r#"You are an Amazon Platform Review Analyst. This review has mixed opinions about Amazon's service. Separate them clearly.

REVIEW:
{review}

TASK: Extract pros and cons about Amazon's platform/service.

RESPOND IN JSON FORMAT ONLY:
{
    "pros": ["positive point 1", "positive point 2"],
    "cons": ["negative point 1", "negative point 2"],
    "tags": ["tag1", "tag2"],
    "summary": "One balanced sentence summarizing the review"
}

IMPORTANT: Tags should be plain text only, do NOT include square brackets [] or special characters.

FOCUS ON:
- Delivery experience (speed, accuracy, driver behavior)
- Customer service quality
- Prime membership value
- Website/App usability
- Refund/Return process
- Overall shopping experience

Keep each point concise (max 10 words each)."#;

/// Closed taxonomy for the root cause of a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueCategory {
    Delivery,
    #[serde(rename = "Customer Service")]
    CustomerService,
    #[serde(rename = "Account/Prime")]
    AccountPrime,
    #[serde(rename = "Refund/Return")]
    RefundReturn,
    #[serde(rename = "Website/App")]
    WebsiteApp,
    #[serde(rename = "Seller Issue")]
    SellerIssue,
    #[serde(other)]
    Other,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 7] = [
        Self::Delivery,
        Self::CustomerService,
        Self::AccountPrime,
        Self::RefundReturn,
        Self::WebsiteApp,
        Self::SellerIssue,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delivery => "Delivery",
            Self::CustomerService => "Customer Service",
            Self::AccountPrime => "Account/Prime",
            Self::RefundReturn => "Refund/Return",
            Self::WebsiteApp => "Website/App",
            Self::SellerIssue => "Seller Issue",
            Self::Other => "Other",
        }
    }

    /// Case-insensitive; anything outside the taxonomy is `Other`.
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(label))
            .unwrap_or(Self::Other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(alias = "high")]
    High,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "low")]
    Low,
}

impl Severity {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisDetail {
    /// No model call was made.
    Skipped {
        summary: Option<String>,
        tags: Vec<String>,
    },
    Negative {
        main_issue: IssueCategory,
        issue_detail: Option<String>,
        severity: Option<Severity>,
        tags: Vec<String>,
        summary: Option<String>,
    },
    Mixed {
        pros: Vec<String>,
        cons: Vec<String>,
        tags: Vec<String>,
        summary: Option<String>,
    },
    /// The model answered but the reply held no usable JSON object.
    ParseFailure { raw: String, error: String },
    /// The model could not be called or the call failed.
    CallFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub original_text: String,
    pub category: ReviewCategory,
    pub topic: String,
    pub topic_confidence: f64,
    pub detail: AnalysisDetail,
}

impl AnalysisResult {
    pub fn tags(&self) -> &[String] {
        match &self.detail {
            AnalysisDetail::Skipped { tags, .. }
            | AnalysisDetail::Negative { tags, .. }
            | AnalysisDetail::Mixed { tags, .. } => tags,
            AnalysisDetail::ParseFailure { .. } | AnalysisDetail::CallFailed { .. } => &[],
        }
    }

    pub fn summary(&self) -> Option<&str> {
        match &self.detail {
            AnalysisDetail::Skipped { summary, .. }
            | AnalysisDetail::Negative { summary, .. }
            | AnalysisDetail::Mixed { summary, .. } => summary.as_deref(),
            AnalysisDetail::ParseFailure { .. } | AnalysisDetail::CallFailed { .. } => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self.detail,
            AnalysisDetail::ParseFailure { .. } | AnalysisDetail::CallFailed { .. }
        )
    }
}

#[derive(Deserialize)]
struct NegativeReply {
    #[serde(default)]
    main_issue: Option<String>,
    #[serde(default)]
    issue_detail: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Deserialize)]
struct MixedReply {
    #[serde(default)]
    pros: Vec<String>,
    #[serde(default)]
    cons: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    summary: Option<String>,
}

pub fn render_prompt(template: &str, review: &str) -> String {
    template.replace("{review}", review)
}

/// First balanced `{ ... }` span, ignoring braces inside JSON strings.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.replace(['[', ']'], "").trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn decode<T: for<'de> Deserialize<'de>>(raw: &str) -> Result<T, String> {
    let json = extract_json_object(raw).ok_or_else(|| "no JSON object in reply".to_string())?;
    serde_json::from_str(json).map_err(|e| e.to_string())
}

pub fn parse_negative_reply(raw: &str) -> AnalysisDetail {
    match decode::<NegativeReply>(raw) {
        Ok(reply) => AnalysisDetail::Negative {
            main_issue: reply
                .main_issue
                .as_deref()
                .map(IssueCategory::parse)
                .unwrap_or(IssueCategory::Other),
            issue_detail: non_empty(reply.issue_detail),
            severity: reply.severity.as_deref().and_then(Severity::parse),
            tags: clean_tags(reply.tags),
            summary: non_empty(reply.summary),
        },
        Err(error) => AnalysisDetail::ParseFailure {
            raw: raw.to_string(),
            error,
        },
    }
}

pub fn parse_mixed_reply(raw: &str) -> AnalysisDetail {
    match decode::<MixedReply>(raw) {
        Ok(reply) => AnalysisDetail::Mixed {
            pros: reply.pros,
            cons: reply.cons,
            tags: clean_tags(reply.tags),
            summary: non_empty(reply.summary),
        },
        Err(error) => AnalysisDetail::ParseFailure {
            raw: raw.to_string(),
            error,
        },
    }
}
