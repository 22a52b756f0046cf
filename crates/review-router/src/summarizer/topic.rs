use crate::text::KeywordSet;

pub const GENERAL_TOPIC: &str = "General";

/// Topics in tie-break order.
const TOPICS: &[(&str, &[&str])] = &[
    (
        "Delivery",
        &[
            "delivery", "deliver", "shipping", "shipped", "package", "parcel",
            "arrived", "late", "driver", "courier", "tracking", "lost", "damaged",
            "box", "days", "week", "address", "door", "porch",
        ],
    ),
    (
        "Customer Service",
        &[
            "customer service", "support", "representative", "rep", "agent", "call",
            "phone", "chat", "help", "contact", "response", "wait", "hold",
            "escalate", "manager", "resolve", "unhelpful", "rude",
        ],
    ),
    (
        "Account/Prime",
        &[
            "prime", "membership", "subscription", "account", "login", "password",
            "locked", "suspended", "cancelled", "cancel", "charged", "billing",
            "payment", "credit card", "unauthorized",
        ],
    ),
    (
        "Refund/Return",
        &[
            "refund", "return", "money back", "reimburse", "credit", "exchange",
            "replacement", "policy", "denied", "rejected",
        ],
    ),
    (
        "Website/App",
        &[
            "website", "app", "site", "page", "checkout", "cart", "order", "search",
            "filter", "bug", "error", "crash", "slow", "glitch",
        ],
    ),
    (
        "Seller/Product",
        &[
            "seller", "vendor", "third party", "product", "item", "quality", "fake",
            "counterfeit", "authentic", "description", "picture", "review",
            "rating", "stars",
        ],
    ),
];

/// Keyword topic tagging; cheap enough to run on every review.
pub struct TopicClassifier {
    topics: Vec<(&'static str, KeywordSet)>,
}

impl TopicClassifier {
    pub fn new() -> Self {
        Self {
            topics: TOPICS
                .iter()
                .map(|(name, keywords)| (*name, KeywordSet::inflected(keywords)))
                .collect(),
        }
    }

    fn hits(&self, text: &str) -> Vec<(&'static str, usize)> {
        self.topics
            .iter()
            .map(|(name, keywords)| (*name, keywords.count_matches(text)))
            .filter(|(_, hits)| *hits > 0)
            .collect()
    }

    /// Best topic and its share of all keyword hits, rounded to 2
    /// decimals. Ties go to the earlier topic; no hits is
    /// `("General", 0.0)`.
    pub fn classify(&self, text: &str) -> (String, f64) {
        let hits = self.hits(text);
        let total: usize = hits.iter().map(|(_, h)| h).sum();

        let mut best: Option<(&str, usize)> = None;
        for (name, count) in &hits {
            if best.map_or(true, |(_, c)| *count > c) {
                best = Some((*name, *count));
            }
        }

        match best {
            Some((name, count)) if total > 0 => {
                let confidence = ((count as f64 / total as f64) * 100.0).round() / 100.0;
                (name.to_string(), confidence)
            }
            _ => (GENERAL_TOPIC.to_string(), 0.0),
        }
    }

    /// Every topic with at least one hit, by hit count descending (ties in
    /// topic order).
    pub fn all_topics(&self, text: &str) -> Vec<(String, usize)> {
        let mut hits = self.hits(text);
        hits.sort_by(|a, b| b.1.cmp(&a.1));
        hits.into_iter().map(|(name, h)| (name.to_string(), h)).collect()
    }
}

impl Default for TopicClassifier {
    fn default() -> Self {
        Self::new()
    }
}
