//! Keyword-based document analysis.
//!
//! Produces lightweight insights (topics, routing hints, confidentiality)
//! for a submitted document without any external model dependency.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during document analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Document is empty")]
    EmptyDocument,
}

/// Overall tone detected in a document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Neutral,
    Positive,
    Urgent,
}

/// How carefully a document should be handled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confidentiality {
    Standard,
    Sensitive,
    Confidential,
}

/// Insights extracted from a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInsights {
    /// One-line description of the document.
    pub summary: String,
    /// Departments the document should likely be routed to.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_recipients: Vec<String>,
    /// Handling notes worth surfacing before sending.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content_warnings: Vec<String>,
    pub sentiment: Sentiment,
    /// All detected topics, primary first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    pub confidentiality: Confidentiality,
}

/// Analyzes a document and produces insights.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<DocumentInsights, AnalysisError>;
}

/// Topic signatures for keyword matching.
struct TopicPattern {
    topic: &'static str,
    keywords: &'static [&'static str],
    summary: &'static str,
    recipients: &'static [&'static str],
    sentiment: Sentiment,
    confidentiality: Confidentiality,
    warnings: &'static [&'static str],
}

/// Known document topics for automatic analysis.
const PATTERNS: &[TopicPattern] = &[
    TopicPattern {
        topic: "contract",
        keywords: &[
            "contract",
            "agreement",
            "terms and conditions",
            "parties agree",
            "hereby agrees",
            "signature",
        ],
        summary: "Contract or agreement document",
        recipients: &["legal"],
        sentiment: Sentiment::Neutral,
        confidentiality: Confidentiality::Confidential,
        warnings: &["Contains legally binding terms"],
    },
    TopicPattern {
        topic: "invoice",
        keywords: &[
            "invoice",
            "bill",
            "amount due",
            "total due",
            "payment due",
            "remittance",
        ],
        summary: "Invoice or billing document",
        recipients: &["accounting", "finance"],
        sentiment: Sentiment::Neutral,
        confidentiality: Confidentiality::Sensitive,
        warnings: &["Contains payment details"],
    },
    TopicPattern {
        topic: "report",
        keywords: &[
            "report",
            "summary",
            "quarterly",
            "annual",
            "findings",
            "overview",
        ],
        summary: "Report or summary document",
        recipients: &["management"],
        sentiment: Sentiment::Neutral,
        confidentiality: Confidentiality::Standard,
        warnings: &[],
    },
    TopicPattern {
        topic: "complaint",
        keywords: &[
            "complaint",
            "dissatisfied",
            "unacceptable",
            "escalation",
            "refund",
            "dispute",
        ],
        summary: "Complaint or escalation",
        recipients: &["support"],
        sentiment: Sentiment::Urgent,
        confidentiality: Confidentiality::Sensitive,
        warnings: &["Customer escalation"],
    },
    TopicPattern {
        topic: "proposal",
        keywords: &[
            "proposal",
            "quotation",
            "quote",
            "offer",
            "estimate",
            "pricing",
        ],
        summary: "Proposal or quotation",
        recipients: &["sales"],
        sentiment: Sentiment::Positive,
        confidentiality: Confidentiality::Confidential,
        warnings: &[],
    },
];

/// How much of the document body is scanned for keywords.
const SCAN_LIMIT: usize = 4096;

/// Keyword matcher over the file name and the head of the document body.
pub struct KeywordAnalyzer;

impl KeywordAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for KeywordAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentAnalyzer for KeywordAnalyzer {
    async fn analyze(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<DocumentInsights, AnalysisError> {
        if bytes.is_empty() {
            return Err(AnalysisError::EmptyDocument);
        }

        let head = &bytes[..bytes.len().min(SCAN_LIMIT)];
        let haystack = format!(
            "{} {}",
            file_name.to_lowercase(),
            String::from_utf8_lossy(head).to_lowercase()
        );

        let mut matches: Vec<(&TopicPattern, usize)> = Vec::new();
        for pattern in PATTERNS {
            let hits = pattern
                .keywords
                .iter()
                .filter(|keyword| haystack.contains(&keyword.to_lowercase()))
                .count();
            if hits > 0 {
                matches.push((pattern, hits));
            }
        }
        matches.sort_by(|a, b| b.1.cmp(&a.1));

        let insights = match matches.first() {
            Some((primary, _)) => DocumentInsights {
                summary: primary.summary.to_string(),
                suggested_recipients: primary.recipients.iter().map(|r| r.to_string()).collect(),
                content_warnings: primary.warnings.iter().map(|w| w.to_string()).collect(),
                sentiment: primary.sentiment,
                topics: matches.iter().map(|(p, _)| p.topic.to_string()).collect(),
                confidentiality: primary.confidentiality,
            },
            None => DocumentInsights {
                summary: "General correspondence".to_string(),
                suggested_recipients: Vec::new(),
                content_warnings: Vec::new(),
                sentiment: Sentiment::Neutral,
                topics: vec!["general".to_string()],
                confidentiality: Confidentiality::Standard,
            },
        };

        Ok(insights)
    }
}

/// Runs analysis and swallows errors, logging instead. Analysis never
/// blocks or fails a transmission.
pub async fn analyze_best_effort(
    analyzer: &dyn DocumentAnalyzer,
    file_name: &str,
    bytes: &[u8],
) -> Option<DocumentInsights> {
    match analyzer.analyze(file_name, bytes).await {
        Ok(insights) => Some(insights),
        Err(e) => {
            log::warn!("Analysis of '{}' failed: {}", file_name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_document_rejected() {
        let analyzer = KeywordAnalyzer::new();
        let result = analyzer.analyze("empty.pdf", b"").await;
        assert!(matches!(result, Err(AnalysisError::EmptyDocument)));
    }

    #[tokio::test]
    async fn test_detects_contract_from_filename() {
        let analyzer = KeywordAnalyzer::new();
        let insights = analyzer
            .analyze("service-contract-2026.pdf", b"lorem ipsum")
            .await
            .unwrap();

        assert_eq!(insights.topics, vec!["contract"]);
        assert_eq!(insights.confidentiality, Confidentiality::Confidential);
        assert_eq!(insights.suggested_recipients, vec!["legal"]);
        assert_eq!(insights.content_warnings, vec!["Contains legally binding terms"]);
    }

    #[tokio::test]
    async fn test_detects_invoice_from_body() {
        let analyzer = KeywordAnalyzer::new();
        let insights = analyzer
            .analyze("scan001.pdf", b"INVOICE #42\nAmount due: $100.00")
            .await
            .unwrap();

        assert_eq!(insights.summary, "Invoice or billing document");
        assert!(insights.topics.contains(&"invoice".to_string()));
        assert_eq!(insights.sentiment, Sentiment::Neutral);
    }

    #[tokio::test]
    async fn test_primary_topic_has_most_hits() {
        let analyzer = KeywordAnalyzer::new();
        // One contract keyword, three complaint keywords.
        let insights = analyzer
            .analyze(
                "letter.pdf",
                b"This complaint about your contract is unacceptable, we demand a refund.",
            )
            .await
            .unwrap();

        assert_eq!(insights.topics[0], "complaint");
        assert!(insights.topics.contains(&"contract".to_string()));
        assert_eq!(insights.sentiment, Sentiment::Urgent);
    }

    #[tokio::test]
    async fn test_no_match_falls_back_to_general() {
        let analyzer = KeywordAnalyzer::new();
        let insights = analyzer
            .analyze("photo.jpg", b"\x89PNG\r\n\x1a\n")
            .await
            .unwrap();

        assert_eq!(insights.topics, vec!["general"]);
        assert_eq!(insights.summary, "General correspondence");
        assert_eq!(insights.confidentiality, Confidentiality::Standard);
        assert!(insights.suggested_recipients.is_empty());
    }

    #[tokio::test]
    async fn test_keywords_beyond_scan_limit_ignored() {
        let analyzer = KeywordAnalyzer::new();
        let mut body = vec![b'x'; SCAN_LIMIT];
        body.extend_from_slice(b" invoice amount due");

        let insights = analyzer.analyze("doc.pdf", &body).await.unwrap();
        assert_eq!(insights.topics, vec!["general"]);
    }

    #[tokio::test]
    async fn test_best_effort_swallows_errors() {
        let analyzer = KeywordAnalyzer::new();
        assert!(analyze_best_effort(&analyzer, "empty.pdf", b"").await.is_none());
        assert!(analyze_best_effort(&analyzer, "a.pdf", b"report findings")
            .await
            .is_some());
    }

    #[test]
    fn test_insights_serialization() {
        let insights = DocumentInsights {
            summary: "Invoice or billing document".to_string(),
            suggested_recipients: vec!["accounting".to_string()],
            content_warnings: Vec::new(),
            sentiment: Sentiment::Neutral,
            topics: vec!["invoice".to_string()],
            confidentiality: Confidentiality::Sensitive,
        };
        let json = serde_json::to_string(&insights).unwrap();

        assert!(json.contains("\"suggestedRecipients\":[\"accounting\"]"));
        assert!(json.contains("\"confidentiality\":\"sensitive\""));
        assert!(!json.contains("contentWarnings"));
    }
}
