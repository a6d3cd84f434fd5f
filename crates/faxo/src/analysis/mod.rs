//! Document analysis.
//!
//! A keyword heuristic over document names and content that yields
//! routing hints for submitted faxes.

pub mod analyzer;

pub use analyzer::{
    analyze_best_effort, AnalysisError, Confidentiality, DocumentAnalyzer, DocumentInsights,
    KeywordAnalyzer, Sentiment,
};
