// src/audit/score.rs
// =============================================================================
// Per-page health score.
//
// Every page starts at 100. Each failed check subtracts its penalty and adds
// a reason; checks are independent, so several can apply at once. An HTTP
// error (or no response at all) forces the score to 0.
//
// | Check                    | Penalty | Reason                     |
// |--------------------------|---------|----------------------------|
// | empty title              | 20      | Missing title              |
// | empty meta description   | 10      | Missing meta description   |
// | no <h1>                  | 10      | Missing H1                 |
// | fewer than 100 words     | 5       | Low word count (<100)      |
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::analyze::PageAnalysis;
use crate::crawl::FetchResult;

pub const MIN_WORD_COUNT: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageScore {
    /// 0..=100
    pub score: u8,
    /// In the order the checks run
    pub reasons: Vec<String>,
}

// Scores one page. Pure: same inputs, same output.
pub fn score_page(analysis: &PageAnalysis, fetch: &FetchResult) -> PageScore {
    let checks = [
        (analysis.title.length == 0, 20, "Missing title"),
        (analysis.meta_description.length == 0, 10, "Missing meta description"),
        (analysis.h1.count == 0, 10, "Missing H1"),
        (analysis.word_count < MIN_WORD_COUNT, 5, "Low word count (<100)"),
    ];

    let mut score: i32 = 100;
    let mut reasons = Vec::new();

    for (failed, penalty, reason) in checks {
        if failed {
            score -= penalty;
            reasons.push(reason.to_string());
        }
    }

    match fetch.http_status {
        Some(status) if status < 400 => {}
        status => {
            score = 0;
            let status = status.map_or_else(|| "none".to_string(), |s| s.to_string());
            reasons.push(format!("HTTP error: {}", status));
        }
    }

    PageScore {
        score: score.clamp(0, 100) as u8,
        reasons,
    }
}
