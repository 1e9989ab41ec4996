use crate::types::{DocumentStats, Performance, PerformanceLevel};

const MB: f64 = 1024.0 * 1024.0;

/// Classify a document by estimated size, node count, and parse time.
/// All thresholds are strictly greater-than, so a document of exactly 5 MB
/// is not yet large.
pub fn classify(stats: &DocumentStats) -> Performance {
    let mb = stats.estimated_size as f64 / MB;
    let nodes = stats.node_count;
    let parse_ms = stats.parse_ms;

    let is_large = mb > 5.0 || nodes > 1000;
    let is_very_large = mb > 50.0 || nodes > 10_000;
    let should_virtualize = mb > 10.0 || nodes > 5000;

    let level = if mb > 100.0 || parse_ms > 5000.0 || nodes > 100_000 {
        PerformanceLevel::Critical
    } else if mb > 20.0 || parse_ms > 2000.0 || nodes > 10_000 {
        PerformanceLevel::Warning
    } else if mb > 5.0 || parse_ms > 1000.0 || nodes > 1000 {
        PerformanceLevel::Good
    } else {
        PerformanceLevel::Excellent
    };

    let mut recommendations = Vec::new();
    match level {
        PerformanceLevel::Critical => {
            recommendations
                .push("Document is very large; process it in chunks and keep virtualized rendering on.".to_string());
        }
        PerformanceLevel::Warning => {
            recommendations
                .push("Enable virtualized rendering to keep the view responsive.".to_string());
        }
        PerformanceLevel::Good => {
            recommendations
                .push("Large document; consider virtualized rendering for smoother scrolling.".to_string());
        }
        PerformanceLevel::Excellent => {}
    }

    Performance {
        level,
        is_large,
        is_very_large,
        should_virtualize,
        recommendations,
    }
}
