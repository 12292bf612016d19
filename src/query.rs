use chrono::{DateTime, Local, TimeDelta};

use crate::index::{ApplicationIndex, ApplicationRecord};

/// Reports longer than this many characters are cut.
pub const REPORT_LIMIT: usize = 4000;
pub const TRUNCATION_MARKER: &str = "\n... (обрезано)";

const TIMESTAMP_FORMAT: &str = "%d.%m %H:%M";

/// Trailing time window of a query, with the token the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub span: TimeDelta,
    pub token: String,
}

impl Window {
    pub fn new(span: TimeDelta, token: impl Into<String>) -> Self {
        Self {
            span,
            token: token.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    /// Nothing was ever stored for the article.
    UnknownArticle { article: String },
    /// Records exist, but none fall inside the window.
    EmptyWindow { article: String, period: String },
    Report(String),
}

impl QueryOutcome {
    pub fn into_reply(self) -> String {
        match self {
            QueryOutcome::UnknownArticle { article } => {
                format!("📭 Нет заявок по артикулу: `{}`", article)
            }
            QueryOutcome::EmptyWindow { article, period } => {
                format!("📭 Нет заявок по `{}` {}.", article, period)
            }
            QueryOutcome::Report(text) => text,
        }
    }
}

pub fn period_label(window: Option<&Window>) -> String {
    match window {
        Some(w) => format!("за последние {}", w.token),
        None => "за всё время".to_string(),
    }
}

/// Filter the article's records by window, rank them by amount and render a report.
pub fn query(
    index: &ApplicationIndex,
    article: &str,
    window: Option<&Window>,
    now: DateTime<Local>,
) -> QueryOutcome {
    let records = index.get(article);
    if records.is_empty() {
        return QueryOutcome::UnknownArticle {
            article: article.to_string(),
        };
    }

    let mut kept = match window {
        Some(w) => within_window(records, w.span, now),
        None => records,
    };
    let period = period_label(window);
    if kept.is_empty() {
        return QueryOutcome::EmptyWindow {
            article: article.to_string(),
            period,
        };
    }

    // Stable: equal amounts keep their insertion order.
    kept.sort_by(|a, b| b.amount.cmp(&a.amount));
    QueryOutcome::Report(truncate_report(render_report(article, &period, &kept)))
}

fn within_window(
    records: Vec<ApplicationRecord>,
    span: TimeDelta,
    now: DateTime<Local>,
) -> Vec<ApplicationRecord> {
    // A cutoff before the representable range keeps everything.
    let Some(cutoff) = now.checked_sub_signed(span) else {
        return records;
    };
    records
        .into_iter()
        .filter(|r| r.timestamp >= cutoff)
        .collect()
}

pub fn render_report(article: &str, period: &str, records: &[ApplicationRecord]) -> String {
    let mut out = format!("📋 Аукцион: *{}*\n📅 {}\n\n", article, period);
    for r in records {
        out.push_str(&format!(
            "• *{}*\n  Сумма: {} ₽\n  Время: {}\n\n",
            r.input,
            r.amount,
            r.timestamp.format(TIMESTAMP_FORMAT)
        ));
    }
    out
}

/// Hard cut on character count; it may land mid-entry.
pub fn truncate_report(report: String) -> String {
    if report.chars().count() <= REPORT_LIMIT {
        return report;
    }
    let mut cut: String = report.chars().take(REPORT_LIMIT).collect();
    cut.push_str(TRUNCATION_MARKER);
    cut
}

// ── Tests ──
