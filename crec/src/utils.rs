use chrono::{DateTime, Utc};
use std::time::Duration;

/// Whether a pull-based provider is due for a refresh.
///
/// Looking one refresh interval ahead, content older than the provider's
/// maximum age (in minutes) is refreshed now rather than served stale until
/// the next cycle. A provider that was never updated is always due.
pub fn needs_refresh(
    last_updated: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    refresh_interval: Duration,
    max_content_age_minutes: i64,
) -> bool {
    let Some(last_updated) = last_updated else {
        return true;
    };

    let next_refresh = chrono::Duration::from_std(refresh_interval)
        .ok()
        .and_then(|interval| now.checked_add_signed(interval))
        .unwrap_or(now);

    (next_refresh - last_updated).num_minutes() > max_content_age_minutes
}

/// Formats a `Cache-Control` value for client-side caching.
pub fn cache_control_header(max_age_seconds: u64) -> String {
    format!("max-age={}, must-revalidate", max_age_seconds)
}
