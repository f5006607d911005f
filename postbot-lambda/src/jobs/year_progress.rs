//! Year progress: how much of the current year has elapsed, in a fixed
//! local offset, rounded to the nearest hour.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};
use postbot_core::{error::Result, PostbotError, Posted, SocialPoster};

use crate::context::JobContext;

pub async fn run(ctx: &JobContext) -> Result<Posted> {
    let cfg = &ctx.config.year_progress;
    let poster = ctx.poster().await?;

    // The schedule fires a little before the hour; wait for it to turn.
    if cfg.delay_seconds > 0 {
        tracing::debug!(seconds = cfg.delay_seconds, "Waiting before computing progress");
        tokio::time::sleep(std::time::Duration::from_secs(cfg.delay_seconds)).await;
    }

    let offset = FixedOffset::east_opt(cfg.utc_offset_hours * 3600).ok_or_else(|| {
        PostbotError::InvalidConfig(format!(
            "year_progress.utc_offset_hours out of range: {}",
            cfg.utc_offset_hours
        ))
    })?;

    post_progress(&poster, Utc::now().with_timezone(&offset)).await
}

pub async fn post_progress(
    poster: &dyn SocialPoster,
    now: DateTime<FixedOffset>,
) -> Result<Posted> {
    let text = progress_text(now).ok_or_else(|| {
        PostbotError::InvalidConfig(format!("cannot compute year progress for {}", now))
    })?;
    tracing::info!(text = %text, "Posting year progress");
    poster.post_text(&text).await
}

pub fn progress_text(now: DateTime<FixedOffset>) -> Option<String> {
    let (rounded, percent) = year_progress(now)?;
    Some(format!(
        "{:.3}% of the year {} has passed.",
        percent,
        rounded.format("%Y")
    ))
}

/// Round `now` to the nearest hour and return it with the elapsed share of
/// its year, in percent.
pub fn year_progress(now: DateTime<FixedOffset>) -> Option<(DateTime<FixedOffset>, f64)> {
    let rounded = round_to_hour(now)?;
    let offset = *rounded.offset();
    let year = chrono::Datelike::year(&rounded);

    let start = start_of_year(year, offset)?;
    let end = start_of_year(year + 1, offset)?;

    let elapsed = (rounded - start).num_seconds() as f64;
    let total = (end - start).num_seconds() as f64;
    Some((rounded, elapsed / total * 100.0))
}

fn round_to_hour(now: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    let floor = now
        .with_minute(0)?
        .with_second(0)?
        .with_nanosecond(0)?;
    if now.minute() >= 30 {
        Some(floor + Duration::hours(1))
    } else {
        Some(floor)
    }
}

fn start_of_year(year: i32, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    NaiveDate::from_ymd_opt(year, 1, 1)?
        .and_hms_opt(0, 0, 0)?
        .and_local_timezone(offset)
        .single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::fakes::FakePoster;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn test_midyear() {
        // 2025 is not a leap year: Jul 2 12:00 is day 182.5 of 365
        assert_eq!(
            progress_text(at("2025-07-02T12:10:00+09:00")).unwrap(),
            "50.000% of the year 2025 has passed."
        );
    }

    #[test]
    fn test_rounds_into_next_year() {
        assert_eq!(
            progress_text(at("2024-12-31T23:45:00+09:00")).unwrap(),
            "0.000% of the year 2025 has passed."
        );
    }

    #[test]
    fn test_minute_29_rounds_down() {
        let (rounded, _) = year_progress(at("2025-03-01T08:29:59+09:00")).unwrap();
        assert_eq!(rounded, at("2025-03-01T08:00:00+09:00"));
    }

    #[test]
    fn test_minute_30_rounds_up() {
        let (rounded, _) = year_progress(at("2025-03-01T08:30:00+09:00")).unwrap();
        assert_eq!(rounded, at("2025-03-01T09:00:00+09:00"));
    }

    #[test]
    fn test_end_of_year_is_just_under_100() {
        let (_, percent) = year_progress(at("2025-12-31T23:00:00+09:00")).unwrap();
        assert!(percent > 99.98 && percent < 100.0);
    }

    #[tokio::test]
    async fn test_post_progress() {
        let poster = FakePoster::default();
        post_progress(&poster, at("2025-01-01T00:00:00+09:00"))
            .await
            .unwrap();
        assert_eq!(
            poster.posts(),
            vec![("0.000% of the year 2025 has passed.".to_string(), None)]
        );
    }
}
