//! Daily streak calculation.
//!
//! A streak is the number of consecutive calendar days, ending at the most
//! recent post's day, that carry at least one post. A run whose most recent
//! day is older than yesterday is stale and reported as zero. Only the post
//! timestamps are read; this module performs no I/O.

use crate::post_core::Post;
use chrono::{Local, NaiveDate};

/// Computes the current streak relative to `today`.
///
/// Multiple posts on the same day count once. The scan walks days newest
/// first and stops at the first gap; nothing older than a gap can extend the
/// run.
///
/// # Examples
///
/// ```
/// use jotter::post_core::{append, PostDraft};
/// use jotter::streak::calculate_streak;
/// use chrono::NaiveDate;
///
/// let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let yesterday = today.pred_opt().unwrap().and_hms_opt(20, 0, 0).unwrap();
/// let (posts, _) = append(Vec::new(), PostDraft::with_content("late entry"), yesterday).unwrap();
///
/// assert_eq!(calculate_streak(&posts, today), 1);
/// assert_eq!(calculate_streak(&[], today), 0);
/// ```
pub fn calculate_streak(posts: &[Post], today: NaiveDate) -> u32 {
    let mut dates: Vec<NaiveDate> = posts.iter().map(|post| post.timestamp.date()).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));

    let Some((&most_recent, older)) = dates.split_first() else {
        return 0;
    };

    if (today - most_recent).num_days() > 1 {
        return 0;
    }

    let mut streak = 1;
    let mut cursor = most_recent;
    for &date in older {
        if date == cursor {
            continue;
        }
        if Some(date) == cursor.pred_opt() {
            streak += 1;
            cursor = date;
        } else {
            break;
        }
    }

    streak
}

/// Computes the streak against the process's local calendar date.
///
/// "Today" moves, so callers recompute this on every view instead of storing it.
pub fn current_streak(posts: &[Post]) -> u32 {
    calculate_streak(posts, Local::now().date_naive())
}
