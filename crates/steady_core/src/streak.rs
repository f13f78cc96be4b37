use chrono::NaiveDate;

use crate::habit::MarkHistory;

/// Upper bound on the reported streak. A longer history still counts as 365;
/// this caps the walk, it does not prune storage.
pub const STREAK_DISPLAY_CAP: u32 = 365;

/// Count consecutive fully-completed days, walking backward from `today`.
///
/// An in-progress `today` neither breaks nor extends the streak: when today's
/// mark is already `Completed` the walk starts at today, otherwise it starts
/// at yesterday. Absent or `Partial` days stop the walk.
pub fn current_streak(marks: &MarkHistory, today: NaiveDate) -> u32 {
    let start = if marks.get(&today).is_some_and(|mark| mark.is_completed()) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) => yesterday,
            None => return 0,
        }
    };

    let mut streak = 0;
    let mut cursor = start;
    while streak < STREAK_DISPLAY_CAP {
        match marks.get(&cursor) {
            Some(mark) if mark.is_completed() => streak += 1,
            _ => break,
        }
        match cursor.pred_opt() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    streak
}
