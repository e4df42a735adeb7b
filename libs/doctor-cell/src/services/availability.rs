//! Operations on a doctor's slot calendar.
//!
//! Dates are `YYYY-MM-DD` strings, so lexical order is calendar order.
//! Times are ordered chronologically; values that do not parse as
//! `hh:mm AM/PM` sort after those that do.

use std::cmp::Ordering;

use chrono::NaiveTime;

use crate::models::DaySlots;

const TIME_FORMAT: &str = "%I:%M %p";

fn parse_time(time: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(time.trim(), TIME_FORMAT).ok()
}

pub fn compare_times(a: &str, b: &str) -> Ordering {
    match (parse_time(a), parse_time(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

pub fn contains_slot(calendar: &[DaySlots], date: &str, time: &str) -> bool {
    calendar
        .iter()
        .any(|day| day.date == date && day.slots.iter().any(|slot| slot == time))
}

/// Remove one offered time. A date left without times is dropped.
/// Returns false when the slot was not offered.
pub fn remove_slot(calendar: &mut Vec<DaySlots>, date: &str, time: &str) -> bool {
    let Some(index) = calendar.iter().position(|day| day.date == date) else {
        return false;
    };

    let day = &mut calendar[index];
    let before = day.slots.len();
    day.slots.retain(|slot| slot != time);
    let removed = day.slots.len() != before;

    if day.slots.is_empty() {
        calendar.remove(index);
    }
    removed
}

/// Offer a time again, creating the date entry if needed.
/// Returns false when the slot was already offered.
pub fn restore_slot(calendar: &mut Vec<DaySlots>, date: &str, time: &str) -> bool {
    match calendar.iter().position(|day| day.date == date) {
        Some(index) => {
            let day = &mut calendar[index];
            if day.slots.iter().any(|slot| slot == time) {
                return false;
            }
            day.slots.push(time.to_string());
            day.slots.sort_by(|a, b| compare_times(a, b));
        }
        None => {
            let at = calendar.partition_point(|day| day.date.as_str() < date);
            calendar.insert(
                at,
                DaySlots {
                    date: date.to_string(),
                    slots: vec![time.to_string()],
                },
            );
        }
    }
    true
}

/// Canonical form: dates ascending and unique, times sorted and unique,
/// no empty dates.
pub fn normalize(calendar: Vec<DaySlots>) -> Vec<DaySlots> {
    let mut merged: Vec<DaySlots> = Vec::with_capacity(calendar.len());

    for day in calendar {
        match merged.iter_mut().find(|existing| existing.date == day.date) {
            Some(existing) => existing.slots.extend(day.slots),
            None => merged.push(day),
        }
    }

    for day in &mut merged {
        day.slots.sort_by(|a, b| compare_times(a, b));
        day.slots.dedup();
    }
    merged.retain(|day| !day.slots.is_empty());
    merged.sort_by(|a, b| a.date.cmp(&b.date));
    merged
}
