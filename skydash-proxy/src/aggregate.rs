//! Collapse the upstream's 3-hourly forecast slots into one summary per
//! calendar day.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use skydash_core::model::ForecastDay;

use crate::upstream::OwSlot;

/// Group slots by calendar day and summarize each group. Days come out
/// sorted ascending; slots with an unparseable timestamp are skipped.
pub fn daily_summaries(slots: &[OwSlot]) -> Vec<ForecastDay> {
    let mut days: BTreeMap<NaiveDate, Vec<&OwSlot>> = BTreeMap::new();
    for slot in slots {
        let Some(date) = slot_date(slot) else {
            tracing::debug!(dt_txt = %slot.dt_txt, "skipping slot with bad timestamp");
            continue;
        };
        days.entry(date).or_default().push(slot);
    }

    days.into_iter().map(|(date, slots)| summarize(date, &slots)).collect()
}

// dt_txt looks like "2025-10-18 12:00:00".
fn slot_date(slot: &OwSlot) -> Option<NaiveDate> {
    let day = slot.dt_txt.split(' ').next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn summarize(date: NaiveDate, slots: &[&OwSlot]) -> ForecastDay {
    let temps: Vec<f64> = slots.iter().filter_map(|s| s.main.map(|m| m.temp)).collect();
    let mins = slots.iter().filter_map(|s| s.main.map(|m| m.temp_min));
    let maxs = slots.iter().filter_map(|s| s.main.map(|m| m.temp_max));

    let temp_avg = if temps.is_empty() {
        None
    } else {
        Some(round1(temps.iter().sum::<f64>() / temps.len() as f64))
    };

    let (icon, description) = dominant_condition(slots);

    ForecastDay {
        date,
        temp_avg,
        temp_min: mins.reduce(f64::min).map(round1),
        temp_max: maxs.reduce(f64::max).map(round1),
        icon,
        description,
    }
}

/// Most frequent (icon, description) pair across the day's slots; first
/// occurrence wins a tie.
fn dominant_condition(slots: &[&OwSlot]) -> (Option<String>, Option<String>) {
    let mut counts: HashMap<(Option<String>, String), (usize, usize)> = HashMap::new();
    for (idx, cond) in slots.iter().filter_map(|s| s.weather.first()).enumerate() {
        let key = (cond.icon.clone(), cond.description.clone());
        let entry = counts.entry(key).or_insert((0, idx));
        entry.0 += 1;
    }

    match counts
        .into_iter()
        .max_by_key(|&(_, (count, first_idx))| (count, std::cmp::Reverse(first_idx)))
    {
        Some(((icon, description), _)) => (icon, Some(description)),
        None => (None, None),
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
