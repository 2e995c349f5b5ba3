//! Grouping of historical instances into curve-weighting sets.
//!
//! A [`Grouping`] names which observations are combined into one curve:
//! all instances of a weekday, all instances of a named holiday, or the
//! analog instances fetched for one specific date. [`select_group`] is a
//! pure filter over caller-owned instances; nothing is cached.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::calendar::{holiday_names_match, HolidayCalendar};
use crate::curves::{even_weights, propose_weights, Observation, Weight};
use crate::types::{Date, Weekday};

/// Key classifying which observations are combined together.
///
/// # Examples
///
/// ```
/// use intraday_core::grouping::Grouping;
/// use intraday_core::types::Weekday;
///
/// let grouping = Grouping::Weekday(Weekday::Monday);
/// assert_eq!(grouping.to_string(), "weekday:Monday");
///
/// let json = serde_json::to_string(&Grouping::Holiday("Navidad".into())).unwrap();
/// assert_eq!(json, r#"{"kind":"holiday","key":"Navidad"}"#);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum Grouping {
    /// Every non-holiday instance falling on this weekday
    Weekday(Weekday),
    /// Historical instances of a named holiday
    Holiday(String),
    /// Analog instances fetched for one target date
    SpecificDate(Date),
}

impl Grouping {
    /// Short human label (`Monday`, `Navidad`, `2024-03-15`).
    pub fn label(&self) -> String {
        match self {
            Grouping::Weekday(day) => day.name().to_string(),
            Grouping::Holiday(name) => name.clone(),
            Grouping::SpecificDate(date) => date.to_string(),
        }
    }

    /// Default grouping of a date: its holiday if it has one, else its weekday.
    pub fn for_date(date: Date, calendar: &HolidayCalendar) -> Self {
        match calendar.name_for(date) {
            Some(name) => Grouping::Holiday(name.to_string()),
            None => Grouping::Weekday(date.weekday()),
        }
    }
}

impl fmt::Display for Grouping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grouping::Weekday(day) => write!(f, "weekday:{}", day),
            Grouping::Holiday(name) => write!(f, "holiday:{}", name),
            Grouping::SpecificDate(date) => write!(f, "date:{}", date),
        }
    }
}

/// Holiday name an instance belongs to: its own tag, else the calendar's.
fn holiday_of<'a>(instance: &'a Observation, calendar: &'a HolidayCalendar) -> Option<&'a str> {
    instance
        .holiday()
        .or_else(|| calendar.name_for(instance.date()))
}

/// Selects the instances making up one grouping, most recent first.
///
/// - `Weekday`: instances on that ISO weekday that are not holidays
///   (neither tagged nor in `calendar`); weights are kept. When none of
///   them carries a weight the group gets [`propose_weights`] instead,
///   so unweighted history still yields a curve.
/// - `Holiday`: instances tagged with, or dated on, that holiday (names
///   compared ignoring case and surrounding whitespace); weights reset
///   to the even default.
/// - `SpecificDate`: every instance is passed through unchanged except
///   for the even default weight.
pub fn select_group(
    instances: &[Observation],
    grouping: &Grouping,
    calendar: &HolidayCalendar,
) -> Vec<Observation> {
    let mut selected: Vec<Observation> = match grouping {
        Grouping::Weekday(day) => instances
            .iter()
            .filter(|o| o.weekday() == *day && holiday_of(o, calendar).is_none())
            .cloned()
            .collect(),
        Grouping::Holiday(name) => instances
            .iter()
            .filter(|o| holiday_of(o, calendar).is_some_and(|h| holiday_names_match(h, name)))
            .cloned()
            .collect(),
        Grouping::SpecificDate(_) => instances.to_vec(),
    };
    selected.sort_by(|a, b| b.date().cmp(&a.date()));

    match grouping {
        Grouping::Weekday(_) => with_proposed_weights_if_unweighted(selected),
        Grouping::Holiday(_) | Grouping::SpecificDate(_) => with_even_weights(selected),
    }
}

fn with_even_weights(observations: Vec<Observation>) -> Vec<Observation> {
    let weights = even_weights(observations.len());
    observations
        .into_iter()
        .zip(weights)
        .map(|(o, w)| o.with_weight_of(Weight::clamped(w)))
        .collect()
}

fn with_proposed_weights_if_unweighted(observations: Vec<Observation>) -> Vec<Observation> {
    if observations.iter().any(|o| o.weight().get() > 0) {
        return observations;
    }
    let weights = propose_weights(&observations);
    observations
        .into_iter()
        .zip(weights)
        .map(|(o, w)| o.with_weight_of(Weight::clamped(w)))
        .collect()
}

/// Splits instances into the seven weekday groups (holidays excluded).
///
/// Weekdays without any instance are absent from the map.
pub fn group_by_weekday(
    instances: &[Observation],
    calendar: &HolidayCalendar,
) -> BTreeMap<Weekday, Vec<Observation>> {
    Weekday::ALL
        .iter()
        .map(|day| (*day, select_group(instances, &Grouping::Weekday(*day), calendar)))
        .filter(|(_, group)| !group.is_empty())
        .collect()
}

/// Splits holiday instances by holiday name, with even default weights.
///
/// Names are keyed by their first spelling encountered.
pub fn group_by_holiday(
    instances: &[Observation],
    calendar: &HolidayCalendar,
) -> BTreeMap<String, Vec<Observation>> {
    let mut names: Vec<String> = Vec::new();
    for instance in instances {
        if let Some(name) = holiday_of(instance, calendar) {
            if !names.iter().any(|n| holiday_names_match(n, name)) {
                names.push(name.trim().to_string());
            }
        }
    }

    names
        .into_iter()
        .map(|name| {
            let group = select_group(instances, &Grouping::Holiday(name.clone()), calendar);
            (name, group)
        })
        .collect()
}
