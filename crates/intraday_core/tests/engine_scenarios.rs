//! End-to-end tests: history → grouping → weighted curve → rows.

use approx::assert_relative_eq;
use intraday_core::export::SkipReason;
use intraday_core::prelude::*;
use proptest::prelude::*;

fn bucket(label: &str) -> TimeBucket {
    TimeBucket::parse(label).unwrap()
}

const LABELS: [&str; 5] = ["09:00", "09:30", "10:00", "10:30", "11:00"];

/// Distribution over `LABELS` from raw shares.
fn observation(date: &str, shares: [f64; 5]) -> Observation {
    let total: f64 = shares.iter().sum();
    let distribution = LABELS
        .iter()
        .zip(shares)
        .map(|(l, s)| (bucket(l), s / total))
        .collect();
    Observation::new(Date::normalise(date).unwrap(), distribution).unwrap()
}

fn peaked(date: &str) -> Observation {
    observation(date, [1.0, 2.0, 5.0, 2.0, 1.0])
}

#[test]
fn test_monday_scenario_end_to_end() {
    let history = vec![
        peaked("2024-03-04").with_weight(40).unwrap(),
        observation("11/03/2024", [1.0, 3.0, 4.0, 1.0, 1.0]).with_weight(30).unwrap(),
        observation("2024-03-18", [2.0, 2.0, 6.0, 3.0, 1.0]).with_weight(30).unwrap(),
    ];
    let calendar = HolidayCalendar::new();

    let group = select_group(&history, &Grouping::Weekday(Weekday::Monday), &calendar);
    assert_eq!(group.len(), 3);

    let outcome = compute_curve(&group);
    assert!(outcome.weight_warning.is_none());
    assert_relative_eq!(outcome.curve.total(), 1.0, epsilon = 1e-9);

    let mut book = CurveBook::new();
    book.insert(Grouping::Weekday(Weekday::Monday), outcome.curve);

    let report = ScenarioExporter::new(&book, &calendar)
        .build_rows(&[ScenarioEntry::new("25/03/2024", 100)]);
    assert!(report.is_complete());

    let row = &report.rows[0];
    assert_eq!(row.total(), 100);
    assert_eq!(row.peak(), Some(bucket("10:00")));
    assert_eq!(row.row_type, RowType::Normal);
    assert_eq!(row.row_type.code(), "N");
    assert_eq!(row.iso_week, 13);
    assert_eq!(row.day_name, Weekday::Monday);
}

#[test]
fn test_partial_failure_batch() {
    let history = vec![
        peaked("2024-03-18").with_weight(100).unwrap(), // Monday
        peaked("2024-03-19").with_weight(100).unwrap(), // Tuesday
        peaked("2024-03-20").with_weight(100).unwrap().with_outlier(true), // Wednesday
        peaked("2024-03-21").with_weight(100).unwrap(), // Thursday
        peaked("2024-03-22").with_weight(100).unwrap(), // Friday
    ];
    let calendar = HolidayCalendar::new();
    let (book, warnings) = CurveBook::from_observations(&history, &calendar);
    // the all-outlier Wednesday group totals 0
    assert_eq!(warnings.len(), 1);

    let dates = ["25/03/2024", "26/03/2024", "2024-03-27", "2024-03-28", "29/03/2024"];
    let entries: Vec<ScenarioEntry> = dates
        .iter()
        .map(|d| ScenarioEntry::new(*d, 480))
        .collect();
    let report = ScenarioExporter::new(&book, &calendar).build_rows(&entries);

    assert_eq!(report.rows.len(), 4);
    assert_eq!(report.skipped_dates.len(), 1);
    let skipped = &report.skipped_dates[0];
    assert_eq!(skipped.input, "2024-03-27");
    assert_eq!(skipped.grouping, Some(Grouping::Weekday(Weekday::Wednesday)));
    assert_eq!(
        skipped.reason,
        SkipReason::Distribution(DistributionError::NoCurveAvailable)
    );
    assert!(report.rows.iter().all(|r| r.total() == 480));
}

#[test]
fn test_date_forms_match_for_holidays_and_sorting() {
    let mut calendar = HolidayCalendar::new();
    calendar.insert_raw("15/03/2024", "Fallas").unwrap();

    let history = vec![peaked("2024-03-15"), peaked("2023-03-15")];
    let group = select_group(&history, &Grouping::Holiday("Fallas".into()), &calendar);
    assert_eq!(group.len(), 1);
    assert_eq!(group[0].date(), Date::normalise("15/03/2024").unwrap());

    let weekday_curve = compute_curve(&[peaked("2024-03-04").with_weight(100).unwrap()]).curve;
    let mut book = CurveBook::new();
    book.insert(Grouping::Holiday("Fallas".into()), compute_curve(&group).curve);
    for day in Weekday::ALL {
        book.insert(Grouping::Weekday(day), weekday_curve.clone());
    }

    let report = ScenarioExporter::new(&book, &calendar).build_rows(&[
        ScenarioEntry::new("2024-03-16", 10),
        ScenarioEntry::new("15/03/2024", 10),
        ScenarioEntry::new("2024-03-14", 10),
    ]);
    let dates: Vec<String> = report.rows.iter().map(|r| r.date.to_string()).collect();
    assert_eq!(dates, vec!["2024-03-14", "2024-03-15", "2024-03-16"]);
    assert_eq!(report.rows[1].row_type, RowType::Holiday);
}

#[test]
fn test_weight_deficit_and_outlier_exclusion() {
    let deficit = vec![
        peaked("2024-03-04").with_weight(60).unwrap(),
        peaked("2024-03-11").with_weight(30).unwrap(),
    ];
    let warning = compute_curve(&deficit).weight_warning.unwrap();
    assert_eq!(warning.delta(), -10);

    let exact = vec![
        peaked("2024-03-04").with_weight(60).unwrap(),
        peaked("2024-03-11").with_weight(40).unwrap(),
    ];
    assert!(compute_curve(&exact).weight_warning.is_none());

    let with_outlier = vec![
        peaked("2024-03-04").with_weight(50).unwrap(),
        observation("2024-03-11", [9.0, 0.0, 0.0, 0.0, 1.0])
            .with_weight(50)
            .unwrap()
            .with_outlier(true),
    ];
    let curve = compute_curve(&with_outlier).curve;
    let alone = compute_curve(&with_outlier[..1]).curve;
    assert_eq!(curve, alone);
}

#[test]
fn test_analysed_group_distributes_exactly() {
    let mut history: Vec<Observation> = ["2024-02-05", "2024-02-12", "2024-02-19", "2024-02-26"]
        .iter()
        .map(|d| peaked(d))
        .collect();
    history.push(observation("2024-03-04", [0.0, 0.0, 0.0, 0.0, 1.0]));

    let analysed = analyse_group(&history).unwrap();
    assert!(analysed[4].is_outlier());

    let outcome = compute_curve(&analysed);
    assert!(outcome.weight_warning.is_none());
    let row = DistributionRow::distribute(
        Date::from_ymd(2024, 3, 11).unwrap(),
        RowType::Normal,
        &outcome.curve,
        997,
    )
    .unwrap();
    assert_eq!(row.total(), 997);
    assert_eq!(row.get(bucket("11:00")), row.get(bucket("09:00")));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_weighted_history_distributes_exactly(
        raw in prop::collection::vec((prop::array::uniform5(0.01f64..1.0), 0u32..=100), 1..8),
        volume in 0u64..100_000,
    ) {
        let history: Vec<Observation> = raw
            .iter()
            .enumerate()
            .map(|(i, (shares, weight))| {
                let date = format!("2024-01-{:02}", i + 1);
                observation(&date, *shares).with_weight(*weight).unwrap()
            })
            .collect();

        let outcome = compute_curve(&history);
        match distribute(&outcome.curve, volume) {
            Ok(allocated) => {
                prop_assert_eq!(allocated.values().sum::<u64>(), volume);
            }
            Err(e) => {
                prop_assert_eq!(e, DistributionError::NoCurveAvailable);
                prop_assert!(outcome.curve.is_zero());
            }
        }
    }
}
