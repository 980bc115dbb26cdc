//! COVID summary record.
//!
//! The dashboard publishes deaths by date of death, so the newest one or two
//! days usually carry `null` death figures. Case figures always come from the
//! newest day; death figures from the first of the newest three days that has
//! any.

use anyhow::{bail, Result};

use crate::ingest::types::{CovidDay, CovidDoc};

pub const COVID_TITLE: &str = "Coronavirus Data Update";

/// How many of the newest days are searched for death figures.
pub const DEATH_LOOKBACK: usize = 3;

/// Newest day with a death figure within the lookback window.
pub fn deaths_day(data: &[CovidDay]) -> Option<&CovidDay> {
    data.iter().take(DEATH_LOOKBACK).find(|d| d.has_deaths())
}

fn show(v: Option<i64>) -> String {
    v.map_or_else(|| "n/a".to_string(), |n| n.to_string())
}

pub fn covid_content(doc: &CovidDoc) -> Result<String> {
    let Some(today) = doc.data.first() else {
        bail!("covid data has no rows");
    };
    let deaths = deaths_day(&doc.data);

    Ok(format!(
        "Today's New Cases: {}\nTotal Cases: {}\nToday's New Deaths: {}\nTotal Deaths: {}",
        show(today.new_cases_by_publish_date),
        show(today.cum_cases_by_publish_date),
        show(deaths.and_then(|d| d.new_deaths_by_death_date)),
        show(deaths.and_then(|d| d.cum_deaths_by_death_date)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(cases: i64, new_d: Option<i64>, cum_d: Option<i64>) -> CovidDay {
        CovidDay {
            date: None,
            new_cases_by_publish_date: Some(cases),
            cum_cases_by_publish_date: Some(cases * 10),
            new_deaths_by_death_date: new_d,
            cum_deaths_by_death_date: cum_d,
        }
    }

    #[test]
    fn latest_day_used_when_deaths_present() {
        let doc = CovidDoc {
            data: vec![day(5, Some(1), Some(2)), day(4, Some(9), Some(9))],
        };
        let c = covid_content(&doc).unwrap();
        assert_eq!(
            c,
            "Today's New Cases: 5\nTotal Cases: 50\nToday's New Deaths: 1\nTotal Deaths: 2"
        );
    }

    #[test]
    fn walks_back_two_days() {
        let doc = CovidDoc {
            data: vec![
                day(7, None, None),
                day(6, None, None),
                day(5, Some(3), Some(300)),
            ],
        };
        let c = covid_content(&doc).unwrap();
        assert!(c.starts_with("Today's New Cases: 7\nTotal Cases: 70\n"));
        assert!(c.ends_with("Today's New Deaths: 3\nTotal Deaths: 300"));
    }

    #[test]
    fn either_death_field_counts() {
        let doc = CovidDoc {
            data: vec![day(7, None, Some(120)), day(6, Some(2), Some(118))],
        };
        let c = covid_content(&doc).unwrap();
        assert!(c.ends_with("Today's New Deaths: n/a\nTotal Deaths: 120"));
    }

    #[test]
    fn gives_up_after_three_days() {
        let doc = CovidDoc {
            data: vec![
                day(7, None, None),
                day(6, None, None),
                day(5, None, None),
                day(4, Some(1), Some(1)),
            ],
        };
        let c = covid_content(&doc).unwrap();
        assert!(c.ends_with("Today's New Deaths: n/a\nTotal Deaths: n/a"));
    }

    #[test]
    fn short_series_and_empty_series() {
        let one = CovidDoc {
            data: vec![day(1, None, None)],
        };
        assert!(covid_content(&one).unwrap().contains("Today's New Deaths: n/a"));
        assert!(covid_content(&CovidDoc { data: vec![] }).is_err());
    }
}
