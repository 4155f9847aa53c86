use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which financial statement to fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatementKind {
    Income,
    BalanceSheet,
    CashFlow,
}

/// Reporting frequency of a statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Frequency {
    Annual,
    Quarterly,
}

impl Frequency {
    /// Prefix Yahoo puts in front of timeseries line item names.
    pub fn yahoo_prefix(&self) -> &'static str {
        match self {
            Self::Annual => "annual",
            Self::Quarterly => "quarterly",
        }
    }
}

/// Line items reported for one period end date.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub as_of: NaiveDate,
    /// Line item name (e.g. `TotalRevenue`) to reported value
    pub items: BTreeMap<String, f64>,
}

impl StatementPeriod {
    pub fn new(as_of: NaiveDate) -> Self {
        Self {
            as_of,
            items: BTreeMap::new(),
        }
    }

    pub fn with_item(mut self, name: impl Into<String>, value: f64) -> Self {
        self.items.insert(name.into(), value);
        self
    }

    pub fn value(&self, item: &str) -> Option<f64> {
        self.items.get(item).copied()
    }

    /// Value of the first name in `names` that this period reports.
    ///
    /// Providers rename line items over time; callers list the names in
    /// order of preference.
    pub fn first_value(&self, names: &[&str]) -> Option<f64> {
        names.iter().find_map(|name| self.value(name))
    }
}

/// A financial statement as a list of periods, newest first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    pub periods: Vec<StatementPeriod>,
}

impl FinancialStatement {
    /// Build a statement from periods in any order.
    pub fn from_periods(mut periods: Vec<StatementPeriod>) -> Self {
        periods.sort_by(|a, b| b.as_of.cmp(&a.as_of));
        Self { periods }
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn latest(&self) -> Option<&StatementPeriod> {
        self.periods.first()
    }

    /// The `n` most recent periods.
    pub fn recent(&self, n: usize) -> &[StatementPeriod] {
        &self.periods[..n.min(self.periods.len())]
    }

    pub fn period(&self, as_of: NaiveDate) -> Option<&StatementPeriod> {
        self.periods.iter().find(|p| p.as_of == as_of)
    }

    /// Whether any period reports `item`.
    pub fn has_item(&self, item: &str) -> bool {
        self.periods.iter().any(|p| p.items.contains_key(item))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_from_periods_sorts_newest_first() {
        let statement = FinancialStatement::from_periods(vec![
            StatementPeriod::new(date(2022, 12, 31)),
            StatementPeriod::new(date(2024, 12, 31)),
            StatementPeriod::new(date(2023, 12, 31)),
        ]);
        let dates: Vec<_> = statement.periods.iter().map(|p| p.as_of).collect();
        assert_eq!(
            dates,
            vec![date(2024, 12, 31), date(2023, 12, 31), date(2022, 12, 31)]
        );
        assert_eq!(statement.latest().map(|p| p.as_of), Some(date(2024, 12, 31)));
    }

    #[test]
    fn test_recent_is_clamped() {
        let statement = FinancialStatement::from_periods(vec![
            StatementPeriod::new(date(2024, 3, 31)),
            StatementPeriod::new(date(2024, 6, 30)),
        ]);
        assert_eq!(statement.recent(4).len(), 2);
        assert_eq!(statement.recent(1).len(), 1);
        assert!(FinancialStatement::default().recent(3).is_empty());
    }

    #[test]
    fn test_first_value_prefers_earlier_names() {
        let period = StatementPeriod::new(date(2024, 12, 31))
            .with_item("TotalEquityGrossMinorityInterest", 10.0)
            .with_item("StockholdersEquity", 8.0);
        assert_eq!(
            period.first_value(&["StockholdersEquity", "TotalEquityGrossMinorityInterest"]),
            Some(8.0)
        );
        assert_eq!(
            period.first_value(&["TotalEquity", "TotalEquityGrossMinorityInterest"]),
            Some(10.0)
        );
        assert_eq!(period.first_value(&["Missing"]), None);
    }

    #[test]
    fn test_period_lookup_by_date() {
        let statement = FinancialStatement::from_periods(vec![
            StatementPeriod::new(date(2023, 12, 31)).with_item("FreeCashFlow", 5.0)
        ]);
        assert!(statement.has_item("FreeCashFlow"));
        assert!(!statement.has_item("TotalRevenue"));
        assert_eq!(
            statement
                .period(date(2023, 12, 31))
                .and_then(|p| p.value("FreeCashFlow")),
            Some(5.0)
        );
        assert!(statement.period(date(2022, 12, 31)).is_none());
    }
}
