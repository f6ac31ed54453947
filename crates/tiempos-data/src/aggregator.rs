//! Daily and monthly load aggregation over the unified dataset.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tiempos_core::columns::CanonicalColumn;
use tiempos_core::models::{
    CenterItemBreakdownRow, CenterLoadRow, ItemLoadRow, ReportTables, SourceRecord,
    UnifiedDataset,
};
use tiempos_core::time_utils::month_key;

use crate::rankings::compute_rankings;

// ── MonthlyStat ───────────────────────────────────────────────────────────────

/// Daily loads of one key accumulated over one month.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MonthlyStat {
    pub total: f64,
    /// Days with data in the month.
    pub days: u32,
}

impl MonthlyStat {
    pub fn add_day(&mut self, load: f64) {
        self.total += load;
        self.days += 1;
    }

    /// Mean daily load, `None` for an empty month.
    pub fn mean(&self) -> Option<f64> {
        (self.days > 0).then(|| self.total / self.days as f64)
    }
}

// ── KeyedLoad ─────────────────────────────────────────────────────────────────

/// One day's load of a key with its month's statistics joined on.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedLoad {
    pub date: NaiveDate,
    pub key: String,
    pub daily_load: f64,
    pub monthly_mean: f64,
    pub monthly_total: f64,
}

// ── LoadAggregator ────────────────────────────────────────────────────────────

/// Stateless helper that turns source records into the report tables.
pub struct LoadAggregator;

impl LoadAggregator {
    /// Build all four report tables.
    ///
    /// Without an available-time column every table is empty; without an
    /// item column the item and breakdown tables are.
    pub fn aggregate(dataset: &UnifiedDataset) -> ReportTables {
        let has_work_order = dataset.has_column(CanonicalColumn::WorkOrder);
        if !dataset.has_column(CanonicalColumn::AvailableTime) {
            return ReportTables {
                has_work_order,
                ..Default::default()
            };
        }

        let centers = Self::center_loads(&dataset.records);
        let (items, breakdown) = if dataset.has_column(CanonicalColumn::Item) {
            (
                Self::item_loads(&dataset.records),
                Self::breakdown(&dataset.records),
            )
        } else {
            (Vec::new(), Vec::new())
        };
        let rankings = compute_rankings(&centers, &items);

        ReportTables {
            centers,
            items,
            breakdown,
            rankings,
            has_work_order,
        }
    }

    /// Daily load per (date, center) with monthly mean and total.
    pub fn center_loads(records: &[SourceRecord]) -> Vec<CenterLoadRow> {
        Self::keyed_loads(records, |r| r.center.as_deref())
            .into_iter()
            .map(|l| CenterLoadRow {
                date: l.date,
                center: l.key,
                daily_load: l.daily_load,
                monthly_mean: l.monthly_mean,
                monthly_total: l.monthly_total,
            })
            .collect()
    }

    /// Daily load per (date, item) with monthly mean and total.
    pub fn item_loads(records: &[SourceRecord]) -> Vec<ItemLoadRow> {
        Self::keyed_loads(records, |r| r.item.as_deref())
            .into_iter()
            .map(|l| ItemLoadRow {
                date: l.date,
                item: l.key,
                daily_load: l.daily_load,
                monthly_mean: l.monthly_mean,
                monthly_total: l.monthly_total,
            })
            .collect()
    }

    /// Hours per (date, center, item, work order). Records without a center
    /// or item are left out; an absent work order is its own group.
    pub fn breakdown(records: &[SourceRecord]) -> Vec<CenterItemBreakdownRow> {
        type Key = (NaiveDate, String, String, Option<String>);
        let mut sums: BTreeMap<Key, f64> = BTreeMap::new();

        for r in records {
            let (Some(center), Some(item)) = (&r.center, &r.item) else {
                continue;
            };
            let key = (r.report_date, center.clone(), item.clone(), r.work_order.clone());
            *sums.entry(key).or_insert(0.0) += r.available_time.unwrap_or(0.0);
        }

        sums.into_iter()
            .map(|((date, center, item, work_order), hours)| CenterItemBreakdownRow {
                date,
                center,
                item,
                work_order,
                hours,
            })
            .collect()
    }

    /// Sum of available time per (date, key). Records without a key are
    /// skipped; absent times add nothing but still create the group.
    pub fn daily_sums<'a>(
        records: &'a [SourceRecord],
        key_fn: impl Fn(&'a SourceRecord) -> Option<&'a str>,
    ) -> BTreeMap<(NaiveDate, String), f64> {
        let mut sums: BTreeMap<(NaiveDate, String), f64> = BTreeMap::new();
        for r in records {
            let Some(key) = key_fn(r) else { continue };
            *sums.entry((r.report_date, key.to_string())).or_insert(0.0) +=
                r.available_time.unwrap_or(0.0);
        }
        sums
    }

    /// Group daily sums by (month, key).
    pub fn monthly_stats(
        daily: &BTreeMap<(NaiveDate, String), f64>,
    ) -> BTreeMap<(String, String), MonthlyStat> {
        let mut stats: BTreeMap<(String, String), MonthlyStat> = BTreeMap::new();
        for ((date, key), load) in daily {
            stats
                .entry((month_key(*date), key.clone()))
                .or_default()
                .add_day(*load);
        }
        stats
    }

    // ── Private ───────────────────────────────────────────────────────────────

    fn keyed_loads<'a>(
        records: &'a [SourceRecord],
        key_fn: impl Fn(&'a SourceRecord) -> Option<&'a str>,
    ) -> Vec<KeyedLoad> {
        let daily = Self::daily_sums(records, key_fn);
        let monthly = Self::monthly_stats(&daily);

        daily
            .into_iter()
            .filter_map(|((date, key), daily_load)| {
                let stat = monthly.get(&(month_key(date), key.clone()))?;
                Some(KeyedLoad {
                    date,
                    key,
                    daily_load,
                    monthly_mean: stat.mean()?,
                    monthly_total: stat.total,
                })
            })
            .collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use tiempos_core::models::RankingType;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rec(date: NaiveDate, center: &str, item: &str, time: Option<f64>) -> SourceRecord {
        SourceRecord {
            center: Some(center.to_string()),
            item: Some(item.to_string()),
            available_time: time,
            completed_qty: None,
            completed_qty_prior: None,
            work_order: None,
            report_date: date,
            year_month: month_key(date),
        }
    }

    fn dataset(records: Vec<SourceRecord>, columns: &[CanonicalColumn]) -> UnifiedDataset {
        UnifiedDataset {
            records,
            columns: columns.iter().copied().collect(),
            ..Default::default()
        }
    }

    const FULL: [CanonicalColumn; 3] = [
        CanonicalColumn::Center,
        CanonicalColumn::Item,
        CanonicalColumn::AvailableTime,
    ];

    // ── MonthlyStat ──────────────────────────────────────────────────────────

    #[test]
    fn test_monthly_stat_mean() {
        let mut s = MonthlyStat::default();
        assert_eq!(s.mean(), None);
        s.add_day(5.0);
        s.add_day(15.0);
        assert_eq!(s.mean(), Some(10.0));
        assert_eq!(s.total, 20.0);
    }

    // ── center_loads ─────────────────────────────────────────────────────────

    #[test]
    fn test_center_monthly_mean_broadcast() {
        let records = vec![
            rec(d(2024, 2, 10), "123", "A", Some(2.0)),
            rec(d(2024, 2, 10), "123", "B", Some(3.0)),
            rec(d(2024, 2, 20), "123", "A", Some(15.0)),
            rec(d(2024, 3, 1), "123", "A", Some(7.0)),
        ];
        let rows = LoadAggregator::center_loads(&records);
        assert_eq!(rows.len(), 3);

        let feb: Vec<_> = rows.iter().filter(|r| r.date.month0() == 1).collect();
        assert_eq!(feb.len(), 2);
        assert_eq!(feb[0].daily_load, 5.0);
        assert_eq!(feb[1].daily_load, 15.0);
        for r in &feb {
            assert_eq!(r.monthly_mean, 10.0);
            assert_eq!(r.monthly_total, 20.0);
        }

        let mar = &rows[2];
        assert_eq!(mar.monthly_mean, 7.0);
        assert_eq!(mar.monthly_total, 7.0);
    }

    #[test]
    fn test_absent_times_keep_group_at_zero() {
        let records = vec![rec(d(2024, 1, 15), "101", "A", None)];
        let rows = LoadAggregator::center_loads(&records);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].daily_load, 0.0);
        assert_eq!(rows[0].monthly_mean, 0.0);
    }

    #[test]
    fn test_missing_center_is_not_grouped() {
        let mut r = rec(d(2024, 1, 15), "101", "A", Some(1.0));
        r.center = None;
        assert!(LoadAggregator::center_loads(&[r]).is_empty());
    }

    // ── breakdown ────────────────────────────────────────────────────────────

    #[test]
    fn test_breakdown_groups_by_work_order() {
        let mut a = rec(d(2024, 1, 15), "101", "A", Some(1.0));
        a.work_order = Some("OF1".into());
        let mut b = a.clone();
        b.available_time = Some(2.0);
        let mut c = a.clone();
        c.work_order = None;
        c.available_time = Some(4.0);

        let rows = LoadAggregator::breakdown(&[a, b, c]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].work_order, None);
        assert_eq!(rows[0].hours, 4.0);
        assert_eq!(rows[1].work_order.as_deref(), Some("OF1"));
        assert_eq!(rows[1].hours, 3.0);
    }

    // ── aggregate ────────────────────────────────────────────────────────────

    #[test]
    fn test_aggregate_without_item_column() {
        let mut r = rec(d(2024, 1, 15), "101", "A", Some(1.0));
        r.item = None;
        let ds = dataset(
            vec![r],
            &[CanonicalColumn::Center, CanonicalColumn::AvailableTime],
        );
        let tables = LoadAggregator::aggregate(&ds);
        assert_eq!(tables.centers.len(), 1);
        assert!(tables.items.is_empty());
        assert!(tables.breakdown.is_empty());
        assert!(tables
            .rankings
            .iter()
            .all(|r| r.kind == RankingType::Center));
    }

    #[test]
    fn test_aggregate_without_time_column() {
        let ds = dataset(
            vec![rec(d(2024, 1, 15), "101", "A", None)],
            &[CanonicalColumn::Center, CanonicalColumn::Item],
        );
        assert_eq!(LoadAggregator::aggregate(&ds).total_rows(), 0);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let ds = dataset(
            vec![
                rec(d(2024, 1, 15), "101", "A", Some(1.0)),
                rec(d(2024, 1, 15), "102", "B", Some(2.0)),
                rec(d(2024, 1, 16), "101", "B", Some(3.0)),
            ],
            &FULL,
        );
        let first = LoadAggregator::aggregate(&ds);
        let second = LoadAggregator::aggregate(&ds);
        assert_eq!(first, second);
        assert_eq!(first.items.len(), 3);
        assert_eq!(first.breakdown.len(), 3);
        assert!(!first.has_work_order);
    }

    #[test]
    fn test_monthly_mean_invariant() {
        let records: Vec<_> = (1..=9)
            .map(|day| rec(d(2024, 4, day), "300", "X", Some(day as f64)))
            .collect();
        let daily = LoadAggregator::daily_sums(&records, |r| r.center.as_deref());
        let monthly = LoadAggregator::monthly_stats(&daily);
        let stat = monthly[&("2024-04".to_string(), "300".to_string())];
        let sum: f64 = daily.values().sum();
        assert_eq!(stat.mean(), Some(sum / daily.len() as f64));
    }
}
