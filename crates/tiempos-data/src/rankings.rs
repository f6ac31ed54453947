//! Top-N daily rankings of centers and items.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tiempos_core::models::{CenterLoadRow, ItemLoadRow, RankingRow, RankingType, RANKING_SIZE};

/// Rank centers and items per date, keeping the [`RANKING_SIZE`] largest
/// daily loads of each.
///
/// Ties keep their input order. The result is sorted by date, then type
/// label, then rank.
pub fn compute_rankings(centers: &[CenterLoadRow], items: &[ItemLoadRow]) -> Vec<RankingRow> {
    let mut rankings = rank_per_date(centers.iter().map(|r| RankingRow {
        date: r.date,
        kind: RankingType::Center,
        rank: 0,
        center: r.center.clone(),
        item: String::new(),
        daily_load: r.daily_load,
        monthly_mean: r.monthly_mean,
        monthly_total: r.monthly_total,
    }));
    rankings.extend(rank_per_date(items.iter().map(|r| RankingRow {
        date: r.date,
        kind: RankingType::Item,
        rank: 0,
        center: String::new(),
        item: r.item.clone(),
        daily_load: r.daily_load,
        monthly_mean: r.monthly_mean,
        monthly_total: r.monthly_total,
    })));

    rankings.sort_by(|a, b| {
        (a.date, a.kind.label(), a.rank).cmp(&(b.date, b.kind.label(), b.rank))
    });
    rankings
}

fn rank_per_date(rows: impl Iterator<Item = RankingRow>) -> Vec<RankingRow> {
    let mut by_date: BTreeMap<NaiveDate, Vec<RankingRow>> = BTreeMap::new();
    for row in rows {
        by_date.entry(row.date).or_default().push(row);
    }

    let mut out = Vec::new();
    for (_, mut group) in by_date {
        // Stable: equal loads keep input order.
        group.sort_by(|a, b| b.daily_load.total_cmp(&a.daily_load));
        group.truncate(RANKING_SIZE);
        for (i, mut row) in group.into_iter().enumerate() {
            row.rank = i as u32 + 1;
            out.push(row);
        }
    }
    out
}
