//! Fixed business filter applied to every freshly loaded report.

use tiempos_core::models::ReportTables;

/// Auxiliary centers (`910`, `9100`, ...) start with this digit.
const AUXILIARY_PREFIX: char = '9';

/// True for centers that never appear in query results.
pub fn is_auxiliary_center(center: &str) -> bool {
    center.starts_with(AUXILIARY_PREFIX)
}

/// Drop auxiliary centers from the center-keyed tables.
///
/// Item loads are left alone. Item ranking rows have an empty center and
/// always survive.
pub fn apply_business_filter(mut tables: ReportTables) -> ReportTables {
    tables.centers.retain(|r| !is_auxiliary_center(&r.center));
    tables.rankings.retain(|r| !is_auxiliary_center(&r.center));
    tables.breakdown.retain(|r| !is_auxiliary_center(&r.center));
    tables
}
