//! Nation-wide series and per-entity averages derived from the loaded tables.

use crate::core::table::{Entity, EntityYearTable, Year, YearSeries};
use indexmap::IndexMap;
use statrs::statistics::Statistics;
use tracing::{debug, warn};

/// Relative difference tolerated between a published total and the sum of its entities.
pub const GRAND_TOTAL_TOLERANCE: f64 = 1e-6;

/// Sum over entities for each year of the table, skipping missing values and any entity for
/// which `exclude` returns true.
pub fn total_by_year(table: &EntityYearTable, exclude: impl Fn(&str) -> bool) -> YearSeries {
    table
        .years()
        .iter()
        .map(|year| {
            let total = table
                .column(*year)
                .filter(|(entity, _)| !exclude(entity.as_str()))
                .filter_map(|(_, value)| value)
                .sum::<f64>();
            (*year, total)
        })
        .collect()
}

/// Mean of each entity's present values, ordered ascending by the mean. Entities without any
/// value are left out.
pub fn average_by_entity(
    table: &EntityYearTable,
    exclude: impl Fn(&str) -> bool,
) -> IndexMap<Entity, f64> {
    let mut averages: IndexMap<Entity, f64> = table
        .rows()
        .filter(|(entity, _)| !exclude(entity.as_str()))
        .filter_map(|(entity, values)| {
            let present: Vec<f64> = values.iter().flatten().copied().collect();
            if present.is_empty() {
                debug!(entity = %entity, "no values to average");
                return None;
            }
            Some((entity.clone(), present.mean()))
        })
        .collect();
    averages.sort_by(|_, a, _, b| a.total_cmp(b));
    averages
}

#[derive(Clone, Debug, PartialEq)]
pub struct TotalMismatch {
    pub year: Year,
    pub reported: f64,
    pub computed: f64,
}

/// Compares a published grand total against the computed one, year by year. Years missing from
/// either series are not compared.
pub fn cross_check_grand_total(reported: &YearSeries, computed: &YearSeries) -> Vec<TotalMismatch> {
    let mismatches: Vec<TotalMismatch> = reported
        .iter()
        .filter_map(|(year, reported)| {
            let sum = *computed.get(year)?;
            let scale = reported.abs().max(sum.abs()).max(f64::MIN_POSITIVE);
            ((reported - sum).abs() / scale > GRAND_TOTAL_TOLERANCE).then_some(TotalMismatch {
                year: *year,
                reported: *reported,
                computed: sum,
            })
        })
        .collect();

    for mismatch in &mismatches {
        warn!(
            year = mismatch.year,
            reported = mismatch.reported,
            computed = mismatch.computed,
            "published grand total differs from the sum of entities"
        );
    }
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::EnergyUnit;
    use crate::layout::is_aggregate;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn generation() -> EntityYearTable {
        let mut table = EntityYearTable::new(EnergyUnit::MegawattHours, vec![2002, 2003]);
        table
            .insert_row("Jalisco", vec![Some(10.), Some(20.)])
            .unwrap();
        table
            .insert_row("Total Nacional", vec![Some(100.), Some(200.)])
            .unwrap();
        table
            .insert_row("Colima", vec![Some(1.), None])
            .unwrap();
        table.insert_row("Durango", vec![None, None]).unwrap();
        table
    }

    #[rstest]
    fn test_total_excludes_aggregate_rows(generation: EntityYearTable) {
        let totals = total_by_year(&generation, |entity| is_aggregate(entity, "Total"));
        assert_eq!(totals, YearSeries::from([(2002, 11.), (2003, 20.)]));
    }

    #[rstest]
    fn test_total_without_exclusion_counts_everything(generation: EntityYearTable) {
        let totals = total_by_year(&generation, |_| false);
        assert_eq!(totals, YearSeries::from([(2002, 111.), (2003, 220.)]));
    }

    #[rstest]
    fn test_average_ignores_missing_years_and_sorts_ascending(generation: EntityYearTable) {
        let averages = average_by_entity(&generation, |entity| is_aggregate(entity, "total"));

        assert_eq!(
            averages.keys().map(|e| e.as_str()).collect::<Vec<_>>(),
            vec!["Colima", "Jalisco"]
        );
        assert_relative_eq!(averages["Colima"], 1.);
        assert_relative_eq!(averages["Jalisco"], 15.);
    }

    #[rstest]
    fn test_cross_check_reports_only_mismatched_years() {
        let reported = YearSeries::from([(2006, 100.), (2007, 210.), (2008, 300.)]);
        let computed = YearSeries::from([(2006, 100.), (2007, 200.)]);

        let mismatches = cross_check_grand_total(&reported, &computed);

        assert_eq!(
            mismatches,
            vec![TotalMismatch {
                year: 2007,
                reported: 210.,
                computed: 200.
            }]
        );
    }
}
