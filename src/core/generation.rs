//! Loads gross electricity generation (MWh), folding monthly columns into annual totals.

use crate::core::table::{EntityYearTable, Year};
use crate::core::units::EnergyUnit;
use crate::errors::LoadError;
use crate::layout::GenerationLayout;
use crate::raw_table::RawTable;
use std::io::Read;
use tracing::{debug, warn};

pub fn load_generation(
    source: impl Read,
    layout: &GenerationLayout,
) -> Result<EntityYearTable, LoadError> {
    let raw = RawTable::from_reader(source, layout.skip_rows)?;
    generation_from_raw(&raw, layout)
}

pub fn generation_from_raw(
    raw: &RawTable,
    layout: &GenerationLayout,
) -> Result<EntityYearTable, LoadError> {
    if layout.months_per_year == 0 {
        return Err(LoadError::InvalidLayout(
            "months_per_year must be at least 1".into(),
        ));
    }

    let columns = raw.header.len();
    if columns < layout.trailing_columns {
        return Err(LoadError::TooFewColumns {
            expected: layout.trailing_columns,
            found: columns,
        });
    }
    let monthly_columns = columns - layout.trailing_columns;
    let year_count = monthly_columns / layout.months_per_year;
    let remainder = monthly_columns % layout.months_per_year;
    if year_count == 0 {
        return Err(LoadError::TooFewColumns {
            expected: layout.months_per_year + layout.trailing_columns,
            found: columns,
        });
    }
    if remainder > 0 {
        warn!(
            remainder,
            months_per_year = layout.months_per_year,
            "trailing monthly columns don't make up a whole year and are dropped"
        );
    }

    let years: Vec<Year> = (0..year_count)
        .map(|offset| layout.base_year + offset as Year)
        .collect();
    let window = layout.entity_rows.resolve(&raw.labels())?;

    let mut table = EntityYearTable::new(EnergyUnit::MegawattHours, years);
    for row in &raw.rows[window] {
        let mut months = row.values();
        if let Some(policy) = layout.corrections.get(row.label.as_str()) {
            let changed = policy.apply(&mut months);
            debug!(entity = %row.label, ?policy, changed, "applied correction");
        }
        months.truncate(monthly_columns);
        table.insert_row(&row.label, annual_totals(&months, layout.months_per_year))?;
    }

    for entity in layout.corrections.keys() {
        if !table.contains_entity(entity) {
            debug!(entity = %entity, "no row to correct");
        }
    }
    debug!(
        entities = table.len(),
        years = table.years().len(),
        "loaded generation table"
    );

    Ok(table)
}

/// Sums each whole block of `months_per_year` values; missing months count as zero, so every
/// year has a value. A partial block at the end is ignored.
pub fn annual_totals(months: &[Option<f64>], months_per_year: usize) -> Vec<Option<f64>> {
    months
        .chunks_exact(months_per_year)
        .map(|block| Some(block.iter().flatten().sum::<f64>()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::corrections::CorrectionPolicy;
    use crate::layout::RowWindow;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::{BufReader, Cursor};

    fn header(months: usize, annotations: usize) -> String {
        let mut labels = vec!["Entidad".to_string()];
        labels.extend((0..months).map(|m| format!("M{}", m + 1)));
        labels.extend((0..annotations).map(|a| format!("Nota {}", a + 1)));
        labels.join(",")
    }

    fn row(label: &str, values: &[&str], annotations: usize) -> String {
        let mut cells = vec![label.to_string()];
        cells.extend(values.iter().map(|v| v.to_string()));
        cells.extend((0..annotations).map(|_| "999".to_string()));
        cells.join(",")
    }

    #[fixture]
    fn layout() -> GenerationLayout {
        GenerationLayout {
            skip_rows: 2,
            entity_rows: RowWindow::Span { first: 1, last: 2 },
            trailing_columns: 3,
            months_per_year: 12,
            base_year: 2002,
            corrections: IndexMap::from([("Morelos".to_string(), CorrectionPolicy::ForwardFill)]),
            aggregate_marker: "Total".into(),
        }
    }

    #[rstest]
    fn test_two_entities_with_two_years_of_months(layout: GenerationLayout) {
        let jalisco: Vec<String> = (1..=24).map(|m| m.to_string()).collect();
        let sonora: Vec<String> = (1..=24).map(|m| (m * 10).to_string()).collect();
        let csv = [
            "Generacion bruta".to_string(),
            "MWh".to_string(),
            header(24, 3),
            row("Total", &["0"; 24], 3),
            row("Jalisco", &jalisco.iter().map(String::as_str).collect::<Vec<_>>(), 3),
            row("Sonora", &sonora.iter().map(String::as_str).collect::<Vec<_>>(), 3),
        ]
        .join("\n");

        let table = load_generation(BufReader::new(Cursor::new(csv)), &layout).unwrap();

        assert_eq!(table.years(), &[2002, 2003]);
        assert_eq!(table.unit(), EnergyUnit::MegawattHours);
        assert_eq!(
            table.entities().map(|e| e.as_str()).collect::<Vec<_>>(),
            vec!["Jalisco", "Sonora"]
        );
        // 1 + ... + 12 and 13 + ... + 24
        assert_eq!(table.row("Jalisco").unwrap(), &[Some(78.), Some(222.)]);
        assert_eq!(table.row("Sonora").unwrap(), &[Some(780.), Some(2220.)]);
    }

    #[rstest]
    fn test_named_entity_is_forward_filled_before_summing(layout: GenerationLayout) {
        let mut morelos = vec!["10"; 24];
        morelos[5] = "";
        morelos[6] = "";
        let mut colima = vec!["10"; 24];
        colima[5] = "";
        let csv = [
            "a".to_string(),
            "b".to_string(),
            header(24, 3),
            row("Total", &["0"; 24], 3),
            row("Morelos", &morelos, 3),
            row("Colima", &colima, 3),
        ]
        .join("\n");

        let table = load_generation(BufReader::new(Cursor::new(csv)), &layout).unwrap();

        assert_eq!(table.row("Morelos").unwrap(), &[Some(120.), Some(120.)]);
        // no correction for other entities, so the gap contributes nothing
        assert_eq!(table.row("Colima").unwrap(), &[Some(110.), Some(120.)]);
    }

    #[rstest]
    fn test_all_missing_year_sums_to_zero(layout: GenerationLayout) {
        let mut values = vec!["1"; 12];
        values.extend([""; 12]);
        let csv = [
            "a".to_string(),
            "b".to_string(),
            header(24, 3),
            row("Total", &["0"; 24], 3),
            row("Campeche", &values, 3),
            row("Colima", &["2"; 24], 3),
        ]
        .join("\n");

        let table = load_generation(BufReader::new(Cursor::new(csv)), &layout).unwrap();

        assert_eq!(table.row("Campeche").unwrap(), &[Some(12.), Some(0.)]);
    }

    #[rstest]
    fn test_partial_year_is_dropped(layout: GenerationLayout) {
        let csv = [
            "a".to_string(),
            "b".to_string(),
            header(17, 3),
            row("Total", &["0"; 17], 3),
            row("Colima", &["1"; 17], 3),
            row("Durango", &["2"; 17], 3),
        ]
        .join("\n");

        let table = load_generation(BufReader::new(Cursor::new(csv)), &layout).unwrap();

        assert_eq!(table.years(), &[2002]);
        assert_eq!(table.row("Durango").unwrap(), &[Some(24.)]);
    }

    #[rstest]
    fn test_window_past_the_end_is_fatal(mut layout: GenerationLayout) {
        layout.entity_rows = RowWindow::Span { first: 1, last: 29 };
        let csv = [
            "a".to_string(),
            "b".to_string(),
            header(12, 3),
            row("Colima", &["1"; 12], 3),
        ]
        .join("\n");

        let result = load_generation(BufReader::new(Cursor::new(csv)), &layout);

        assert!(matches!(
            result,
            Err(LoadError::TooFewRows {
                expected: 30,
                found: 1
            })
        ));
    }

    #[rstest]
    fn test_fewer_columns_than_a_year_is_fatal(layout: GenerationLayout) {
        let csv = [
            "a".to_string(),
            "b".to_string(),
            header(5, 3),
            row("Total", &["0"; 5], 3),
            row("Colima", &["1"; 5], 3),
            row("Durango", &["1"; 5], 3),
        ]
        .join("\n");

        let result = load_generation(BufReader::new(Cursor::new(csv)), &layout);

        assert!(matches!(result, Err(LoadError::TooFewColumns { .. })));
    }

    #[rstest]
    fn test_annual_totals() {
        let months = [Some(1.), None, Some(2.), Some(3.), Some(4.)];
        assert_eq!(annual_totals(&months, 2), vec![Some(1.), Some(5.)]);
    }
}
