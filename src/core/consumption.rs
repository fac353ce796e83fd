//! Loads the per-entity annual electricity consumption table (GWh).

use crate::core::table::{EntityYearTable, Year, YearSeries};
use crate::core::units::EnergyUnit;
use crate::errors::LoadError;
use crate::layout::ConsumptionLayout;
use crate::raw_table::{parse_cell, parse_year_label, RawTable};
use itertools::Itertools;
use std::io::Read;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq)]
pub struct ConsumptionData {
    pub table: EntityYearTable,
    /// The nationwide row published in the source, when it was found. Only present cells are kept.
    pub grand_total: Option<YearSeries>,
}

pub fn load_consumption(
    source: impl Read,
    layout: &ConsumptionLayout,
) -> Result<ConsumptionData, LoadError> {
    let raw = RawTable::from_reader(source, layout.skip_rows)?;
    consumption_from_raw(&raw, layout)
}

pub fn consumption_from_raw(
    raw: &RawTable,
    layout: &ConsumptionLayout,
) -> Result<ConsumptionData, LoadError> {
    // columns whose label isn't a year are dropped entirely
    let year_columns: Vec<(usize, Year)> = raw
        .header
        .iter()
        .enumerate()
        .filter_map(|(idx, label)| parse_year_label(label).map(|year| (idx, year)))
        .collect();
    if year_columns.is_empty() {
        return Err(LoadError::NoYearColumns);
    }
    if let Some((_, year)) = year_columns.iter().duplicates_by(|(_, year)| *year).next() {
        return Err(LoadError::DuplicateYear(*year));
    }
    debug!(
        kept = year_columns.len(),
        dropped = raw.header.len() - year_columns.len(),
        "consumption year columns"
    );

    let values_for = |cells: &[String]| -> Vec<Option<f64>> {
        year_columns
            .iter()
            .map(|(idx, _)| parse_cell(&cells[*idx]))
            .collect()
    };

    let grand_total_position = raw.position_of(&layout.grand_total_label);
    let grand_total = grand_total_position.map(|position| {
        year_columns
            .iter()
            .zip(values_for(&raw.rows[position].cells))
            .filter_map(|((_, year), value)| value.map(|value| (*year, value)))
            .collect::<YearSeries>()
    });
    if grand_total.is_none() {
        warn!(
            label = %layout.grand_total_label,
            "grand total row not found, continuing without it"
        );
    }

    let window = layout.entity_rows.resolve(&raw.labels())?;
    let mut table = EntityYearTable::new(
        EnergyUnit::GigawattHours,
        year_columns.iter().map(|(_, year)| *year).collect(),
    );
    for position in window {
        if Some(position) == grand_total_position {
            debug!("grand total row falls inside the entity window, leaving it out");
            continue;
        }
        let row = &raw.rows[position];
        table.insert_row(&row.label, values_for(&row.cells))?;
    }
    debug!(entities = table.len(), "loaded consumption table");

    Ok(ConsumptionData { table, grand_total })
}
