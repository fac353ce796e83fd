//! Reshapes both tables into long form and joins them on (entity, year).

use crate::core::table::{Entity, EntityYearTable, Year};
use crate::core::units::EnergyUnit;
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Values are compared and stored in this unit once combined.
pub const COMBINED_UNIT: EnergyUnit = EnergyUnit::MegawattHours;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LongRecord {
    pub entity: Entity,
    pub year: Year,
    pub value: f64,
}

/// One (entity, year) key present in at least one source. A side without a value is `None`,
/// never zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CombinedRecord {
    pub entity: Entity,
    pub year: Year,
    pub consumption: Option<f64>,
    pub generation: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CombinedTable {
    records: Vec<CombinedRecord>,
    years: Vec<Year>,
}

impl CombinedTable {
    /// Records ordered by entity, then year.
    pub fn records(&self) -> &[CombinedRecord] {
        &self.records
    }

    /// Distinct years, ascending. This is the frame order for anything animated over years.
    pub fn years(&self) -> &[Year] {
        &self.years
    }

    pub fn for_year(&self, year: Year) -> impl Iterator<Item = &CombinedRecord> {
        self.records.iter().filter(move |record| record.year == year)
    }

    pub fn get(&self, entity: &str, year: Year) -> Option<&CombinedRecord> {
        self.records
            .iter()
            .find(|record| record.entity.as_str() == entity && record.year == year)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// One record per present cell.
pub fn melt(table: &EntityYearTable) -> Vec<LongRecord> {
    table
        .cells()
        .map(|(entity, year, value)| LongRecord {
            entity: entity.clone(),
            year,
            value,
        })
        .collect()
}

/// Full outer join of consumption and generation, with both converted to MWh first.
pub fn combine(consumption: &EntityYearTable, generation: &EntityYearTable) -> CombinedTable {
    let consumption_long = melt(&consumption.to_unit(COMBINED_UNIT));
    let generation_long = melt(&generation.to_unit(COMBINED_UNIT));

    let mut joined: BTreeMap<(Entity, Year), CombinedRecord> = BTreeMap::new();
    for LongRecord {
        entity,
        year,
        value,
    } in consumption_long
    {
        joined
            .entry((entity.clone(), year))
            .or_insert_with(|| empty_record(entity, year))
            .consumption = Some(value);
    }
    for LongRecord {
        entity,
        year,
        value,
    } in generation_long
    {
        joined
            .entry((entity.clone(), year))
            .or_insert_with(|| empty_record(entity, year))
            .generation = Some(value);
    }

    let records: Vec<CombinedRecord> = joined.into_values().collect();
    let years = records
        .iter()
        .map(|record| record.year)
        .sorted()
        .dedup()
        .collect();
    debug!(records = records.len(), "combined consumption and generation");

    CombinedTable { records, years }
}

fn empty_record(entity: Entity, year: Year) -> CombinedRecord {
    CombinedRecord {
        entity,
        year,
        consumption: None,
        generation: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn consumption() -> EntityYearTable {
        let mut table = EntityYearTable::new(EnergyUnit::GigawattHours, vec![2006, 2007]);
        table
            .insert_row("Jalisco", vec![Some(1.25), Some(0.)])
            .unwrap();
        table.insert_row("Colima", vec![None, Some(3.)]).unwrap();
        table
    }

    #[fixture]
    fn generation() -> EntityYearTable {
        let mut table = EntityYearTable::new(EnergyUnit::MegawattHours, vec![2005, 2006]);
        table
            .insert_row("Jalisco", vec![Some(700.), Some(800.)])
            .unwrap();
        table
            .insert_row("Total Nacional", vec![Some(9000.), Some(9100.)])
            .unwrap();
        table
    }

    #[rstest]
    fn test_melt_emits_present_cells(consumption: EntityYearTable) {
        let long = melt(&consumption);
        assert_eq!(
            long,
            vec![
                LongRecord {
                    entity: "Jalisco".into(),
                    year: 2006,
                    value: 1.25
                },
                LongRecord {
                    entity: "Jalisco".into(),
                    year: 2007,
                    value: 0.
                },
                LongRecord {
                    entity: "Colima".into(),
                    year: 2007,
                    value: 3.
                },
            ]
        );
    }

    #[rstest]
    fn test_every_source_key_survives_the_join(
        consumption: EntityYearTable,
        generation: EntityYearTable,
    ) {
        let combined = combine(&consumption, &generation);

        for (entity, year, _) in consumption.cells().chain(generation.cells()) {
            let record = combined.get(entity, year).unwrap();
            assert!(record.consumption.is_some() || record.generation.is_some());
        }
        assert_eq!(combined.len(), 6);
    }

    #[rstest]
    fn test_consumption_is_converted_to_mwh(
        consumption: EntityYearTable,
        generation: EntityYearTable,
    ) {
        let combined = combine(&consumption, &generation);

        for (entity, year, value) in consumption.cells() {
            assert_eq!(
                combined.get(entity, year).unwrap().consumption,
                Some(value * 1000.)
            );
        }
    }

    #[rstest]
    fn test_unmatched_side_is_missing_not_zero(
        consumption: EntityYearTable,
        generation: EntityYearTable,
    ) {
        let combined = combine(&consumption, &generation);

        assert_eq!(
            combined.get("Jalisco", 2007),
            Some(&CombinedRecord {
                entity: "Jalisco".into(),
                year: 2007,
                consumption: Some(0.),
                generation: None,
            })
        );
        assert_eq!(
            combined.get("Jalisco", 2005),
            Some(&CombinedRecord {
                entity: "Jalisco".into(),
                year: 2005,
                consumption: None,
                generation: Some(700.),
            })
        );
        assert_eq!(
            combined.get("Jalisco", 2006).unwrap().generation,
            Some(800.)
        );
        assert_eq!(combined.get("Colima", 2006), None);
    }

    #[rstest]
    fn test_years_are_distinct_and_ascending(
        consumption: EntityYearTable,
        generation: EntityYearTable,
    ) {
        let combined = combine(&consumption, &generation);
        assert_eq!(combined.years(), &[2005, 2006, 2007]);
        assert_eq!(combined.for_year(2006).count(), 2);
    }

    #[rstest]
    fn test_records_are_ordered_by_entity_then_year(
        consumption: EntityYearTable,
        generation: EntityYearTable,
    ) {
        let combined = combine(&consumption, &generation);
        let keys = combined
            .records()
            .iter()
            .map(|record| (record.entity.as_str(), record.year))
            .collect::<Vec<_>>();
        assert_eq!(
            keys,
            vec![
                ("Colima", 2007),
                ("Jalisco", 2005),
                ("Jalisco", 2006),
                ("Jalisco", 2007),
                ("Total Nacional", 2005),
                ("Total Nacional", 2006),
            ]
        );
    }
}
