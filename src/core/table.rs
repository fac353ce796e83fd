use crate::core::units::EnergyUnit;
use crate::errors::LoadError;
use indexmap::IndexMap;

pub type Entity = smartstring::alias::String;
pub type Year = i32;
/// A value per year, in ascending year order.
pub type YearSeries = IndexMap<Year, f64>;

/// A grid of values keyed by (entity, year). Entities keep the order they had in the source file
/// and each entity appears once.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityYearTable {
    unit: EnergyUnit,
    years: Vec<Year>,
    rows: IndexMap<Entity, Vec<Option<f64>>>,
}

impl EntityYearTable {
    pub fn new(unit: EnergyUnit, years: Vec<Year>) -> Self {
        Self {
            unit,
            years,
            rows: Default::default(),
        }
    }

    pub fn insert_row(&mut self, entity: &str, values: Vec<Option<f64>>) -> Result<(), LoadError> {
        if values.len() != self.years.len() {
            return Err(LoadError::InvalidLayout(format!(
                "row for '{entity}' has {} values but the table has {} years",
                values.len(),
                self.years.len()
            )));
        }
        if self.rows.contains_key(entity) {
            return Err(LoadError::DuplicateEntity(entity.to_string()));
        }
        self.rows.insert(entity.into(), values);
        Ok(())
    }

    pub fn unit(&self) -> EnergyUnit {
        self.unit
    }

    pub fn years(&self) -> &[Year] {
        &self.years
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.rows.keys()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains_entity(&self, entity: &str) -> bool {
        self.rows.contains_key(entity)
    }

    pub fn row(&self, entity: &str) -> Option<&[Option<f64>]> {
        self.rows.get(entity).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = (&Entity, &[Option<f64>])> {
        self.rows
            .iter()
            .map(|(entity, values)| (entity, values.as_slice()))
    }

    pub fn get(&self, entity: &str, year: Year) -> Option<f64> {
        let index = self.year_index(year)?;
        self.rows.get(entity)?[index]
    }

    /// Every entity's value for one year, missing values included. Empty if the year isn't
    /// present in the table.
    pub fn column(&self, year: Year) -> impl Iterator<Item = (&Entity, Option<f64>)> {
        let index = self.year_index(year);
        self.rows
            .iter()
            .filter_map(move |(entity, values)| index.map(|i| (entity, values[i])))
    }

    /// Every present cell as (entity, year, value), row by row.
    pub fn cells(&self) -> impl Iterator<Item = (&Entity, Year, f64)> {
        self.rows.iter().flat_map(move |(entity, values)| {
            self.years
                .iter()
                .zip(values)
                .filter_map(move |(year, value)| value.map(|value| (entity, *year, value)))
        })
    }

    /// A copy of the table with every value converted into `unit`.
    pub fn to_unit(&self, unit: EnergyUnit) -> Self {
        let factor = self.unit.factor_to(unit);
        Self {
            unit,
            years: self.years.clone(),
            rows: self
                .rows
                .iter()
                .map(|(entity, values)| {
                    (
                        entity.clone(),
                        values.iter().map(|value| value.map(|v| v * factor)).collect(),
                    )
                })
                .collect(),
        }
    }

    /// A copy of the table holding only the entities for which `keep` returns true.
    pub fn retain_entities(&self, keep: impl Fn(&str) -> bool) -> Self {
        Self {
            unit: self.unit,
            years: self.years.clone(),
            rows: self
                .rows
                .iter()
                .filter(|(entity, _)| keep(entity.as_str()))
                .map(|(entity, values)| (entity.clone(), values.clone()))
                .collect(),
        }
    }

    fn year_index(&self, year: Year) -> Option<usize> {
        self.years.iter().position(|y| *y == year)
    }
}
