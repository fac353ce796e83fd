use crate::core::corrections::CorrectionPolicy;
use crate::core::units::MONTHS_PER_YEAR;
use crate::errors::LoadError;
use anyhow::bail;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::ops::RangeInclusive;

/// Where the data lives inside each source file. Defaults describe the published INEGI/SENER
/// exports the dashboard was built around.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceLayout {
    pub consumption: ConsumptionLayout,
    pub generation: GenerationLayout,
}

impl SourceLayout {
    pub fn from_json(json: impl Read) -> anyhow::Result<Self> {
        let layout: Self = serde_json::from_reader(json)?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.generation.months_per_year == 0 {
            bail!("months_per_year must be at least 1");
        }
        if self.generation.aggregate_marker.trim().is_empty() {
            bail!("aggregate_marker must not be blank");
        }
        self.consumption.entity_rows.check()?;
        self.generation.entity_rows.check()?;
        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumptionLayout {
    pub skip_rows: usize,
    /// Label of the nationwide row, extracted before the entity window is applied.
    pub grand_total_label: String,
    pub entity_rows: RowWindow,
}

impl Default for ConsumptionLayout {
    fn default() -> Self {
        Self {
            skip_rows: 8,
            grand_total_label: "Total Nacional (1)".into(),
            entity_rows: RowWindow::Trim {
                leading: 3,
                trailing: 8,
            },
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationLayout {
    pub skip_rows: usize,
    pub entity_rows: RowWindow,
    /// Annotation columns at the right-hand edge that carry no monthly data.
    pub trailing_columns: usize,
    pub months_per_year: usize,
    /// Year of the first block of monthly columns.
    pub base_year: i32,
    pub corrections: IndexMap<String, CorrectionPolicy>,
    /// Token (matched case-insensitively as a substring) marking pre-aggregated rows.
    pub aggregate_marker: String,
}

impl Default for GenerationLayout {
    fn default() -> Self {
        Self {
            skip_rows: 7,
            entity_rows: RowWindow::Span { first: 1, last: 29 },
            trailing_columns: 3,
            months_per_year: MONTHS_PER_YEAR,
            base_year: 2002,
            corrections: IndexMap::from([("Morelos".to_string(), CorrectionPolicy::ForwardFill)]),
            aggregate_marker: "Total".into(),
        }
    }
}

impl GenerationLayout {
    pub fn is_aggregate(&self, entity: &str) -> bool {
        is_aggregate(entity, &self.aggregate_marker)
    }
}

pub fn is_aggregate(entity: &str, marker: &str) -> bool {
    entity.to_lowercase().contains(&marker.to_lowercase())
}

/// The rows of the post-header grid holding one entity each.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum RowWindow {
    /// Drop a number of rows from either end.
    Trim { leading: usize, trailing: usize },
    /// Keep rows `first..=last` by position.
    Span { first: usize, last: usize },
    /// Keep the rows from the one labelled `first` through the one labelled `last`.
    Labelled { first: String, last: String },
}

impl RowWindow {
    fn check(&self) -> anyhow::Result<()> {
        match self {
            RowWindow::Span { first, last } if first > last => {
                bail!("row window {} ends before it starts", self)
            }
            RowWindow::Labelled { first, last } if first.is_empty() || last.is_empty() => {
                bail!("row window {} needs non-empty labels", self)
            }
            _ => Ok(()),
        }
    }

    /// Resolves the window against the row labels of a grid, failing if the grid doesn't have
    /// the shape the window expects.
    pub fn resolve(&self, labels: &[&str]) -> Result<RangeInclusive<usize>, LoadError> {
        let rows = labels.len();
        let empty = || LoadError::EmptyWindow {
            window: self.to_string(),
            rows,
        };

        match self {
            RowWindow::Trim { leading, trailing } => {
                let needed = leading + trailing;
                if rows < needed {
                    return Err(LoadError::TooFewRows {
                        expected: needed,
                        found: rows,
                    });
                }
                if rows == needed {
                    return Err(empty());
                }
                Ok(*leading..=rows - trailing - 1)
            }
            RowWindow::Span { first, last } => {
                if first > last {
                    return Err(empty());
                }
                if *last >= rows {
                    return Err(LoadError::TooFewRows {
                        expected: last + 1,
                        found: rows,
                    });
                }
                Ok(*first..=*last)
            }
            RowWindow::Labelled { first, last } => {
                let start = labels
                    .iter()
                    .position(|label| *label == first.as_str())
                    .ok_or_else(|| LoadError::MissingLabel(first.clone()))?;
                let end = labels
                    .iter()
                    .skip(start)
                    .position(|label| *label == last.as_str())
                    .map(|offset| start + offset)
                    .ok_or_else(|| LoadError::MissingLabel(last.clone()))?;
                Ok(start..=end)
            }
        }
    }
}

impl Display for RowWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RowWindow::Trim { leading, trailing } => {
                write!(f, "trim({leading} leading, {trailing} trailing)")
            }
            RowWindow::Span { first, last } => write!(f, "span({first}..={last})"),
            RowWindow::Labelled { first, last } => write!(f, "labelled('{first}'..='{last}')"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Cursor;

    #[fixture]
    fn labels() -> Vec<&'static str> {
        vec!["", "Total", "Aguascalientes", "Colima", "Zacatecas", "Nota 1"]
    }

    #[rstest]
    fn test_trim_window(labels: Vec<&str>) {
        let window = RowWindow::Trim {
            leading: 2,
            trailing: 1,
        };
        assert_eq!(window.resolve(&labels).unwrap(), 2..=4);
    }

    #[rstest]
    fn test_trim_window_needs_enough_rows(labels: Vec<&str>) {
        let window = RowWindow::Trim {
            leading: 3,
            trailing: 8,
        };
        assert!(matches!(
            window.resolve(&labels),
            Err(LoadError::TooFewRows {
                expected: 11,
                found: 6
            })
        ));
    }

    #[rstest]
    fn test_trim_window_that_removes_everything_is_empty(labels: Vec<&str>) {
        let window = RowWindow::Trim {
            leading: 3,
            trailing: 3,
        };
        assert!(matches!(
            window.resolve(&labels),
            Err(LoadError::EmptyWindow { rows: 6, .. })
        ));
    }

    #[rstest]
    fn test_span_window(labels: Vec<&str>) {
        let window = RowWindow::Span { first: 1, last: 4 };
        assert_eq!(window.resolve(&labels).unwrap(), 1..=4);

        let too_long = RowWindow::Span { first: 1, last: 29 };
        assert!(matches!(
            too_long.resolve(&labels),
            Err(LoadError::TooFewRows {
                expected: 30,
                found: 6
            })
        ));
    }

    #[rstest]
    fn test_labelled_window(labels: Vec<&str>) {
        let window = RowWindow::Labelled {
            first: "Aguascalientes".into(),
            last: "Zacatecas".into(),
        };
        assert_eq!(window.resolve(&labels).unwrap(), 2..=4);

        let missing = RowWindow::Labelled {
            first: "Aguascalientes".into(),
            last: "Yucatán".into(),
        };
        assert!(matches!(
            missing.resolve(&labels),
            Err(LoadError::MissingLabel(label)) if label == "Yucatán"
        ));
    }

    #[rstest]
    #[case("Total Nacional", true)]
    #[case("TOTAL", true)]
    #[case("Subtotal norte", true)]
    #[case("Jalisco", false)]
    fn test_is_aggregate(#[case] entity: &str, #[case] expected: bool) {
        assert_eq!(is_aggregate(entity, "Total"), expected);
    }

    #[test]
    fn test_partial_json_overrides_only_named_fields() {
        let json = r#"{"generation": {"base_year": 2010, "entity_rows": {"kind": "trim", "leading": 1, "trailing": 2}}}"#;
        let layout = SourceLayout::from_json(Cursor::new(json)).unwrap();

        assert_eq!(layout.consumption, ConsumptionLayout::default());
        assert_eq!(layout.generation.base_year, 2010);
        assert_eq!(
            layout.generation.entity_rows,
            RowWindow::Trim {
                leading: 1,
                trailing: 2
            }
        );
        assert_eq!(layout.generation.months_per_year, 12);
        assert_eq!(
            layout.generation.corrections.get("Morelos"),
            Some(&CorrectionPolicy::ForwardFill)
        );
    }

    #[test]
    fn test_json_with_unknown_field_is_rejected() {
        let json = r#"{"consumption": {"skip_rows": 8, "footer_rows": 2}}"#;
        assert!(SourceLayout::from_json(Cursor::new(json)).is_err());
    }

    #[test]
    fn test_zero_months_per_year_is_rejected() {
        let json = r#"{"generation": {"months_per_year": 0}}"#;
        assert!(SourceLayout::from_json(Cursor::new(json)).is_err());
    }
}
