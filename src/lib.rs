pub mod charts;
pub mod core;
pub mod errors;
pub mod layout;
pub mod output;
pub mod page;
pub mod raw_table;

use crate::charts::{build_charts, Chart, ChartId, HoverNotes};
use crate::core::combine::{combine, CombinedTable};
use crate::core::consumption::{load_consumption, ConsumptionData};
use crate::core::generation::load_generation;
use crate::core::summary::{
    average_by_entity, cross_check_grand_total, total_by_year, TotalMismatch,
};
use crate::core::table::{Entity, EntityYearTable, YearSeries};
use crate::errors::{OutputError, PanoramaError};
use crate::layout::SourceLayout;
use crate::output::Output;
use crate::page::{render_page, Theme};
use bitflags::bitflags;
use csv::WriterBuilder;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value;
use std::io::{Read, Write};
use tracing::{debug, info};

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DashboardFlags: u32 {
        const WRITE_PAGE = 0b1;
        const WRITE_FIGURES_JSON = 0b10;
        const WRITE_SUMMARY_CSV = 0b100;
    }
}

/// Everything the charts are drawn from: both loaded tables and the series derived from them.
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub consumption: ConsumptionData,
    /// Generation as loaded, aggregate rows included.
    pub generation: EntityYearTable,
    /// Generation with aggregate rows removed.
    pub generation_by_entity: EntityYearTable,
    pub combined: CombinedTable,
    pub national_consumption: YearSeries,
    pub national_generation: YearSeries,
    pub average_consumption: IndexMap<Entity, f64>,
    pub average_generation: IndexMap<Entity, f64>,
    pub grand_total_mismatches: Vec<TotalMismatch>,
}

pub fn load_dataset(
    consumption: impl Read,
    generation: impl Read,
    layout: &SourceLayout,
) -> Result<Dataset, PanoramaError> {
    layout.validate()?;

    let consumption = load_consumption(consumption, &layout.consumption)
        .map_err(PanoramaError::loading("consumption"))?;
    info!(
        entities = consumption.table.len(),
        years = consumption.table.years().len(),
        "loaded consumption table"
    );
    let generation = load_generation(generation, &layout.generation)
        .map_err(PanoramaError::loading("generation"))?;
    info!(
        entities = generation.len(),
        years = generation.years().len(),
        "loaded generation table"
    );

    let is_aggregate = |entity: &str| layout.generation.is_aggregate(entity);
    let generation_by_entity = generation.retain_entities(|entity| !is_aggregate(entity));
    debug!(
        removed = generation.len() - generation_by_entity.len(),
        "removed aggregate generation rows"
    );

    let combined = combine(&consumption.table, &generation);
    let national_consumption = total_by_year(&consumption.table, |_| false);
    let national_generation = total_by_year(&generation, is_aggregate);
    let average_consumption = average_by_entity(&consumption.table, |_| false);
    let average_generation = average_by_entity(&generation, is_aggregate);

    let grand_total_mismatches = match &consumption.grand_total {
        Some(reported) => cross_check_grand_total(reported, &national_consumption),
        None => vec![],
    };

    Ok(Dataset {
        consumption,
        generation,
        generation_by_entity,
        combined,
        national_consumption,
        national_generation,
        average_consumption,
        average_generation,
        grand_total_mismatches,
    })
}

#[derive(Debug)]
pub struct DashboardRun {
    pub dataset: Dataset,
    pub charts: Vec<Chart>,
}

pub fn run_dashboard(
    consumption: impl Read,
    generation: impl Read,
    output: impl Output,
    layout: &SourceLayout,
    notes: &HoverNotes,
    theme: &Theme,
    flags: DashboardFlags,
) -> Result<DashboardRun, PanoramaError> {
    let dataset = load_dataset(consumption, generation, layout)?;
    let charts = build_charts(&dataset, notes);
    info!(charts = charts.len(), "built charts");

    if output.is_noop() {
        return Ok(DashboardRun { dataset, charts });
    }

    if flags.contains(DashboardFlags::WRITE_PAGE) {
        write_page(&output, &charts, theme).map_err(OutputError::new)?;
    }
    if flags.contains(DashboardFlags::WRITE_FIGURES_JSON) {
        write_figures_json(&output, &charts).map_err(OutputError::new)?;
    }
    if flags.contains(DashboardFlags::WRITE_SUMMARY_CSV) {
        write_combined_csv(&output, &dataset.combined).map_err(OutputError::new)?;
        write_national_totals_csv(&output, &dataset).map_err(OutputError::new)?;
        write_entity_averages_csv(&output, &dataset).map_err(OutputError::new)?;
    }

    Ok(DashboardRun { dataset, charts })
}

fn write_page(output: &impl Output, charts: &[Chart], theme: &Theme) -> anyhow::Result<()> {
    let page = render_page(charts, theme);
    info!("writing out dashboard page");
    let mut writer = output.writer_for_location_key("dashboard", "html")?;
    writer.write_all(page.as_bytes())?;
    writer.flush()?;
    Ok(())
}

#[derive(Serialize)]
struct FigureEntry<'a> {
    id: ChartId,
    title: &'a str,
    figure: Value,
}

fn write_figures_json(output: &impl Output, charts: &[Chart]) -> anyhow::Result<()> {
    let entries = charts
        .iter()
        .map(|chart| {
            Ok(FigureEntry {
                id: chart.id,
                title: &chart.title,
                figure: chart.to_value()?,
            })
        })
        .collect::<serde_json::Result<Vec<_>>>()?;
    info!("writing out figures JSON");
    let mut writer = output.writer_for_location_key("figures", "json")?;
    serde_json::to_writer_pretty(&mut writer, &entries)?;
    writer.flush()?;
    Ok(())
}

fn write_combined_csv(output: &impl Output, combined: &CombinedTable) -> anyhow::Result<()> {
    info!(records = combined.len(), "writing out combined table");
    let writer = output.writer_for_location_key("combined", "csv")?;
    let mut writer = WriterBuilder::new().from_writer(writer);
    if combined.is_empty() {
        writer.write_record(["entity", "year", "consumption", "generation"])?;
    }
    for record in combined.records() {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_national_totals_csv(output: &impl Output, dataset: &Dataset) -> anyhow::Result<()> {
    let consumption_unit = dataset.consumption.table.unit();
    let generation_unit = dataset.generation.unit();
    let years = dataset
        .national_consumption
        .keys()
        .chain(dataset.national_generation.keys())
        .copied()
        .sorted()
        .dedup()
        .collect_vec();

    info!(years = years.len(), "writing out national totals");
    let writer = output.writer_for_location_key("national_totals", "csv")?;
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record([
        "year".to_string(),
        format!("consumption ({consumption_unit})"),
        format!("generation ({generation_unit})"),
    ])?;
    for year in years {
        writer.write_record([
            year.to_string(),
            optional_cell(dataset.national_consumption.get(&year)),
            optional_cell(dataset.national_generation.get(&year)),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_entity_averages_csv(output: &impl Output, dataset: &Dataset) -> anyhow::Result<()> {
    info!("writing out entity averages");
    let writer = output.writer_for_location_key("entity_averages", "csv")?;
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(["source", "entity", "average", "unit"])?;
    for (source, averages, unit) in [
        (
            "consumption",
            &dataset.average_consumption,
            dataset.consumption.table.unit(),
        ),
        (
            "generation",
            &dataset.average_generation,
            dataset.generation.unit(),
        ),
    ] {
        for (entity, average) in averages {
            writer.write_record([
                source.to_string(),
                entity.to_string(),
                average.to_string(),
                unit.to_string(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn optional_cell(value: Option<&f64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}
