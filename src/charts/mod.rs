//! Builders for the seven dashboard charts. Each one turns a loaded table or derived series into a
//! [`Chart`]; none of them knows anything about page styling.

mod animation;

use crate::charts::animation::{play_pause, year_slider};
use crate::core::combine::{CombinedTable, COMBINED_UNIT};
use crate::core::table::{Entity, EntityYearTable, Year, YearSeries};
use crate::Dataset;
use indexmap::IndexMap;
use itertools::Itertools;
use plotly::layout::Frame;
use plotly::common::{
    ColorScale, ColorScalePalette, Marker, MarkerSymbol, Mode, Orientation, Title,
};
use plotly::layout::{Axis, Layout};
use plotly::{Bar, Plot, Scatter, Trace, Traces};
use serde::Serialize;
use serde_json::Value;
use std::fmt::{Debug, Formatter};
use strum::{Display, EnumIter, IntoEnumIterator};

#[derive(Clone, Copy, Debug, Display, EnumIter, Eq, Hash, PartialEq, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChartId {
    ConsumptionByEntity,
    GenerationByEntity,
    ConsumptionVsGeneration,
    NationalConsumption,
    NationalGeneration,
    AverageConsumption,
    AverageGeneration,
}

/// A finished chart. Its layout is held apart from the plot so that a theme can extend it before
/// the two are put together.
#[derive(Clone)]
pub struct Chart {
    pub id: ChartId,
    pub title: String,
    plot: Plot,
    layout: Layout,
    frame_count: usize,
}

impl Chart {
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn plot_with(&self, layout: Layout) -> Plot {
        let mut plot = self.plot.clone();
        plot.set_layout(layout);
        plot
    }

    /// The plot with its own, unstyled layout.
    pub fn plot(&self) -> Plot {
        self.plot_with(self.layout.clone())
    }

    pub fn to_value(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.plot().to_json())
    }
}

impl Debug for Chart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chart")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}

/// Extra text shown when hovering over a year of the national consumption series.
pub type HoverNotes = IndexMap<Year, String>;

pub fn default_hover_notes() -> HoverNotes {
    IndexMap::from([(
        2024,
        "Causa: Sequía, Calor Extremo y Alta demanda vs Capacidad Insuficiente".to_string(),
    )])
}

pub fn build_charts(dataset: &Dataset, notes: &HoverNotes) -> Vec<Chart> {
    ChartId::iter()
        .map(|id| build_chart(id, dataset, notes))
        .collect()
}

pub fn build_chart(id: ChartId, dataset: &Dataset, notes: &HoverNotes) -> Chart {
    let consumption = &dataset.consumption.table;
    let consumption_unit = consumption.unit();
    let generation_unit = dataset.generation.unit();

    match id {
        ChartId::ConsumptionByEntity => entity_animation(
            id,
            consumption,
            &BarLabels {
                title: format!(
                    "Evolución del Consumo Eléctrico por Estado {}",
                    year_range(consumption.years())
                ),
                series: "Consumo".into(),
                value_axis: format!("Consumo ({consumption_unit})"),
                palette: ColorScalePalette::YlOrRd,
            },
        ),
        ChartId::GenerationByEntity => entity_animation(
            id,
            &dataset.generation_by_entity,
            &BarLabels {
                title: format!(
                    "Generación Eléctrica por Estado {}",
                    year_range(dataset.generation_by_entity.years())
                ),
                series: "Generación".into(),
                value_axis: format!("Generación ({generation_unit})"),
                palette: ColorScalePalette::Blues,
            },
        ),
        ChartId::ConsumptionVsGeneration => consumption_vs_generation(id, &dataset.combined),
        ChartId::NationalConsumption => national_series(
            id,
            &dataset.national_consumption,
            &LineLabels {
                title: format!(
                    "Consumo Eléctrico Total Nacional {}",
                    year_range(&series_years(&dataset.national_consumption))
                ),
                series: "Consumo eléctrico".into(),
                quantity: "Consumo".into(),
                unit: consumption_unit.to_string(),
            },
            notes,
        ),
        ChartId::NationalGeneration => national_series(
            id,
            &dataset.national_generation,
            &LineLabels {
                title: format!(
                    "Evolución de la Generación Eléctrica Total Nacional {}",
                    year_range(&series_years(&dataset.national_generation))
                ),
                series: "Generación eléctrica".into(),
                quantity: "Generación".into(),
                unit: generation_unit.to_string(),
            },
            &HoverNotes::new(),
        ),
        ChartId::AverageConsumption => average_bars(
            id,
            &dataset.average_consumption,
            &BarLabels {
                title: "Consumo Promedio de Energía por Estado".into(),
                series: "Consumo promedio".into(),
                value_axis: format!("Consumo ({consumption_unit})"),
                palette: ColorScalePalette::YlOrRd,
            },
        ),
        ChartId::AverageGeneration => average_bars(
            id,
            &dataset.average_generation,
            &BarLabels {
                title: format!(
                    "Generación Eléctrica Promedio por Estado {}",
                    year_range(dataset.generation.years())
                ),
                series: "Generación promedio".into(),
                value_axis: format!("Generación ({generation_unit})"),
                palette: ColorScalePalette::Blues,
            },
        ),
    }
}

pub struct BarLabels {
    pub title: String,
    pub series: String,
    pub value_axis: String,
    pub palette: ColorScalePalette,
}

pub struct LineLabels {
    pub title: String,
    pub series: String,
    pub quantity: String,
    pub unit: String,
}

/// Horizontal bars per entity, one animation frame per year, each frame sorted ascending with
/// missing values left out. The chart opens on the first year.
pub fn entity_animation(id: ChartId, table: &EntityYearTable, labels: &BarLabels) -> Chart {
    let bars_for = |year: Year| -> Vec<Box<dyn Trace>> {
        let (entities, values) = ascending(
            table
                .column(year)
                .filter_map(|(entity, value)| value.map(|value| (entity, value))),
        );
        vec![horizontal_bars(
            &labels.series,
            entities,
            values,
            labels.palette.clone(),
        )]
    };

    animated_chart(
        id,
        &labels.title,
        table.years(),
        bars_for,
        (labels.value_axis.as_str(), "Estado"),
    )
}

/// Consumption bars against generation markers for each year of the combined table.
pub fn consumption_vs_generation(id: ChartId, combined: &CombinedTable) -> Chart {
    let traces_for = |year: Year| -> Vec<Box<dyn Trace>> {
        let (bar_entities, bar_values) = ascending(
            combined
                .for_year(year)
                .filter_map(|record| record.consumption.map(|value| (&record.entity, value))),
        );
        let (marker_entities, marker_values): (Vec<String>, Vec<f64>) = combined
            .for_year(year)
            .filter_map(|record| {
                record
                    .generation
                    .map(|value| (record.entity.to_string(), value))
            })
            .unzip();

        let bars = horizontal_bars(
            &format!("Consumo ({COMBINED_UNIT})"),
            bar_entities,
            bar_values,
            ColorScalePalette::Blues,
        );
        let markers = Scatter::new(marker_values, marker_entities)
            .mode(Mode::Markers)
            .name(format!("Generación ({COMBINED_UNIT})").as_str())
            .marker(Marker::new().symbol(MarkerSymbol::Diamond))
            .hover_template(
                format!("<b>%{{y}}</b><br>Generación: %{{x:,.0f}} {COMBINED_UNIT}<extra></extra>")
                    .as_str(),
            );
        vec![bars, markers]
    };

    let title = format!(
        "Consumo vs Generación Eléctrica por Estado {}",
        year_range(combined.years())
    );
    animated_chart(
        id,
        &title,
        combined.years(),
        traces_for,
        (COMBINED_UNIT.to_string().as_str(), "Estados"),
    )
}

/// A line through a nationwide yearly series. Hovering shows the year and the value, plus the
/// year's note when there is one.
pub fn national_series(
    id: ChartId,
    series: &YearSeries,
    labels: &LineLabels,
    notes: &HoverNotes,
) -> Chart {
    let note_lines: Vec<String> = series
        .keys()
        .map(|year| {
            notes
                .get(year)
                .map(|note| format!("<br>{note}"))
                .unwrap_or_default()
        })
        .collect();

    let line = Scatter::new(series_years(series), series.values().copied().collect())
        .mode(Mode::LinesMarkers)
        .name(labels.series.as_str())
        .text_array(note_lines)
        .hover_template(
            format!(
                "Año: %{{x}}<br>{}: %{{y:,.0f}} {}%{{text}}<extra></extra>",
                labels.quantity, labels.unit
            )
            .as_str(),
        );

    static_chart(
        id,
        &labels.title,
        line,
        ("Año", format!("{} ({})", labels.quantity, labels.unit).as_str()),
    )
}

/// Static horizontal bars of per-entity averages, already in ascending order.
pub fn average_bars(id: ChartId, averages: &IndexMap<Entity, f64>, labels: &BarLabels) -> Chart {
    let bars = horizontal_bars(
        &labels.series,
        averages.keys().map(|entity| entity.to_string()).collect(),
        averages.values().copied().collect(),
        labels.palette.clone(),
    );

    static_chart(
        id,
        &labels.title,
        bars,
        (labels.value_axis.as_str(), "Estado"),
    )
}

/// Horizontal bars with one category per value, shaded by value.
fn horizontal_bars(
    name: &str,
    labels: Vec<String>,
    values: Vec<f64>,
    palette: ColorScalePalette,
) -> Box<dyn Trace> {
    Bar::new(values.clone(), labels)
        .orientation(Orientation::Horizontal)
        .name(name)
        .marker(
            Marker::new()
                .color_array(values)
                .color_scale(ColorScale::Palette(palette)),
        )
}

fn layout_for(title: &str, (x_title, y_title): (&str, &str)) -> Layout {
    Layout::new()
        .title(Title::with_text(title))
        .x_axis(Axis::new().title(Title::with_text(x_title)))
        .y_axis(Axis::new().title(Title::with_text(y_title)))
}

fn static_chart(id: ChartId, title: &str, trace: Box<dyn Trace>, axes: (&str, &str)) -> Chart {
    let mut plot = Plot::new();
    plot.add_trace(trace);

    Chart {
        id,
        title: title.to_string(),
        plot,
        layout: layout_for(title, axes),
        frame_count: 0,
    }
}

/// One frame per year, named after it, with a year slider and play/pause buttons. The plot starts
/// out showing the first year's traces.
fn animated_chart<T: IntoIterator<Item = Box<dyn Trace>>>(
    id: ChartId,
    title: &str,
    years: &[Year],
    traces_for: impl Fn(Year) -> T,
    axes: (&str, &str),
) -> Chart {
    let mut plot = Plot::new();
    if let Some(first) = years.first() {
        for trace in traces_for(*first) {
            plot.add_trace(trace);
        }
    }
    for year in years {
        let mut data = Traces::new();
        for trace in traces_for(*year) {
            data.push(trace);
        }
        plot.add_frame(Frame::new().name(year.to_string().as_str()).data(data));
    }

    let mut layout = layout_for(title, axes);
    if !years.is_empty() {
        layout = layout
            .sliders(vec![year_slider(years)])
            .update_menus(vec![play_pause()]);
    }

    Chart {
        id,
        title: title.to_string(),
        plot,
        layout,
        frame_count: years.len(),
    }
}

/// Splits (entity, value) pairs into labels and values sorted ascending by value. Ties keep their
/// original order.
fn ascending<'a>(pairs: impl Iterator<Item = (&'a Entity, f64)>) -> (Vec<String>, Vec<f64>) {
    pairs
        .sorted_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(entity, value)| (entity.to_string(), value))
        .unzip()
}

fn series_years(series: &YearSeries) -> Vec<Year> {
    series.keys().copied().collect()
}

/// "(first–last)" for a non-empty year list, empty otherwise.
pub fn year_range(years: &[Year]) -> String {
    match (years.iter().min(), years.iter().max()) {
        (Some(first), Some(last)) => format!("({first}–{last})"),
        _ => String::new(),
    }
}
