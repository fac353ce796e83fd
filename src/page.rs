//! The dashboard page. Presentation state lives here and is applied to finished charts, so the
//! data pipeline never depends on it.

use crate::charts::{Chart, ChartId};
use plotly::common::{Anchor, Font, Title};
use plotly::layout::themes::PLOTLY_DARK;
use plotly::layout::Layout;

pub const PLOTLY_JS_URL: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Clone, Debug)]
pub struct Theme {
    pub page_title: String,
    pub background: &'static str,
    pub font_color: &'static str,
    pub bar_gap: f64,
    /// Height in pixels for charts with one bar per entity.
    pub tall_chart_height: usize,
    pub stylesheet: &'static str,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            page_title: "Panorama de Energía Eléctrica en México".into(),
            background: "black",
            font_color: "white",
            bar_gap: 0.15,
            tall_chart_height: 900,
            stylesheet: STYLESHEET,
        }
    }
}

impl Theme {
    /// The chart's own layout with the theme laid over it and the title centred.
    pub fn layout_for(&self, chart: &Chart) -> Layout {
        let layout = chart
            .layout()
            .clone()
            .template(&*PLOTLY_DARK)
            .plot_background_color(self.background)
            .paper_background_color(self.background)
            .font(Font::new().color(self.font_color))
            .bar_gap(self.bar_gap)
            .title(
                Title::with_text(&chart.title)
                    .x(0.5)
                    .x_anchor(Anchor::Center),
            );
        if is_tall(chart.id) {
            layout.height(self.tall_chart_height)
        } else {
            layout
        }
    }
}

fn is_tall(id: ChartId) -> bool {
    !matches!(id, ChartId::NationalConsumption | ChartId::NationalGeneration)
}

/// An HTML page drawing every chart with plotly.js, one section per chart.
pub fn render_page(charts: &[Chart], theme: &Theme) -> String {
    let sections: String = charts
        .iter()
        .map(|chart| {
            let div_id = format!("chart-{}", chart.id);
            let plot = chart.plot_with(theme.layout_for(chart));
            format!(
                "<section>\n{}\n</section>\n<hr>\n",
                plot.to_inline_html(Some(&div_id))
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="es">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_JS_URL}"></script>
<style>{stylesheet}</style>
</head>
<body>
<h1>{title}</h1>
<hr>
{sections}</body>
</html>
"#,
        title = escape_html(&theme.page_title),
        stylesheet = theme.stylesheet,
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const STYLESHEET: &str = r#"
body {
    background: linear-gradient(135deg, #0f2027, #203a43, #2c5364);
    color: white;
    font-family: 'Segoe UI', sans-serif;
    padding: 15px 40px 40px;
}
h1 {
    text-align: center;
    color: #00FFAA;
    font-size: 52px;
    font-weight: bold;
    margin-bottom: 40px;
    text-shadow: 1px 1px 5px black;
}
hr {
    border: 0;
    height: 1px;
    background: #555;
    margin: 40px 0;
}
section {
    width: 100%;
}
"#;
