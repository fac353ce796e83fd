use crate::core::table::Year;
use plotly::layout::update_menu::{Button, ButtonMethod, UpdateMenu, UpdateMenuType};
use plotly::layout::{Slider, SliderCurrentValue, SliderMethod, SliderStep};
use serde_json::json;

const FRAME_DURATION_MS: u32 = 500;
const TRANSITION_DURATION_MS: u32 = 300;
const PLAY_FRAME_DURATION_MS: u32 = 700;
const PLAY_TRANSITION_DURATION_MS: u32 = 400;

/// One step per year, each jumping to the frame named after that year.
pub(crate) fn year_slider(years: &[Year]) -> Slider {
    Slider::new()
        .steps(
            years
                .iter()
                .map(|year| {
                    SliderStep::new()
                        .label(year.to_string().as_str())
                        .method(SliderMethod::Animate)
                        .args(json!([
                            [year.to_string()],
                            {
                                "frame": {"duration": FRAME_DURATION_MS, "redraw": true},
                                "mode": "immediate",
                                "transition": {"duration": TRANSITION_DURATION_MS}
                            }
                        ]))
                })
                .collect(),
        )
        .current_value(SliderCurrentValue::new().prefix("Año: "))
}

pub(crate) fn play_pause() -> UpdateMenu {
    UpdateMenu::new()
        .ty(UpdateMenuType::Buttons)
        .show_active(false)
        .buttons(vec![
            Button::new()
                .label("▶ Play")
                .method(ButtonMethod::Animate)
                .args(json!([
                    null,
                    {
                        "frame": {"duration": PLAY_FRAME_DURATION_MS, "redraw": true},
                        "fromcurrent": true,
                        "transition": {"duration": PLAY_TRANSITION_DURATION_MS, "easing": "quadratic-in-out"}
                    }
                ])),
            Button::new()
                .label("⏸ Pause")
                .method(ButtonMethod::Animate)
                .args(json!([
                    [null],
                    {
                        "frame": {"duration": 0, "redraw": false},
                        "mode": "immediate",
                        "transition": {"duration": 0}
                    }
                ])),
        ])
}
