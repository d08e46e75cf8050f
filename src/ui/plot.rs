use eframe::egui::{Color32, ScrollArea, Ui};
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotPoints, Points};

use crate::color;
use crate::data::model::HeatingRate;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Per-rate raw vs cleaned plots (central panel)
// ---------------------------------------------------------------------------

/// Render one plot per visible heating rate, stacked vertically: the raw
/// curve dimmed behind the cleaned one, replaced spikes marked with crosses.
pub fn rate_plots(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a file to view measurements  (File → Open…)");
            });
            return;
        }
    };

    let visible: Vec<HeatingRate> = dataset
        .series
        .keys()
        .copied()
        .filter(|rate| state.visible_rates.contains(rate))
        .collect();
    if visible.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No heating rate selected.");
        });
        return;
    }

    let plot_height = (ui.available_height() / visible.len() as f32 - 8.0).max(120.0);

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for rate in visible {
                let series = &dataset.series[&rate];

                Plot::new(("rate_plot", rate.label()))
                    .height(plot_height)
                    .legend(Legend::default())
                    .x_axis_label("Temperature [°C]")
                    .y_axis_label("CTE")
                    .allow_boxed_zoom(true)
                    .allow_drag(true)
                    .allow_scroll(false)
                    .allow_zoom(true)
                    .show(ui, |plot_ui| {
                        if state.show_raw {
                            let points: PlotPoints = series
                                .x
                                .iter()
                                .zip(series.y.iter())
                                .map(|(&xi, &yi)| [xi, yi])
                                .collect();
                            plot_ui.line(
                                Line::new(points)
                                    .name(format!("{rate} raw"))
                                    .color(color::raw_color(rate))
                                    .width(1.0),
                            );
                        }

                        let Some(result) = state.results.get(&rate) else {
                            return;
                        };

                        if state.show_cleaned {
                            let points: PlotPoints = series
                                .x
                                .iter()
                                .zip(result.cleaned_y.iter())
                                .map(|(&xi, &yi)| [xi, yi])
                                .collect();
                            plot_ui.line(
                                Line::new(points)
                                    .name(format!("{rate} cleaned"))
                                    .color(color::rate_color(rate))
                                    .width(1.5),
                            );
                        }

                        if state.mark_spikes && !result.spike_indices.is_empty() {
                            let points: PlotPoints = result
                                .spike_indices
                                .iter()
                                .map(|&i| [series.x[i], series.y[i]])
                                .collect();
                            plot_ui.points(
                                Points::new(points)
                                    .name(format!("{rate} spikes"))
                                    .color(Color32::RED)
                                    .shape(MarkerShape::Cross)
                                    .radius(5.0),
                            );
                        }
                    });
            }
        });
}
