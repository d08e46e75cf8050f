use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color;
use crate::data::model::HeatingRate;
use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.dataset.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.selectable_value(&mut state.view, View::Table, "Table");
        ui.selectable_value(&mut state.view, View::Plots, "Plots");

        ui.separator();

        if let (Some(ds), Some(name)) = (&state.dataset, &state.source_name) {
            ui.label(format!(
                "{name}: {} heating rates, {} rows",
                ds.rate_count(),
                ds.rows()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – despiking controls
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.add_space(4.0);
    ui.heading("Despiking");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ui.strong("Parameters");
    let window = egui::Slider::new(&mut state.params.window, 3..=21)
        .step_by(2.0)
        .text("window");
    if ui.add(window).changed() {
        state.invalidate_results();
    }
    let threshold = egui::Slider::new(&mut state.params.threshold, 0.5..=10.0).text("threshold");
    if ui.add(threshold).changed() {
        state.invalidate_results();
    }

    ui.add_space(4.0);
    if ui.button("Despike").clicked() {
        state.run_despike();
    }
    ui.separator();

    // ---- Per-rate visibility and outcome ----
    ui.strong("Heating rates");
    let rates: Vec<HeatingRate> = state
        .dataset
        .as_ref()
        .map(|ds| ds.series.keys().copied().collect())
        .unwrap_or_default();

    for rate in rates {
        let mut checked = state.visible_rates.contains(&rate);
        let label = RichText::new(rate.label()).color(color::rate_color(rate));
        if ui.checkbox(&mut checked, label).changed() {
            if checked {
                state.visible_rates.insert(rate);
            } else {
                state.visible_rates.remove(&rate);
            }
        }
        if let Some(result) = state.results.get(&rate) {
            ui.small(format!("{} spikes replaced", result.spike_count()));
        }
        if let Some(err) = state.failures.get(&rate) {
            ui.small(RichText::new(err).color(Color32::RED));
        }
    }
    ui.separator();

    ui.checkbox(&mut state.show_raw, "Show raw");
    ui.checkbox(&mut state.show_cleaned, "Show cleaned");
    ui.checkbox(&mut state.mark_spikes, "Mark spikes");
}

// ---------------------------------------------------------------------------
// Central panel – data table
// ---------------------------------------------------------------------------

/// Render the loaded dataset as a table, one Temperature/CTE column pair per
/// heating rate. Replaced spike cells are highlighted after a despike run.
pub fn data_table(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a file to view measurements  (File → Open…)");
            });
            return;
        }
    };

    let rates: Vec<HeatingRate> = dataset.series.keys().copied().collect();
    let n_rows = dataset.rows();

    TableBuilder::new(ui)
        .striped(true)
        .columns(Column::remainder().resizable(true), rates.len() * 2)
        .header(32.0, |mut header| {
            for &rate in &rates {
                header.col(|ui: &mut Ui| {
                    ui.strong(
                        RichText::new(format!("{rate}\nTemperature"))
                            .color(color::rate_color(rate)),
                    );
                });
                header.col(|ui: &mut Ui| {
                    ui.strong(
                        RichText::new(format!("{rate}\nCTE")).color(color::rate_color(rate)),
                    );
                });
            }
        })
        .body(|body| {
            body.rows(18.0, n_rows, |mut row| {
                let i = row.index();
                for &rate in &rates {
                    let series = &dataset.series[&rate];
                    row.col(|ui: &mut Ui| {
                        if i < series.len() {
                            ui.label(format!("{:.2}", series.x[i]));
                        }
                    });
                    row.col(|ui: &mut Ui| {
                        if i < series.len() {
                            let is_spike = state
                                .results
                                .get(&rate)
                                .is_some_and(|r| r.spike_indices.contains(&i));
                            let text = format!("{:.4e}", series.y[i]);
                            if is_spike {
                                ui.label(RichText::new(text).color(Color32::RED));
                            } else {
                                ui.label(text);
                            }
                        }
                    });
                }
            });
        });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open CTE measurement data")
        .add_filter("Supported files", &["csv", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} heating rates, {} rows",
                    dataset.rate_count(),
                    dataset.rows()
                );
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("dataset")
                    .to_string();
                state.set_dataset(dataset, name);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn export_file_dialog(state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };

    let file = rfd::FileDialog::new()
        .set_title("Export despiked data")
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .set_file_name("despiked.csv")
        .save_file();

    if let Some(path) = file {
        match crate::data::export::export_file(&path, dataset, &state.results) {
            Ok(()) => {
                log::info!("Exported despiked data to {}", path.display());
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to export: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
