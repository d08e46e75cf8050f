use eframe::egui;

use crate::state::{AppState, View};
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct DespikerApp {
    pub state: AppState,
}

impl eframe::App for DespikerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: despiking controls ----
        egui::SidePanel::left("despike_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: table or plots ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.view {
            View::Table => panels::data_table(ui, &self.state),
            View::Plots => plot::rate_plots(ui, &self.state),
        });
    }
}
