use std::collections::{BTreeMap, BTreeSet};

use crate::data::despike::{self, SmoothParams};
use crate::data::model::{Dataset, HeatingRate, SmoothingResult};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Which central view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Table,
    Plots,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset (None until user loads a file).
    pub dataset: Option<Dataset>,

    /// File name of the loaded dataset, for the top bar.
    pub source_name: Option<String>,

    /// Despiking parameters, editable in the side panel.
    pub params: SmoothParams,

    /// Per-rate smoothing results from the last despike run.
    pub results: BTreeMap<HeatingRate, SmoothingResult>,

    /// Per-rate failures from the last despike run, as shown messages.
    pub failures: BTreeMap<HeatingRate, String>,

    /// Which heating rates are plotted.
    pub visible_rates: BTreeSet<HeatingRate>,

    /// Active central view.
    pub view: View,

    /// Curve visibility toggles.
    pub show_raw: bool,
    pub show_cleaned: bool,
    pub mark_spikes: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            source_name: None,
            params: SmoothParams::default(),
            results: BTreeMap::new(),
            failures: BTreeMap::new(),
            visible_rates: BTreeSet::new(),
            view: View::Table,
            show_raw: true,
            show_cleaned: true,
            mark_spikes: true,
            status_message: None,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset, resetting derived state.
    pub fn set_dataset(&mut self, dataset: Dataset, source_name: String) {
        self.visible_rates = dataset.series.keys().copied().collect();
        self.results.clear();
        self.failures.clear();
        self.dataset = Some(dataset);
        self.source_name = Some(source_name);
        self.status_message = None;
        self.view = View::Table;
    }

    /// Run the despiking core over every loaded series.
    pub fn run_despike(&mut self) {
        let Some(dataset) = &self.dataset else {
            return;
        };

        self.results.clear();
        self.failures.clear();
        for (rate, outcome) in despike::smooth_dataset(dataset, &self.params) {
            match outcome {
                Ok(result) => {
                    log::info!("{rate}: replaced {} spikes", result.spike_count());
                    self.results.insert(rate, result);
                }
                Err(e) => {
                    log::warn!("{rate}: {e}");
                    self.failures.insert(rate, e.to_string());
                }
            }
        }

        self.status_message = if self.failures.is_empty() {
            None
        } else {
            Some(format!(
                "{} of {} heating rates could not be despiked",
                self.failures.len(),
                self.failures.len() + self.results.len()
            ))
        };
        self.view = View::Plots;
    }

    /// Drop stale results after a parameter change.
    pub fn invalidate_results(&mut self) {
        self.results.clear();
        self.failures.clear();
    }
}
