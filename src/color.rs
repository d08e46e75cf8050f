use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::HeatingRate;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Heating rate → Color32
// ---------------------------------------------------------------------------

/// Fixed colour per heating rate, stable across sessions.
pub fn rate_color(rate: HeatingRate) -> Color32 {
    let palette = generate_palette(HeatingRate::ALL.len());
    let idx = HeatingRate::ALL
        .iter()
        .position(|&r| r == rate)
        .unwrap_or(0);
    palette[idx]
}

/// Dimmed variant used for the raw curve behind the cleaned one.
pub fn raw_color(rate: HeatingRate) -> Color32 {
    rate_color(rate).gamma_multiply(0.45)
}
