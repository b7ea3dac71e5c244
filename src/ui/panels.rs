use eframe::egui::{self, Color32, RichText, Ui};

use crate::config::{HISTOGRAM_BINS_RANGE, ROW_LIMIT_RANGE, ROW_LIMIT_STEP, SEARCH_ROWS_RANGE};
use crate::data::export::SUGGESTED_FILE_NAME;
use crate::state::{AppState, Level, Notice};

// ---------------------------------------------------------------------------
// Left side panel – search controls
// ---------------------------------------------------------------------------

/// Render the left search panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("1) Targeted search");
    ui.separator();

    ui.label("Keywords (e.g. hospital, egresos, prestaciones, camas, urgencia)");
    let query_response = ui.text_edit_singleline(&mut state.query);
    let submitted =
        query_response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

    ui.add_space(4.0);
    ui.add(
        egui::Slider::new(&mut state.search_rows, SEARCH_ROWS_RANGE).text("Results"),
    );

    let mut row_limit = state.row_limit;
    let limit_response = ui.add(
        egui::Slider::new(&mut row_limit, ROW_LIMIT_RANGE)
            .step_by(ROW_LIMIT_STEP as f64)
            .text("Max rows"),
    );
    if limit_response.changed() {
        state.set_row_limit(row_limit);
    }

    ui.add_space(4.0);
    if ui.button("Search datasets").clicked() || submitted {
        state.search();
    }
    notice(ui, state.notices.search.as_ref());

    ui.separator();
    ui.strong("Histogram");
    ui.add(egui::Slider::new(&mut state.histogram_bins, HISTOGRAM_BINS_RANGE).text("Bins"));
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            let can_export = state.analysis.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export filtered CSV…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(profile) = &state.profile {
            let visible = state.analysis.as_ref().map_or(0, |a| a.filtered.len());
            ui.label(format!("{} rows loaded, {visible} in range", profile.rows));
        }

        if state.notices.export.is_some() {
            ui.separator();
            notice(ui, state.notices.export.as_ref());
        }
    });
}

// ---------------------------------------------------------------------------
// Shared widgets
// ---------------------------------------------------------------------------

/// Show a stage notice, if any, coloured by level.
pub fn notice(ui: &mut Ui, notice: Option<&Notice>) {
    let Some(n) = notice else {
        return;
    };
    let color = match n.level {
        Level::Info => Color32::from_rgb(90, 160, 220),
        Level::Warning => Color32::from_rgb(220, 170, 40),
        Level::Error => Color32::RED,
    };
    ui.label(RichText::new(&n.text).color(color));
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save filtered data")
        .set_file_name(SUGGESTED_FILE_NAME)
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        state.export_to(&path);
    }
}
