use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use super::panels::{notice, save_file_dialog};
use super::plot::{histogram_plot, top_n_plot};
use crate::config::{PREVIEW_ROWS, SUMMARY_CHARS};
use crate::data::model::Table;
use crate::data::narrative::format_number;
use crate::data::stats::AggregateMode;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Central panel – the analysis page, top to bottom
// ---------------------------------------------------------------------------

pub fn analysis_page(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if state.datasets.is_none() {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading("Press \"Search datasets\" in the left panel first.");
                });
                return;
            }

            dataset_section(ui, state);
            resource_section(ui, state);
            profile_section(ui, state);
            indicator_section(ui, state);
            category_section(ui, state);
            conclusion_section(ui, state);
        });
}

fn dataset_section(ui: &mut Ui, state: &mut AppState) {
    ui.heading("2) Select a dataset");
    let Some(datasets) = &state.datasets else {
        return;
    };
    if datasets.is_empty() {
        return;
    }

    let current_id = state.dataset.as_ref().map(|d| d.id.clone());
    let current_title = datasets
        .iter()
        .find(|d| Some(&d.id) == current_id.as_ref())
        .map(|d| d.display_title().to_string())
        .unwrap_or_default();

    let mut picked: Option<String> = None;
    egui::ComboBox::from_id_salt("dataset_select")
        .selected_text(current_title)
        .width(ui.available_width().min(600.0))
        .show_ui(ui, |ui: &mut Ui| {
            for d in datasets {
                let selected = Some(&d.id) == current_id.as_ref();
                if ui.selectable_label(selected, d.display_title()).clicked() && !selected {
                    picked = Some(d.id.clone());
                }
            }
        });
    if let Some(id) = picked {
        state.select_dataset(&id);
    }
    notice(ui, state.notices.dataset.as_ref());

    if let Some(dataset) = &state.dataset {
        ui.label(RichText::new("Description (summary):").strong());
        ui.label(dataset.summary(SUMMARY_CHARS));
        ui.label("Source: open-data catalog (CKAN action API)");
    }
    ui.separator();
}

fn resource_section(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };
    if dataset.resources.is_empty() {
        return;
    }
    ui.heading("3) Select a resource (table)");

    let current = state.resource_index;
    let current_label = state.selected_resource().map(|r| r.label()).unwrap_or_default();

    let mut picked: Option<usize> = None;
    egui::ComboBox::from_id_salt("resource_select")
        .selected_text(current_label)
        .width(ui.available_width().min(600.0))
        .show_ui(ui, |ui: &mut Ui| {
            for (i, r) in dataset.resources.iter().enumerate() {
                let selected = current == Some(i);
                if ui.selectable_label(selected, r.label()).clicked() && !selected {
                    picked = Some(i);
                }
            }
        });
    if let Some(i) = picked {
        state.select_resource(i);
    }
    notice(ui, state.notices.load.as_ref());
    ui.separator();
}

fn profile_section(ui: &mut Ui, state: &AppState) {
    let (Some(profile), Some(table)) = (&state.profile, &state.table) else {
        return;
    };
    ui.heading("4) Quick profile");

    egui::Grid::new("profile_grid")
        .num_columns(5)
        .spacing([24.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            for label in ["Rows", "Columns", "Total nulls", "Numeric columns", "Potential categories"] {
                ui.label(label);
            }
            ui.end_row();
            for value in [
                profile.rows,
                profile.columns,
                profile.null_cells,
                profile.numeric_count(),
                profile.categorical_count(),
            ] {
                ui.strong(value.to_string());
            }
            ui.end_row();
        });

    ui.add_space(6.0);
    ui.label(RichText::new(format!("Preview (first {PREVIEW_ROWS} rows):")).strong());
    preview_table(ui, &table.head(PREVIEW_ROWS));
    ui.separator();
}

fn preview_table(ui: &mut Ui, table: &Table) {
    ScrollArea::horizontal()
        .id_salt("preview_scroll")
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .columns(Column::auto().at_least(60.0).clip(true), table.columns().len())
                .header(20.0, |mut header| {
                    for col in table.columns() {
                        header.col(|ui: &mut Ui| {
                            ui.strong(col.as_str());
                        });
                    }
                })
                .body(|mut body| {
                    for row in table.rows() {
                        body.row(18.0, |mut table_row| {
                            for cell in row {
                                table_row.col(|ui: &mut Ui| {
                                    ui.label(cell.to_string());
                                });
                            }
                        });
                    }
                });
        });
}

fn indicator_section(ui: &mut Ui, state: &mut AppState) {
    let Some(profile) = &state.profile else {
        return;
    };
    ui.heading("5) Interactive analysis");

    if !profile.numeric.is_empty() {
        let current = state.value_column.clone().unwrap_or_default();
        let mut picked: Option<String> = None;
        egui::ComboBox::from_id_salt("indicator_select")
            .selected_text(current.as_str())
            .show_ui(ui, |ui: &mut Ui| {
                for col in &profile.numeric {
                    if ui.selectable_label(current == *col, col.as_str()).clicked() && current != *col {
                        picked = Some(col.clone());
                    }
                }
            });
        ui.label("Numeric indicator");
        if let Some(col) = picked {
            state.select_column(&col);
        }
    }

    if let (Some(bounds), Some(range)) = (state.bounds, state.range) {
        let (mut lo, mut hi) = (range.lo, range.hi);
        let lo_changed = ui
            .add(egui::Slider::new(&mut lo, bounds.lo..=bounds.hi).text("From"))
            .changed();
        let hi_changed = ui
            .add(egui::Slider::new(&mut hi, bounds.lo..=bounds.hi).text("To"))
            .changed();
        if lo_changed || hi_changed {
            state.set_range(lo, hi);
        }
    }
    notice(ui, state.notices.analysis.as_ref());

    let Some(analysis) = &state.analysis else {
        return;
    };
    let s = &analysis.stats;

    egui::Grid::new("kpi_grid")
        .num_columns(6)
        .spacing([24.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            for label in ["Records (filtered)", "Sum (total production)", "Mean", "Median", "P90", "Max"] {
                ui.label(label);
            }
            ui.end_row();
            ui.strong(s.count.to_string());
            for v in [s.sum, s.mean, s.median, s.p90, s.max] {
                ui.strong(format_number(v));
            }
            ui.end_row();
        });

    ui.add_space(6.0);
    ui.label(RichText::new("Descriptive statistics:").strong());
    egui::Grid::new("describe_grid")
        .num_columns(8)
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            for label in ["count", "mean", "std", "min", "25%", "50%", "75%", "max"] {
                ui.strong(label);
            }
            ui.end_row();
            ui.label(s.count.to_string());
            for v in [s.mean, s.std, s.min, s.quartiles.q25, s.quartiles.q50, s.quartiles.q75, s.max] {
                ui.label(format_number(v));
            }
            ui.end_row();
        });

    ui.add_space(8.0);
    ui.heading("6) Visualizations");
    ui.label(RichText::new(format!("Distribution of {} (filtered)", analysis.column)).strong());
    histogram_plot(ui, &analysis.column, &state.histogram());
}

fn category_section(ui: &mut Ui, state: &mut AppState) {
    let Some(analysis) = &state.analysis else {
        return;
    };
    ui.label(RichText::new("Top 15 by category (e.g. facility, service, region, year)").strong());

    if !analysis.categories.is_empty() {
        let current = state.category_column.clone().unwrap_or_default();
        let mut picked: Option<String> = None;
        egui::ComboBox::from_id_salt("category_select")
            .selected_text(current.as_str())
            .show_ui(ui, |ui: &mut Ui| {
                for col in &analysis.categories {
                    if ui.selectable_label(current == *col, col.as_str()).clicked() && current != *col {
                        picked = Some(col.clone());
                    }
                }
            });

        let mut mode = state.mode;
        ui.horizontal(|ui: &mut Ui| {
            ui.label("Summary per category:");
            for m in AggregateMode::ALL {
                ui.radio_value(&mut mode, m, m.to_string());
            }
        });

        if let Some(col) = picked {
            state.select_category(&col);
        }
        if mode != state.mode {
            state.set_mode(mode);
        }
    }
    notice(ui, state.notices.aggregate.as_ref());

    if let Some(result) = &state.aggregate {
        top_n_plot(ui, result);
        egui::Grid::new("top_n_grid")
            .num_columns(2)
            .striped(true)
            .show(ui, |ui: &mut Ui| {
                ui.strong(result.category_column.as_str());
                ui.strong(result.mode.axis_label());
                ui.end_row();
                for (label, value) in &result.entries {
                    ui.label(label.as_str());
                    ui.label(format_number(*value));
                    ui.end_row();
                }
            });
    }
    ui.separator();
}

fn conclusion_section(ui: &mut Ui, state: &mut AppState) {
    if state.analysis.is_none() {
        return;
    }
    ui.heading("7) Automatic conclusion");
    for line in state.conclusion() {
        ui.label(format!("• {line}"));
    }

    ui.add_space(6.0);
    if ui.button("Download CSV (filtered data)").clicked() {
        save_file_dialog(state);
    }
    notice(ui, state.notices.export.as_ref());
}
