use eframe::egui::Ui;
use egui_plot::{Bar, BarChart, Legend, Plot};

use crate::color::{generate_palette, histogram_color};
use crate::data::stats::{AggregateResult, Bin};

// ---------------------------------------------------------------------------
// Histogram of the filtered indicator
// ---------------------------------------------------------------------------

pub fn histogram_plot(ui: &mut Ui, column: &str, bins: &[Bin]) {
    let bars: Vec<Bar> = bins
        .iter()
        .map(|b| {
            Bar::new((b.start + b.end) / 2.0, b.count as f64)
                .width(b.end - b.start)
                .name(format!("[{:.2}, {:.2}]", b.start, b.end))
        })
        .collect();

    Plot::new("histogram_plot")
        .height(260.0)
        .x_axis_label(column.to_string())
        .y_axis_label("Frequency")
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(histogram_color()));
        });
}

// ---------------------------------------------------------------------------
// Top-N categories
// ---------------------------------------------------------------------------

pub fn top_n_plot(ui: &mut Ui, result: &AggregateResult) {
    let palette = generate_palette(result.entries.len());

    Plot::new("top_n_plot")
        .height(300.0)
        .legend(Legend::default())
        .x_axis_label(result.category_column.clone())
        .y_axis_label(result.mode.axis_label())
        .show_x(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            for (i, ((label, value), color)) in result.entries.iter().zip(palette).enumerate() {
                let bar = Bar::new(i as f64, *value).width(0.7).fill(color);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(label).color(color));
            }
        });
}
