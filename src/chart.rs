//! Bar-chart rendering of account balances.
//!
//! Purely cosmetic output for the admin menu: one bar per account holder,
//! written as a PNG file. Nothing in the core depends on it.

use std::path::Path;

use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;

use crate::Error;

const CHART_SIZE: (u32, u32) = (1000, 500);

/// Renders `balances` as a vertical bar chart at `path`. An empty listing
/// still produces a valid (bar-less) chart.
pub fn render(balances: &[(String, i64)], path: &Path) -> Result<(), Error> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| Error::Chart(e.to_string()))?;

    let max_balance = balances.iter().map(|(_, b)| *b).max().unwrap_or(0);
    // Leave a little headroom above the tallest bar; keep the axis non-empty
    // even when every balance is zero. The axis is f64 so a balance anywhere
    // in the i64 range plots without overflowing.
    let y_max = (max_balance as f64 * 1.1).max(10.0);
    let columns = balances.len().max(1) as u32;

    let mut chart = ChartBuilder::on(&root)
        .caption("User Balances", ("sans-serif", 40).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d((0..columns).into_segmented(), 0f64..y_max)
        .map_err(|e| Error::Chart(e.to_string()))?;

    chart
        .configure_mesh()
        .x_desc("Usernames")
        .y_desc("Balances")
        .x_labels(balances.len().max(1))
        .x_label_formatter(&|value| {
            let idx = match value {
                SegmentValue::Exact(idx) | SegmentValue::CenterOf(idx) => *idx as usize,
                SegmentValue::Last => return String::new(),
            };
            balances
                .get(idx)
                .map(|(username, _)| username.clone())
                .unwrap_or_default()
        })
        .y_label_formatter(&|balance| format!("{balance:.0}"))
        .draw()
        .map_err(|e| Error::Chart(e.to_string()))?;

    chart
        .draw_series(
            Histogram::vertical(&chart).style(BLUE.filled()).data(
                balances
                    .iter()
                    .enumerate()
                    .map(|(idx, (_, balance))| (idx as u32, *balance as f64)),
            ),
        )
        .map_err(|e| Error::Chart(e.to_string()))?;

    root.present().map_err(|e| Error::Chart(e.to_string()))?;
    Ok(())
}
