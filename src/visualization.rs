//! Visualization - Tracking chart of measured value against set-point

use plotters::prelude::*;

use crate::telemetry::TelemetrySample;

pub fn render_tracking_chart(samples: &[TelemetrySample], path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if samples.is_empty() {
        return Err("no telemetry samples to plot".into());
    }

    let t_start = samples[0].time;
    let t_end = samples[samples.len() - 1].time.max(t_start + 1e-3);
    let y_max = samples
        .iter()
        .map(|s| (s.measured as f64).max(s.set_point))
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.1;

    let root = BitMapBackend::new(path, (1024, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Servo tracking", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(t_start..t_end, 0.0..y_max)?;

    chart.configure_mesh().x_desc("Time (s)").y_desc("Position (counts)").draw()?;

    chart
        .draw_series(LineSeries::new(samples.iter().map(|s| (s.time, s.measured as f64)), &BLUE))?
        .label("measured")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
    chart
        .draw_series(LineSeries::new(samples.iter().map(|s| (s.time, s.set_point)), &RED))?
        .label("set-point")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));

    chart.configure_series_labels().border_style(BLACK).draw()?;
    root.present()?;
    Ok(())
}
