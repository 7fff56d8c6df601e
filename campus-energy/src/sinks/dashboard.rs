//! PNG dashboard with three stacked panels:
//! 1. daily consumption trend per building (lines),
//! 2. average weekly consumption per building (bars),
//! 3. individual readings over time (scatter).

use std::{collections::BTreeMap, error::Error, path::PathBuf};

use energy_model::domain::{BuildingAverage, Reading};
use plotters::{coord::Shift, prelude::*};
use time::{Date, PrimitiveDateTime};

use crate::pipeline::{PipelineError, Sink};

use super::Analysis;

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type DrawResult = Result<(), Box<dyn Error>>;

/// One named line or point cloud. `x` is a Julian day number (fractional
/// for intra-day timestamps).
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardData {
    pub daily_trend: Vec<Series>,
    pub weekly_average: Vec<(String, f64)>,
    pub readings: Vec<Series>,
}

fn day_number(ts: PrimitiveDateTime) -> f64 {
    let t = ts.time();
    let secs = u32::from(t.hour()) * 3600 + u32::from(t.minute()) * 60 + u32::from(t.second());
    f64::from(ts.date().to_julian_day()) + f64::from(secs) / 86_400.0
}

fn day_label(x: f64) -> String {
    match Date::from_julian_day(x.floor() as i32) {
        Ok(d) => format!("{:04}-{:02}-{:02}", d.year(), u8::from(d.month()), d.day()),
        Err(_) => String::new(),
    }
}

fn readings_by_building(readings: &[Reading]) -> Vec<Series> {
    let mut grouped: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
    for r in readings {
        grouped
            .entry(r.building_id())
            .or_default()
            .push((day_number(r.timestamp()), r.usage_kwh()));
    }
    grouped
        .into_iter()
        .map(|(name, mut points)| {
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            Series {
                name: name.to_string(),
                points,
            }
        })
        .collect()
}

impl DashboardData {
    pub fn from_analysis(analysis: &Analysis<'_>) -> Self {
        let mut trend: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
        // `daily` iterates by building then day, so points arrive sorted.
        for (key, record) in &analysis.daily {
            if let Some(bucket) = key.bucket {
                trend
                    .entry(key.building_id.as_str())
                    .or_default()
                    .push((f64::from(bucket.date().to_julian_day()), record.total_kwh));
            }
        }

        Self {
            daily_trend: trend
                .into_iter()
                .map(|(name, points)| Series {
                    name: name.to_string(),
                    points,
                })
                .collect(),
            weekly_average: analysis
                .overview
                .weekly_averages
                .iter()
                .map(|BuildingAverage { building_id, average_kwh, .. }| {
                    (building_id.clone(), *average_kwh)
                })
                .collect(),
            readings: readings_by_building(&analysis.outcome.readings),
        }
    }
}

fn x_bounds(series: &[Series]) -> (f64, f64) {
    let xs = series.iter().flat_map(|s| s.points.iter().map(|p| p.0));
    let (min, max) = xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
        (lo.min(x), hi.max(x))
    });
    if !min.is_finite() {
        return (0.0, 1.0);
    }
    if max - min < 1.0 {
        return (min - 0.5, max + 0.5);
    }
    (min, max)
}

fn y_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.filter(|v| v.is_finite()).fold(0.0_f64, f64::max);
    if max <= 0.0 {
        return 1.0;
    }
    let padded = max * 1.1;
    if padded.is_finite() {
        padded
    } else {
        max
    }
}

pub struct DashboardSink {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl DashboardSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            width: 1200,
            height: 1200,
        }
    }

    fn draw(&self, data: &DashboardData) -> DrawResult {
        let root = BitMapBackend::new(&self.path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled("Building Energy Consumption Dashboard", ("sans-serif", 28))?;

        let panels = root.split_evenly((3, 1));
        draw_trend(&panels[0], &data.daily_trend)?;
        draw_weekly_bars(&panels[1], &data.weekly_average)?;
        draw_scatter(&panels[2], &data.readings)?;

        root.present()?;
        Ok(())
    }
}

fn draw_trend(area: &Panel<'_>, series: &[Series]) -> DrawResult {
    let (x_min, x_max) = x_bounds(series);
    let top = y_max(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)));

    let mut chart = ChartBuilder::on(area)
        .caption("1. Daily Consumption Trend Over Time", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, 0.0..top)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Daily kWh Total")
        .x_label_formatter(&|x| day_label(*x))
        .draw()?;

    for (idx, s) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(LineSeries::new(s.points.iter().copied(), color.stroke_width(2)))?
            .label(s.name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

fn draw_weekly_bars(area: &Panel<'_>, averages: &[(String, f64)]) -> DrawResult {
    let n = averages.len().max(1) as f64;
    let top = y_max(averages.iter().map(|(_, v)| *v));
    let names: Vec<String> = averages.iter().map(|(name, _)| name.clone()).collect();

    let mut chart = ChartBuilder::on(area)
        .caption("2. Comparison of Average Weekly Usage (kWh)", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5..(n - 0.5), 0.0..top)?;

    let label = move |x: &f64| {
        let rounded = x.round();
        if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        names.get(rounded as usize).cloned().unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(averages.len().max(1))
        .x_label_formatter(&label)
        .x_desc("Building")
        .y_desc("Average Weekly kWh")
        .draw()?;

    chart.draw_series(averages.iter().enumerate().map(|(i, (_, v))| {
        let x = i as f64;
        Rectangle::new([(x - 0.3, 0.0), (x + 0.3, *v)], Palette99::pick(i).filled())
    }))?;
    Ok(())
}

fn draw_scatter(area: &Panel<'_>, series: &[Series]) -> DrawResult {
    let (x_min, x_max) = x_bounds(series);
    let top = y_max(series.iter().flat_map(|s| s.points.iter().map(|p| p.1)));

    let mut chart = ChartBuilder::on(area)
        .caption("3. Peak Consumption Events", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(70)
        .build_cartesian_2d(x_min..x_max, 0.0..top)?;

    chart
        .configure_mesh()
        .x_desc("Date (Time)")
        .y_desc("Reading kWh")
        .x_label_formatter(&|x| day_label(*x))
        .draw()?;

    for (idx, s) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();
        chart
            .draw_series(s.points.iter().map(|&(x, y)| Circle::new((x, y), 3, color.filled())))?
            .label(s.name.as_str())
            .legend(move |(x, y)| Circle::new((x + 10, y), 3, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

impl Sink<Analysis<'_>> for DashboardSink {
    fn run(&self, input: &Analysis<'_>) -> Result<(), PipelineError> {
        let data = DashboardData::from_analysis(input);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                PipelineError::Sink(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        self.draw(&data)
            .map_err(|e| PipelineError::Sink(format!("dashboard rendering failed: {e}")))?;

        tracing::info!(file = %self.path.display(), "dashboard saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::IngestOutcome;
    use time::macros::{date, datetime};

    fn outcome() -> IngestOutcome {
        IngestOutcome {
            readings: vec![
                Reading::new("B2", datetime!(2024-01-02 12:00), 4.0).unwrap(),
                Reading::new("B1", datetime!(2024-01-02 00:00), 20.0).unwrap(),
                Reading::new("B1", datetime!(2024-01-01 00:00), 10.0).unwrap(),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn day_numbers_round_trip_to_labels() {
        let x = day_number(datetime!(2024-01-02 12:00));
        assert_eq!(x.fract(), 0.5);
        assert_eq!(day_label(x), "2024-01-02");
        assert_eq!(
            day_label(f64::from(date!(2024-03-01).to_julian_day())),
            "2024-03-01"
        );
    }

    #[test]
    fn chart_data_groups_by_building() {
        let outcome = outcome();
        let analysis = Analysis::build(&outcome).unwrap();
        let data = DashboardData::from_analysis(&analysis);

        let names: Vec<&str> = data.daily_trend.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["B1", "B2"]);
        let b1_totals: Vec<f64> = data.daily_trend[0].points.iter().map(|p| p.1).collect();
        assert_eq!(b1_totals, vec![10.0, 20.0]);

        assert_eq!(
            data.weekly_average,
            vec![("B1".to_string(), 30.0), ("B2".to_string(), 4.0)]
        );

        // Scatter points are sorted by time within each building.
        let b1_points = &data.readings[0].points;
        assert!(b1_points[0].0 < b1_points[1].0);
        assert_eq!(data.readings[1].points, vec![(day_number(datetime!(2024-01-02 12:00)), 4.0)]);
    }

    #[test]
    fn bounds_widen_single_points() {
        let series = vec![Series {
            name: "B1".to_string(),
            points: vec![(10.0, 1.0)],
        }];
        assert_eq!(x_bounds(&series), (9.5, 10.5));
        assert_eq!(x_bounds(&[]), (0.0, 1.0));
        assert_eq!(y_max([0.0, 0.0].into_iter()), 1.0);
        assert_eq!(y_max([10.0, 5.0].into_iter()), 11.0);
        assert_eq!(y_max([f64::INFINITY, 10.0].into_iter()), 11.0);
        assert_eq!(y_max([f64::MAX].into_iter()), f64::MAX);
    }
}
