use crate::{metrics::summary::MetricsRecord, signal::CleanSeries};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Style {
    pub width: f32,
    pub dash: Option<[f32; 2]>,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct Color(pub u32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub style: Style,
}

/// Unconnected markers, e.g. detected beats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub radius: u32,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Points(PointSeries),
}

impl Series {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(line) => &line.points,
            Series::Points(points) => &points.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis { label: None },
            y: Axis { label: None },
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// Bounding box `(x_min, x_max, y_min, y_max)` over every series, if any point exists.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self.series.iter().flat_map(|s| s.points().iter());
        let first = points.next()?;
        Some(points.fold(
            (first[0], first[0], first[1], first[1]),
            |(x0, x1, y0, y1), p| (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1])),
        ))
    }
}

pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    (0..max_points)
        .map(|i| (i as f64 * bucket_size).floor() as usize)
        .take_while(|&start| start < points.len())
        .map(|start| points[start])
        .collect()
}

/// Voltage trace of a cleaned strip with beat markers placed on the trace.
pub fn figure_from_strip(
    series: &CleanSeries,
    record: &MetricsRecord,
    max_points: usize,
) -> Figure {
    let trace: Vec<[f64; 2]> = series
        .samples()
        .iter()
        .map(|s| [s.time, s.voltage])
        .collect();
    let beats: Vec<[f64; 2]> = record
        .beats
        .iter()
        .filter_map(|&t| {
            series
                .samples()
                .iter()
                .find(|s| s.time == t)
                .map(|s| [s.time, s.voltage])
        })
        .collect();

    let mut fig = Figure::new(Some(format!(
        "ECG strip: {} beats, {:.1} bpm",
        record.num_beats, record.mean_hr_bpm
    )));
    fig.x.label = Some("time (s)".into());
    fig.y.label = Some("voltage (mV)".into());
    fig.add_series(Series::Line(LineSeries {
        name: "voltage".into(),
        points: decimate_points(&trace, max_points),
        style: Style {
            width: 1.4,
            dash: None,
            color: Color(0x1F77B4),
        },
    }));
    fig.add_series(Series::Points(PointSeries {
        name: "beats".into(),
        points: beats,
        radius: 4,
        color: Color(0xFF0077),
    }));
    fig
}
