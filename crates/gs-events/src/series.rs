//! Ordered (time, value) series shared by the player variants.
//!
//! Series can be built in memory or loaded from a delimited text file, and
//! the file load can run on a background thread while the simulation
//! initializes. The load must be finished (joined) before the series is
//! first consulted; [`TimeSeries::ensure_loaded`] does that.

use std::path::{Path, PathBuf};
use std::thread::JoinHandle;

use gs_core::Time;

use crate::error::{EventError, EventResult};

type LoadResult = EventResult<Vec<(Time, f64)>>;

/// An ordered time/value series with an optional pending background load.
#[derive(Default)]
pub struct TimeSeries {
    points: Vec<(Time, f64)>,
    pending: Option<JoinHandle<LoadResult>>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from in-memory points; sorts by time.
    pub fn from_points(mut points: Vec<(Time, f64)>) -> Self {
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self {
            points,
            pending: None,
        }
    }

    /// Append a point, keeping the series ordered.
    pub fn push(&mut self, time: Time, value: f64) {
        let at = self.points.partition_point(|p| p.0 <= time);
        self.points.insert(at, (time, value));
    }

    /// Load synchronously from a delimited file. `column` selects which
    /// value column to read, 0 being the first column after the time.
    pub fn load_file(&mut self, path: impl AsRef<Path>, column: usize) -> EventResult<()> {
        self.points = read_series(path.as_ref(), column)?;
        Ok(())
    }

    /// Start a background load. The series stays empty until
    /// [`TimeSeries::ensure_loaded`] joins the loader thread.
    pub fn load_file_async(&mut self, path: impl AsRef<Path>, column: usize) {
        let path: PathBuf = path.as_ref().to_path_buf();
        self.pending = Some(std::thread::spawn(move || read_series(&path, column)));
    }

    /// Join a pending background load, if any.
    pub fn ensure_loaded(&mut self) -> EventResult<()> {
        if let Some(handle) = self.pending.take() {
            self.points = handle.join().map_err(|_| EventError::SeriesLoad {
                what: "series loader thread panicked".to_string(),
            })??;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, index: usize) -> Option<(Time, f64)> {
        self.points.get(index).copied()
    }

    pub fn points(&self) -> &[(Time, f64)] {
        &self.points
    }

    /// Linear interpolation between knots; clamps outside the series range.
    pub fn interpolate(&self, time: Time) -> Option<f64> {
        let (first, last) = (self.points.first()?, self.points.last()?);
        if time <= first.0 {
            return Some(first.1);
        }
        if time >= last.0 {
            return Some(last.1);
        }
        let hi = self.points.partition_point(|p| p.0 <= time);
        let (t0, v0) = self.points[hi - 1];
        let (t1, v1) = self.points[hi];
        if t1 == t0 {
            return Some(v1);
        }
        Some(v0 + (v1 - v0) * (time - t0) / (t1 - t0))
    }
}

impl Clone for TimeSeries {
    /// Clones the loaded points. A pending background load is not shared;
    /// the clone sees whatever was loaded at clone time.
    fn clone(&self) -> Self {
        Self {
            points: self.points.clone(),
            pending: None,
        }
    }
}

/// Read `(time, value)` rows from a comma/whitespace-delimited file.
fn read_series(path: &Path, column: usize) -> LoadResult {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .flexible(true)
        .comment(Some(b'#'))
        .from_path(path)?;
    let mut points = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.is_empty() || record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let parse = |idx: usize| -> EventResult<f64> {
            let raw = record.get(idx).ok_or_else(|| EventError::SeriesLoad {
                what: format!("{}: missing column {idx}", path.display()),
            })?;
            raw.parse().map_err(|_| EventError::SeriesLoad {
                what: format!("{}: bad number {raw:?}", path.display()),
            })
        };
        points.push((parse(0)?, parse(1 + column)?));
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn push_keeps_order() {
        let mut s = TimeSeries::new();
        s.push(2.0, 20.0);
        s.push(0.0, 0.0);
        s.push(1.0, 10.0);
        assert_eq!(s.points(), &[(0.0, 0.0), (1.0, 10.0), (2.0, 20.0)]);
    }

    #[test]
    fn interpolation_clamps_and_blends() {
        let s = TimeSeries::from_points(vec![(0.0, 1.0), (2.0, 3.0)]);
        assert_eq!(s.interpolate(-1.0), Some(1.0));
        assert_eq!(s.interpolate(1.0), Some(2.0));
        assert_eq!(s.interpolate(5.0), Some(3.0));
        assert_eq!(TimeSeries::new().interpolate(0.0), None);
    }

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn file_load_selects_column() {
        let path = write_temp(
            "gs-events-series.csv",
            "# time, p, q\n0.0, 1.0, -1.0\n1.0, 2.0, -2.0\n",
        );
        let mut s = TimeSeries::new();
        s.load_file(&path, 1).unwrap();
        assert_eq!(s.points(), &[(0.0, -1.0), (1.0, -2.0)]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn background_load_joins() {
        let path = write_temp("gs-events-series-bg.csv", "0.0,1.0\n1.0,2.0\n");
        let mut s = TimeSeries::new();
        s.load_file_async(&path, 0);
        s.ensure_loaded().unwrap();
        assert_eq!(s.len(), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_an_error() {
        let mut s = TimeSeries::new();
        assert!(s.load_file("/nonexistent/series.csv", 0).is_err());
    }
}
