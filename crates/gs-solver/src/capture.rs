//! Jacobian capture side-channel.
//!
//! Appends one JSON record per captured evaluation so a run can be replayed
//! or diffed offline. Capture never alters what reaches the backend; the
//! matrix is re-exported after the record is written.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use gs_core::time::Time;
use gs_matrix::{MatrixData, MatrixElement};

use crate::error::SolverResult;

/// One captured Jacobian evaluation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureRecord {
    pub time: Time,
    pub iterations: usize,
    pub offset: usize,
    pub triplets: Vec<MatrixElement>,
}

/// Line-delimited JSON writer for Jacobian snapshots.
pub struct JacCapture {
    path: PathBuf,
    writer: BufWriter<File>,
    records: usize,
}

impl JacCapture {
    /// Open `path` for appending, creating it if needed.
    pub fn create(path: impl AsRef<Path>) -> SolverResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!(path = %path.display(), "jacobian capture enabled");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            records: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records_written(&self) -> usize {
        self.records
    }

    /// Append a snapshot of `matrix` with its solve context.
    pub fn write(
        &mut self,
        time: Time,
        iterations: usize,
        offset: usize,
        matrix: &mut dyn MatrixData,
    ) -> SolverResult<()> {
        let mut triplets = Vec::with_capacity(matrix.size());
        matrix.start();
        while let Some(e) = matrix.next_element() {
            triplets.push(e);
        }
        let record = CaptureRecord {
            time,
            iterations,
            offset,
            triplets,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.records += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_matrix::SparseMatrix;
    use std::io::BufRead;

    #[test]
    fn records_are_replayable_json_lines() {
        let dir = std::env::temp_dir().join("gs-solver-capture-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("jac.jsonl");
        let _ = std::fs::remove_file(&path);

        let mut capture = JacCapture::create(&path).unwrap();
        let mut m = SparseMatrix::new();
        m.assign(0, 0, 2.0);
        m.assign(1, 0, -1.0);
        capture.write(0.5, 3, 0, &mut m).unwrap();
        m.assign(1, 1, 4.0);
        capture.write(1.0, 2, 0, &mut m).unwrap();
        assert_eq!(capture.records_written(), 2);

        let file = std::fs::File::open(&path).unwrap();
        let lines: Vec<CaptureRecord> = std::io::BufReader::new(file)
            .lines()
            .map(|l| serde_json::from_str(&l.unwrap()).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].time, 0.5);
        assert_eq!(lines[0].iterations, 3);
        assert_eq!(lines[0].triplets.len(), 2);
        assert_eq!(lines[1].triplets.len(), 3);

        let _ = std::fs::remove_file(&path);
    }
}
