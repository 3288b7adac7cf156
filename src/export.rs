//! Snapshot output.
//!
//! The coordinator's contract with the export collaborator is narrow: write
//! the requested named fields for one recorded step, and write the time-index
//! manifest at the end of the run. The bundled [`CsvExporter`] writes one
//! delimited snapshot file per step; richer formats stay external.

use std::path::PathBuf;

use crate::grid::GridCollection;
use crate::Error;

pub trait Exporter {
    /// Writes the named cell fields of every grid for snapshot `step`.
    fn write(&mut self, gb: &GridCollection, fields: &[&str], step: usize) -> Result<(), Error>;

    /// Writes the manifest of all recorded times, in order.
    fn write_index(&mut self, times: &[f64]) -> Result<(), Error>;
}

/// Writes snapshots as `<prefix>_<step>.csv` plus a `<prefix>_index.csv`
/// manifest, one row per grid cell keyed by node number and cell index, with
/// the cell center coordinates alongside the requested fields.
pub struct CsvExporter {
    dir: PathBuf,
    prefix: String,
}

impl CsvExporter {
    /// Creates the output directory if needed.
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<Self, Error> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(CsvExporter {
            dir,
            prefix: prefix.into(),
        })
    }

    fn snapshot_path(&self, step: usize) -> PathBuf {
        self.dir.join(format!("{}_{:04}.csv", self.prefix, step))
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(format!("{}_index.csv", self.prefix))
    }
}

impl Exporter for CsvExporter {
    fn write(&mut self, gb: &GridCollection, fields: &[&str], step: usize) -> Result<(), Error> {
        let path = self.snapshot_path(step);
        let mut writer = csv::Writer::from_path(&path)?;

        let mut header = vec!["node", "cell", "x", "y", "z"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>();
        header.extend(fields.iter().map(|name| name.to_string()));
        writer.write_record(&header)?;

        for grid in gb.grids() {
            let columns = fields
                .iter()
                .map(|name| grid.cell_field(name))
                .collect::<Result<Vec<_>, _>>()?;
            for (cell, center) in grid.cell_centers().iter().enumerate() {
                let mut record = vec![
                    grid.node_number().to_string(),
                    cell.to_string(),
                    center.x.to_string(),
                    center.y.to_string(),
                    center.z.to_string(),
                ];
                record.extend(columns.iter().map(|column| column[cell].to_string()));
                writer.write_record(&record)?;
            }
        }
        writer.flush()?;
        log::debug!("wrote snapshot {}", path.display());
        Ok(())
    }

    fn write_index(&mut self, times: &[f64]) -> Result<(), Error> {
        let mut writer = csv::Writer::from_path(self.index_path())?;
        writer.write_record(["step", "time"])?;
        for (step, time) in times.iter().enumerate() {
            writer.write_record([step.to_string(), time.to_string()])?;
        }
        writer.flush()?;
        Ok(())
    }
}
