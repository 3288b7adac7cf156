//! Fracture table input.
//!
//! One row per elliptic fracture: center x, y, z, major axis, minor axis,
//! major axis angle, strike angle, dip angle, and an optional point count for
//! the discretization resolution. A single-fracture file is just a one-row
//! table.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Discretization point count used when the table omits the ninth column.
pub const DEFAULT_FRACTURE_POINTS: usize = 16;

/// An elliptic fracture as described by one row of the input table. Lengths
/// in m, angles in radians.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EllipticFracture {
    pub center: [f64; 3],
    pub major_axis: f64,
    pub minor_axis: f64,
    pub major_axis_angle: f64,
    pub strike_angle: f64,
    pub dip_angle: f64,
    pub num_points: usize,
}

/// Reads the fracture table at `path`.
pub fn load_fractures(path: impl AsRef<Path>) -> Result<Vec<EllipticFracture>, Error> {
    let file = File::open(path.as_ref())?;
    parse_fractures(file)
}

/// Parses a delimited fracture table.
///
/// Every row must have 8 or 9 numeric columns; anything else fails with
/// [`Error::Config`] before any solve begins.
pub fn parse_fractures(reader: impl std::io::Read) -> Result<Vec<EllipticFracture>, Error> {
    let mut table = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut fractures = Vec::new();
    for (index, record) in table.records().enumerate() {
        let record = record?;
        let row = index + 1;
        if record.len() != 8 && record.len() != 9 {
            return Err(Error::Config {
                message: format!(
                    "fracture table row {}: expected 8 or 9 columns, found {}",
                    row,
                    record.len()
                ),
            });
        }
        let column = |i: usize| -> Result<f64, Error> {
            record[i].parse().map_err(|_| Error::Config {
                message: format!(
                    "fracture table row {}, column {}: invalid number {:?}",
                    row,
                    i + 1,
                    &record[i]
                ),
            })
        };
        let num_points = if record.len() == 9 {
            column(8)? as usize
        } else {
            DEFAULT_FRACTURE_POINTS
        };
        fractures.push(EllipticFracture {
            center: [column(0)?, column(1)?, column(2)?],
            major_axis: column(3)?,
            minor_axis: column(4)?,
            major_axis_angle: column(5)?,
            strike_angle: column(6)?,
            dip_angle: column(7)?,
            num_points,
        });
    }
    if fractures.is_empty() {
        return Err(Error::Config {
            message: "fracture table is empty".to_string(),
        });
    }
    Ok(fractures)
}
