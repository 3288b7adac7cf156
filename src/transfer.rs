//! Cross-dimensional field transfer between fracture cells and matrix faces.
//!
//! Pressure and aperture live on fracture cells while traction and slip are
//! matrix face quantities, so every coupling step crosses this boundary once
//! per direction per quantity. The cell to face direction is a broadcast; the
//! face to cell direction averages over the incident face set in stored
//! incidence order, which keeps the result independent of construction order.

use crate::attrib_defines::face_attrib;
use crate::grid::GridCollection;
use crate::Error;

/// Broadcasts the cell field `field` of every fracture grid into the
/// face-indexed field `face_<field>` on the matrix grid.
///
/// The field must already exist on every fracture grid. The face field is
/// created zero-filled on first use; faces not incident to any fracture cell
/// are left untouched.
pub fn project_cell_to_face(gb: &mut GridCollection, field: &str) -> Result<(), Error> {
    let face_name = face_attrib(field);
    let (matrix, fractures, maps) = gb.split_mut();

    // Validate sources up front so the face field is never partially written.
    for grid in fractures.iter() {
        grid.cell_field(field)?;
    }

    if !matrix.has_field(&face_name) {
        let zeros = vec![0.0; matrix.num_faces()];
        matrix.set_face_field(&face_name, zeros)?;
    }
    let face_values = matrix.face_field_mut(&face_name)?;
    for (grid, map) in fractures.iter().zip(maps.iter()) {
        let cell_values = grid.cell_field(field)?;
        for (cell, faces) in map.cells() {
            for face in faces {
                face_values[face] = cell_values[cell];
            }
        }
    }
    Ok(())
}

/// Averages the matrix face field `face_<field>` back onto the cells of every
/// fracture grid, overwriting each fracture's cell field `field`.
///
/// A fracture cell with no incident matrix faces is a configuration error and
/// fails with [`Error::Mapping`] rather than producing a NaN.
pub fn project_face_to_cell(gb: &mut GridCollection, field: &str) -> Result<(), Error> {
    let face_name = face_attrib(field);
    let (matrix, fractures, maps) = gb.split_mut();
    let face_values = matrix.face_field(&face_name)?;

    for (grid, map) in fractures.iter_mut().zip(maps.iter()) {
        let node = grid.node_number();
        let mut cell_values = vec![0.0; grid.num_cells()];
        for (cell, faces) in map.cells() {
            if faces.is_empty() {
                return Err(Error::Mapping { node, cell });
            }
            let sum: f64 = faces.iter().map(|&face| face_values[face]).sum();
            cell_values[cell] = sum / faces.len() as f64;
        }
        grid.set_cell_field(field, cell_values)?;
    }
    Ok(())
}
