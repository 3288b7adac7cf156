//! Multi-dimensional grid collection with per-grid named field storage.
//!
//! A collection holds exactly one 3D matrix grid and any number of embedded 2D
//! fracture grids. Each fracture grid is tied to the matrix grid by a sparse
//! incidence map pairing fracture cells with matrix boundary faces. The maps
//! are established when the collection is built and are read-only afterwards.

use ahash::{AHashMap, AHashSet};
use na::Point3;
use sprs::{CsMat, TriMat};

use crate::Error;

/// A single grid entity of some topological dimension.
///
/// Fields are flat scalar arrays indexed either by cell or by face. A field is
/// created once and overwritten in place on subsequent writes; writing an
/// array of the wrong length is an error rather than a resize.
#[derive(Clone, Debug)]
pub struct Grid {
    dim: usize,
    node_number: usize,
    num_cells: usize,
    num_faces: usize,
    cell_centers: Vec<Point3<f64>>,
    fields: AHashMap<String, Vec<f64>>,
}

impl Grid {
    /// Constructs a grid with one cell per entry of `cell_centers`.
    pub fn new(
        dim: usize,
        node_number: usize,
        num_faces: usize,
        cell_centers: Vec<Point3<f64>>,
    ) -> Self {
        Grid {
            dim,
            node_number,
            num_cells: cell_centers.len(),
            num_faces,
            cell_centers,
            fields: AHashMap::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Stable per-grid identity assigned at build time.
    pub fn node_number(&self) -> usize {
        self.node_number
    }

    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    pub fn num_faces(&self) -> usize {
        self.num_faces
    }

    pub fn cell_centers(&self) -> &[Point3<f64>] {
        &self.cell_centers
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn field_checked(&self, name: &str, expected: usize) -> Result<&[f64], Error> {
        let values = self.fields.get(name).ok_or_else(|| Error::MissingField {
            node: self.node_number,
            name: name.to_string(),
        })?;
        if values.len() != expected {
            return Err(Error::FieldSize {
                node: self.node_number,
                name: name.to_string(),
                expected,
                actual: values.len(),
            });
        }
        Ok(values)
    }

    fn field_checked_mut(&mut self, name: &str, expected: usize) -> Result<&mut [f64], Error> {
        let node = self.node_number;
        let values = self.fields.get_mut(name).ok_or_else(|| Error::MissingField {
            node,
            name: name.to_string(),
        })?;
        if values.len() != expected {
            return Err(Error::FieldSize {
                node,
                name: name.to_string(),
                expected,
                actual: values.len(),
            });
        }
        Ok(values)
    }

    pub fn cell_field(&self, name: &str) -> Result<&[f64], Error> {
        self.field_checked(name, self.num_cells)
    }

    pub fn face_field(&self, name: &str) -> Result<&[f64], Error> {
        self.field_checked(name, self.num_faces)
    }

    pub fn face_field_mut(&mut self, name: &str) -> Result<&mut [f64], Error> {
        self.field_checked_mut(name, self.num_faces)
    }

    /// Writes a cell-indexed field, creating it if absent.
    pub fn set_cell_field(&mut self, name: &str, values: Vec<f64>) -> Result<(), Error> {
        if values.len() != self.num_cells {
            return Err(Error::FieldSize {
                node: self.node_number,
                name: name.to_string(),
                expected: self.num_cells,
                actual: values.len(),
            });
        }
        self.fields.insert(name.to_string(), values);
        Ok(())
    }

    /// Writes a face-indexed field, creating it if absent.
    pub fn set_face_field(&mut self, name: &str, values: Vec<f64>) -> Result<(), Error> {
        if values.len() != self.num_faces {
            return Err(Error::FieldSize {
                node: self.node_number,
                name: name.to_string(),
                expected: self.num_faces,
                actual: values.len(),
            });
        }
        self.fields.insert(name.to_string(), values);
        Ok(())
    }
}

/// Sparse relation pairing the cells of one fracture grid with the matrix
/// grid's boundary faces. Rows are fracture cells, columns are matrix faces.
#[derive(Clone, Debug)]
pub struct IncidenceMap {
    map: CsMat<f64>,
}

impl IncidenceMap {
    /// Builds the relation from (cell, face) pairs.
    ///
    /// The stored CSR layout fixes the iteration order (cells in ascending
    /// order, faces ascending within each cell), independent of the order the
    /// pairs are supplied in.
    pub fn from_pairs(num_cells: usize, num_faces: usize, pairs: &[(usize, usize)]) -> Self {
        let mut triplets = TriMat::new((num_cells, num_faces));
        for &(cell, face) in pairs {
            triplets.add_triplet(cell, face, 1.0);
        }
        IncidenceMap {
            map: triplets.to_csr(),
        }
    }

    pub fn num_cells(&self) -> usize {
        self.map.rows()
    }

    pub fn num_faces(&self) -> usize {
        self.map.cols()
    }

    /// Iterates every cell in row order, yielding its incident faces in stored
    /// order. Cells with no incident faces yield an empty face list.
    pub fn cells(&self) -> impl Iterator<Item = (usize, Vec<usize>)> + '_ {
        self.map
            .outer_iterator()
            .enumerate()
            .map(|(cell, row)| (cell, row.indices().to_vec()))
    }

    /// Faces incident to `cell`, in stored order.
    pub fn faces_of(&self, cell: usize) -> Vec<usize> {
        self.map
            .outer_view(cell)
            .map(|row| row.indices().to_vec())
            .unwrap_or_default()
    }
}

/// One 3D matrix grid plus its embedded 2D fracture grids and their incidence
/// maps.
#[derive(Clone, Debug)]
pub struct GridCollection {
    matrix: Grid,
    fractures: Vec<Grid>,
    incidence: Vec<IncidenceMap>,
}

impl GridCollection {
    /// Assembles a collection, checking dimensions, incidence map shapes and
    /// node number uniqueness.
    pub fn new(matrix: Grid, fractures: Vec<(Grid, IncidenceMap)>) -> Result<Self, Error> {
        if matrix.dim() != 3 {
            return Err(Error::InvalidCollection {
                message: format!("matrix grid must have dimension 3, got {}", matrix.dim()),
            });
        }
        let mut nodes = AHashSet::new();
        nodes.insert(matrix.node_number());
        for (grid, map) in fractures.iter() {
            if grid.dim() != 2 {
                return Err(Error::InvalidCollection {
                    message: format!(
                        "fracture grid {} must have dimension 2, got {}",
                        grid.node_number(),
                        grid.dim()
                    ),
                });
            }
            if map.num_cells() != grid.num_cells() || map.num_faces() != matrix.num_faces() {
                return Err(Error::InvalidCollection {
                    message: format!(
                        "incidence map for fracture {} is {}x{}, expected {}x{}",
                        grid.node_number(),
                        map.num_cells(),
                        map.num_faces(),
                        grid.num_cells(),
                        matrix.num_faces()
                    ),
                });
            }
            if !nodes.insert(grid.node_number()) {
                return Err(Error::InvalidCollection {
                    message: format!("duplicate node number {}", grid.node_number()),
                });
            }
        }
        let (fractures, incidence) = fractures.into_iter().unzip();
        Ok(GridCollection {
            matrix,
            fractures,
            incidence,
        })
    }

    pub fn matrix(&self) -> &Grid {
        &self.matrix
    }

    pub fn matrix_mut(&mut self) -> &mut Grid {
        &mut self.matrix
    }

    pub fn fractures(&self) -> &[Grid] {
        &self.fractures
    }

    pub fn fractures_mut(&mut self) -> &mut [Grid] {
        &mut self.fractures
    }

    pub fn incidence(&self) -> &[IncidenceMap] {
        &self.incidence
    }

    /// All grids, matrix first.
    pub fn grids(&self) -> impl Iterator<Item = &Grid> {
        std::iter::once(&self.matrix).chain(self.fractures.iter())
    }

    pub fn grids_mut(&mut self) -> impl Iterator<Item = &mut Grid> {
        std::iter::once(&mut self.matrix).chain(self.fractures.iter_mut())
    }

    pub fn fracture_by_node(&self, node: usize) -> Result<&Grid, Error> {
        self.fractures
            .iter()
            .find(|g| g.node_number() == node)
            .ok_or(Error::UnknownNode { node })
    }

    /// Splits the borrow so the matrix grid and the fracture grids can be
    /// accessed simultaneously during cross-dimensional transfer.
    pub fn split_mut(&mut self) -> (&mut Grid, &mut [Grid], &[IncidenceMap]) {
        (&mut self.matrix, &mut self.fractures, &self.incidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centers(n: usize) -> Vec<Point3<f64>> {
        (0..n).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect()
    }

    #[test]
    fn field_length_is_enforced() {
        let mut grid = Grid::new(2, 1, 6, centers(2));
        assert!(grid.set_cell_field("pressure", vec![1.0, 2.0]).is_ok());
        assert!(matches!(
            grid.set_cell_field("pressure", vec![1.0]),
            Err(Error::FieldSize { expected: 2, actual: 1, .. })
        ));
        assert!(matches!(
            grid.face_field("pressure"),
            Err(Error::FieldSize { expected: 6, actual: 2, .. })
        ));
        assert!(matches!(
            grid.cell_field("aperture"),
            Err(Error::MissingField { .. })
        ));
    }

    #[test]
    fn incidence_iteration_is_sorted() {
        // Pairs supplied out of order come back in CSR order.
        let map = IncidenceMap::from_pairs(2, 8, &[(1, 7), (0, 4), (1, 2), (0, 1)]);
        assert_eq!(map.faces_of(0), vec![1, 4]);
        assert_eq!(map.faces_of(1), vec![2, 7]);
        let rows: Vec<_> = map.cells().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], (0, vec![1, 4]));
    }

    #[test]
    fn collection_rejects_bad_shapes() {
        let matrix = Grid::new(3, 0, 8, centers(4));
        let fracture = Grid::new(2, 1, 4, centers(2));
        let bad_map = IncidenceMap::from_pairs(3, 8, &[]);
        assert!(matches!(
            GridCollection::new(matrix, vec![(fracture, bad_map)]),
            Err(Error::InvalidCollection { .. })
        ));
    }
}
