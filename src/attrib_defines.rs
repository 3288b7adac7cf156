pub const PRESSURE_ATTRIB: &str = "pressure";
pub const TRACTION_ATTRIB: &str = "traction";
pub const APERTURE_ATTRIB: &str = "aperture";
pub const APERTURE_CHANGE_ATTRIB: &str = "aperture_change";

/// Name of the face-indexed projection of the cell field `name` on the matrix grid.
pub fn face_attrib(name: &str) -> String {
    format!("face_{}", name)
}
