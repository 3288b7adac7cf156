use std::fs::File;
use std::path::Path;

use thiserror::Error;

use crate::regions::PhysicalConfig;
use crate::sim::SimParams;

#[derive(Error, Debug)]
pub enum LoadConfigError {
    #[error("IO")]
    IO(#[from] std::io::Error),
    #[error("Parse")]
    Parse(#[from] ron::error::SpannedError),
}

pub fn load_sim_params(path: impl AsRef<Path>) -> std::result::Result<SimParams, LoadConfigError> {
    let f = File::open(path.as_ref())?;
    Ok(ron::de::from_reader(f)?)
}

pub fn load_physical_config(
    path: impl AsRef<Path>,
) -> std::result::Result<PhysicalConfig, LoadConfigError> {
    let f = File::open(path.as_ref())?;
    Ok(ron::de::from_reader(f)?)
}
