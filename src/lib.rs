//! Chunk, buffer and compression planning for datasets written to NWB containers.
//!
//! A [`DatasetConfigurationPlanner`] turns [`DatasetDescriptor`]s (location, shape, dtype)
//! into [`DatasetConfiguration`]s for either the HDF5 or the Zarr backend.
//! Planning never touches array data, only its shape and element type.
pub mod backend;
pub mod chunking;
pub mod compression;
pub mod dataset;
pub mod descriptor;
pub mod dtype;
mod error;
pub mod planner;

pub use zarrs;

pub use backend::Backend;
pub use chunking::ChunkingLimits;
pub use compression::{Compression, Filter};
pub use dataset::{DatasetConfiguration, Hdf5DatasetOptions};
pub use descriptor::DatasetDescriptor;
pub use dtype::Dtype;
pub use error::{Error, Result};
pub use planner::{BackendConfiguration, DatasetConfigurationPlanner};
