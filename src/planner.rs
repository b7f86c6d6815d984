use std::{collections::HashSet, fmt};

use crate::{
    backend::Backend,
    chunking::{ChunkingLimits, estimate_buffer_shape, estimate_chunk_shape},
    compression::{Compression, Filter},
    dataset::{DatasetConfiguration, validate_chunk_shape},
    descriptor::DatasetDescriptor,
};

/// Computes chunk shapes, buffer shapes and codec settings for datasets.
///
/// Planning reads only shapes and dtypes, and is deterministic:
/// the same descriptors always produce the same configurations.
#[derive(Debug, Clone, Default)]
pub struct DatasetConfigurationPlanner {
    limits: ChunkingLimits,
    compression: Option<Compression>,
    filters: Option<Vec<Filter>>,
}

impl DatasetConfigurationPlanner {
    pub fn new(limits: ChunkingLimits) -> Self {
        Self {
            limits,
            ..Default::default()
        }
    }

    /// Use this compression instead of the backend default.
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Use these filters instead of the backend default.
    pub fn with_filters(mut self, filters: Vec<Filter>) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn limits(&self) -> &ChunkingLimits {
        &self.limits
    }

    /// Plan a single dataset.
    pub fn plan_dataset(
        &self,
        descriptor: &DatasetDescriptor,
        backend: Backend,
    ) -> crate::Result<DatasetConfiguration> {
        descriptor.validate()?;
        let itemsize = descriptor.dtype.itemsize();
        let maxshape = &descriptor.maxshape;

        let chunk_shape = match &descriptor.chunk_hint {
            Some(hint) => {
                validate_chunk_shape(maxshape, hint)?;
                let nbytes = hint.iter().fold(itemsize, |acc, &n| acc.saturating_mul(n));
                if nbytes > self.limits.chunk_bytes {
                    log::warn!(
                        "{}: chunk hint {hint:?} is {nbytes} bytes, above the {} byte budget",
                        descriptor.location,
                        self.limits.chunk_bytes
                    );
                }
                hint.clone()
            }
            None => estimate_chunk_shape(maxshape, itemsize, &self.limits),
        };
        let buffer_shape = estimate_buffer_shape(maxshape, &chunk_shape, itemsize, &self.limits);

        let compression = self
            .compression
            .unwrap_or_else(|| backend.default_compression());
        let filters = self
            .filters
            .clone()
            .unwrap_or_else(|| backend.default_filters());

        log::debug!(
            "{}: maxshape {maxshape:?}, chunk {chunk_shape:?}, buffer {buffer_shape:?}",
            descriptor.location
        );
        DatasetConfiguration::new(
            descriptor.clone(),
            backend,
            chunk_shape,
            buffer_shape,
            compression,
            filters,
        )
    }

    /// Plan every dataset, preserving input order.
    ///
    /// Fails on the first dataset that cannot be configured,
    /// or if two datasets share a location.
    pub fn plan<'a>(
        &self,
        datasets: impl IntoIterator<Item = &'a DatasetDescriptor>,
        backend: Backend,
    ) -> crate::Result<BackendConfiguration> {
        let mut seen = HashSet::new();
        let mut configurations = Vec::new();
        for descriptor in datasets {
            if !seen.insert(descriptor.location.as_str()) {
                return Err(crate::Error::configuration(format!(
                    "duplicate dataset location {}",
                    descriptor.location
                )));
            }
            configurations.push(self.plan_dataset(descriptor, backend)?);
        }
        Ok(BackendConfiguration {
            backend,
            configurations,
        })
    }
}

/// The planned configurations of all datasets in a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfiguration {
    backend: Backend,
    configurations: Vec<DatasetConfiguration>,
}

impl BackendConfiguration {
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Configurations in the order their datasets were given.
    pub fn configurations(&self) -> &[DatasetConfiguration] {
        &self.configurations
    }

    pub fn get(&self, location: &str) -> Option<&DatasetConfiguration> {
        self.configurations.iter().find(|c| c.location() == location)
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DatasetConfiguration> {
        self.configurations.iter()
    }

    pub fn into_configurations(self) -> Vec<DatasetConfiguration> {
        self.configurations
    }
}

impl<'a> IntoIterator for &'a BackendConfiguration {
    type Item = &'a DatasetConfiguration;
    type IntoIter = std::slice::Iter<'a, DatasetConfiguration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for BackendConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = format!(
            "Configurable datasets identified using the {} backend",
            self.backend
        );
        writeln!(f)?;
        writeln!(f, "{header}")?;
        writeln!(f, "{}", "-".repeat(header.len()))?;
        for configuration in &self.configurations {
            write!(f, "\n{configuration}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::Dtype;

    #[test]
    fn chunk_hint_overrides_heuristic() {
        let descriptor =
            DatasetDescriptor::new("acquisition/Series/data", vec![1_800_000, 384], Dtype::Int16)
                .with_chunk_hint(vec![30_000, 384]);
        let config = DatasetConfigurationPlanner::default()
            .plan_dataset(&descriptor, Backend::Hdf5)
            .unwrap();
        assert_eq!(config.chunk_shape(), &[30_000, 384]);
        assert_eq!(config.buffer_shape(), &[1_290_000, 384]);
    }

    #[test]
    fn into_configurations_keeps_order() {
        let datasets = [
            DatasetDescriptor::new("acquisition/B/data", vec![100, 4], Dtype::Int16),
            DatasetDescriptor::new("acquisition/A/data", vec![100, 4], Dtype::Int16),
        ];
        let config = DatasetConfigurationPlanner::default()
            .plan(&datasets, Backend::Zarr)
            .unwrap();
        let locations: Vec<_> = config
            .into_configurations()
            .into_iter()
            .map(|c| c.location().to_string())
            .collect();
        assert_eq!(locations, ["acquisition/B/data", "acquisition/A/data"]);
    }

    #[test]
    fn invalid_chunk_hint() {
        let descriptor =
            DatasetDescriptor::new("acquisition/Series/data", vec![100, 4], Dtype::Int16)
                .with_chunk_hint(vec![100, 8]);
        let result =
            DatasetConfigurationPlanner::default().plan_dataset(&descriptor, Backend::Zarr);
        assert!(matches!(result, Err(crate::Error::Configuration(_))));
    }

    #[test]
    fn duplicate_locations_rejected() {
        let descriptor =
            DatasetDescriptor::new("acquisition/Series/data", vec![100, 4], Dtype::Int16);
        let datasets = [descriptor.clone(), descriptor];
        let result = DatasetConfigurationPlanner::default().plan(&datasets, Backend::Zarr);
        assert!(matches!(result, Err(crate::Error::Configuration(_))));
    }

    #[test]
    fn empty_plan_renders_header_only() {
        let datasets: [DatasetDescriptor; 0] = [];
        let config = DatasetConfigurationPlanner::default()
            .plan(&datasets, Backend::Hdf5)
            .unwrap();
        assert!(config.is_empty());
        assert_eq!(
            config.to_string(),
            "\nConfigurable datasets identified using the hdf5 backend\n\
             -------------------------------------------------------\n"
        );
    }
}
