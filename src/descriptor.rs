use serde::{Deserialize, Serialize};

use crate::dtype::Dtype;

/// Description of an array dataset about to be written into a container.
///
/// Only metadata is held here; the array itself stays with the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDescriptor {
    /// Path of the dataset within the container, e.g. `acquisition/ElectricalSeries/data`.
    pub location: String,
    /// Full shape of the dataset.
    pub maxshape: Vec<u64>,
    pub dtype: Dtype,
    /// Chunk shape already chosen upstream, used instead of the heuristic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_hint: Option<Vec<u64>>,
}

impl DatasetDescriptor {
    pub fn new(location: impl Into<String>, maxshape: Vec<u64>, dtype: Dtype) -> Self {
        Self {
            location: location.into(),
            maxshape,
            dtype,
            chunk_hint: None,
        }
    }

    pub fn with_chunk_hint(mut self, chunk_shape: Vec<u64>) -> Self {
        self.chunk_hint = Some(chunk_shape);
        self
    }

    /// Last component of the location.
    pub fn dataset_name(&self) -> &str {
        self.location
            .rsplit_once('/')
            .map_or(self.location.as_str(), |(_, name)| name)
    }

    /// Total size of the dataset in bytes.
    pub fn nbytes(&self) -> u64 {
        self.maxshape
            .iter()
            .fold(self.dtype.itemsize(), |acc, &n| acc.saturating_mul(n))
    }

    pub(crate) fn validate(&self) -> crate::Result<()> {
        if self.location.is_empty() {
            return Err(crate::Error::configuration("empty dataset location"));
        }
        if self.maxshape.is_empty() {
            return Err(crate::Error::configuration(format!(
                "{}: scalar datasets cannot be chunked",
                self.location
            )));
        }
        if self.maxshape.contains(&0) {
            return Err(crate::Error::configuration(format!(
                "{}: zero-size axis in maxshape {:?}",
                self.location, self.maxshape
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_name_is_last_component() {
        let d = DatasetDescriptor::new("acquisition/Series/data", vec![10, 2], Dtype::Int16);
        assert_eq!(d.dataset_name(), "data");
        assert_eq!(d.nbytes(), 40);
        let d = DatasetDescriptor::new("data", vec![10], Dtype::Int16);
        assert_eq!(d.dataset_name(), "data");
    }

    #[test]
    fn zero_and_scalar_shapes_are_invalid() {
        let zero = DatasetDescriptor::new("a/data", vec![0, 384], Dtype::Int16);
        assert!(matches!(
            zero.validate(),
            Err(crate::Error::Configuration(_))
        ));
        let scalar = DatasetDescriptor::new("a/data", Vec::<u64>::new(), Dtype::Int16);
        assert!(scalar.validate().is_err());
    }

    #[test]
    fn deserialize_without_hint() {
        let d: DatasetDescriptor = serde_json::from_str(
            r#"{"location": "acquisition/Series/data", "maxshape": [100, 4], "dtype": "float32"}"#,
        )
        .unwrap();
        assert_eq!(d.dtype, Dtype::Float32);
        assert_eq!(d.chunk_hint, None);
    }
}
