use std::{fmt, num::NonZeroU64};

use serde::Serialize;
use zarrs::{
    array::{
        ArrayMetadataV3, FillValueMetadata,
        chunk_grid::{RegularBoundedChunkGrid, RegularBoundedChunkGridConfiguration},
    },
    metadata::v3::MetadataV3,
    plugin::ExtensionAliasesV3,
};

use crate::{
    backend::Backend,
    compression::{Compression, Filter, zarr_bytes_codec},
    descriptor::DatasetDescriptor,
    dtype::Dtype,
};

/// How a single dataset is chunked, buffered and compressed.
///
/// Instances are validated on construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetConfiguration {
    descriptor: DatasetDescriptor,
    backend: Backend,
    chunk_shape: Vec<u64>,
    buffer_shape: Vec<u64>,
    compression: Compression,
    filters: Vec<Filter>,
}

/// Checks that `chunk_shape` can partition an array of `maxshape`.
pub(crate) fn validate_chunk_shape(maxshape: &[u64], chunk_shape: &[u64]) -> crate::Result<()> {
    if chunk_shape.len() != maxshape.len() {
        return Err(crate::Error::configuration(format!(
            "chunk shape {chunk_shape:?} does not match the rank of maxshape {maxshape:?}"
        )));
    }
    for (axis, (&c, &m)) in chunk_shape.iter().zip(maxshape).enumerate() {
        if c == 0 {
            return Err(crate::Error::configuration(format!(
                "chunk shape {chunk_shape:?} is zero along axis {axis}"
            )));
        }
        if c > m {
            return Err(crate::Error::configuration(format!(
                "chunk shape {chunk_shape:?} exceeds maxshape {maxshape:?} along axis {axis}"
            )));
        }
    }
    Ok(())
}

fn validate_buffer_shape(
    maxshape: &[u64],
    chunk_shape: &[u64],
    buffer_shape: &[u64],
) -> crate::Result<()> {
    if buffer_shape.len() != maxshape.len() {
        return Err(crate::Error::configuration(format!(
            "buffer shape {buffer_shape:?} does not match the rank of maxshape {maxshape:?}"
        )));
    }
    for (axis, ((&b, &c), &m)) in buffer_shape
        .iter()
        .zip(chunk_shape)
        .zip(maxshape)
        .enumerate()
    {
        if b == 0 || b % c != 0 {
            return Err(crate::Error::configuration(format!(
                "buffer shape {buffer_shape:?} is not a multiple of chunk shape \
                 {chunk_shape:?} along axis {axis}"
            )));
        }
        if b > m {
            return Err(crate::Error::configuration(format!(
                "buffer shape {buffer_shape:?} exceeds maxshape {maxshape:?} along axis {axis}"
            )));
        }
    }
    Ok(())
}

impl DatasetConfiguration {
    pub fn new(
        descriptor: DatasetDescriptor,
        backend: Backend,
        chunk_shape: Vec<u64>,
        buffer_shape: Vec<u64>,
        compression: Compression,
        filters: Vec<Filter>,
    ) -> crate::Result<Self> {
        descriptor.validate()?;
        validate_chunk_shape(&descriptor.maxshape, &chunk_shape)?;
        validate_buffer_shape(&descriptor.maxshape, &chunk_shape, &buffer_shape)?;
        compression.validate(backend)?;
        if let Some(f) = filters.iter().find(|f| !backend.supports_filter(f)) {
            return Err(crate::Error::unsupported(backend, format!("{f} filter")));
        }
        Ok(Self {
            descriptor,
            backend,
            chunk_shape,
            buffer_shape,
            compression,
            filters,
        })
    }

    pub fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    pub fn location(&self) -> &str {
        &self.descriptor.location
    }

    pub fn maxshape(&self) -> &[u64] {
        &self.descriptor.maxshape
    }

    pub fn dtype(&self) -> Dtype {
        self.descriptor.dtype
    }

    pub fn backend(&self) -> Backend {
        self.backend
    }

    pub fn chunk_shape(&self) -> &[u64] {
        &self.chunk_shape
    }

    pub fn buffer_shape(&self) -> &[u64] {
        &self.buffer_shape
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Size of one full chunk in bytes.
    pub fn chunk_nbytes(&self) -> u64 {
        self.chunk_shape
            .iter()
            .fold(self.dtype().itemsize(), |acc, &n| acc.saturating_mul(n))
    }

    /// Zarr v3 metadata for creating the array this configuration describes.
    pub fn to_zarr_metadata(&self) -> crate::Result<ArrayMetadataV3> {
        if self.backend != Backend::Zarr {
            return Err(crate::Error::general(format!(
                "{} is configured for the {} backend, not zarr",
                self.location(),
                self.backend
            )));
        }
        let chunk_shape = self
            .chunk_shape
            .iter()
            .map(|&n| NonZeroU64::new(n).ok_or_else(|| crate::Error::general("zero chunk size")))
            .collect::<crate::Result<Vec<_>>>()?;
        let chunk_grid = MetadataV3::new_with_serializable_configuration(
            RegularBoundedChunkGrid::aliases_v3()
                .default_name
                .clone()
                .to_string(),
            &RegularBoundedChunkGridConfiguration { chunk_shape },
        )?;

        let dtype = self.dtype();
        let mut codecs = Vec::with_capacity(self.filters.len() + 2);
        for filter in self.filters.iter().filter(|f| f.is_array_to_array()) {
            codecs.push(filter.to_zarr_codec(dtype)?);
        }
        codecs.push(zarr_bytes_codec());
        for filter in self.filters.iter().filter(|f| !f.is_array_to_array()) {
            codecs.push(filter.to_zarr_codec(dtype)?);
        }
        codecs.extend(self.compression.to_zarr_codec()?);

        let fill_value = FillValueMetadata::Number(serde_json::Number::from(0));
        Ok(ArrayMetadataV3::new(
            self.descriptor.maxshape.clone(),
            chunk_grid,
            dtype.to_zarr_metadata(),
            fill_value,
            codecs,
        ))
    }

    /// Dataset creation options for an HDF5 writer.
    pub fn hdf5_options(&self) -> crate::Result<Hdf5DatasetOptions> {
        if self.backend != Backend::Hdf5 {
            return Err(crate::Error::general(format!(
                "{} is configured for the {} backend, not hdf5",
                self.location(),
                self.backend
            )));
        }
        let compression = match self.compression {
            Compression::None => None,
            c => Some(c.method_name().to_string()),
        };
        Ok(Hdf5DatasetOptions {
            chunks: self.chunk_shape.clone(),
            compression,
            compression_opts: self.compression.hdf5_level(),
            shuffle: self.filters.contains(&Filter::Shuffle),
        })
    }
}

/// Keyword options for creating an HDF5 dataset, named as h5py names them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hdf5DatasetOptions {
    pub chunks: Vec<u64>,
    pub compression: Option<String>,
    pub compression_opts: Option<u8>,
    pub shuffle: bool,
}

/// Python tuple notation, e.g. `(5,)` or `(1800000, 384)`.
pub(crate) struct PyTuple<'a>(pub &'a [u64]);

impl fmt::Display for PyTuple<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (idx, n) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{n}")?;
        }
        if self.0.len() == 1 {
            f.write_str(",")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for DatasetConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let location = self.location();
        writeln!(f, "{location}")?;
        writeln!(f, "{}", "-".repeat(location.chars().count()))?;
        writeln!(f, "  maxshape: {}", PyTuple(self.maxshape()))?;
        writeln!(f, "  dtype: {}", self.dtype())?;
        writeln!(f)?;
        writeln!(f, "  chunk_shape: {}", PyTuple(&self.chunk_shape))?;
        writeln!(f, "  buffer_shape: {}", PyTuple(&self.buffer_shape))?;
        writeln!(f, "  compression_method: {}", self.compression)?;
        if let Some(options) = self.compression.options_repr() {
            writeln!(f, "  compression_options: {options}")?;
        }
        if !self.filters.is_empty() {
            let names: Vec<_> = self
                .filters
                .iter()
                .map(|filter| format!("'{filter}'"))
                .collect();
            writeln!(f, "  filter_methods: [{}]", names.join(", "))?;
        }
        Ok(())
    }
}
