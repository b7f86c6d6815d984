use std::fmt;

use serde::{Deserialize, Serialize};
use zarrs::{
    array::codec::{BytesCodec, Bz2Codec, Bz2CompressionLevel, GzipCodec},
    metadata::v3::MetadataV3,
    plugin::{ExtensionName, ZarrVersion},
};
use zarrs_codec::CodecTraits;

use crate::{backend::Backend, dtype::Dtype};

/// Build v3 metadata from a zarrs codec, falling back to `$name` if it has none.
macro_rules! codec_metadata {
    ($codec:expr, $name:literal) => {{
        let zarr_version = ZarrVersion::V3;
        let name = $codec.name(zarr_version).unwrap_or_else(|| $name.into());
        if let Some(config) =
            $codec.configuration(zarr_version, &zarrs_codec::CodecMetadataOptions::default())
        {
            MetadataV3::new_with_configuration(name, config)
        } else {
            MetadataV3::new(name)
        }
    }};
}

/// Compression applied to each chunk.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "method")]
pub enum Compression {
    /// Uncompressed.
    None,
    Gzip {
        /// Must be in the range 0..=9.
        /// None means the backend's default (4 for HDF5, 1 for Zarr).
        #[serde(default)]
        level: Option<u8>,
    },
    Bz2 {
        /// Must be in the range 1..=9. None means 9.
        #[serde(default)]
        block_size: Option<u8>,
    },
    /// HDF5-only fast compressor without options.
    Lzf,
}

impl Default for Compression {
    fn default() -> Self {
        Self::Gzip { level: None }
    }
}

impl Compression {
    /// Name as written in configuration reports, `None` for no compression.
    pub fn method_name(&self) -> &'static str {
        match self {
            Compression::None => "None",
            Compression::Gzip { .. } => "gzip",
            Compression::Bz2 { .. } => "bz2",
            Compression::Lzf => "lzf",
        }
    }

    /// Python-dict rendering of explicitly set options.
    pub fn options_repr(&self) -> Option<String> {
        match self {
            Compression::Gzip { level: Some(l) } => Some(format!("{{'level': {l}}}")),
            Compression::Bz2 {
                block_size: Some(b),
            } => Some(format!("{{'block_size': {b}}}")),
            _ => None,
        }
    }

    pub(crate) fn validate(&self, backend: Backend) -> crate::Result<()> {
        if !backend.supports_compression(self) {
            return Err(crate::Error::unsupported(backend, self.method_name()));
        }
        match self {
            Compression::Gzip { level: Some(l) } if *l > 9 => Err(crate::Error::configuration(
                format!("invalid gzip compression level {l}"),
            )),
            Compression::Bz2 {
                block_size: Some(b),
            } if !(1..=9).contains(b) => Err(crate::Error::configuration(format!(
                "invalid bz2 block size {b}"
            ))),
            _ => Ok(()),
        }
    }

    /// Gzip level an HDF5 writer should use.
    pub(crate) fn hdf5_level(&self) -> Option<u8> {
        match self {
            Compression::Gzip { level } => Some(level.unwrap_or(4)),
            _ => None,
        }
    }

    /// Bytes-to-bytes compressor metadata for a Zarr v3 codec chain.
    pub(crate) fn to_zarr_codec(&self) -> crate::Result<Option<MetadataV3>> {
        match self {
            Compression::None => Ok(None),
            Compression::Gzip { level } => {
                let codec = GzipCodec::new(level.unwrap_or(1) as u32).map_err(crate::Error::wrap)?;
                Ok(Some(codec_metadata!(codec, "gzip")))
            }
            Compression::Bz2 { block_size } => {
                let block_size = block_size.unwrap_or(9);
                let codec = Bz2Codec::new(Bz2CompressionLevel::new(block_size as u32).map_err(
                    |n| crate::Error::configuration(format!("invalid bz2 block size {n}")),
                )?);
                Ok(Some(codec_metadata!(codec, "bz2")))
            }
            c => Err(crate::Error::unsupported(Backend::Zarr, c.method_name())),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Pre-compression filter.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Store differences between consecutive elements.
    Delta,
    /// Byte shuffle, grouping the n-th byte of every element together.
    Shuffle,
}

impl Filter {
    pub fn name(&self) -> &'static str {
        match self {
            Filter::Delta => "delta",
            Filter::Shuffle => "shuffle",
        }
    }

    /// Zarr v3 codec metadata for this filter, using the numcodecs names.
    pub(crate) fn to_zarr_codec(&self, dtype: Dtype) -> crate::Result<MetadataV3> {
        let meta = match self {
            Filter::Delta => MetadataV3::new_with_serializable_configuration(
                "numcodecs.delta".to_string(),
                &DeltaConfiguration {
                    dtype: dtype.typestr(),
                },
            )?,
            Filter::Shuffle => MetadataV3::new_with_serializable_configuration(
                "numcodecs.shuffle".to_string(),
                &ShuffleConfiguration {
                    elementsize: dtype.itemsize(),
                },
            )?,
        };
        Ok(meta)
    }

    /// Whether the filter sits before the array-to-bytes codec.
    pub(crate) fn is_array_to_array(&self) -> bool {
        matches!(self, Filter::Delta)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Serialize)]
struct DeltaConfiguration {
    dtype: String,
}

#[derive(Serialize)]
struct ShuffleConfiguration {
    elementsize: u64,
}

/// Little-endian bytes codec terminating the array-to-array stage.
pub(crate) fn zarr_bytes_codec() -> MetadataV3 {
    let codec = BytesCodec::little();
    codec_metadata!(codec, "bytes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_defaults() {
        let c: Compression = serde_json::from_str(r#"{"method": "gzip"}"#).unwrap();
        assert_eq!(c, Compression::Gzip { level: None });
        let c: Compression = serde_json::from_str(r#"{"method": "bz2", "block_size": 5}"#).unwrap();
        assert_eq!(
            c,
            Compression::Bz2 {
                block_size: Some(5)
            }
        );
    }

    #[test]
    fn options_only_rendered_when_set() {
        assert_eq!(Compression::default().options_repr(), None);
        assert_eq!(
            Compression::Gzip { level: Some(4) }.options_repr().as_deref(),
            Some("{'level': 4}")
        );
    }

    #[test]
    fn rejects_out_of_range_levels() {
        assert!(
            Compression::Gzip { level: Some(12) }
                .validate(Backend::Hdf5)
                .is_err()
        );
        assert!(
            Compression::Bz2 {
                block_size: Some(0)
            }
            .validate(Backend::Zarr)
            .is_err()
        );
    }

    #[test]
    fn delta_filter_records_dtype() {
        let meta = Filter::Delta.to_zarr_codec(Dtype::Int16).unwrap();
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["name"], "numcodecs.delta");
        assert_eq!(value["configuration"]["dtype"], "<i2");
    }
}
