use std::{borrow::Cow, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use zarrs::{array::data_type, metadata::v3::MetadataV3};

/// Fixed-size element type of a dataset, named as numpy names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Float32,
    Float64,
}

impl Dtype {
    /// Size of one element in bytes.
    pub fn itemsize(&self) -> u64 {
        match self {
            Dtype::Bool | Dtype::Int8 | Dtype::Uint8 => 1,
            Dtype::Int16 | Dtype::Uint16 => 2,
            Dtype::Int32 | Dtype::Uint32 | Dtype::Float32 => 4,
            Dtype::Int64 | Dtype::Uint64 | Dtype::Float64 => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dtype::Bool => "bool",
            Dtype::Int8 => "int8",
            Dtype::Uint8 => "uint8",
            Dtype::Int16 => "int16",
            Dtype::Uint16 => "uint16",
            Dtype::Int32 => "int32",
            Dtype::Uint32 => "uint32",
            Dtype::Int64 => "int64",
            Dtype::Uint64 => "uint64",
            Dtype::Float32 => "float32",
            Dtype::Float64 => "float64",
        }
    }

    /// Little-endian numpy type string, as numcodecs filters expect it.
    pub fn typestr(&self) -> String {
        let kind = match self {
            Dtype::Bool => 'b',
            Dtype::Int8 | Dtype::Int16 | Dtype::Int32 | Dtype::Int64 => 'i',
            Dtype::Uint8 | Dtype::Uint16 | Dtype::Uint32 | Dtype::Uint64 => 'u',
            Dtype::Float32 | Dtype::Float64 => 'f',
        };
        let order = if self.itemsize() == 1 { '|' } else { '<' };
        format!("{order}{kind}{}", self.itemsize())
    }

    /// Zarr v3 data type metadata.
    pub fn to_zarr_metadata(&self) -> MetadataV3 {
        let data_type = match self {
            Dtype::Bool => data_type::bool(),
            Dtype::Int8 => data_type::int8(),
            Dtype::Uint8 => data_type::uint8(),
            Dtype::Int16 => data_type::int16(),
            Dtype::Uint16 => data_type::uint16(),
            Dtype::Int32 => data_type::int32(),
            Dtype::Uint32 => data_type::uint32(),
            Dtype::Int64 => data_type::int64(),
            Dtype::Uint64 => data_type::uint64(),
            Dtype::Float32 => data_type::float32(),
            Dtype::Float64 => data_type::float64(),
        };
        let data_type_name = data_type
            .name_v3()
            .map_or_else(|| self.name().to_string(), Cow::into_owned);
        let data_type_configuration = data_type.configuration_v3();
        if data_type_configuration.is_empty() {
            MetadataV3::new(data_type_name)
        } else {
            MetadataV3::new_with_configuration(data_type_name, data_type_configuration)
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dtype {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dtype = match s {
            "bool" | "b1" | "|b1" => Dtype::Bool,
            "int8" | "i1" | "|i1" => Dtype::Int8,
            "uint8" | "u1" | "|u1" => Dtype::Uint8,
            "int16" | "i2" | "<i2" => Dtype::Int16,
            "uint16" | "u2" | "<u2" => Dtype::Uint16,
            "int32" | "i4" | "<i4" => Dtype::Int32,
            "uint32" | "u4" | "<u4" => Dtype::Uint32,
            "int64" | "i8" | "<i8" => Dtype::Int64,
            "uint64" | "u8" | "<u8" => Dtype::Uint64,
            "float32" | "f4" | "<f4" => Dtype::Float32,
            "float64" | "f8" | "<f8" => Dtype::Float64,
            s => return Err(crate::Error::general(format!("unsupported data type: {s}"))),
        };
        Ok(dtype)
    }
}
