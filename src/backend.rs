use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::compression::{Compression, Filter};

/// Storage backend an NWB container is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Hdf5,
    Zarr,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Hdf5 => "hdf5",
            Backend::Zarr => "zarr",
        }
    }

    /// Compression used when the caller does not choose one.
    pub fn default_compression(&self) -> Compression {
        Compression::Gzip { level: None }
    }

    /// Filters applied ahead of compression by default.
    ///
    /// Zarr gets a delta filter, which suits slowly varying integer traces.
    pub fn default_filters(&self) -> Vec<Filter> {
        match self {
            Backend::Hdf5 => vec![],
            Backend::Zarr => vec![Filter::Delta],
        }
    }

    pub fn supports_compression(&self, compression: &Compression) -> bool {
        matches!(
            (self, compression),
            (_, Compression::None)
                | (_, Compression::Gzip { .. })
                | (Backend::Hdf5, Compression::Lzf)
                | (Backend::Zarr, Compression::Bz2 { .. })
        )
    }

    pub fn supports_filter(&self, filter: &Filter) -> bool {
        matches!(
            (self, filter),
            (_, Filter::Shuffle) | (Backend::Zarr, Filter::Delta)
        )
    }

    /// Names of the compression methods this backend accepts.
    pub fn available_compression_methods(&self) -> &'static [&'static str] {
        match self {
            Backend::Hdf5 => &["gzip", "lzf"],
            Backend::Zarr => &["gzip", "bz2"],
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hdf5" | "h5" => Ok(Backend::Hdf5),
            "zarr" => Ok(Backend::Zarr),
            s => Err(crate::Error::general(format!("unknown backend: {s}"))),
        }
    }
}
