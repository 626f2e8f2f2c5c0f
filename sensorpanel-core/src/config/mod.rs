//! Configuration types
//!
//! Boot-time panel configuration, read from TOML text or from
//! postcard-serialized binary data.

pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ParseError};
pub use types::*;

/// Upper bound on the encoded size of a `PanelConfig`
pub const MAX_CONFIG_SIZE: usize = 64;

/// Decode a binary configuration and check its layout version
#[cfg(feature = "serde")]
pub fn from_bytes(bytes: &[u8]) -> Result<PanelConfig, ConfigError> {
    let config: PanelConfig = postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;

    if config.version != CONFIG_VERSION {
        crate::log::warn!(
            "Config version mismatch: found {}, expected {}",
            config.version,
            CONFIG_VERSION
        );
        return Err(ConfigError::VersionMismatch);
    }

    Ok(config)
}

/// Encode a configuration into `buffer`, returning the used prefix
#[cfg(feature = "serde")]
pub fn to_slice<'a>(config: &PanelConfig, buffer: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
    postcard::to_slice(config, buffer).map_err(|_| ConfigError::Serialize)
}
