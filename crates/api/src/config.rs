//! Types for use when configuring pictor modules.

use crate::*;

/// helper transcode function
fn tc<S: serde::Serialize, D: serde::de::DeserializeOwned>(
    s: &S,
) -> PicResult<D> {
    serde_json::from_str(
        &serde_json::to_string(s)
            .map_err(|e| PicError::other_src("encode", e))?,
    )
    .map_err(|e| PicError::other_src("decode", e))
}

/// Denotes a type used to configure a specific pictor module.
///
/// Note, the types defined in this struct are specifically for configuration
/// that cannot be changed at runtime, the likes of which might be found
/// in a configuration file.
///
/// It is highly recommended that you expose this struct in your module
/// docs to help devs using your module understand how to configure it.
pub trait ModConfig:
    'static
    + Sized
    + Default
    + std::fmt::Debug
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Send
    + Sync
{
    /// The top-level key under which this module config is stored.
    const MODULE_NAME: &'static str;
}

/// Pictor configuration.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Config(serde_json::Map<String, serde_json::Value>);

impl Config {
    /// When pictor is generating a default or example configuration
    /// file, it will pass a mutable reference of this config struct to
    /// the module factories that are configured to be used. Those factories
    /// should call this function to add their default configuration
    /// parameters to that file.
    pub fn set_module_config<M: ModConfig>(&mut self, m: &M) -> PicResult<()> {
        if self.0.contains_key(M::MODULE_NAME) {
            return Err(PicError::other(format!(
                "Refusing to overwrite conflicting module name: {}",
                M::MODULE_NAME,
            )));
        }
        self.0.insert(M::MODULE_NAME.into(), tc(m)?);
        Ok(())
    }

    /// When pictor is initializing, it will call the factory function
    /// for all of its modules with an immutable reference to this config
    /// struct. Each of those modules may choose to call this function
    /// to extract a module config. Note that this config can be loaded from
    /// disk and edited by humans, so the serialization on the module
    /// config should be tolerant to missing properties, setting sane
    /// defaults.
    pub fn get_module_config<M: ModConfig>(&self) -> PicResult<M> {
        self.0
            .get(M::MODULE_NAME)
            .map(tc)
            .unwrap_or_else(|| Ok(M::default()))
    }
}
