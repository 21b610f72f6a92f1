//! Types for use when configuring attestation modules.

use crate::*;

/// helper transcode function
fn tc<S: serde::Serialize, D: serde::de::DeserializeOwned>(
    s: &S,
) -> AtResult<D> {
    serde_json::from_str(
        &serde_json::to_string(s)
            .map_err(|e| AtError::other_src("encode", e))?,
    )
    .map_err(|e| AtError::other_src("decode", e))
}

/// Denotes a type used to configure a specific module.
///
/// A module config type is a struct with a single named field holding the
/// module's own parameters, e.g. `{ "hostFetcher": { ... } }`. Multiple
/// modules can thus share one [Config] without conflicting.
///
/// Note, the types defined in this struct are specifically for configuration
/// that cannot be changed at runtime, the likes of which might be found
/// in a configuration file.
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
}

impl<T> ModConfig for T where
    T: 'static
        + Sized
        + Default
        + std::fmt::Debug
        + serde::Serialize
        + serde::de::DeserializeOwned
        + Send
        + Sync
{
}

/// Attestation service configuration.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Config(serde_json::Map<String, serde_json::Value>);

impl Config {
    /// Set the properties of a module config. When generating a default
    /// configuration, factories call this with their default module
    /// config. Refuses to overwrite a module key that is already set.
    pub fn set_module_config<M: ModConfig>(&mut self, m: &M) -> AtResult<()> {
        let serde_json::Value::Object(map) = tc(m)? else {
            return Err(AtError::other(
                "module config must serialize to a json object",
            ));
        };
        for (key, value) in map {
            if self.0.contains_key(&key) {
                return Err(AtError::other(format!(
                    "Refusing to overwrite conflicting module name: {key}"
                )));
            }
            self.0.insert(key, value);
        }
        Ok(())
    }

    /// Extract a module config. Note that this config may be loaded from
    /// disk and edited by humans, so module configs should be tolerant
    /// to missing properties, setting sane defaults.
    pub fn get_module_config<M: ModConfig>(&self) -> AtResult<M> {
        tc(&self.0)
    }

    /// Load a config from a json string.
    pub fn from_json(json: &str) -> AtResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| AtError::other_src("parse config", e))
    }

    /// Render this config as pretty json.
    pub fn to_json_pretty(&self) -> AtResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| AtError::other_src("encode config", e))
    }
}
