//! Builder-related types.

use crate::*;
use std::sync::Arc;

/// The general attestation service builder.
/// This contains both configuration and factory instances,
/// allowing construction of runtime module instances.
#[derive(Debug)]
pub struct Builder {
    /// The module configuration to be used when building modules.
    /// This can be loaded from disk or modified before freezing the builder.
    pub config: config::Config,

    /// The [fetch::HostDataFetcherFactory] to be used for creating
    /// [fetch::HostDataFetcher] instances.
    pub host_fetcher: fetch::DynHostDataFetcherFactory,
}

impl Builder {
    /// Construct a default config given the configured module factories.
    /// Note, this should be called before freezing the Builder instance
    /// in an Arc<>.
    pub fn with_default_config(mut self) -> AtResult<Self> {
        {
            let Self {
                config,
                host_fetcher,
            } = &mut self;

            host_fetcher.default_config(config)?;
        }

        Ok(self)
    }

    /// Validate the config against every configured module factory.
    pub fn validate_config(&self) -> AtResult<()> {
        self.host_fetcher.validate_config(&self.config)
    }

    /// Freeze this builder so it can be handed to module factories.
    pub fn build(self) -> AtResult<Arc<Self>> {
        self.validate_config()?;
        Ok(Arc::new(self))
    }
}
