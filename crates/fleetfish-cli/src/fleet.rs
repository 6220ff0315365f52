//! Shared state handed to every command handler

use std::sync::Arc;

use anyhow::{Context, Result};
use fleetfish_bios::{DecodeMode, DecoderRegistry, StagingLayout, VendorCatalog};
use fleetfish_client::{ClientConfig, CredentialStore, RedfishGateway, DEFAULT_CONNECT_TIMEOUT};
use fleetfish_core::Gateway;
use fleetfish_dispatch::DispatchOptions;

use crate::config::{Config, MergedConfig};
use crate::output::OutputFormat;

/// Everything a per-host handler needs besides its host.
///
/// Registry, catalog and staging layout are built once and shared; cloning
/// a `Fleet` only bumps reference counts.
#[derive(Clone)]
pub struct Fleet {
    pub gateway: Arc<dyn Gateway>,
    pub decoders: Arc<DecoderRegistry>,
    pub catalog: Arc<VendorCatalog>,
    pub staging: Arc<StagingLayout>,
    pub options: DispatchOptions,
    pub mode: DecodeMode,
}

impl Fleet {
    /// A fleet using the built-in decoders, presets and staging layout
    pub fn new(gateway: Arc<dyn Gateway>) -> Result<Self> {
        Ok(Self {
            gateway,
            decoders: Arc::new(DecoderRegistry::builtin()?),
            catalog: Arc::new(VendorCatalog::builtin()),
            staging: Arc::new(StagingLayout::default()),
            options: DispatchOptions::default(),
            mode: DecodeMode::default(),
        })
    }

    /// Build the fleet described by the config file and merged flags
    pub fn from_config(
        config: &Config,
        merged: &MergedConfig,
        credentials: CredentialStore,
    ) -> Result<Self> {
        let client = ClientConfig {
            timeout: merged.timeout,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT.min(merged.timeout),
            insecure: merged.insecure,
            auth: merged.auth,
        };
        let gateway = RedfishGateway::new(client, credentials).context("Failed to create Redfish client")?;

        Ok(Self {
            gateway: Arc::new(gateway),
            decoders: Arc::new(config.decoder_registry()?),
            catalog: Arc::new(config.vendor_catalog()),
            staging: Arc::new(config.staging_layout()),
            options: DispatchOptions {
                quiet: merged.quiet,
                max_in_flight: merged.max_in_flight,
                host_timeout: merged.host_timeout,
                ..DispatchOptions::default()
            },
            mode: decode_mode(merged.output),
        })
    }

    pub fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_mode(mut self, mode: DecodeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_catalog(mut self, catalog: VendorCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn with_staging(mut self, staging: StagingLayout) -> Self {
        self.staging = Arc::new(staging);
        self
    }

    /// Dispatch options with a different progress verb
    pub(crate) fn options_for(&self, verb: &'static str) -> DispatchOptions {
        self.options.clone().with_verb(verb)
    }
}

/// Machine-readable formats keep canonical keys; tables show display names
pub fn decode_mode(format: OutputFormat) -> DecodeMode {
    match format {
        OutputFormat::Table => DecodeMode::Display,
        OutputFormat::Json | OutputFormat::Yaml => DecodeMode::Canonical,
    }
}
