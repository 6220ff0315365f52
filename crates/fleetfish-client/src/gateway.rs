//! Redfish implementation of the [`Gateway`] trait

use std::sync::Arc;

use async_trait::async_trait;
use fleetfish_core::{hosts, Gateway, HostResult, Session};
use reqwest::Client;
use url::Url;

use crate::client::{ClientConfig, RedfishSession};
use crate::credentials::CredentialStore;
use crate::error::{ClientError, Result};

/// Opens Redfish sessions to any host of the fleet.
///
/// The underlying HTTP client, and with it the connection pool, is shared
/// by every session the gateway opens.
#[derive(Debug, Clone)]
pub struct RedfishGateway {
    client: Client,
    config: ClientConfig,
    credentials: CredentialStore,
}

impl RedfishGateway {
    pub fn new(config: ClientConfig, credentials: CredentialStore) -> Result<Self> {
        let client = config.build_http()?;
        Ok(Self {
            client,
            config,
            credentials,
        })
    }
}

#[async_trait]
impl Gateway for RedfishGateway {
    async fn connect(&self, host: &str) -> HostResult<Arc<dyn Session>> {
        let credentials = self.credentials.resolve(host)?;
        let base_url = Url::parse(&hosts::base_url(host)).map_err(ClientError::from)?;

        let session = RedfishSession::open(
            host,
            self.client.clone(),
            base_url,
            credentials,
            self.config.auth,
        )
        .await?;
        Ok(Arc::new(session))
    }
}
