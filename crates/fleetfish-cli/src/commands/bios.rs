//! BIOS commands - read attributes, write them, show staged changes

use std::sync::Arc;

use fleetfish_bios::{pending_changes, pending_changes_at, retain_known, select_attributes, Intent};
use fleetfish_core::{
    resources, AttributeSet, BiosAttributes, ComputerSystem, FleetReport, HostResult, HostSet,
    PendingAttributes, Session, SessionGuard,
};
use fleetfish_dispatch::{broadcast, dispatch};
use serde_json::json;

use crate::fleet::Fleet;

/// Keys to read with `bios get`
#[derive(Debug, Clone, Default)]
pub struct BiosQuery {
    /// Raw attribute keys; empty selects every attribute
    pub keys: Vec<String>,
    /// Add the keys of the host vendor's virtualization preset
    pub virtualization: bool,
}

/// Attributes to write with `bios set`
#[derive(Debug, Clone, Default)]
pub struct BiosChange {
    /// Explicit assignments; these win over preset values
    pub attributes: AttributeSet,
    /// Apply the preset of each host's detected vendor
    pub virtualization: Option<Intent>,
}

impl BiosChange {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.virtualization.is_none()
    }
}

/// Read BIOS attributes from every host
pub async fn get(fleet: &Fleet, hosts: &HostSet, query: BiosQuery) -> FleetReport<BiosAttributes> {
    let query = Arc::new(query);
    dispatch(hosts, &fleet.options, |host| {
        let fleet = fleet.clone();
        let query = Arc::clone(&query);
        async move {
            let session = SessionGuard::open(fleet.gateway.as_ref(), &host).await?;
            let result = read_attributes(&*session, &fleet, &query).await;
            session.finish(result).await
        }
    })
    .await
}

/// Staged changes that differ from the live settings, per host
pub async fn pending(fleet: &Fleet, hosts: &HostSet) -> FleetReport<PendingAttributes> {
    dispatch(hosts, &fleet.options, |host| {
        let fleet = fleet.clone();
        async move {
            let session = SessionGuard::open(fleet.gateway.as_ref(), &host).await?;
            let result = read_pending(&*session, &fleet).await;
            session.finish(result).await
        }
    })
    .await
}

/// Write attributes to every host and report what is now pending
pub async fn set(fleet: &Fleet, hosts: &HostSet, change: BiosChange) -> FleetReport<PendingAttributes> {
    let options = fleet.options_for("updating");
    broadcast(hosts, &options, Arc::new(change), |host, change| {
        let fleet = fleet.clone();
        async move {
            let session = SessionGuard::open(fleet.gateway.as_ref(), &host).await?;
            let result = write_attributes(&*session, &fleet, &change).await;
            session.finish(result).await
        }
    })
    .await
}

fn processor_model(system: &ComputerSystem) -> &str {
    system
        .processor_summary
        .as_ref()
        .and_then(|summary| summary.model.as_deref())
        .unwrap_or_default()
}

fn manufacturer(system: &ComputerSystem) -> &str {
    system.manufacturer.as_deref().unwrap_or_default()
}

async fn read_attributes(
    session: &dyn Session,
    fleet: &Fleet,
    query: &BiosQuery,
) -> HostResult<BiosAttributes> {
    let system = resources::first_system(session).await?;
    let bios = resources::bios(session, &system).await?;
    let decoder = fleet.decoders.lookup(processor_model(&system));

    let mut keys = query.keys.clone();
    if query.virtualization {
        let preset = fleet.catalog.template(true, manufacturer(&system))?;
        keys.extend(preset.into_keys().filter(|key| !query.keys.contains(key)));
    }

    let attributes = select_attributes(&bios.attributes, &keys, decoder, fleet.mode)?;
    Ok(BiosAttributes { attributes })
}

async fn read_pending(session: &dyn Session, fleet: &Fleet) -> HostResult<PendingAttributes> {
    let system = resources::first_system(session).await?;
    let bios = resources::bios(session, &system).await?;
    let pending = pending_changes(session, &bios, &fleet.staging).await?;
    Ok(PendingAttributes { pending })
}

async fn write_attributes(
    session: &dyn Session,
    fleet: &Fleet,
    change: &BiosChange,
) -> HostResult<PendingAttributes> {
    let system = resources::first_system(session).await?;
    let bios = resources::bios(session, &system).await?;

    let mut requested = AttributeSet::new();
    if let Some(intent) = change.virtualization {
        requested.extend(fleet.catalog.template(intent == Intent::Enable, manufacturer(&system))?);
    }
    requested.extend(change.attributes.clone());

    let known = retain_known(&requested, &bios.attributes)?;
    let target = bios
        .settings_object()
        .map(str::to_string)
        .unwrap_or_else(|| fleet.staging.staging_path(&bios.odata_id));

    tracing::debug!(host = session.host(), target = %target, count = known.len(), "writing BIOS attributes");
    session.patch(&target, &json!({ "Attributes": known })).await?;

    let pending = pending_changes_at(session, &bios, &target, &fleet.staging).await?;
    Ok(PendingAttributes { pending })
}
