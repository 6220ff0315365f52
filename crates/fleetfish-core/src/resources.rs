//! Typed accessors over a [`Session`]
//!
//! Each function issues the GETs needed to resolve one kind of resource
//! and decodes the result into the models in [`crate::models`].

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::error::{HostError, HostResult};
use crate::gateway::Session;
use crate::models::{
    Bios, BootOption, Collection, ComputerSystem, Manager, Processor, ResetType,
};
use crate::paths;

/// GET `path` and decode it as `T`
pub async fn fetch<T: DeserializeOwned>(session: &dyn Session, path: &str) -> HostResult<T> {
    let doc = session.get(path).await?;
    serde_json::from_value(doc).map_err(|e| HostError::InvalidResponse(format!("{}: {}", path, e)))
}

async fn members<T: DeserializeOwned>(session: &dyn Session, path: &str) -> HostResult<Vec<T>> {
    let collection: Collection = fetch(session, path).await?;
    let mut items = Vec::with_capacity(collection.members.len());
    for member in &collection.members {
        items.push(fetch(session, &member.odata_id).await?);
    }
    Ok(items)
}

/// Every computer system the BMC manages
pub async fn systems(session: &dyn Session) -> HostResult<Vec<ComputerSystem>> {
    members(session, paths::SYSTEMS).await
}

/// The first computer system; single-node BMCs expose exactly one
pub async fn first_system(session: &dyn Session) -> HostResult<ComputerSystem> {
    let collection: Collection = fetch(session, paths::SYSTEMS).await?;
    let first = collection
        .members
        .first()
        .ok_or_else(|| HostError::NotFound("no computer systems reported".to_string()))?;
    fetch(session, &first.odata_id).await
}

/// BIOS resource of `system`
pub async fn bios(session: &dyn Session, system: &ComputerSystem) -> HostResult<Bios> {
    let path = match &system.bios {
        Some(link) => link.odata_id.clone(),
        None => paths::child_path(&system.odata_id, "Bios"),
    };
    fetch(session, &path).await
}

pub async fn managers(session: &dyn Session) -> HostResult<Vec<Manager>> {
    members(session, paths::MANAGERS).await
}

/// Processors of `system`
pub async fn processors(session: &dyn Session, system: &ComputerSystem) -> HostResult<Vec<Processor>> {
    let path = match &system.processors {
        Some(link) => link.odata_id.clone(),
        None => paths::child_path(&system.odata_id, "Processors"),
    };
    members(session, &path).await
}

/// Description of the boot option a `BootOrder` entry points at.
///
/// Returns `Ok(None)` when the BMC has no `BootOptions` collection.
pub async fn boot_option_description(
    session: &dyn Session,
    system: &ComputerSystem,
    reference: &str,
) -> HostResult<Option<String>> {
    let path = paths::boot_option(&system.odata_id, reference);
    match fetch::<BootOption>(session, &path).await {
        Ok(option) => Ok(option
            .description
            .or(option.display_name)
            .map(|d| d.trim().to_string())),
        Err(HostError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Invoke the reset action of `system`
pub async fn reset(session: &dyn Session, system: &ComputerSystem, reset_type: ResetType) -> HostResult<()> {
    let body = json!({ "ResetType": reset_type });
    session.post(&paths::reset_action(&system.odata_id), &body).await?;
    Ok(())
}
