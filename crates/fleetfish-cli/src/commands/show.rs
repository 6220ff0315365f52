//! Inventory commands

use fleetfish_core::{
    resources, BootInfo, ComputerSystem, FleetReport, HostResult, HostSet, ProcessorSummary,
    Session, SessionGuard, SystemSummary,
};
use fleetfish_dispatch::dispatch;

use crate::fleet::Fleet;

/// Boot order and next boot of every host
pub async fn boot(fleet: &Fleet, hosts: &HostSet) -> FleetReport<BootInfo> {
    dispatch(hosts, &fleet.options, |host| {
        let fleet = fleet.clone();
        async move {
            let session = SessionGuard::open(fleet.gateway.as_ref(), &host).await?;
            let result = boot_info(&*session).await;
            session.finish(result).await
        }
    })
    .await
}

/// Manufacturer, model and firmware versions of every host
pub async fn system(fleet: &Fleet, hosts: &HostSet) -> FleetReport<SystemSummary> {
    dispatch(hosts, &fleet.options, |host| {
        let fleet = fleet.clone();
        async move {
            let session = SessionGuard::open(fleet.gateway.as_ref(), &host).await?;
            let result = system_summary(&*session).await;
            session.finish(result).await
        }
    })
    .await
}

/// Processors of every host
pub async fn processors(fleet: &Fleet, hosts: &HostSet) -> FleetReport<Vec<ProcessorSummary>> {
    dispatch(hosts, &fleet.options, |host| {
        let fleet = fleet.clone();
        async move {
            let session = SessionGuard::open(fleet.gateway.as_ref(), &host).await?;
            let result = processor_summaries(&*session).await;
            session.finish(result).await
        }
    })
    .await
}

/// `BootOrder` entries, labelled with their boot option descriptions when
/// the BMC has a `BootOptions` collection
async fn boot_info(session: &dyn Session) -> HostResult<BootInfo> {
    let system = resources::first_system(session).await?;
    let order = describe_boot_order(session, &system).await?;
    let next = system.boot.boot_next.filter(|next| !next.is_empty());
    Ok(BootInfo { order, next })
}

async fn describe_boot_order(session: &dyn Session, system: &ComputerSystem) -> HostResult<Vec<String>> {
    let mut order = Vec::with_capacity(system.boot.boot_order.len());
    for reference in &system.boot.boot_order {
        match resources::boot_option_description(session, system, reference).await? {
            Some(description) => order.push(format!("{} ({})", reference, description)),
            // No collection means no descriptions at all
            None => return Ok(system.boot.boot_order.clone()),
        }
    }
    Ok(order)
}

async fn system_summary(session: &dyn Session) -> HostResult<SystemSummary> {
    let system = resources::first_system(session).await?;
    let managers = resources::managers(session).await?;

    Ok(SystemSummary {
        manufacturer: system.manufacturer,
        model: system.model,
        bios_version: system.bios_version,
        firmware_version: managers.into_iter().next().and_then(|m| m.firmware_version),
    })
}

async fn processor_summaries(session: &dyn Session) -> HostResult<Vec<ProcessorSummary>> {
    let system = resources::first_system(session).await?;
    let processors = resources::processors(session, &system).await?;

    let trimmed = |value: Option<String>| value.map(|v| v.trim().to_string());
    Ok(processors
        .into_iter()
        .map(|p| ProcessorSummary {
            socket: trimmed(p.socket),
            model: trimmed(p.model),
            architecture: trimmed(p.processor_architecture),
            total_cores: p.total_cores,
            total_threads: p.total_threads,
            vendor_id: trimmed(p.processor_id.and_then(|id| id.vendor_id)),
        })
        .collect())
}
