//! Boot override command

use fleetfish_core::{
    resources, BootOverride, BootOverrideRequest, BootSourceOverrideEnabled,
    BootSourceOverrideTarget, FleetReport, HostResult, HostSet, ResetType, Session, SessionGuard,
};
use fleetfish_dispatch::broadcast;
use serde_json::json;

use crate::commands::power::issue_reset;
use crate::fleet::Fleet;

/// Boot mode written with every override
const OVERRIDE_MODE: &str = "UEFI";

/// Parameters of `boot override`
#[derive(Debug, Clone, Copy)]
pub struct OverrideRequest {
    pub target: BootSourceOverrideTarget,
    /// Keep the override for every boot
    pub persist: bool,
    /// Force a restart once the override is set
    pub restart: bool,
}

impl OverrideRequest {
    /// `Enabled` value sent with this override
    pub fn enabled(&self) -> BootSourceOverrideEnabled {
        match (self.target, self.persist) {
            (BootSourceOverrideTarget::None, _) => BootSourceOverrideEnabled::Disabled,
            (_, true) => BootSourceOverrideEnabled::Continuous,
            (_, false) => BootSourceOverrideEnabled::Once,
        }
    }
}

/// Set the boot override on every host
pub async fn set_override(fleet: &Fleet, hosts: &HostSet, request: OverrideRequest) -> FleetReport<BootOverride> {
    broadcast(hosts, &fleet.options_for("updating"), request, |host, request| {
        let fleet = fleet.clone();
        async move {
            let session = SessionGuard::open(fleet.gateway.as_ref(), &host).await?;
            let result = apply_override(&*session, request).await;
            session.finish(result).await
        }
    })
    .await
}

async fn apply_override(session: &dyn Session, request: OverrideRequest) -> HostResult<BootOverride> {
    let system = resources::first_system(session).await?;
    let body = BootOverrideRequest {
        boot_source_override_target: request.target,
        boot_source_override_enabled: request.enabled(),
        boot_source_override_mode: OVERRIDE_MODE.to_string(),
    };
    session.patch(&system.odata_id, &json!({ "Boot": body })).await?;

    let restart = if request.restart {
        Some(issue_reset(session, ResetType::ForceRestart).await?)
    } else {
        None
    };

    Ok(BootOverride {
        target: request.target,
        enabled: request.enabled(),
        restart,
    })
}
