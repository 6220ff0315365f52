//! Power commands

use fleetfish_core::{
    resources, FleetReport, HostResult, HostSet, PowerStateChange, PowerStatus, ResetType, Session,
    SessionGuard,
};
use fleetfish_dispatch::{broadcast, dispatch, send, ActionReport, DispatchOptions};

use crate::fleet::Fleet;

/// Power state of every host
pub async fn status(fleet: &Fleet, hosts: &HostSet) -> FleetReport<PowerStatus> {
    dispatch(hosts, &fleet.options, |host| {
        let fleet = fleet.clone();
        async move {
            let session = SessionGuard::open(fleet.gateway.as_ref(), &host).await?;
            let result = resources::first_system(&*session)
                .await
                .map(|system| PowerStatus {
                    power_state: system.power_state,
                });
            session.finish(result).await
        }
    })
    .await
}

/// Fire `reset_type` at every host; only reports whether it was accepted
pub async fn send_reset(fleet: &Fleet, hosts: &HostSet, reset_type: ResetType) -> ActionReport {
    let options = DispatchOptions {
        quiet: true,
        ..fleet.options.clone()
    };
    send(hosts, &options, |host| {
        let fleet = fleet.clone();
        async move {
            let session = SessionGuard::open(fleet.gateway.as_ref(), &host).await?;
            let result = issue_reset(&*session, reset_type).await.map(|_| ());
            session.finish(result).await
        }
    })
    .await
}

/// Issue `reset_type` on every host and report the state it left behind
pub async fn reset(fleet: &Fleet, hosts: &HostSet, reset_type: ResetType) -> FleetReport<PowerStateChange> {
    broadcast(hosts, &fleet.options_for("updating"), reset_type, |host, reset_type| {
        let fleet = fleet.clone();
        async move {
            let session = SessionGuard::open(fleet.gateway.as_ref(), &host).await?;
            let result = issue_reset(&*session, reset_type).await;
            session.finish(result).await
        }
    })
    .await
}

/// Reset the first system through an open session
pub(crate) async fn issue_reset(session: &dyn Session, reset_type: ResetType) -> HostResult<PowerStateChange> {
    let system = resources::first_system(session).await?;
    resources::reset(session, &system, reset_type).await?;
    tracing::debug!(host = session.host(), %reset_type, "reset issued");

    Ok(PowerStateChange {
        previous_power_state: system.power_state,
        reset_type,
    })
}

/// Reset type for `power on`
pub fn on_reset_type(force: bool) -> ResetType {
    if force {
        ResetType::ForceOn
    } else {
        ResetType::On
    }
}

/// Reset type for `power off`
pub fn off_reset_type(force: bool, button: bool) -> ResetType {
    match (force, button) {
        (true, _) => ResetType::ForceOff,
        (false, true) => ResetType::PushPowerButton,
        (false, false) => ResetType::GracefulShutdown,
    }
}

/// Reset type for `power cycle`
pub fn cycle_reset_type(force: bool) -> ResetType {
    if force {
        ResetType::ForceRestart
    } else {
        ResetType::GracefulRestart
    }
}
