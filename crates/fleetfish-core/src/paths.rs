//! Resource path helpers.
//!
//! Redfish resource identifiers are absolute paths that may or may not
//! carry a trailing `/`. These helpers centralise the joining rules so
//! every call site derives sub-resource paths the same way.

/// Service root of every Redfish implementation
pub const SERVICE_ROOT: &str = "/redfish/v1";

/// Systems collection
pub const SYSTEMS: &str = "/redfish/v1/Systems";

/// Managers collection
pub const MANAGERS: &str = "/redfish/v1/Managers";

/// Session collection used for token authentication
pub const SESSIONS: &str = "/redfish/v1/SessionService/Sessions";

/// Append `child` to `parent`, tolerating a trailing `/` on the parent.
///
/// ```
/// # use fleetfish_core::paths::child_path;
/// assert_eq!(child_path("/redfish/v1/Systems/1/Bios/", "Settings"), "/redfish/v1/Systems/1/Bios/Settings");
/// assert_eq!(child_path("/redfish/v1/Systems/1", "Bios"), "/redfish/v1/Systems/1/Bios");
/// ```
pub fn child_path(parent: &str, child: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), child)
}

/// Target of the `ComputerSystem.Reset` action for a system
///
/// ```
/// # use fleetfish_core::paths::reset_action;
/// assert_eq!(reset_action("/redfish/v1/Systems/1"), "/redfish/v1/Systems/1/Actions/ComputerSystem.Reset");
/// ```
pub fn reset_action(system: &str) -> String {
    child_path(system, "Actions/ComputerSystem.Reset")
}

/// Path of the boot option named by a `BootOrder` entry.
///
/// `BootOrder` holds references like `Boot0003`; the option itself lives
/// at `<system>/BootOptions/0003`.
///
/// ```
/// # use fleetfish_core::paths::boot_option;
/// assert_eq!(boot_option("/redfish/v1/Systems/1", "Boot0003"), "/redfish/v1/Systems/1/BootOptions/0003");
/// ```
pub fn boot_option(system: &str, reference: &str) -> String {
    let id = reference.strip_prefix("Boot").unwrap_or(reference);
    child_path(&child_path(system, "BootOptions"), id)
}
