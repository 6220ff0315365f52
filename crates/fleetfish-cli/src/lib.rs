//! fleetfish - fleet-wide BMC management over Redfish
//!
//! Each command resolves its target hosts, fans a per-host handler out
//! through the dispatcher and renders the host-keyed report:
//!
//! ```text
//! hosts ──► dispatch ──┬──► [bmc-01] SessionGuard ─► Redfish ─► result ─┐
//!                      ├──► [bmc-02] SessionGuard ─► Redfish ─► error  ─┼──► FleetReport ──► json | yaml | table
//!                      └──► [bmc-03] ...                               ─┘
//! ```
//!
//! The command handlers in [`commands`] take a [`Fleet`] and a
//! [`HostSet`](fleetfish_core::HostSet) and return the report, so they can
//! be driven against mock BMCs as easily as from the binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod fleet;
pub mod input;
pub mod output;

use anyhow::{bail, Context, Result};
use fleetfish_bios::{load_attribute_file, parse_assignments, Intent};
use fleetfish_client::{ClientError, CredentialStore};
use fleetfish_core::HostSet;
use fleetfish_dispatch::Shutdown;

use crate::cli::{BiosCommand, BootCommand, Cli, Commands, HostArgs, PowerCommand, ShowCommand};
use crate::commands::{BiosChange, BiosQuery, OverrideRequest};
pub use crate::config::Config;
pub use crate::fleet::Fleet;
use crate::output::OutputContext;

/// Execute a parsed command line and return the process exit code
pub async fn run(cli: Cli) -> Result<i32> {
    let config = match &cli.global.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let merged = config.merge_with_args(&cli.global)?;
    let ctx = OutputContext::new(merged.output, merged.no_color, merged.quiet);

    let hosts = input::resolve_hosts(&host_args(&cli.command).hosts)?;
    let credentials = config.credentials(|name| std::env::var(name).ok());
    check_credentials(&credentials, &hosts)?;

    let mut fleet = Fleet::from_config(&config, &merged, credentials)?;
    fleet.options.shutdown = Some(Shutdown::on_ctrl_c());

    match cli.command {
        Commands::Bios { command } => match command {
            BiosCommand::Get {
                attributes,
                from_file,
                virtualization,
                pending,
                ..
            } => {
                if pending {
                    ctx.render(&commands::bios::pending(&fleet, &hosts).await)?;
                } else {
                    let mut keys = attributes;
                    if let Some(path) = from_file {
                        let file = load_attribute_file(&path)
                            .with_context(|| format!("Failed to read attribute file: {}", path.display()))?;
                        keys.extend(file.into_keys());
                    }
                    let query = BiosQuery { keys, virtualization };
                    ctx.render(&commands::bios::get(&fleet, &hosts, query).await)?;
                }
            }

            BiosCommand::Set {
                attributes,
                from_file,
                virtualization,
                disable,
                vendor,
                ..
            } => {
                let mut change = BiosChange::default();
                if let Some(path) = from_file {
                    change.attributes = load_attribute_file(&path)
                        .with_context(|| format!("Failed to read attribute file: {}", path.display()))?;
                }
                change.attributes.extend(parse_assignments(&attributes)?);

                if virtualization {
                    match vendor {
                        Some(vendor) => {
                            let mut preset = fleet.catalog.template(!disable, &vendor)?;
                            preset.append(&mut change.attributes);
                            change.attributes = preset;
                        }
                        None => change.virtualization = Some(Intent::from_enable(!disable)),
                    }
                }
                if change.is_empty() {
                    bail!("nothing to set: pass --attributes, --from-file or --virtualization");
                }
                ctx.render(&commands::bios::set(&fleet, &hosts, change).await)?;
            }
        },

        Commands::Power { command } => match command {
            PowerCommand::Status { .. } => {
                ctx.render(&commands::power::status(&fleet, &hosts).await)?;
            }
            PowerCommand::On { force, .. } => {
                let reset_type = commands::power::on_reset_type(force);
                let report = commands::power::send_reset(&fleet, &hosts, reset_type).await;
                ctx.print_action(&report);
                return Ok(report.exit_code());
            }
            PowerCommand::Off { force, button, .. } => {
                let reset_type = commands::power::off_reset_type(force, button);
                let report = commands::power::send_reset(&fleet, &hosts, reset_type).await;
                ctx.print_action(&report);
                return Ok(report.exit_code());
            }
            PowerCommand::Cycle { force, .. } => {
                let reset_type = commands::power::cycle_reset_type(force);
                ctx.render(&commands::power::reset(&fleet, &hosts, reset_type).await)?;
            }
            PowerCommand::Reset { .. } => {
                let reset_type = fleetfish_core::ResetType::ForceRestart;
                ctx.render(&commands::power::reset(&fleet, &hosts, reset_type).await)?;
            }
            PowerCommand::Nmi { .. } => {
                let reset_type = fleetfish_core::ResetType::Nmi;
                ctx.render(&commands::power::reset(&fleet, &hosts, reset_type).await)?;
            }
        },

        Commands::Boot { command } => match command {
            BootCommand::Override {
                target,
                persist,
                now,
                ..
            } => {
                let request = OverrideRequest {
                    target: target.into(),
                    persist,
                    restart: now,
                };
                ctx.render(&commands::boot::set_override(&fleet, &hosts, request).await)?;
            }
        },

        Commands::Show { command } => match command {
            ShowCommand::Boot { .. } => ctx.render(&commands::show::boot(&fleet, &hosts).await)?,
            ShowCommand::System { .. } => ctx.render(&commands::show::system(&fleet, &hosts).await)?,
            ShowCommand::Proc { .. } => ctx.render(&commands::show::processors(&fleet, &hosts).await)?,
        },
    }

    Ok(0)
}

fn host_args(command: &Commands) -> &HostArgs {
    match command {
        Commands::Bios { command } => match command {
            BiosCommand::Get { hosts, .. } | BiosCommand::Set { hosts, .. } => hosts,
        },
        Commands::Power { command } => match command {
            PowerCommand::Status { hosts }
            | PowerCommand::On { hosts, .. }
            | PowerCommand::Off { hosts, .. }
            | PowerCommand::Cycle { hosts, .. }
            | PowerCommand::Reset { hosts }
            | PowerCommand::Nmi { hosts } => hosts,
        },
        Commands::Boot { command } => match command {
            BootCommand::Override { hosts, .. } => hosts,
        },
        Commands::Show { command } => match command {
            ShowCommand::Boot { hosts } | ShowCommand::System { hosts } | ShowCommand::Proc { hosts } => hosts,
        },
    }
}

/// Every target host must have a username and password before anything is sent
fn check_credentials(credentials: &CredentialStore, hosts: &HostSet) -> Result<(), ClientError> {
    for host in hosts.iter() {
        credentials.resolve(host)?;
    }
    Ok(())
}
