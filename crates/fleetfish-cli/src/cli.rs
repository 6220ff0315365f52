//! Command-line definition

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fleetfish_client::AuthMode;
use fleetfish_core::BootSourceOverrideTarget;

use crate::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "fleetfish")]
#[command(author, version, about = "Fleet-wide BMC management over Redfish")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every command
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Configuration file path
    #[arg(short, long, env = "FLEETFISH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long, global = true)]
    pub insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Deadline for each host's whole operation in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub host_timeout: Option<u64>,

    /// Maximum number of hosts worked on at once
    #[arg(long, value_name = "N", global = true)]
    pub max_in_flight: Option<usize>,

    /// Authentication mode: basic or session
    #[arg(long, value_name = "MODE", global = true)]
    pub auth: Option<AuthMode>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Read or change BIOS attributes
    Bios {
        #[command(subcommand)]
        command: BiosCommand,
    },

    /// Power state and reset actions
    Power {
        #[command(subcommand)]
        command: PowerCommand,
    },

    /// Boot source overrides
    Boot {
        #[command(subcommand)]
        command: BootCommand,
    },

    /// Inventory
    Show {
        #[command(subcommand)]
        command: ShowCommand,
    },
}

/// Target hosts
#[derive(Debug, Clone, Default, Args)]
pub struct HostArgs {
    /// Host names or addresses; read from stdin when omitted and stdin is piped
    #[arg(value_name = "HOST")]
    pub hosts: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum BiosCommand {
    /// Get BIOS attributes by key name, or all of them
    Get {
        /// Attribute keys to read
        #[arg(short, long, value_delimiter = ',', value_name = "KEY")]
        attributes: Vec<String>,

        /// Read the keys named in a YAML key/value file
        #[arg(long, value_name = "FILE")]
        from_file: Option<PathBuf>,

        /// Read the virtualization attributes of each host's vendor
        #[arg(long)]
        virtualization: bool,

        /// Show staged changes that differ from the live settings
        #[arg(short, long, conflicts_with_all = ["attributes", "from_file", "virtualization"])]
        pending: bool,

        #[command(flatten)]
        hosts: HostArgs,
    },

    /// Set BIOS attributes that the host reports
    Set {
        /// Assignments to write
        #[arg(short, long, value_delimiter = ',', value_name = "KEY=VALUE")]
        attributes: Vec<String>,

        /// Write the assignments in a YAML key/value file
        #[arg(long, value_name = "FILE")]
        from_file: Option<PathBuf>,

        /// Apply the virtualization preset of each host's vendor
        #[arg(long)]
        virtualization: bool,

        /// Use the disable preset instead of enable
        #[arg(long, requires = "virtualization")]
        disable: bool,

        /// Use this vendor's preset for every host instead of detecting it
        #[arg(long, requires = "virtualization")]
        vendor: Option<String>,

        #[command(flatten)]
        hosts: HostArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum PowerCommand {
    /// Current power state
    Status {
        #[command(flatten)]
        hosts: HostArgs,
    },

    /// Power on
    On {
        /// Force on
        #[arg(short, long)]
        force: bool,

        #[command(flatten)]
        hosts: HostArgs,
    },

    /// Power off, gracefully unless told otherwise
    Off {
        /// Cut power immediately
        #[arg(short, long)]
        force: bool,

        /// Press the power button
        #[arg(short, long, conflicts_with = "force")]
        button: bool,

        #[command(flatten)]
        hosts: HostArgs,
    },

    /// Graceful restart
    Cycle {
        /// Restart without waiting for the OS (warm boot)
        #[arg(short, long)]
        force: bool,

        #[command(flatten)]
        hosts: HostArgs,
    },

    /// Forceful restart without a graceful shutdown
    Reset {
        #[command(flatten)]
        hosts: HostArgs,
    },

    /// Send a non-maskable interrupt
    Nmi {
        #[command(flatten)]
        hosts: HostArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum BootCommand {
    /// Override the next boot device
    Override {
        /// Boot target
        #[arg(value_enum)]
        target: BootTarget,

        /// Keep the override for every boot instead of the next one only
        #[arg(long)]
        persist: bool,

        /// Restart right after setting the override
        #[arg(long)]
        now: bool,

        #[command(flatten)]
        hosts: HostArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum ShowCommand {
    /// Boot order and next boot
    Boot {
        #[command(flatten)]
        hosts: HostArgs,
    },

    /// Manufacturer, model, BIOS and BMC firmware versions
    System {
        #[command(flatten)]
        hosts: HostArgs,
    },

    /// Processors with core counts, model and architecture
    Proc {
        #[command(flatten)]
        hosts: HostArgs,
    },
}

/// Boot targets accepted by `boot override`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BootTarget {
    /// BIOS setup
    Bios,
    /// Network boot
    Pxe,
    /// Local disk
    Hdd,
    /// UEFI HTTP boot
    Http,
    /// Clear the override
    None,
}

impl From<BootTarget> for BootSourceOverrideTarget {
    fn from(target: BootTarget) -> Self {
        match target {
            BootTarget::Bios => BootSourceOverrideTarget::BiosSetup,
            BootTarget::Pxe => BootSourceOverrideTarget::Pxe,
            BootTarget::Hdd => BootSourceOverrideTarget::Hdd,
            BootTarget::Http => BootSourceOverrideTarget::UefiHttp,
            BootTarget::None => BootSourceOverrideTarget::None,
        }
    }
}
