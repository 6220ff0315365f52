//! Configuration file handling for fleetfish
//!
//! ```toml
//! username = "root"
//! insecure = true
//! output = "json"
//! max_in_flight = 64
//! auth = "session"
//!
//! [hosts."bmc-07.example.net"]
//! username = "admin"
//! password = "other"
//!
//! [staging]
//! suffix = "Settings"
//! container_keys = ["Attributes"]
//!
//! [[decoders]]
//! file = "/etc/fleetfish/milan.yaml"
//! pattern = "^AMD EPYC 7[0-9]{2}3"
//! prepend = true
//!
//! [presets."ACME SERVERS"]
//! enable = { VirtEnable = "Enabled" }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use fleetfish_bios::{DecoderRegistry, DecoderTable, StagingLayout, VendorCatalog, VendorPresets};
use fleetfish_client::{AuthMode, CredentialStore, Credentials, DEFAULT_TIMEOUT};
use fleetfish_core::AttributeSet;
use serde::Deserialize;

use crate::cli::GlobalArgs;
use crate::output::OutputFormat;

/// Configuration for the CLI tool
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default BMC username
    pub username: Option<String>,
    /// Default BMC password
    pub password: Option<String>,
    /// Skip TLS certificate verification
    pub insecure: Option<bool>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Deadline for each host's whole operation, in seconds
    pub host_timeout_secs: Option<u64>,
    /// Hosts in flight at once
    pub max_in_flight: Option<usize>,
    pub auth: Option<AuthMode>,
    /// Per-host credentials
    pub hosts: HashMap<String, Credentials>,
    pub staging: Option<StagingLayout>,
    /// Extra decoder tables
    pub decoders: Vec<DecoderSource>,
    /// Extra or replacement vendor presets
    pub presets: BTreeMap<String, PresetSource>,
}

/// A decoder table registered from a file
#[derive(Debug, Clone, Deserialize)]
pub struct DecoderSource {
    pub file: PathBuf,
    /// Overrides the pattern named in the table's `meta`
    pub pattern: Option<String>,
    /// Register ahead of the built-in tables
    #[serde(default)]
    pub prepend: bool,
}

/// Presets of one vendor; an omitted intent is declared but unsupported
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PresetSource {
    pub enable: Option<AttributeSet>,
    pub disable: Option<AttributeSet>,
}

impl Config {
    /// Load configuration from the default config file.
    ///
    /// Without a config directory there is no file to read.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Ok(path) => Self::load_if_exists(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Load `path`, or the defaults when it does not exist
    pub fn load_if_exists(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("fleetfish");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(&self, args: &GlobalArgs) -> Result<MergedConfig> {
        let output = match (args.output, &self.output) {
            (Some(format), _) => format,
            (None, Some(name)) => OutputFormat::from_str(name, true)
                .map_err(|e| anyhow::anyhow!("invalid output format {:?} in config: {}", name, e))?,
            (None, None) => OutputFormat::default(),
        };

        Ok(MergedConfig {
            output,
            no_color: args.no_color || self.no_color.unwrap_or(false),
            quiet: args.quiet,
            insecure: args.insecure || self.insecure.unwrap_or(false),
            timeout: args
                .timeout
                .or(self.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
            host_timeout: args.host_timeout.or(self.host_timeout_secs).map(Duration::from_secs),
            max_in_flight: args.max_in_flight.or(self.max_in_flight),
            auth: args.auth.or(self.auth).unwrap_or_default(),
        })
    }

    /// Credentials from the file, overridden by `lookup` (normally the
    /// process environment)
    pub fn credentials(&self, lookup: impl Fn(&str) -> Option<String>) -> CredentialStore {
        let default = Credentials::new(
            self.username.clone().unwrap_or_default(),
            self.password.clone().unwrap_or_default(),
        );
        self.hosts
            .iter()
            .fold(CredentialStore::new(default), |store, (host, credentials)| {
                store.with_host(host.clone(), credentials.clone())
            })
            .with_env_overrides(lookup)
    }

    /// Built-in decoders plus the `[[decoders]]` entries
    pub fn decoder_registry(&self) -> Result<DecoderRegistry> {
        let mut registry = DecoderRegistry::builtin().context("Failed to load built-in decoders")?;

        for source in &self.decoders {
            let table = DecoderTable::from_file(&source.file)
                .with_context(|| format!("Failed to load decoder table: {}", source.file.display()))?;
            let pattern = source
                .pattern
                .clone()
                .or_else(|| table.meta.pattern.clone())
                .with_context(|| format!("Decoder table {} has no pattern", source.file.display()))?;

            if source.prepend {
                registry.register_first(&pattern, table)?;
            } else {
                registry.register(&pattern, table)?;
            }
        }
        Ok(registry)
    }

    /// Built-in presets with `[presets]` entries layered on top
    pub fn vendor_catalog(&self) -> VendorCatalog {
        self.presets
            .iter()
            .fold(VendorCatalog::builtin(), |catalog, (vendor, preset)| {
                catalog.with_vendor(
                    vendor,
                    VendorPresets {
                        enable: preset.enable.clone(),
                        disable: preset.disable.clone(),
                    },
                )
            })
    }

    pub fn staging_layout(&self) -> StagingLayout {
        self.staging.clone().unwrap_or_default()
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub output: OutputFormat,
    pub no_color: bool,
    pub quiet: bool,
    pub insecure: bool,
    pub timeout: Duration,
    pub host_timeout: Option<Duration>,
    pub max_in_flight: Option<usize>,
    pub auth: AuthMode,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use serial_test::serial;
    use std::io::Write;

    const SAMPLE: &str = r#"
username = "root"
password = "from-file"
insecure = true
output = "yaml"
max_in_flight = 8
auth = "session"

[hosts."bmc-07"]
username = "admin"
password = "special"

[staging]
container_keys = ["Attributes", "attributes"]

[presets."ACME SERVERS"]
enable = { VirtEnable = "Enabled", Iommu = 1 }
"#;

    fn sample() -> Config {
        toml::from_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_full_file() {
        let config = sample();
        assert_eq!(config.username.as_deref(), Some("root"));
        assert_eq!(config.auth, Some(AuthMode::Session));
        assert_eq!(config.hosts["bmc-07"].username, "admin");

        let layout = config.staging_layout();
        assert_eq!(layout.suffix, "Settings");
        assert_eq!(layout.container_keys, vec!["Attributes", "attributes"]);
    }

    #[test]
    fn test_args_override_file() {
        let config = sample();

        let merged = config.merge_with_args(&GlobalArgs::default()).unwrap();
        assert_eq!(merged.output, OutputFormat::Yaml);
        assert!(merged.insecure);
        assert_eq!(merged.max_in_flight, Some(8));
        assert_eq!(merged.timeout, DEFAULT_TIMEOUT);

        let args = GlobalArgs {
            output: Some(OutputFormat::Json),
            max_in_flight: Some(2),
            timeout: Some(5),
            auth: Some(AuthMode::Basic),
            ..GlobalArgs::default()
        };
        let merged = config.merge_with_args(&args).unwrap();
        assert_eq!(merged.output, OutputFormat::Json);
        assert_eq!(merged.max_in_flight, Some(2));
        assert_eq!(merged.timeout, Duration::from_secs(5));
        assert_eq!(merged.auth, AuthMode::Basic);
    }

    #[test]
    fn test_invalid_output_in_file() {
        let config = Config {
            output: Some("xml".into()),
            ..Config::default()
        };
        assert!(config.merge_with_args(&GlobalArgs::default()).is_err());
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file_credentials() {
        std::env::set_var("IPMI_PASSWORD", "from-env");
        let store = sample().credentials(|name| std::env::var(name).ok());
        std::env::remove_var("IPMI_PASSWORD");

        assert_eq!(store.resolve("bmc-01").unwrap().password, "from-env");
        assert_eq!(store.resolve("bmc-07").unwrap().password, "special");
    }

    #[test]
    fn test_presets_extend_catalog() {
        let catalog = sample().vendor_catalog();
        assert_eq!(catalog.template(true, "acme servers").unwrap()["Iommu"], json!(1));
        assert!(catalog.template(false, "ACME SERVERS").is_err());
        assert!(catalog.template(true, "HPE").is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_if_exists(&dir.path().join("config.toml")).unwrap();
        assert!(config.username.is_none());
        assert!(config.hosts.is_empty());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "username = \"root\"\nmax_in_flight = \"many\"\n").unwrap();

        let err = Config::load_if_exists(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));
    }

    #[test]
    fn test_decoder_sources() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "meta:\n  name: test\n  pattern: \"^Test CPU\"\nattributes:\n  T001:\n    attribute_name: T001\n    display_name: Turbo\n"
        )
        .unwrap();

        let config = Config {
            decoders: vec![DecoderSource {
                file: file.path().to_path_buf(),
                pattern: None,
                prepend: false,
            }],
            ..Config::default()
        };
        let registry = config.decoder_registry().unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("Test CPU 9000").is_some());

        let broken = Config {
            decoders: vec![DecoderSource {
                file: file.path().to_path_buf(),
                pattern: Some("([".into()),
                prepend: true,
            }],
            ..Config::default()
        };
        assert!(broken.decoder_registry().is_err());
    }
}
