//! Host list input

use std::io::{IsTerminal, Read};

use anyhow::{Context, Result};
use fleetfish_core::hosts::split_tokens;
use fleetfish_core::HostSet;

/// Resolve the target hosts from arguments, or from stdin when no
/// arguments were given and stdin is piped
pub fn resolve_hosts(args: &[String]) -> Result<HostSet> {
    let stdin = std::io::stdin();
    if args.is_empty() && !stdin.is_terminal() {
        read_hosts(args, Some(stdin.lock()))
    } else {
        read_hosts(args, None::<std::io::Empty>)
    }
}

/// Build a host set from `args`, falling back to the tokens read from `piped`
pub fn read_hosts<R: Read>(args: &[String], piped: Option<R>) -> Result<HostSet> {
    let hosts = match piped {
        Some(mut reader) if args.is_empty() => {
            let mut input = String::new();
            reader
                .read_to_string(&mut input)
                .context("Failed to read hosts from stdin")?;
            HostSet::parse(&input)?
        }
        _ => HostSet::new(args.iter().flat_map(|arg| split_tokens(arg)))?,
    };
    tracing::debug!(count = hosts.len(), "resolved hosts");
    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_arguments_split_on_delimiters() {
        let hosts = read_hosts(&args(&["bmc-01,bmc-02", "bmc-03", "bmc-01"]), None::<&[u8]>).unwrap();
        assert_eq!(hosts.as_slice(), &["bmc-01", "bmc-02", "bmc-03"]);
    }

    #[test]
    fn test_piped_input_replaces_missing_arguments() {
        let piped = "bmc-01\nbmc-02;bmc-03 | bmc-02\n".as_bytes();
        let hosts = read_hosts(&[], Some(piped)).unwrap();
        assert_eq!(hosts.as_slice(), &["bmc-01", "bmc-02", "bmc-03"]);
    }

    #[test]
    fn test_arguments_win_over_piped_input() {
        let hosts = read_hosts(&args(&["bmc-09"]), Some("bmc-01".as_bytes())).unwrap();
        assert_eq!(hosts.as_slice(), &["bmc-09"]);
    }

    #[test]
    fn test_no_hosts_is_an_error() {
        let err = read_hosts(&[], Some("  \n ,, ".as_bytes())).unwrap_err();
        assert_eq!(err.to_string(), "no hosts given");
        assert!(read_hosts(&[], None::<&[u8]>).is_err());
    }
}
