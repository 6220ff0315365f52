//! Attribute decoder registry
//!
//! Maps a detected processor model to the decoder table of its hardware
//! family. Patterns are evaluated in registration order and the first
//! match wins; a model nothing matches gets no decoder, and keys pass
//! through unchanged.

use regex::Regex;

use crate::definition::DecoderTable;
use crate::error::{BiosError, BiosResult};

/// How decoded keys are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeMode {
    /// Canonical name alone, for JSON/YAML output
    #[default]
    Canonical,
    /// `"<canonical> (<display>)"`, for tables
    Display,
}

/// A compiled pattern and the table it selects
#[derive(Debug, Clone)]
pub struct Decoder {
    pattern: Regex,
    table: DecoderTable,
}

impl Decoder {
    pub fn new(pattern: &str, table: DecoderTable) -> BiosResult<Self> {
        let pattern = Regex::new(pattern).map_err(|source| BiosError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern, table })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn table(&self) -> &DecoderTable {
        &self.table
    }

    pub fn matches(&self, model: &str) -> bool {
        self.pattern.is_match(model)
    }

    /// Decode one raw key; unknown keys come back unchanged
    pub fn decode(&self, key: &str, mode: DecodeMode) -> String {
        match self.table.get(key) {
            Some(def) => match mode {
                DecodeMode::Canonical => def.attribute_name.clone(),
                DecodeMode::Display => {
                    format!("{} ({})", def.attribute_name, def.display_name.trim_start())
                }
            },
            None => key.to_string(),
        }
    }
}

/// Decode `key` with an optional decoder
pub fn decode_key(decoder: Option<&Decoder>, key: &str, mode: DecodeMode) -> String {
    match decoder {
        Some(decoder) => decoder.decode(key, mode),
        None => key.to_string(),
    }
}

/// Ordered list of decoders
#[derive(Debug, Clone, Default)]
pub struct DecoderRegistry {
    decoders: Vec<Decoder>,
}

impl DecoderRegistry {
    /// An empty registry; every key passes through
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in tables
    pub fn builtin() -> BiosResult<Self> {
        let mut registry = Self::new();
        registry.register("^AMD EPYC", DecoderTable::amd_epyc_rome()?)?;
        Ok(registry)
    }

    /// Append a decoder. It is consulted after every decoder registered
    /// before it.
    pub fn register(&mut self, pattern: &str, table: DecoderTable) -> BiosResult<()> {
        let decoder = Decoder::new(pattern, table)?;
        tracing::debug!(pattern, name = ?decoder.table.meta.name, "registered decoder");
        self.decoders.push(decoder);
        Ok(())
    }

    /// Insert a decoder ahead of every existing one
    pub fn register_first(&mut self, pattern: &str, table: DecoderTable) -> BiosResult<()> {
        let decoder = Decoder::new(pattern, table)?;
        tracing::debug!(pattern, name = ?decoder.table.meta.name, "registered decoder first");
        self.decoders.insert(0, decoder);
        Ok(())
    }

    /// First decoder whose pattern matches `model`
    pub fn lookup(&self, model: &str) -> Option<&Decoder> {
        self.decoders.iter().find(|d| d.matches(model))
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AttributeDefinition;
    use pretty_assertions::assert_eq;

    fn table(key: &str, name: &str, display: &str) -> DecoderTable {
        let mut table = DecoderTable::default();
        table.attributes.insert(
            key.to_string(),
            AttributeDefinition {
                attribute_name: name.to_string(),
                display_name: display.to_string(),
                help_text: None,
                read_only: false,
                attribute_type: None,
                default_value: None,
                values: Vec::new(),
            },
        );
        table
    }

    #[test]
    fn test_builtin_decodes_rome_keys() {
        let registry = DecoderRegistry::builtin().unwrap();
        let decoder = registry.lookup("AMD EPYC 7702 64-Core Processor").unwrap();

        assert_eq!(decoder.decode("Rome0162", DecodeMode::Canonical), "Rome0162");
        assert_eq!(decoder.decode("Rome0162", DecodeMode::Display), "Rome0162 (IOMMU)");
        assert_eq!(decoder.decode("PCIS007", DecodeMode::Display), "PCIS007 (SR-IOV Support)");
        assert_eq!(decoder.decode("NotAKey", DecodeMode::Display), "NotAKey");
    }

    #[test]
    fn test_unknown_model_passes_through() {
        let registry = DecoderRegistry::builtin().unwrap();
        let decoder = registry.lookup("Intel(R) Xeon(R) Gold 6248");

        assert!(decoder.is_none());
        assert_eq!(decode_key(decoder, "Rome0162", DecodeMode::Display), "Rome0162");
    }

    #[test]
    fn test_first_registered_match_wins() {
        let mut registry = DecoderRegistry::new();
        registry.register("^AMD", table("K", "First", "one")).unwrap();
        registry.register("^AMD EPYC", table("K", "Second", "two")).unwrap();

        let decoder = registry.lookup("AMD EPYC 7763").unwrap();
        assert_eq!(decoder.decode("K", DecodeMode::Canonical), "First");

        registry.register_first("EPYC", table("K", "Prepended", "zero")).unwrap();
        let decoder = registry.lookup("AMD EPYC 7763").unwrap();
        assert_eq!(decoder.decode("K", DecodeMode::Canonical), "Prepended");
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut registry = DecoderRegistry::new();
        let err = registry.register("^AMD (EPYC", DecoderTable::default()).unwrap_err();

        assert!(matches!(err, BiosError::InvalidPattern { .. }));
        assert!(registry.is_empty());
    }
}
