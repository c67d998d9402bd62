//! Tracked protocol definitions.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// A DeFi protocol tracked by the monitor.
///
/// The `id` is the stable join key between consecutive poll cycles; the
/// upstream identifiers are optional because not every protocol is listed
/// on both data providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolSpec {
    /// Stable identifier (e.g., "aave")
    pub id: CompactString,
    /// Display name (e.g., "Aave V3")
    pub name: String,
    /// Token ticker symbol (e.g., "AAVE")
    pub symbol: String,
    /// DefiLlama protocol slug, None if not listed
    #[serde(default)]
    pub defillama_slug: Option<String>,
    /// CoinGecko coin id, None if the protocol has no token
    #[serde(default)]
    pub coingecko_id: Option<String>,
}

impl ProtocolSpec {
    /// Create a protocol tracked on both DefiLlama and CoinGecko.
    pub fn new(
        id: &str,
        name: &str,
        symbol: &str,
        defillama_slug: &str,
        coingecko_id: &str,
    ) -> Self {
        Self {
            id: CompactString::new(id),
            name: name.to_string(),
            symbol: symbol.to_string(),
            defillama_slug: Some(defillama_slug.to_string()),
            coingecko_id: Some(coingecko_id.to_string()),
        }
    }

    pub fn aave() -> Self {
        Self::new("aave", "Aave V3", "AAVE", "aave-v3", "aave")
    }

    pub fn lido() -> Self {
        Self::new("lido", "Lido", "LDO", "lido", "lido-dao")
    }

    pub fn eigenlayer() -> Self {
        Self::new("eigenlayer", "EigenLayer", "EIGEN", "eigenlayer", "eigenlayer")
    }

    /// Default watch list.
    pub fn default_registry() -> Vec<Self> {
        vec![Self::aave(), Self::lido(), Self::eigenlayer()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_registry_ids_are_unique() {
        let registry = ProtocolSpec::default_registry();
        let mut ids: Vec<_> = registry.iter().map(|p| p.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), registry.len());
    }

    #[test]
    fn test_protocol_serde_roundtrip() {
        let aave = ProtocolSpec::aave();
        let json = serde_json::to_string(&aave).unwrap();
        let back: ProtocolSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(aave, back);
    }

    #[test]
    fn test_optional_upstream_ids_default_to_none() {
        let spec: ProtocolSpec =
            serde_json::from_str(r#"{"id":"x","name":"X","symbol":"X"}"#).unwrap();
        assert_eq!(spec.defillama_slug, None);
        assert_eq!(spec.coingecko_id, None);
    }
}
