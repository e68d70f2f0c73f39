use errors::ErrorMetadata;
use serde::Deserialize;

/// The subset of a collection's opaque configuration blob this core reads:
/// at least `enable_summary: bool`. Other fields are consumed elsewhere,
/// so they're kept as a passthrough `serde_json::Value` rather than
/// modeled here.
#[derive(Clone, Debug, Deserialize)]
pub struct CollectionConfig {
    #[serde(default)]
    pub enable_summary: bool,
    #[serde(flatten)]
    pub other: serde_json::Value,
}

/// A parse failure is treated by callers as `enable_summary = false` with
/// an error log; the summary row itself still gets marked `Complete` (see
/// `reconcile::summary_callbacks`). This function just reports the error.
pub fn parse_collection_config(blob: &str) -> Result<CollectionConfig, ErrorMetadata> {
    serde_json::from_str(blob)
        .map_err(|e| ErrorMetadata::config_parse(format!("invalid collection config: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_enable_summary() {
        let cfg = parse_collection_config(r#"{"enable_summary": true, "language": "en"}"#).unwrap();
        assert!(cfg.enable_summary);
    }

    #[test]
    fn defaults_enable_summary_to_false_when_absent() {
        let cfg = parse_collection_config(r#"{}"#).unwrap();
        assert!(!cfg.enable_summary);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_collection_config("not json").is_err());
    }
}
