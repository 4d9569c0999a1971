//! Ticker-universe / CIK-map loading: parses `company_tickers_exchange.json`
//! in either the legacy flat-map shape (`{"0": {"cik_str": ..., ...}, ...}`)
//! or the newer tabular shape (`{"fields": [...], "data": [[...], ...]}`).

use serde_json::Value;
use std::collections::HashMap;

/// One resolved ticker-universe entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniverseEntry {
    /// Zero-padded 10-digit CIK.
    pub cik: String,
    /// Company name.
    pub name: String,
    /// Listing exchange, when present (empty string otherwise).
    pub exchange: String,
}

fn zfill10(raw: &str) -> String {
    format!("{raw:0>10}")
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn load_tabular(fields: &[Value], data: &[Value]) -> HashMap<String, UniverseEntry> {
    let field_names: Vec<String> = fields.iter().map(value_as_string).collect();
    let ticker_idx = field_names.iter().position(|f| f == "ticker");
    let cik_idx = field_names.iter().position(|f| f == "cik");
    let name_idx = field_names.iter().position(|f| f == "title");
    let exchange_idx = field_names.iter().position(|f| f == "exchange");

    let mut mapping = HashMap::new();
    let (Some(ticker_idx), Some(cik_idx)) = (ticker_idx, cik_idx) else { return mapping };

    for row in data {
        let Value::Array(cells) = row else { continue };
        let Some(Value::String(ticker_raw)) = cells.get(ticker_idx) else { continue };
        let ticker = ticker_raw.to_uppercase().trim().to_string();
        if ticker.is_empty() {
            continue;
        }
        let cik = cells.get(cik_idx).map(value_as_string).unwrap_or_default();
        let name = name_idx.and_then(|i| cells.get(i)).map(value_as_string).unwrap_or_default();
        let exchange = exchange_idx.and_then(|i| cells.get(i)).map(value_as_string).unwrap_or_default();
        mapping.insert(ticker, UniverseEntry { cik: zfill10(&cik), name, exchange });
    }
    mapping
}

fn load_legacy_map(entries: &serde_json::Map<String, Value>) -> HashMap<String, UniverseEntry> {
    let mut mapping = HashMap::new();
    for entry in entries.values() {
        let Value::Object(obj) = entry else { continue };
        let Some(Value::String(ticker_raw)) = obj.get("ticker") else { continue };
        let ticker = ticker_raw.to_uppercase().trim().to_string();
        if ticker.is_empty() {
            continue;
        }
        let cik = obj.get("cik_str").map(value_as_string).unwrap_or_default();
        let name = obj.get("title").map(value_as_string).unwrap_or_default();
        let exchange = obj.get("exchange").map(value_as_string).unwrap_or_default();
        mapping.insert(ticker, UniverseEntry { cik: zfill10(&cik), name, exchange });
    }
    mapping
}

/// Parse a ticker-universe JSON payload (either shape) into a
/// ticker-to-entry map, uppercased ticker keys.
pub fn parse_ticker_map(payload: &Value) -> HashMap<String, UniverseEntry> {
    if let Value::Object(obj) = payload
        && let (Some(Value::Array(fields)), Some(Value::Array(data))) = (obj.get("fields"), obj.get("data"))
    {
        return load_tabular(fields, data);
    }
    if let Value::Object(obj) = payload {
        return load_legacy_map(obj);
    }
    HashMap::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_legacy_flat_map() {
        let payload = json!({
            "0": {"cik_str": 320193, "ticker": "aapl", "title": "Apple Inc."}
        });
        let mapping = parse_ticker_map(&payload);
        let entry = mapping.get("AAPL").unwrap();
        assert_eq!(entry.cik, "0000320193");
        assert_eq!(entry.name, "Apple Inc.");
    }

    #[test]
    fn parses_tabular_shape() {
        let payload = json!({
            "fields": ["cik", "name", "ticker", "exchange"],
            "data": [[320193, "Apple Inc.", "AAPL", "Nasdaq"]]
        });
        let mapping = parse_ticker_map(&payload);
        let entry = mapping.get("AAPL").unwrap();
        assert_eq!(entry.cik, "0000320193");
        assert_eq!(entry.exchange, "Nasdaq");
    }

    #[test]
    fn skips_rows_missing_ticker() {
        let payload = json!({
            "fields": ["cik", "ticker"],
            "data": [[1, null]]
        });
        assert!(parse_ticker_map(&payload).is_empty());
    }
}
