//! Per-symbol aggregation output.

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Sentinel used in range fields when no data is available.
pub const NOT_AVAILABLE: &str = "N/A";

/// Percentage changes keyed by window label, in window configuration order.
///
/// Serializes as a JSON object whose keys follow that order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HorizonChanges(Vec<(String, f64)>);

impl HorizonChanges {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Record the change for `label`, replacing an earlier value for the same label.
    pub fn insert(&mut self, label: impl Into<String>, percent_change: f64) {
        let label = label.into();
        match self.0.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = percent_change,
            None => self.0.push((label, percent_change)),
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(l, v)| (l.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for HorizonChanges {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, value) in &self.0 {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

/// Aggregated view of one symbol for one request.
///
/// Built fresh from the bar series on every call and discarded after
/// serialization.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    pub symbol: String,
    /// Display name, attached by the board layer when the category defines one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub latest_price: f64,
    pub changes: HorizonChanges,
    pub daily_range: String,
    pub year_range: String,
}

impl AggregateResult {
    /// Change for `label`, or 0 when the label was not configured.
    pub fn change(&self, label: &str) -> f64 {
        self.changes.get(label).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changes_keep_insertion_order_in_json() {
        let mut changes = HorizonChanges::new();
        changes.insert("5D", 1.5);
        changes.insert("1M", -2.0);
        changes.insert("10Y", 120.0);
        let json = serde_json::to_string(&changes).unwrap();
        assert_eq!(json, r#"{"5D":1.5,"1M":-2.0,"10Y":120.0}"#);
    }

    #[test]
    fn insert_replaces_existing_label() {
        let mut changes = HorizonChanges::new();
        changes.insert("1Y", 1.0);
        changes.insert("1Y", 2.0);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes.get("1Y"), Some(2.0));
    }

    #[test]
    fn result_serializes_camel_case_without_missing_name() {
        let result = AggregateResult {
            symbol: "AAA".into(),
            name: None,
            latest_price: 15.0,
            changes: HorizonChanges::new(),
            daily_range: NOT_AVAILABLE.into(),
            year_range: "1.00 - 2.00".into(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["latestPrice"], 15.0);
        assert_eq!(value["dailyRange"], "N/A");
        assert_eq!(value["yearRange"], "1.00 - 2.00");
        assert!(value.get("name").is_none());
    }
}
