//! Analysis payload returned by the status endpoint once a job succeeds.
//!
//! The payload is a JSON object whose object-valued keys are lots and whose
//! scalar keys carry metering data. Key order is preserved throughout.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Top-level keys that carry token/cost metering rather than lots.
pub const METERING_KEYS: [&str; 4] = [
    "completion_tokens",
    "prompt_tokens",
    "total_tokens",
    "total_cost",
];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct AnalysisResult {
    entries: Vec<(String, ResultEntry)>,
}

/// A top-level value of the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultEntry {
    /// Object-valued key: a candidate lot.
    Lot(LotData),
    /// Anything else, e.g. metering counters.
    Other(Value),
}

impl AnalysisResult {
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ResultEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn get(&self, key: &str) -> Option<&ResultEntry> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, entry)| entry)
    }

    pub fn lot(&self, key: &str) -> Option<&LotData> {
        match self.get(key)? {
            ResultEntry::Lot(lot) => Some(lot),
            ResultEntry::Other(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn metering(&self) -> Metering {
        let number = |key: &str| match self.get(key) {
            Some(ResultEntry::Other(value)) => Some(value),
            _ => None,
        };
        Metering {
            completion_tokens: number("completion_tokens").and_then(Value::as_u64),
            prompt_tokens: number("prompt_tokens").and_then(Value::as_u64),
            total_tokens: number("total_tokens").and_then(Value::as_u64),
            total_cost: number("total_cost").and_then(Value::as_f64),
        }
    }
}

impl From<Map<String, Value>> for AnalysisResult {
    fn from(map: Map<String, Value>) -> Self {
        let entries = map
            .into_iter()
            .map(|(key, value)| {
                let entry = match value {
                    Value::Object(fields) => ResultEntry::Lot(LotData::from(fields)),
                    other => ResultEntry::Other(other),
                };
                (key, entry)
            })
            .collect();
        Self { entries }
    }
}

impl From<AnalysisResult> for Map<String, Value> {
    fn from(result: AnalysisResult) -> Self {
        result
            .entries
            .into_iter()
            .map(|(key, entry)| {
                let value = match entry {
                    ResultEntry::Lot(lot) => Value::Object(lot.into()),
                    ResultEntry::Other(value) => value,
                };
                (key, value)
            })
            .collect()
    }
}

/// Token and cost counters reported alongside the lots.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Metering {
    pub completion_tokens: Option<u64>,
    pub prompt_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
    pub total_cost: Option<f64>,
}

/// Fields extracted for a single lot, in payload order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LotData {
    entries: Vec<(String, LotEntry)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LotEntry {
    /// Scalar or unrecognised value; never rendered as a field.
    Scalar(Value),
    Field(FieldEntry),
}

impl LotData {
    pub fn entries(&self) -> impl Iterator<Item = (&str, &LotEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn get(&self, name: &str) -> Option<&LotEntry> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, entry)| entry)
    }

    pub fn field(&self, name: &str) -> Option<&FieldEntry> {
        match self.get(name)? {
            LotEntry::Field(field) => Some(field),
            LotEntry::Scalar(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Map<String, Value>> for LotData {
    fn from(map: Map<String, Value>) -> Self {
        let entries = map
            .into_iter()
            .map(|(name, value)| {
                let entry = match value {
                    Value::Object(fields) => LotEntry::Field(FieldEntry::from(fields)),
                    other => LotEntry::Scalar(other),
                };
                (name, entry)
            })
            .collect();
        Self { entries }
    }
}

impl From<LotData> for Map<String, Value> {
    fn from(lot: LotData) -> Self {
        lot.entries
            .into_iter()
            .map(|(name, entry)| {
                let value = match entry {
                    LotEntry::Scalar(value) => value,
                    LotEntry::Field(field) => Value::Object(field.raw),
                };
                (name, value)
            })
            .collect()
    }
}

/// A structured extracted value with optional provenance.
///
/// Parts are read leniently: a part with an unexpected shape degrades to a
/// raw value or is left out, never the whole field. The object as received is
/// kept and is what gets serialized.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct FieldEntry {
    value: Option<FieldValue>,
    source_text: Option<String>,
    sources: Vec<Source>,
    raw: Map<String, Value>,
}

impl FieldEntry {
    pub fn value(&self) -> Option<&FieldValue> {
        self.value.as_ref()
    }

    /// The value when it is non-null and non-empty (a zero number counts as absent).
    pub fn present_value(&self) -> Option<&FieldValue> {
        self.value.as_ref().filter(|value| value.is_present())
    }

    pub fn source_text(&self) -> Option<&str> {
        self.source_text.as_deref()
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// The field object exactly as it appeared in the payload.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.raw
    }
}

impl From<Map<String, Value>> for FieldEntry {
    fn from(raw: Map<String, Value>) -> Self {
        let sources = match raw.get("sources") {
            Some(Value::Array(items)) => items.iter().filter_map(Source::from_json).collect(),
            Some(single) => Source::from_json(single).into_iter().collect(),
            None => Vec::new(),
        };
        Self {
            value: raw.get("value").and_then(FieldValue::from_json),
            source_text: raw.get("source_text").and_then(text_of),
            sources,
            raw,
        }
    }
}

impl From<FieldEntry> for Map<String, Value> {
    fn from(field: FieldEntry) -> Self {
        field.raw
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(Number),
    /// Booleans, arrays and objects, shown through their JSON form.
    Other(Value),
}

impl FieldValue {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(text) => Some(FieldValue::Text(text.clone())),
            Value::Number(number) => Some(FieldValue::Number(number.clone())),
            other => Some(FieldValue::Other(other.clone())),
        }
    }

    pub fn is_present(&self) -> bool {
        match self {
            FieldValue::Text(text) => !text.is_empty(),
            FieldValue::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
            FieldValue::Other(Value::Bool(flag)) => *flag,
            FieldValue::Other(_) => true,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(number) => write!(f, "{number}"),
            FieldValue::Other(value) => write_loose(f, value),
        }
    }
}

/// Document and page backing an extracted value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Source {
    pub source: Option<String>,
    pub page_num: Option<PageRef>,
}

impl Source {
    /// Objects give name and page; a bare string is taken as the document name.
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Source {
                source: fields.get("source").and_then(text_of),
                page_num: fields.get("page_num").and_then(PageRef::from_json),
            }),
            Value::Null => None,
            other => Some(Source {
                source: text_of(other),
                page_num: None,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageRef {
    Number(Number),
    Text(String),
    /// Page ranges sent as arrays and other unexpected shapes.
    Other(Value),
}

impl PageRef {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Number(number) => Some(PageRef::Number(number.clone())),
            Value::String(text) => Some(PageRef::Text(text.clone())),
            other => Some(PageRef::Other(other.clone())),
        }
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRef::Number(number) => write!(f, "{number}"),
            PageRef::Text(text) => f.write_str(text),
            PageRef::Other(value) => write_loose(f, value),
        }
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Strings unquoted, arrays as comma-separated items, anything else as JSON.
fn write_loose(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::String(text) => f.write_str(text),
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write_loose(f, item)?;
            }
            Ok(())
        }
        other => write!(f, "{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> AnalysisResult {
        serde_json::from_value(value).expect("analysis payload")
    }

    #[test]
    fn object_values_become_lots_and_scalars_stay_aside() {
        let result = parse(json!({
            "lotto_2": { "comune": { "value": "Torino" } },
            "lotto_1": { "comune": { "value": "Milano" } },
            "total_tokens": 900,
        }));

        let keys: Vec<_> = result.entries().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["lotto_2", "lotto_1", "total_tokens"]);
        assert!(result.lot("lotto_1").is_some());
        assert!(result.lot("total_tokens").is_none());
    }

    fn lot(value: Value) -> LotData {
        match value {
            Value::Object(map) => LotData::from(map),
            other => panic!("lot fixture must be an object, got {other}"),
        }
    }

    #[test]
    fn only_non_object_entries_are_scalars() {
        let lot = lot(json!({
            "numero": 3,
            "note": null,
            "superficie": { "value": "120 mq", "sources": [{ "source": "perizia.pdf", "page_num": 4 }] },
        }));

        assert!(matches!(lot.get("numero"), Some(LotEntry::Scalar(_))));
        assert!(matches!(lot.get("note"), Some(LotEntry::Scalar(Value::Null))));
        let field = lot.field("superficie").expect("structured field");
        assert_eq!(field.present_value().map(ToString::to_string), Some("120 mq".into()));
        assert_eq!(field.sources()[0].source.as_deref(), Some("perizia.pdf"));
        assert_eq!(field.sources()[0].page_num.as_ref().map(ToString::to_string), Some("4".into()));
    }

    #[test]
    fn irregular_field_parts_keep_the_field() {
        let lot = lot(json!({
            "foglio": { "value": "Foglio 3", "sources": [{ "source": null, "page_num": 4 }] },
            "pagine": { "value": "Relazione", "sources": [{ "source": "perizia.pdf", "page_num": [4, 5] }] },
            "libero": { "value": true },
            "confini": { "value": ["nord", "sud"], "source_text": 12 },
            "vuoto": {},
        }));

        let foglio = lot.field("foglio").expect("null source name");
        assert_eq!(foglio.present_value().map(ToString::to_string), Some("Foglio 3".into()));
        assert_eq!(foglio.sources()[0].source, None);
        assert_eq!(foglio.sources()[0].page_num.as_ref().map(ToString::to_string), Some("4".into()));

        let pagine = lot.field("pagine").expect("page range");
        assert_eq!(pagine.sources()[0].page_num.as_ref().map(ToString::to_string), Some("4, 5".into()));

        let libero = lot.field("libero").expect("boolean value");
        assert_eq!(libero.present_value().map(ToString::to_string), Some("true".into()));

        let confini = lot.field("confini").expect("array value");
        assert_eq!(confini.present_value().map(ToString::to_string), Some("nord, sud".into()));
        assert_eq!(confini.source_text(), Some("12"));

        let vuoto = lot.field("vuoto").expect("empty object");
        assert!(vuoto.present_value().is_none());
        assert!(vuoto.sources().is_empty());
    }

    #[test]
    fn metering_is_projected_from_scalar_keys() {
        let result = parse(json!({
            "lotto_1": {},
            "completion_tokens": 42,
            "prompt_tokens": 1000,
            "total_cost": 0.5,
        }));

        let metering = result.metering();
        assert_eq!(metering.completion_tokens, Some(42));
        assert_eq!(metering.prompt_tokens, Some(1000));
        assert_eq!(metering.total_tokens, None);
        assert_eq!(metering.total_cost, Some(0.5));
    }

    #[test]
    fn zero_and_empty_values_are_not_present() {
        let empty: FieldEntry = serde_json::from_value(json!({ "value": "" })).unwrap();
        let off: FieldEntry = serde_json::from_value(json!({ "value": false })).unwrap();
        let zero: FieldEntry = serde_json::from_value(json!({ "value": 0 })).unwrap();
        let text: FieldEntry = serde_json::from_value(json!({ "value": "Appartamento" })).unwrap();

        assert!(empty.present_value().is_none());
        assert!(zero.present_value().is_none());
        assert!(off.present_value().is_none());
        assert_eq!(off.value(), Some(&FieldValue::Other(Value::Bool(false))));
        assert!(text.present_value().is_some());
    }

    #[test]
    fn serializes_back_to_payload_shape() {
        let payload = json!({
            "lotto_1": {
                "valore_immobiliare": {
                    "value": "150000",
                    "source_text": "valore di stima euro 150.000",
                    "sources": [{ "source": "perizia.pdf", "page_num": "12" }]
                },
                "numero_lotto": 1
            },
            "total_cost": 0.25
        });

        let result = parse(payload.clone());
        assert_eq!(serde_json::to_value(&result).unwrap(), payload);
    }

    #[test]
    fn unknown_and_null_field_keys_survive_serialization() {
        let payload = json!({
            "lotto_1": {
                "comune": {
                    "value": "Lecco",
                    "confidence": 0.9,
                    "source_text": null,
                    "note": "dato da verificare",
                    "sources": [{ "source": null, "page_num": [2, 3], "riga": 14 }]
                },
                "tipologia_immobile": { "value": true }
            }
        });

        let result = parse(payload.clone());
        let comune = result.lot("lotto_1").and_then(|lot| lot.field("comune")).unwrap();
        assert_eq!(comune.as_map().get("confidence"), Some(&json!(0.9)));
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            serde_json::to_string(&payload).unwrap()
        );
    }
}
