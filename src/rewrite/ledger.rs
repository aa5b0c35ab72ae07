use std::collections::BTreeMap;
use std::io::{Read, Write};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Identifies a local variable: class, method and descriptor in source
/// names, plus the slot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariableKey {
    /// Internal name of the declaring class.
    pub class: String,
    /// Method name.
    pub method: String,
    /// Method descriptor.
    pub descriptor: String,
    /// Local variable slot.
    pub slot: u16,
}

impl VariableKey {
    /// Creates a key.
    pub fn new(class: &str, method: &str, descriptor: &str, slot: u16) -> Self {
        VariableKey {
            class: class.to_string(),
            method: method.to_string(),
            descriptor: descriptor.to_string(),
            slot,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct LedgerEntry {
    #[serde(flatten)]
    key: VariableKey,
    name: String,
}

#[derive(Serialize, Deserialize)]
struct LedgerFile {
    variables: Vec<LedgerEntry>,
}

/// Local variable names assigned across a batch of classes.
///
/// Shared by all rewriting tasks. Persisting it keeps generated names
/// stable between runs.
#[derive(Debug, Default)]
pub struct VariableLedger {
    names: Mutex<BTreeMap<VariableKey, String>>,
}

impl VariableLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a ledger from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let file: LedgerFile = serde_json::from_str(json)?;
        Ok(Self::from_entries(file))
    }

    /// Reads a ledger from a JSON stream.
    pub fn load<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        let file: LedgerFile = serde_json::from_reader(reader)?;
        Ok(Self::from_entries(file))
    }

    fn from_entries(file: LedgerFile) -> Self {
        let names = file
            .variables
            .into_iter()
            .map(|entry| (entry.key, entry.name))
            .collect();
        VariableLedger {
            names: Mutex::new(names),
        }
    }

    fn to_file(&self) -> LedgerFile {
        let variables = self
            .names
            .lock()
            .iter()
            .map(|(key, name)| LedgerEntry {
                key: key.clone(),
                name: name.clone(),
            })
            .collect();
        LedgerFile { variables }
    }

    /// Writes the ledger as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_file())
    }

    /// Writes the ledger as JSON to a stream.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(writer, &self.to_file())
    }

    /// The recorded name of a variable.
    pub fn get(&self, key: &VariableKey) -> Option<String> {
        self.names.lock().get(key).cloned()
    }

    /// Records a name, replacing an earlier one.
    pub fn record(&self, key: VariableKey, name: String) {
        self.names.lock().insert(key, name);
    }

    /// The recorded name, or the one produced by `name`, which is recorded.
    pub fn get_or_insert_with<F: FnOnce() -> String>(&self, key: VariableKey, name: F) -> String {
        self.names.lock().entry(key).or_insert_with(name).clone()
    }

    /// Number of recorded variables.
    pub fn len(&self) -> usize {
        self.names.lock().len()
    }

    /// Whether nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.names.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_insert_keeps_first_name() {
        let ledger = VariableLedger::new();
        let key = VariableKey::new("a/B", "c", "(I)V", 1);
        assert_eq!(ledger.get_or_insert_with(key.clone(), || "i".into()), "i");
        assert_eq!(ledger.get_or_insert_with(key.clone(), || "other".into()), "i");
        ledger.record(key.clone(), "count".into());
        assert_eq!(ledger.get(&key).as_deref(), Some("count"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_json() {
        let ledger = VariableLedger::new();
        ledger.record(VariableKey::new("a/B", "c", "(I)V", 1), "count".into());
        let json = ledger.to_json().unwrap();
        assert!(json.contains(r#""method": "c""#));

        let loaded = VariableLedger::from_json(&json).unwrap();
        assert_eq!(loaded.get(&VariableKey::new("a/B", "c", "(I)V", 1)).as_deref(), Some("count"));

        let mut out = Vec::new();
        loaded.save(&mut out).unwrap();
        let reloaded = VariableLedger::load(out.as_slice()).unwrap();
        assert_eq!(reloaded.len(), 1);

        assert!(VariableLedger::from_json(r#"{"variables": [{"class": "a"}]}"#).is_err());
    }
}
