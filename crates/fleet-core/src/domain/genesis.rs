//! The genesis document and the two fields the fleet owns.
//!
//! The document is held as a raw JSON object so every field this tool does
//! not manage survives a rewrite exactly as authored. Only `alloc` and
//! `extraData` are touched. Serialization is pretty-printed with sorted
//! keys and a trailing newline, so equal fleet state reproduces equal
//! bytes.

use std::collections::BTreeSet;

use primitive_types::U256;
use serde_json::{Map, Value};

use crate::domain::address::SealerAddress;
use crate::domain::extra_data;

/// Account balance table.
pub const ALLOC_FIELD: &str = "alloc";
/// Clique signer field.
pub const EXTRA_DATA_FIELD: &str = "extraData";

#[derive(Debug, Clone, PartialEq)]
pub struct GenesisDocument {
    root: Map<String, Value>,
}

impl GenesisDocument {
    /// Parse a document, verifying that the fields this tool rewrites have
    /// the shapes it expects.
    pub fn parse(text: &str) -> Result<Self, String> {
        let value: Value = serde_json::from_str(text).map_err(|err| err.to_string())?;
        let Value::Object(root) = value else {
            return Err("top level is not a JSON object".to_string());
        };
        if let Some(alloc) = root.get(ALLOC_FIELD) {
            if !alloc.is_object() {
                return Err(format!("`{ALLOC_FIELD}` is not a JSON object"));
            }
        }
        if let Some(extra) = root.get(EXTRA_DATA_FIELD) {
            if !extra.is_string() {
                return Err(format!("`{EXTRA_DATA_FIELD}` is not a string"));
            }
        }
        Ok(Self { root })
    }

    /// Fund `address` with `balance`, creating the alloc table if absent.
    pub fn set_allocation(&mut self, address: &SealerAddress, balance: U256) {
        let alloc = self
            .root
            .entry(ALLOC_FIELD)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(table) = alloc {
            let mut funding = Map::new();
            funding.insert("balance".to_string(), Value::String(format!("{balance:#x}")));
            table.insert(address.to_hex(), Value::Object(funding));
        }
    }

    /// Rewrite the signer field from the full signer set.
    pub fn set_signers(&mut self, signers: &BTreeSet<SealerAddress>) {
        self.root.insert(
            EXTRA_DATA_FIELD.to_string(),
            Value::String(extra_data::encode(signers)),
        );
    }

    /// Drop every fleet-owned value: empty alloc table, empty signer field.
    pub fn clear_fleet_state(&mut self) {
        self.root
            .insert(ALLOC_FIELD.to_string(), Value::Object(Map::new()));
        self.root
            .insert(EXTRA_DATA_FIELD.to_string(), Value::String(String::new()));
    }

    pub fn extra_data(&self) -> Option<&str> {
        self.root.get(EXTRA_DATA_FIELD).and_then(Value::as_str)
    }

    pub fn allocated_accounts(&self) -> Vec<&str> {
        match self.root.get(ALLOC_FIELD) {
            Some(Value::Object(table)) => table.keys().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    pub fn balance_of(&self, address: &SealerAddress) -> Option<&str> {
        let key = address.to_hex();
        self.root
            .get(ALLOC_FIELD)?
            .get(key.as_str())?
            .get("balance")?
            .as_str()
    }

    /// Pretty bytes with sorted keys and a trailing newline.
    pub fn to_pretty_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut bytes = serde_json::to_vec_pretty(&self.root)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}
