//! Party types and the natural key.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tally_shared::types::PartyId;

/// Natural key of a party: trimmed name plus trimmed phone.
///
/// Names compare case-insensitively, phones exactly. Two parties may share a
/// name as long as their phones differ.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyKey {
    name: String,
    phone: String,
}

impl PartyKey {
    /// Builds a key from raw user input.
    #[must_use]
    pub fn new(name: &str, phone: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            phone: phone.trim().to_string(),
        }
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Phone number.
    #[must_use]
    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Lowercased name used for lookups.
    #[must_use]
    pub fn name_key(&self) -> String {
        normalize_name(&self.name)
    }

    /// Returns true if raw `name` and `phone` normalize to this key.
    #[must_use]
    pub fn matches(&self, name: &str, phone: &str) -> bool {
        self.phone == phone.trim() && self.name_key() == normalize_name(name)
    }

    /// Returns true when both name and phone are present.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.phone.is_empty()
    }
}

impl PartialEq for PartyKey {
    fn eq(&self, other: &Self) -> bool {
        self.phone == other.phone && self.name_key() == other.name_key()
    }
}

impl Eq for PartyKey {}

/// Lowercases and trims a party or item name for comparison.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A customer or supplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Party ID.
    pub id: PartyId,
    /// Display name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Postal address.
    pub address: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Net amount the party owes the business.
    pub balance: Decimal,
    /// Created at.
    pub created_at: DateTime<Utc>,
    /// Last modified at.
    pub updated_at: DateTime<Utc>,
}

impl Party {
    /// Creates a party with a zero balance.
    #[must_use]
    pub fn new(key: &PartyKey) -> Self {
        let now = Utc::now();
        Self {
            id: PartyId::new(),
            name: key.name().to_string(),
            phone: key.phone().to_string(),
            address: None,
            email: None,
            balance: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Natural key of this party.
    #[must_use]
    pub fn key(&self) -> PartyKey {
        PartyKey::new(&self.name, &self.phone)
    }
}

/// Input for creating a party from the party form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewParty {
    /// Display name.
    pub name: String,
    /// Phone number.
    pub phone: String,
    /// Postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
}

/// Partial update of a party's contact details.
///
/// The balance is deliberately absent: only ledger operations move it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartyUpdate {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// New postal address.
    #[serde(default)]
    pub address: Option<String>,
    /// New email address.
    #[serde(default)]
    pub email: Option<String>,
}

/// Case-insensitive substring search on name or phone, sorted by name.
///
/// An empty query returns every party.
#[must_use]
pub fn search_parties(parties: Vec<Party>, query: &str) -> Vec<Party> {
    let needle = query.trim().to_lowercase();
    let mut found: Vec<Party> = parties
        .into_iter()
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.phone.to_lowercase().contains(&needle)
        })
        .collect();
    found.sort_by(|a, b| {
        normalize_name(&a.name)
            .cmp(&normalize_name(&b.name))
            .then_with(|| a.phone.cmp(&b.phone))
    });
    found
}
