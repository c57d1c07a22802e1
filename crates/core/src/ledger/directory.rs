//! Party directory: explicit party management and search.

use std::sync::Arc;

use chrono::Utc;
use tally_shared::types::PartyId;
use tracing::info;

use super::party::{NewParty, Party, PartyKey, PartyUpdate, normalize_name, search_parties};
use crate::billing::BillingError;
use crate::store::{LedgerStore, UnitOfWork};

/// Party CRUD outside of transactions. Balances are never touched here.
pub struct PartyDirectory<S: LedgerStore> {
    store: Arc<S>,
}

impl<S: LedgerStore> Clone for PartyDirectory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: LedgerStore> PartyDirectory<S> {
    /// Create a new party directory.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Creates a party with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for a blank name or phone and
    /// `DuplicateParty` if the name and phone are already registered.
    pub async fn create(&self, input: NewParty) -> Result<Party, BillingError> {
        let key = PartyKey::new(&input.name, &input.phone);
        require_complete(&key)?;

        let mut work = self.store.begin().await?;
        ensure_key_free(&mut work, &key, None).await?;

        let mut party = Party::new(&key);
        party.address = non_blank(input.address);
        party.email = non_blank(input.email);
        work.insert_party(&party).await?;
        work.commit().await?;

        info!(party_id = %party.id, name = %party.name, "Party created");
        Ok(party)
    }

    /// Updates contact details and identity. The balance is left alone.
    ///
    /// # Errors
    ///
    /// Returns `PartyNotFound`, `MissingField`, or `DuplicateParty`.
    pub async fn update(&self, id: PartyId, update: PartyUpdate) -> Result<Party, BillingError> {
        let mut work = self.store.begin().await?;
        let mut party = work
            .get_party(id)
            .await?
            .ok_or(BillingError::PartyNotFound(id))?;

        let key = PartyKey::new(
            update.name.as_deref().unwrap_or(&party.name),
            update.phone.as_deref().unwrap_or(&party.phone),
        );
        require_complete(&key)?;
        ensure_key_free(&mut work, &key, Some(id)).await?;

        party.name = key.name().to_string();
        party.phone = key.phone().to_string();
        if update.address.is_some() {
            party.address = non_blank(update.address);
        }
        if update.email.is_some() {
            party.email = non_blank(update.email);
        }
        party.updated_at = Utc::now();

        work.update_party_details(&party).await?;
        work.commit().await?;
        Ok(party)
    }

    /// Deletes a party that no record references.
    ///
    /// # Errors
    ///
    /// Returns `PartyNotFound` or `PartyInUse`.
    pub async fn delete(&self, id: PartyId) -> Result<(), BillingError> {
        let mut work = self.store.begin().await?;
        let records = work.count_party_records(id).await?;
        if records > 0 {
            return Err(BillingError::PartyInUse { id, records });
        }
        if !work.delete_party(id).await? {
            return Err(BillingError::PartyNotFound(id));
        }
        work.commit().await?;

        info!(party_id = %id, "Party deleted");
        Ok(())
    }

    /// Gets a party.
    ///
    /// # Errors
    ///
    /// Returns `PartyNotFound`.
    pub async fn get(&self, id: PartyId) -> Result<Party, BillingError> {
        let mut work = self.store.begin().await?;
        work.get_party(id)
            .await?
            .ok_or(BillingError::PartyNotFound(id))
    }

    /// Lists all parties by name.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn list(&self) -> Result<Vec<Party>, BillingError> {
        self.search("").await
    }

    /// Case-insensitive substring search on name or phone.
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub async fn search(&self, query: &str) -> Result<Vec<Party>, BillingError> {
        let mut work = self.store.begin().await?;
        let parties = work.list_parties().await?;
        Ok(search_parties(parties, query))
    }
}

fn require_complete(key: &PartyKey) -> Result<(), BillingError> {
    if key.name().is_empty() {
        return Err(BillingError::MissingField("party name"));
    }
    if key.phone().is_empty() {
        return Err(BillingError::MissingField("party phone"));
    }
    Ok(())
}

async fn ensure_key_free<W: UnitOfWork>(
    work: &mut W,
    key: &PartyKey,
    owner: Option<PartyId>,
) -> Result<(), BillingError> {
    let clash = work
        .find_parties_by_name(&normalize_name(key.name()))
        .await?
        .into_iter()
        .any(|p| p.key() == *key && Some(p.id) != owner);
    if clash {
        return Err(BillingError::DuplicateParty {
            name: key.name().to_string(),
            phone: key.phone().to_string(),
        });
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use rust_decimal::Decimal;

    fn directory() -> PartyDirectory<InMemoryStore> {
        PartyDirectory::new(Arc::new(InMemoryStore::new()))
    }

    fn new_party(name: &str, phone: &str) -> NewParty {
        NewParty {
            name: name.to_string(),
            phone: phone.to_string(),
            address: Some("  ".to_string()),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_duplicate() {
        let directory = directory();
        let party = directory.create(new_party("Acme", "9000000001")).await.unwrap();
        assert_eq!(party.balance, Decimal::ZERO);
        assert_eq!(party.address, None);

        let err = directory
            .create(new_party(" acme ", "9000000001"))
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::DuplicateParty { .. }));

        directory.create(new_party("Acme", "9000000002")).await.unwrap();
        assert_eq!(directory.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_keeps_balance_and_checks_key() {
        let directory = directory();
        let acme = directory.create(new_party("Acme", "9000000001")).await.unwrap();
        let other = directory.create(new_party("Bharat", "9000000002")).await.unwrap();

        let err = directory
            .update(
                other.id,
                PartyUpdate {
                    name: Some("ACME".to_string()),
                    phone: Some("9000000001".to_string()),
                    ..PartyUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::DuplicateParty { .. }));

        let renamed = directory
            .update(
                acme.id,
                PartyUpdate {
                    name: Some("ACME Traders".to_string()),
                    email: Some("acme@example.com".to_string()),
                    ..PartyUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "ACME Traders");
        assert_eq!(renamed.email.as_deref(), Some("acme@example.com"));
        assert_eq!(renamed.balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_case_only_rename_allowed() {
        let directory = directory();
        let acme = directory.create(new_party("acme", "9000000001")).await.unwrap();
        let renamed = directory
            .update(
                acme.id,
                PartyUpdate {
                    name: Some("Acme".to_string()),
                    ..PartyUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Acme");
    }

    #[tokio::test]
    async fn test_search_and_delete() {
        let directory = directory();
        let acme = directory.create(new_party("Acme", "9000000001")).await.unwrap();
        directory.create(new_party("Bharat", "9111111111")).await.unwrap();

        let found = directory.search("911").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Bharat");

        directory.delete(acme.id).await.unwrap();
        let err = directory.delete(acme.id).await.unwrap_err();
        assert!(matches!(err, BillingError::PartyNotFound(_)));
    }
}
