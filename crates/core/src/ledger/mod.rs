//! Party ledger.
//!
//! Each party carries a running balance: the net amount the party owes the
//! business. Every sale, purchase, and payment applies a signed effect to
//! exactly one party; edits reverse the old effect and apply the new one,
//! deletes reverse the effect. Balances are adjusted incrementally and never
//! recomputed on read.

pub mod directory;
pub mod party;
pub mod service;

#[cfg(test)]
mod props;

pub use directory::PartyDirectory;
pub use party::{NewParty, Party, PartyKey, PartyUpdate, normalize_name, search_parties};
pub use service::{LedgerEffect, LedgerPosting, PartyLedger, balance_before};
