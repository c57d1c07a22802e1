//! `SeaORM` entity definitions.

pub mod items;
pub mod parties;
pub mod transaction_lines;
pub mod transactions;

pub mod prelude {
    //! Entity re-exports.
    pub use super::items::Entity as Items;
    pub use super::parties::Entity as Parties;
    pub use super::transaction_lines::Entity as TransactionLines;
    pub use super::transactions::Entity as Transactions;
}
