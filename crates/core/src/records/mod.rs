//! Transaction records: sales invoices, purchase bills, and payments.
//!
//! A record carries a denormalized party snapshot taken at write time plus
//! the resolved party id, so ledger reversal always reaches the party that
//! was charged even if the party is renamed afterwards.

mod types;
mod validation;

pub use types::{
    LineInput, LineItem, Movement, PartyInput, PaymentDirection, PaymentInput, RecordFilter,
    TradeInput, TransactionKind, TransactionRecord,
};
pub use validation::{
    build_lines, validate_bags, validate_party, validate_payment, validate_trade, MAX_AMOUNT,
    MAX_QUANTITY_KG, MONEY_SCALE, QUANTITY_SCALE,
};
