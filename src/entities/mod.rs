//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod borrow;
pub mod credit_transaction;

// Re-export specific types to avoid conflicts
pub use account::{Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use borrow::{BorrowStatus, Column as BorrowColumn, Entity as Borrow, Model as BorrowModel};
pub use credit_transaction::{
    Column as CreditTransactionColumn, Entity as CreditTransaction,
    Model as CreditTransactionModel, TransactionStatus, TransactionType,
};
