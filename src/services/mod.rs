pub mod ledger;
pub mod seed;
pub mod sqlite_store;
pub mod store;
