pub mod errors;
pub mod ledger_objects;
pub mod reconciler;
