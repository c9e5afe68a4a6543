pub mod ledger;
pub mod memory;

pub use ledger::KvTradeLedger;
pub use memory::InMemoryKvStore;
