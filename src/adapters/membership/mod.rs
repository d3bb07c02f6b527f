//! Membership adapters - implementations of the `MembershipStore` port.
//!
//! - `InMemoryMembershipStore` - Process-local store for tests and local runs
//!
//! The PostgreSQL store lives in `adapters::postgres`.

mod in_memory_store;

pub use in_memory_store::InMemoryMembershipStore;
