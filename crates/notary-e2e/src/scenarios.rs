//! E2E scenarios for the certificate notary
//!
//! Each scenario drives the operation API against a simulated ledger and
//! checks what the indexer mirrors back.
