//! Concrete storage for Keepsake settings with encryption at rest.
//! Uses AES-GCM with keys derived from a passphrase or kept in the OS keyring.

pub mod encrypted_file_store;
pub mod key_provider;
