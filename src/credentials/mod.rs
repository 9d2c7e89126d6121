//! Secret handling: Argon2id hashing and API-key generation.

pub mod hasher;
pub mod keys;

pub use hasher::CredentialHasher;
pub use keys::{API_KEY_PREFIX, API_KEY_RANDOM_LEN, generate_api_key};
