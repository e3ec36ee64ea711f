//! One-way fingerprints for credentials and external identifiers

mod hasher;

pub use hasher::{constant_time_eq, SecretHasher};
