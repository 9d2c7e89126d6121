use rand::{Rng, distr::Alphanumeric};

/// Recognizable marker on every issued key; carries no entropy.
pub const API_KEY_PREFIX: &str = "odsp-";

/// Number of random alphanumeric characters after the prefix.
pub const API_KEY_RANDOM_LEN: usize = 32;

/// Generate a random API key (`odsp-` + 32 alphanumeric characters).
///
/// `rand::rng()` is a CSPRNG reseeded from the OS, suitable for credentials.
#[must_use]
pub fn generate_api_key() -> String {
    let mut key = String::with_capacity(API_KEY_PREFIX.len() + API_KEY_RANDOM_LEN);
    key.push_str(API_KEY_PREFIX);
    key.extend(
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(API_KEY_RANDOM_LEN)
            .map(char::from),
    );
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn key_has_prefix_and_alphanumeric_body() {
        let key = generate_api_key();
        assert_eq!(key.len(), API_KEY_PREFIX.len() + API_KEY_RANDOM_LEN);

        let body = key.strip_prefix(API_KEY_PREFIX).unwrap();
        assert_eq!(body.len(), 32);
        assert!(body.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn keys_do_not_repeat() {
        let keys: HashSet<String> = (0..1000).map(|_| generate_api_key()).collect();
        assert_eq!(keys.len(), 1000);
    }
}
