//! API key lookup: environment first, then the OS keyring.

use crate::error::GenerationError;

/// Environment variable consulted before the keyring.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Keyring entry name for the OpenAI key.
pub const OPENAI_API_KEY_ENTRY: &str = "openai_api_key";

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "habitual";

    pub fn get(key: &str) -> Result<Option<String>, keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)
    }

    pub fn delete(key: &str) -> Result<(), keyring::Error> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Resolve the OpenAI API key.
///
/// A non-empty `OPENAI_API_KEY` wins; otherwise the keyring entry is used.
pub fn openai_api_key() -> Result<String, GenerationError> {
    resolve_api_key(std::env::var(OPENAI_API_KEY_ENV).ok(), || {
        keyring_store::get(OPENAI_API_KEY_ENTRY).ok().flatten()
    })
}

fn resolve_api_key(
    from_env: Option<String>,
    from_keyring: impl FnOnce() -> Option<String>,
) -> Result<String, GenerationError> {
    from_env
        .filter(|k| !k.trim().is_empty())
        .or_else(|| from_keyring().filter(|k| !k.trim().is_empty()))
        .ok_or_else(|| GenerationError::MissingCredentials {
            service: "openai".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_key_wins_over_keyring() {
        let key = resolve_api_key(Some("sk-env".into()), || Some("sk-ring".into())).unwrap();
        assert_eq!(key, "sk-env");
    }

    #[test]
    fn blank_env_falls_back_to_keyring() {
        let key = resolve_api_key(Some("  ".into()), || Some("sk-ring".into())).unwrap();
        assert_eq!(key, "sk-ring");
    }

    #[test]
    fn missing_everywhere_is_an_error() {
        let err = resolve_api_key(None, || None).unwrap_err();
        assert!(matches!(err, GenerationError::MissingCredentials { .. }));
    }
}
