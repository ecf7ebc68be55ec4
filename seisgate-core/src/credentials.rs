//! Credential resolution and connection descriptors.
//!
//! Datasets live in storage accounts. Only allow-listed accounts are served,
//! and each account may carry a default credential that is used when the
//! caller does not supply one.

use secrecy::{ExposeSecret, SecretString};

use crate::error::{CoreResult, GatewayError};

// ============================================================================
// CREDENTIAL (TYPE-SAFE)
// ============================================================================

/// Shared-access token that never shows up in `Debug` output.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    pub fn new(token: String) -> Self {
        Self(SecretString::new(token.into()))
    }

    /// Expose the token, only for handing it to the storage engine.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Everything needed to reach one dataset on behalf of one caller.
#[derive(Debug, Clone)]
pub struct ConnectionDescriptor {
    dataset: String,
    credential: Credential,
}

impl ConnectionDescriptor {
    pub fn new(dataset: impl Into<String>, credential: Credential) -> Self {
        Self {
            dataset: dataset.into(),
            credential,
        }
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

#[derive(Debug, Clone)]
struct StorageAccount {
    prefix: String,
    default_credential: Option<Credential>,
}

impl StorageAccount {
    fn contains(&self, dataset: &str) -> bool {
        match dataset.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

/// Maps dataset locators to connection descriptors.
#[derive(Debug, Clone, Default)]
pub struct CredentialResolver {
    accounts: Vec<StorageAccount>,
}

impl CredentialResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow datasets under `prefix`, e.g. `https://account.blob.core.windows.net`.
    pub fn allow(mut self, prefix: impl Into<String>) -> Self {
        let prefix = normalize_prefix(prefix.into());
        if !self.accounts.iter().any(|account| account.prefix == prefix) {
            self.accounts.push(StorageAccount {
                prefix,
                default_credential: None,
            });
        }
        self
    }

    /// Allow datasets under `prefix` and read them with `credential` when the
    /// caller supplies none.
    pub fn with_default_credential(mut self, prefix: impl Into<String>, credential: Credential) -> Self {
        let prefix = normalize_prefix(prefix.into());
        match self.accounts.iter_mut().find(|account| account.prefix == prefix) {
            Some(account) => account.default_credential = Some(credential),
            None => self.accounts.push(StorageAccount {
                prefix,
                default_credential: Some(credential),
            }),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Allow-listed prefixes, for startup logging.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.accounts.iter().map(|account| account.prefix.as_str())
    }

    /// Resolve the dataset and the caller's credential into a descriptor.
    ///
    /// A leading `?` on the supplied token is stripped. An absent or empty
    /// token falls back to the account's default credential.
    pub fn resolve(&self, dataset: &str, supplied: Option<&str>) -> CoreResult<ConnectionDescriptor> {
        let account = self
            .accounts
            .iter()
            .find(|account| account.contains(dataset))
            .ok_or_else(|| {
                GatewayError::invalid_argument(format!("Unsupported storage account: {}", dataset))
            })?;

        let supplied = supplied
            .map(|token| token.trim().trim_start_matches('?'))
            .filter(|token| !token.is_empty());

        let credential = match (supplied, &account.default_credential) {
            (Some(token), _) => Credential::new(token.to_string()),
            (None, Some(default)) => default.clone(),
            (None, None) => {
                return Err(GatewayError::invalid_argument(format!(
                    "No credentials provided for {}",
                    dataset
                )))
            }
        };

        Ok(ConnectionDescriptor::new(dataset, credential))
    }
}

fn normalize_prefix(prefix: String) -> String {
    prefix.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNT: &str = "https://account.blob.core.windows.net";

    #[test]
    fn test_resolve_uses_supplied_token() -> CoreResult<()> {
        let resolver = CredentialResolver::new().allow(ACCOUNT);
        let descriptor = resolver.resolve(
            "https://account.blob.core.windows.net/cube/volume",
            Some("?sv=1&sig=abc"),
        )?;
        assert_eq!(descriptor.credential().expose(), "sv=1&sig=abc");
        assert_eq!(
            descriptor.dataset(),
            "https://account.blob.core.windows.net/cube/volume"
        );
        Ok(())
    }

    #[test]
    fn test_resolve_falls_back_to_default() -> CoreResult<()> {
        let resolver = CredentialResolver::new()
            .with_default_credential(ACCOUNT, Credential::new("default-token".to_string()));
        let descriptor = resolver.resolve(&format!("{}/cube", ACCOUNT), Some(""))?;
        assert_eq!(descriptor.credential().expose(), "default-token");
        Ok(())
    }

    #[test]
    fn test_resolve_rejects_unlisted_account() {
        let resolver = CredentialResolver::new().allow(ACCOUNT);
        let err = resolver
            .resolve("https://other.blob.core.windows.net/cube", Some("token"))
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.message().starts_with("Unsupported storage account"));
    }

    #[test]
    fn test_prefix_match_respects_path_boundary() {
        let resolver = CredentialResolver::new().allow(format!("{}/", ACCOUNT));
        assert!(resolver
            .resolve("https://account.blob.core.windows.net.attacker.io/cube", Some("t"))
            .is_err());
    }

    #[test]
    fn test_resolve_without_any_credential() {
        let resolver = CredentialResolver::new().allow(ACCOUNT);
        let err = resolver.resolve(&format!("{}/cube", ACCOUNT), None).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.message().starts_with("No credentials provided"));
    }

    #[test]
    fn test_debug_hides_token() {
        let descriptor = ConnectionDescriptor::new("memory://cube", Credential::new("s3cr3t".to_string()));
        let rendered = format!("{:?}", descriptor);
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("REDACTED"));
    }
}
