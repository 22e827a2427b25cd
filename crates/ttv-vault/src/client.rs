use std::time::Duration;

use reqwest::Url;
use serde::Serialize;

use crate::error::{Error, Result};

/// Body of the vault's `POST /imports` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportCommand {
    /// Location of the archived batch.
    pub path: String,
    /// Whether the batch holds one logical object instead of many.
    pub single_object: bool,
}

/// Remote vault import API.
pub trait VaultApi {
    /// Register an import job. Anything but an accepted job is an error.
    fn import(&self, command: &ImportCommand) -> Result<()>;
}

/// Parse a vault base url, making sure relative joins append to its path.
pub fn parse_base_url(base: &str) -> Result<Url> {
    let normalized = if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    };
    let url = Url::parse(&normalized).map_err(|e| Error::InvalidUrl {
        url:    base.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidUrl {
            url:    base.to_string(),
            reason: "url cannot be used as a base".to_string(),
        });
    }
    Ok(url)
}

/// Blocking `reqwest` implementation of [`VaultApi`].
#[derive(Debug)]
pub struct ReqwestVaultClient {
    client: reqwest::blocking::Client,
    imports_url: Url,
}

impl ReqwestVaultClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = parse_base_url(base_url)?;
        let imports_url = base.join("imports").map_err(|e| Error::InvalidUrl {
            url:    base_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Request {
                url:    imports_url.to_string(),
                source: e,
            })?;
        Ok(Self {
            client,
            imports_url,
        })
    }

    pub fn imports_url(&self) -> &Url { &self.imports_url }
}

impl VaultApi for ReqwestVaultClient {
    fn import(&self, command: &ImportCommand) -> Result<()> {
        let url = self.imports_url.to_string();
        let response = self
            .client
            .post(self.imports_url.clone())
            .json(command)
            .send()
            .map_err(|e| Error::Request {
                url:    url.clone(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Status { url, status, body });
        }

        tracing::info!(path = %command.path, single_object = command.single_object, "vault import registered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_command_wire_format() {
        let command = ImportCommand {
            path:          "/vault/batch-1.dmftar".to_string(),
            single_object: false,
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "path": "/vault/batch-1.dmftar", "singleObject": false })
        );
    }

    #[test]
    fn imports_url_appends_to_base_path() {
        let client = ReqwestVaultClient::new("http://localhost:20305/api", Duration::from_secs(1)).unwrap();
        assert_eq!(client.imports_url().as_str(), "http://localhost:20305/api/imports");
    }

    #[test]
    fn invalid_base_url_rejected() {
        assert!(matches!(parse_base_url("not a url"), Err(Error::InvalidUrl { .. })));
        assert!(matches!(parse_base_url("mailto:vault@example.org"), Err(Error::InvalidUrl { .. })));
    }
}
