use crate::proxmox::error::{ProxmoxError, Result};
use crate::settings::Settings;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// API token credential bound to a user; every request carries it.
#[derive(Clone)]
pub struct Ticket {
    user: String,
    token_name: String,
    token_value: String,
}

impl Ticket {
    pub fn new(user: &str, token_name: &str, token_value: &str) -> Self {
        Self {
            user: user.to_string(),
            token_name: token_name.to_string(),
            token_value: token_value.to_string(),
        }
    }

    /// Value of the `Authorization` header, e.g. `PVEAPIToken=root@pam!mcp=<uuid>`.
    fn header_value(&self, service: &str) -> String {
        let scheme = if service.eq_ignore_ascii_case("PBS") {
            "PBSAPIToken"
        } else {
            "PVEAPIToken"
        };
        format!(
            "{}={}!{}={}",
            scheme, self.user, self.token_name, self.token_value
        )
    }
}

impl fmt::Debug for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ticket")
            .field("user", &self.user)
            .field("token_name", &self.token_name)
            .field("token_value", &"<redacted>")
            .finish()
    }
}

fn is_port(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// `host:port` for the base URL. A port already named in `host` (mock
/// servers, reverse proxies) is kept; bare IPv6 literals get brackets.
fn authority(host: &str, port: u16) -> String {
    if host.starts_with('[') {
        return match host.rsplit_once("]:") {
            Some((_, p)) if is_port(p) => host.to_string(),
            _ => format!("{}:{}", host, port),
        };
    }
    match host.split_once(':') {
        None => format!("{}:{}", host, port),
        Some((_, p)) if is_port(p) => host.to_string(),
        Some(_) if host.matches(':').count() > 1 => format!("[{}]:{}", host, port),
        Some(_) => format!("{}:{}", host, port),
    }
}

#[derive(Clone, Debug)]
pub struct ProxmoxClient {
    pub(crate) client: Client,
    pub(crate) base_url: Url,
    ticket: Ticket,
    service: String,
}

impl ProxmoxClient {
    pub fn new(
        host: &str,
        port: u16,
        verify_ssl: bool,
        timeout: Duration,
        ticket: Ticket,
    ) -> Result<Self> {
        let scheme = if host.starts_with("http://") {
            "http"
        } else {
            "https"
        };

        let host_cleaned = if let Some(stripped) = host.strip_prefix("http://") {
            stripped
        } else if let Some(stripped) = host.strip_prefix("https://") {
            stripped
        } else {
            host
        };
        let host_cleaned = host_cleaned.trim_end_matches('/');

        let url_str = format!("{}://{}/api2/json/", scheme, authority(host_cleaned, port));

        let base_url = Url::parse(&url_str)?;

        let client = Client::builder()
            .danger_accept_invalid_certs(!verify_ssl)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            ticket,
            service: "PVE".to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let ticket = Ticket::new(
            &settings.auth.user,
            &settings.auth.token_name,
            &settings.auth.token_value,
        );
        let mut client = Self::new(
            &settings.proxmox.host,
            settings.proxmox.port,
            settings.proxmox.verify_ssl,
            settings.proxmox.timeout(),
            ticket,
        )?;
        client.service = settings.proxmox.service.clone();
        Ok(client)
    }

    /// Checks the token against the API; any failure here is fatal at startup.
    pub async fn verify(&self) -> Result<String> {
        let version: Value = match self.request(Method::GET, "version", None).await {
            Ok(v) => v,
            Err(ProxmoxError::Api(status, body))
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN =>
            {
                return Err(ProxmoxError::Auth(format!("{} - {}", status, body)));
            }
            Err(e) => return Err(e),
        };
        let release = version
            .get("version")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        info!(user = %self.ticket.user, release = %release, "Authenticated against Proxmox API");
        Ok(release)
    }

    pub(crate) async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        let url = self.base_url.join(path)?;
        debug!(%method, %url, "Proxmox request");

        let mut req = self
            .client
            .request(method, url)
            .header("Authorization", self.ticket.header_value(&self.service));

        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ProxmoxError::Api(status, text));
        }

        let v: Value = resp.json().await?;
        if let Some(data) = v.get("data") {
            Ok(serde_json::from_value(data.clone())?)
        } else {
            Ok(serde_json::from_value(v)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket() -> Ticket {
        Ticket::new("root@pam", "mcp", "secret-uuid")
    }

    #[test]
    fn test_header_value() {
        assert_eq!(
            ticket().header_value("PVE"),
            "PVEAPIToken=root@pam!mcp=secret-uuid"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", ticket());
        assert!(!rendered.contains("secret-uuid"));
        assert!(rendered.contains("root@pam"));
    }

    #[test]
    fn test_base_url_gets_default_port() {
        let client =
            ProxmoxClient::new("10.0.0.5", 8006, false, Duration::from_secs(5), ticket()).unwrap();
        assert_eq!(client.base_url.as_str(), "https://10.0.0.5:8006/api2/json/");
    }

    #[test]
    fn test_base_url_keeps_explicit_port() {
        let client = ProxmoxClient::new(
            "http://127.0.0.1:4040/",
            8006,
            true,
            Duration::from_secs(5),
            ticket(),
        )
        .unwrap();
        assert_eq!(client.base_url.as_str(), "http://127.0.0.1:4040/api2/json/");
    }

    #[test]
    fn test_base_url_ipv6_hosts() {
        let client =
            ProxmoxClient::new("fe80::1", 8006, false, Duration::from_secs(5), ticket()).unwrap();
        assert_eq!(client.base_url.as_str(), "https://[fe80::1]:8006/api2/json/");

        let client =
            ProxmoxClient::new("[fd00::5]", 8006, false, Duration::from_secs(5), ticket()).unwrap();
        assert_eq!(client.base_url.as_str(), "https://[fd00::5]:8006/api2/json/");

        let client = ProxmoxClient::new(
            "https://[fd00::5]:8443",
            8006,
            false,
            Duration::from_secs(5),
            ticket(),
        )
        .unwrap();
        assert_eq!(client.base_url.as_str(), "https://[fd00::5]:8443/api2/json/");
    }

    #[test]
    fn test_authority() {
        assert_eq!(authority("pve.lan", 8006), "pve.lan:8006");
        assert_eq!(authority("pve.lan:443", 8006), "pve.lan:443");
        assert_eq!(authority("::1", 8006), "[::1]:8006");
    }
}
