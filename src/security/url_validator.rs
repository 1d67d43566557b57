//! Firmware URL validation
//!
//! Candidate firmware URLs come straight from user input and are fetched by the
//! privileged executor, so they are checked before any request is made.

use url::Url;

use crate::errors::{PlugError, Result};

const MAX_URL_LENGTH: usize = 2048;

/// URL validator for firmware download locations
pub struct UrlValidator;

impl UrlValidator {
    /// Validate a firmware URL and return it parsed
    pub fn validate_firmware_url(firmware_url: &str) -> Result<Url> {
        let firmware_url = firmware_url.trim();
        if firmware_url.is_empty() {
            return Err(invalid("Firmware URL must not be blank"));
        }
        if firmware_url.len() > MAX_URL_LENGTH {
            return Err(invalid(format!(
                "Firmware URL too long (max: {} characters)",
                MAX_URL_LENGTH
            )));
        }

        let parsed = Url::parse(firmware_url)
            .map_err(|e| invalid(format!("Invalid firmware URL format: {}", e)))?;

        match parsed.scheme() {
            "https" => {}
            "http" => {
                log::debug!("Plain HTTP firmware URL: {}", firmware_url);
            }
            scheme => {
                return Err(invalid(format!(
                    "Unsupported firmware URL scheme '{}'. Allowed: http, https",
                    scheme
                )));
            }
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| invalid("Firmware URL must have a valid host"))?;
        Self::validate_host(host)?;

        // Credentials would be forwarded to whatever host serves the file
        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(invalid("Firmware URL must not embed credentials"));
        }

        Ok(parsed)
    }

    fn validate_host(host: &str) -> Result<()> {
        if host.len() > 253 {
            return Err(invalid("Host name too long"));
        }

        if host.contains("..") || host.starts_with('-') || host.ends_with('-') {
            return Err(invalid("Host name contains suspicious patterns"));
        }

        if !Self::is_private_network_host(host) {
            log::debug!("Firmware hosted on public host: {}", host);
        }

        Ok(())
    }

    /// Check if host is loopback, in a private IPv4 range, or a local name
    pub fn is_private_network_host(host: &str) -> bool {
        if let Ok(ip) = host.parse::<std::net::Ipv4Addr>() {
            return ip.is_private() || ip.is_loopback();
        }

        let unbracketed = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = unbracketed.parse::<std::net::Ipv6Addr>() {
            return ip.is_loopback();
        }

        host == "localhost"
            || host.ends_with(".local")
            || host.ends_with(".lan")
            || host.ends_with(".internal")
    }
}

fn invalid(message: impl Into<String>) -> PlugError {
    PlugError::invalid_argument("url", message)
}
