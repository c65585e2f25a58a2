//! Signed URLs for direct client access to storage objects.
//!
//! A URL carries its expiry as a unix timestamp and an HMAC-SHA256 over the
//! method, area, key and expiry. The object routes in
//! `services::storage::objects` verify it before touching storage.

use crate::storage::Area;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use common::model::document::SignedUrl;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignedMethod {
    Get,
    Put,
}

impl SignedMethod {
    fn as_str(self) -> &'static str {
        match self {
            SignedMethod::Get => "GET",
            SignedMethod::Put => "PUT",
        }
    }
}

#[derive(Clone)]
pub struct UrlSigner {
    base_url: String,
    mac: HmacSha256,
    ttl: Duration,
}

impl UrlSigner {
    pub fn new(
        base_url: impl Into<String>,
        secret: &[u8],
        ttl: Duration,
    ) -> Result<Self, hmac::digest::InvalidLength> {
        Ok(Self {
            base_url: base_url.into(),
            mac: HmacSha256::new_from_slice(secret)?,
            ttl,
        })
    }

    /// Signed download URL of a permanent object.
    pub fn sign_get(&self, key: &str) -> SignedUrl {
        self.sign_at(SignedMethod::Get, Area::Permanent, key, Utc::now())
    }

    /// Signed download URL of a temp object.
    pub fn sign_get_temp(&self, key: &str) -> SignedUrl {
        self.sign_at(SignedMethod::Get, Area::Temp, key, Utc::now())
    }

    /// Signed upload URL into the temp area.
    pub fn sign_put(&self, key: &str) -> SignedUrl {
        self.sign_at(SignedMethod::Put, Area::Temp, key, Utc::now())
    }

    pub fn sign_at(
        &self,
        method: SignedMethod,
        area: Area,
        key: &str,
        now: DateTime<Utc>,
    ) -> SignedUrl {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::zero());
        let expires_at = now + ttl;
        let expires = expires_at.timestamp();
        let signature = URL_SAFE_NO_PAD.encode(self.digest(method, area, key, expires));
        SignedUrl {
            url: format!(
                "{}/api/storage/objects/{}/{}?expires={}&signature={}",
                self.base_url, area, key, expires, signature
            ),
            expires_at: Utc.timestamp_opt(expires, 0).single().unwrap_or(expires_at),
        }
    }

    /// Checks signature and expiry of an incoming request.
    pub fn verify(
        &self,
        method: SignedMethod,
        area: Area,
        key: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if now.timestamp() > expires {
            return false;
        }
        let Ok(provided) = URL_SAFE_NO_PAD.decode(signature) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(payload(method, area, key, expires).as_bytes());
        mac.verify_slice(&provided).is_ok()
    }

    fn digest(&self, method: SignedMethod, area: Area, key: &str, expires: i64) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload(method, area, key, expires).as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

fn payload(method: SignedMethod, area: Area, key: &str, expires: i64) -> String {
    format!("{}\n{}\n{}\n{}", method.as_str(), area, key, expires)
}
