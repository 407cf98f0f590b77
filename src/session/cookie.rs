//! Signed session cookie
//!
//! Cookie value format: `<token>|<hex(HMAC-SHA256(key, token))>` where the
//! key is the server secret followed by `token[4..9]`.

use axum::http::HeaderMap;
use axum::http::header::COOKIE;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

use super::store::SessionToken;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE_NAME: &str = "LedgerSessionID";

/// Token bytes mixed into the signing key
const KEY_SALT_RANGE: std::ops::Range<usize> = 4..9;

/// 180 days
pub const DEFAULT_COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 180;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CookieError {
    #[error("Session cookie missing")]
    Missing,

    #[error("Invalid cookie value or it is unsigned")]
    Unsigned,

    #[error("Invalid cookie signature")]
    InvalidSign,

    #[error("Session token too short to derive a signing key")]
    TokenTooShort,
}

/// Signs and verifies session cookie values
#[derive(Clone)]
pub struct CookieSigner {
    secret: Vec<u8>,
    max_age_secs: u64,
}

impl CookieSigner {
    pub fn new(secret: impl Into<Vec<u8>>, max_age_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            max_age_secs,
        }
    }

    fn mac_for(&self, token: &str) -> Result<HmacSha256, CookieError> {
        let salt = token
            .as_bytes()
            .get(KEY_SALT_RANGE)
            .ok_or(CookieError::TokenTooShort)?;
        let mut key = Vec::with_capacity(self.secret.len() + salt.len());
        key.extend_from_slice(&self.secret);
        key.extend_from_slice(salt);

        // HMAC accepts keys of any length
        let mut mac =
            HmacSha256::new_from_slice(&key).map_err(|_| CookieError::InvalidSign)?;
        mac.update(token.as_bytes());
        Ok(mac)
    }

    /// `token|hex-signature`
    pub fn sign(&self, token: &SessionToken) -> Result<String, CookieError> {
        let mac = self.mac_for(token.as_str())?;
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{}|{}", token, signature))
    }

    /// Split a cookie value and check its signature in constant time.
    pub fn verify(&self, value: &str) -> Result<SessionToken, CookieError> {
        let (token, signature) = value.split_once('|').ok_or(CookieError::Unsigned)?;
        let signature = hex::decode(signature).map_err(|_| CookieError::InvalidSign)?;
        self.mac_for(token)?
            .verify_slice(&signature)
            .map_err(|_| CookieError::InvalidSign)?;
        Ok(SessionToken::from(token))
    }

    /// `Set-Cookie` header value carrying the signed token
    pub fn set_cookie_header(&self, token: &SessionToken) -> Result<String, CookieError> {
        Ok(format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly",
            SESSION_COOKIE_NAME,
            self.sign(token)?,
            self.max_age_secs
        ))
    }

    /// Find the session cookie in the request headers and verify it.
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Result<SessionToken, CookieError> {
        let value = find_cookie(headers, SESSION_COOKIE_NAME).ok_or(CookieError::Missing)?;
        self.verify(value)
    }
}

/// First cookie named `name` across all `Cookie` headers
fn find_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim_matches('"'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn signer() -> CookieSigner {
        CookieSigner::new("secret key", DEFAULT_COOKIE_MAX_AGE_SECS)
    }

    #[test]
    fn test_sign_verify() {
        let s = signer();
        let token = SessionToken::generate();
        let value = s.sign(&token).unwrap();
        assert!(value.starts_with(&format!("{}|", token)));
        assert_eq!(s.verify(&value).unwrap(), token);
    }

    #[test]
    fn test_tampered_value_rejected() {
        let s = signer();
        let value = s.sign(&SessionToken::from("0123456789abcdef")).unwrap();

        let forged = value.replacen("0123", "9123", 1);
        assert_eq!(s.verify(&forged), Err(CookieError::InvalidSign));

        let mut bad_sig = value.clone();
        bad_sig.pop();
        bad_sig.push('x');
        assert_eq!(s.verify(&bad_sig), Err(CookieError::InvalidSign));

        let other = CookieSigner::new("other secret", 60);
        assert_eq!(other.verify(&value), Err(CookieError::InvalidSign));
    }

    #[test]
    fn test_unsigned_and_short_values() {
        let s = signer();
        assert_eq!(s.verify("0123456789abcdef"), Err(CookieError::Unsigned));
        assert_eq!(s.verify("abc|00"), Err(CookieError::TokenTooShort));
        assert_eq!(
            s.sign(&SessionToken::from("abcd")),
            Err(CookieError::TokenTooShort)
        );
    }

    #[test]
    fn test_set_cookie_header() {
        let s = signer();
        let token = SessionToken::from("0123456789abcdef");
        let header = s.set_cookie_header(&token).unwrap();
        assert!(header.starts_with("LedgerSessionID=0123456789abcdef|"));
        assert!(header.contains("Path=/"));
        assert!(header.contains("Max-Age=15552000"));
        assert!(header.ends_with("HttpOnly"));
    }

    #[test]
    fn test_token_from_headers() {
        let s = signer();
        let token = SessionToken::generate();
        let value = s.sign(&token).unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(s.token_from_headers(&headers), Err(CookieError::Missing));

        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE_NAME, value))
                .unwrap(),
        );
        assert_eq!(s.token_from_headers(&headers).unwrap(), token);
    }
}
