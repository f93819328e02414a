//! URL template rendering.
//!
//! Turns a [`ServerSpec`]'s template and a tile coordinate into a concrete
//! fetch URL. Placeholder validation happens at construction so that a
//! malformed template aborts before any network activity.

use crate::addressor::AddressingError;
use crate::coord::{quadkey, TileCoord};

use super::{Scheme, ServerSpec};

/// Subdomain rotation set used for `{s}` placeholders.
///
/// The pick is deterministic per tile, `(x + y) % len`, spreading requests
/// across mirror hosts without a mutable round-robin counter.
const SUBDOMAINS: [&str; 3] = ["a", "b", "c"];

/// A validated URL template bound to an addressing scheme.
#[derive(Debug, Clone)]
pub struct UrlTemplate {
    raw: String,
    scheme: Scheme,
    api_key: Option<String>,
}

impl UrlTemplate {
    /// Validate a server spec's template, binding an optional API key.
    ///
    /// # Errors
    ///
    /// - `MissingPlaceholder` if the template lacks the placeholders its
    ///   scheme requires (`{z}`/`{x}`/`{y}` for XYZ, `{quadkey}` for quadkey)
    /// - `MissingApiKey` if the template contains `{apikey}` but no key was
    ///   supplied
    pub fn from_spec(spec: &ServerSpec, api_key: Option<String>) -> Result<Self, AddressingError> {
        Self::parse(&spec.url_template, spec.scheme, api_key)
    }

    /// Validate a raw template string for the given scheme.
    pub fn parse(
        raw: &str,
        scheme: Scheme,
        api_key: Option<String>,
    ) -> Result<Self, AddressingError> {
        let required: &[&str] = match scheme {
            Scheme::Xyz => &["{z}", "{x}", "{y}"],
            Scheme::Quadkey => &["{quadkey}"],
        };
        for placeholder in required {
            if !raw.contains(placeholder) {
                return Err(AddressingError::MissingPlaceholder {
                    scheme,
                    placeholder: placeholder.to_string(),
                });
            }
        }
        if raw.contains("{apikey}") && api_key.is_none() {
            return Err(AddressingError::MissingApiKey);
        }
        Ok(Self {
            raw: raw.to_string(),
            scheme,
            api_key,
        })
    }

    /// The addressing scheme this template serves.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Render the fetch URL for one tile.
    pub fn render(&self, tile: &TileCoord) -> String {
        let mut url = match self.scheme {
            Scheme::Xyz => self
                .raw
                .replace("{z}", &tile.zoom.to_string())
                .replace("{x}", &tile.x.to_string())
                .replace("{y}", &tile.y.to_string()),
            Scheme::Quadkey => self
                .raw
                .replace("{quadkey}", &quadkey::encode(tile.x, tile.y, tile.zoom)),
        };
        if url.contains("{s}") {
            let pick = SUBDOMAINS[((tile.x + tile.y) % SUBDOMAINS.len() as u32) as usize];
            url = url.replace("{s}", pick);
        }
        if let Some(ref key) = self.api_key {
            url = url.replace("{apikey}", key);
        }
        url
    }
}
