use crate::errors::OIDCError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::DecodingKey;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{BigUint, RsaPublicKey};
use std::fmt;

/// An RSA public key published by an identity provider under a key id.
///
/// Holds the parsed key, its SPKI PEM encoding and the verifier handle built
/// from that PEM.
#[derive(Clone)]
pub struct SigningKey {
    kid: String,
    public_key: RsaPublicKey,
    pem: String,
    decoding_key: DecodingKey,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("pem", &self.pem)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Builds a key from the base64url encoded modulus `n` and exponent `e` of a JWK.
    ///
    /// # Arguments
    /// * `kid` - key id the provider publishes the key under.
    /// * `n` - big endian modulus, base64url without padding.
    /// * `e` - big endian public exponent, base64url without padding.
    ///
    /// # Errors
    /// Returns an error when either component is empty or not valid base64url,
    /// or when the pair does not form a usable RSA public key.
    pub fn from_components(kid: impl Into<String>, n: &str, e: &str) -> Result<Self, OIDCError> {
        let modulus = decode_component(n)?;
        let exponent = decode_component(e)?;
        let public_key = RsaPublicKey::new(modulus, exponent)?;
        Self::from_public_key(kid, public_key)
    }

    pub fn from_public_key(
        kid: impl Into<String>,
        public_key: RsaPublicKey,
    ) -> Result<Self, OIDCError> {
        let pem = public_key.to_public_key_pem(LineEnding::LF)?;
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())?;
        Ok(Self {
            kid: kid.into(),
            public_key,
            pem,
            decoding_key,
        })
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    /// SPKI (`BEGIN PUBLIC KEY`) PEM encoding of the key.
    pub fn pem(&self) -> &str {
        &self.pem
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

fn decode_component(value: &str) -> Result<BigUint, OIDCError> {
    // some providers pad their components anyway
    let bytes = URL_SAFE_NO_PAD.decode(value.trim_end_matches('='))?;
    if bytes.is_empty() {
        return Err("empty RSA key component".into());
    }
    Ok(BigUint::from_bytes_be(&bytes))
}
