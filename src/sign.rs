//! Test signing utilities.
//!
//! `OidcSigner` produces RS256 id_tokens with a `kid` header so the parser,
//! the factory and the provider can be exercised against real signatures.
//! Key generation is slow in debug builds, so two key pairs are generated
//! once per test binary and shared through [`TEST_KEYS`].
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::LazyLock;

pub(crate) struct TestKeys {
    pub primary: RsaPrivateKey,
    pub secondary: RsaPrivateKey,
}

pub(crate) static TEST_KEYS: LazyLock<TestKeys> = LazyLock::new(|| TestKeys {
    primary: RsaPrivateKey::new(&mut OsRng, 2048).expect("failed to generate key"),
    secondary: RsaPrivateKey::new(&mut OsRng, 2048).expect("failed to generate key"),
});

pub(crate) fn encode_component(value: &BigUint) -> String {
    URL_SAFE_NO_PAD.encode(value.to_bytes_be())
}

/// JWK descriptor for the public half of `key`.
pub(crate) fn jwk_for(key: &RsaPrivateKey, kid: &str) -> Value {
    let public = key.to_public_key();
    json!({
        "kid": kid,
        "kty": "RSA",
        "alg": "RS256",
        "use": "sig",
        "n": encode_component(public.n()),
        "e": encode_component(public.e()),
    })
}

#[derive(Clone)]
pub(crate) struct OidcSigner {
    pub key: EncodingKey,
    pub kid: Option<String>,
    pub algorithm: Algorithm,
}

impl OidcSigner {
    pub fn from_private_key(key: &RsaPrivateKey, kid: &str) -> Self {
        let pem = key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("failed to encode private key");
        Self {
            key: EncodingKey::from_rsa_pem(pem.as_bytes()).expect("failed to create signer"),
            kid: Some(kid.to_string()),
            algorithm: Algorithm::RS256,
        }
    }

    pub fn without_kid(mut self) -> Self {
        self.kid = None;
        self
    }

    pub fn sign<T: Serialize>(&self, claims: &T) -> String {
        let mut header = Header::new(self.algorithm);
        header.kid = self.kid.clone();
        encode(&header, claims, &self.key).expect("failed to sign token")
    }
}

/// Claims that pass validation for `client123` at `https://idp.example`.
pub(crate) fn valid_claims(nonce: &str) -> Value {
    let now = crate::utils::now_secs();
    json!({
        "aud": "client123",
        "iss": "https://idp.example",
        "sub": "user1",
        "nonce": nonce,
        "iat": now,
        "nbf": now,
        "exp": now + 3600,
    })
}

mod tests {
    use super::*;
    use crate::crypto::SigningKey;
    use jsonwebtoken::{Validation, decode};

    #[test]
    fn sign_and_verify_with_published_jwk() {
        let signer = OidcSigner::from_private_key(&TEST_KEYS.primary, "kid1");
        let token = signer.sign(&json!({ "sub": "user-123", "role": "admin" }));

        let jwk = jwk_for(&TEST_KEYS.primary, "kid1");
        let key = SigningKey::from_components(
            "kid1",
            jwk["n"].as_str().unwrap(),
            jwk["e"].as_str().unwrap(),
        )
        .unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.required_spec_claims.clear();
        let claims: Value = decode(&token, key.decoding_key(), &validation)
            .unwrap()
            .claims;

        assert_eq!(claims.get("sub").and_then(|v| v.as_str()), Some("user-123"));
        assert_eq!(claims.get("role").and_then(|v| v.as_str()), Some("admin"));
    }
}
