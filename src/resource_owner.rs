use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// The authenticated end user as described by a provider's profile endpoint.
///
/// Providers disagree on the shape of this payload, so it is kept as a claims
/// map with accessors for the fields most of them share.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceOwner {
    claims: Map<String, Value>,
    id_key: String,
}

impl ResourceOwner {
    pub fn new(claims: Map<String, Value>, id_key: impl Into<String>) -> Self {
        Self {
            claims,
            id_key: id_key.into(),
        }
    }

    /// Wraps a parsed response body; anything but an object yields an empty claim set.
    pub fn from_value(value: Value, id_key: impl Into<String>) -> Self {
        let claims = match value {
            Value::Object(claims) => claims,
            _ => Map::new(),
        };
        Self::new(claims, id_key)
    }

    /// The user id, rendered as a string when the provider returns a number.
    pub fn id(&self) -> Option<String> {
        match self.claims.get(&self.id_key)? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.claims.get(key)
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn name(&self) -> Option<&str> {
        self.str_claim("name")
    }

    pub fn given_name(&self) -> Option<&str> {
        self.str_claim("given_name")
    }

    pub fn family_name(&self) -> Option<&str> {
        self.str_claim("family_name")
    }

    /// `email`, falling back to Microsoft's `mail` and `upn`.
    pub fn email(&self) -> Option<&str> {
        self.str_claim("email")
            .or_else(|| self.str_claim("mail"))
            .or_else(|| self.str_claim("upn"))
    }

    /// Avatar url, either a plain string or Google's `{ "url": ... }` object.
    pub fn picture(&self) -> Option<&str> {
        match self.claims.get("picture")? {
            Value::String(url) => Some(url),
            Value::Object(picture) => picture.get("url").and_then(Value::as_str),
            _ => None,
        }
    }

    fn str_claim(&self, key: &str) -> Option<&str> {
        self.claims.get(key).and_then(Value::as_str)
    }
}

impl Serialize for ResourceOwner {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.claims.serialize(serializer)
    }
}
