/*
 * Responsibility
 * - Client-side user model (NormalizedUser) and its identifiers/roles
 * - Partial profile update request (ProfileUpdate)
 * - Backend wire shapes are NOT modeled here (see services::normalize)
 */
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Backend user id. The API hands out numeric ids, but string ids are kept
/// verbatim so a backend migration does not log everyone out.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl UserId {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Number),
            Value::String(s) if !s.trim().is_empty() => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{}", n),
            UserId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Role {
    #[default]
    Client,
    Stylist,
    // Any other backend role (admin, etc.). Kept as-is, no role-specific fields.
    Other(String),
}

impl Role {
    pub fn parse(s: &str) -> Self {
        match s {
            "client" => Self::Client,
            "stylist" => Self::Stylist,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Client => "client",
            Role::Stylist => "stylist",
            Role::Other(s) => s,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Role::parse(&s))
    }
}

/// Flat client-side user.
///
/// `phone` and `telefono` are the same value exposed under two names; only
/// one copy is stored so they cannot diverge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedUser {
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: Option<String>,
    phone: String,
    pub direccion: Option<String>,
    pub notas: Option<String>,
    pub especialidad: Option<String>,
    pub status: Option<String>,
}

impl NormalizedUser {
    pub fn new(
        id: Option<UserId>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            role,
            ..Self::default()
        }
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn telefono(&self) -> &str {
        &self.phone
    }

    pub fn set_phone(&mut self, phone: impl Into<String>) {
        self.phone = phone.into();
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NormalizedUserWire<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a UserId>,
    name: &'a str,
    email: &'a str,
    role: &'a Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<&'a str>,
    phone: &'a str,
    telefono: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    direccion: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notas: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    especialidad: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
}

impl Serialize for NormalizedUser {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NormalizedUserWire {
            id: self.id.as_ref(),
            name: &self.name,
            email: &self.email,
            role: &self.role,
            created_at: self.created_at.as_deref(),
            phone: &self.phone,
            telefono: &self.phone,
            direccion: self.direccion.as_deref(),
            notas: self.notas.as_deref(),
            especialidad: self.especialidad.as_deref(),
            status: self.status.as_deref(),
        }
        .serialize(serializer)
    }
}

/// Generic partial profile update coming from a form.
///
/// Which fields reach the backend (and under which names) depends on the
/// current user's role; see `services::session::update`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub notas: Option<String>,
    pub especialidad: Option<String>,
    pub status: Option<String>,
}

impl ProfileUpdate {
    /// `phone` wins over `telefono` unless it is empty.
    pub fn resolved_phone(&self) -> Option<&str> {
        match (self.phone.as_deref(), self.telefono.as_deref()) {
            (Some(p), _) if !p.is_empty() => Some(p),
            (_, Some(t)) => Some(t),
            (p, None) => p,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn phone_aliases_serialize_together() {
        let mut user = NormalizedUser::new(
            Some(UserId::Number(7)),
            "Ana",
            "ana@example.com",
            Role::Client,
        );
        user.set_phone("555-0101");

        let v = serde_json::to_value(&user).unwrap();
        assert_eq!(v["phone"], json!("555-0101"));
        assert_eq!(v["telefono"], json!("555-0101"));
        assert_eq!(v["role"], json!("client"));
        assert!(v.get("especialidad").is_none());
    }

    #[test]
    fn user_id_accepts_numbers_and_strings() {
        assert_eq!(UserId::from_value(&json!(12)), Some(UserId::Number(12)));
        assert_eq!(
            UserId::from_value(&json!("u-12")),
            Some(UserId::Text("u-12".into()))
        );
        assert_eq!(UserId::from_value(&json!("  ")), None);
        assert_eq!(UserId::from_value(&json!(null)), None);
        assert_eq!(UserId::Number(3).to_string(), "3");
    }

    #[test]
    fn unknown_roles_are_kept_verbatim() {
        assert_eq!(Role::parse("admin"), Role::Other("admin".into()));
        assert_eq!(Role::parse("admin").as_str(), "admin");
        assert_eq!(Role::default(), Role::Client);
    }

    #[test]
    fn resolved_phone_prefers_non_empty_phone() {
        let update = ProfileUpdate {
            phone: Some(String::new()),
            telefono: Some("123".into()),
            ..Default::default()
        };
        assert_eq!(update.resolved_phone(), Some("123"));

        let update = ProfileUpdate {
            phone: Some("999".into()),
            telefono: Some("123".into()),
            ..Default::default()
        };
        assert_eq!(update.resolved_phone(), Some("999"));

        assert_eq!(ProfileUpdate::default().resolved_phone(), None);
    }
}
