/*
 * Responsibility
 * - Login/refresh response JSON -> ExtractedAuth {token, user, raw}
 * - The backend has answered with several shapes over time; every location we
 *   know about is listed in TokenField/UserField, in priority order.
 * - Pure: never fails, never touches storage.
 */
use serde_json::Value;

use crate::dto::auth::AuthRecord;
use crate::services::normalize::normalize;
use crate::services::value::{lookup, text};

/// Where a token can live in a login response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenField {
    // { "token": "..." }
    Token,
    // { "access_token": "..." }
    AccessToken,
    // { "accessToken": "..." }
    AccessTokenCamel,
    // { "data": { "token": "..." } }
    DataToken,
    // Sanctum: { "token": { "plainTextToken": "..." } }
    PlainTextToken,
}

impl TokenField {
    pub const PRIORITY: [TokenField; 5] = [
        TokenField::Token,
        TokenField::AccessToken,
        TokenField::AccessTokenCamel,
        TokenField::DataToken,
        TokenField::PlainTextToken,
    ];

    pub fn path(self) -> &'static [&'static str] {
        match self {
            TokenField::Token => &["token"],
            TokenField::AccessToken => &["access_token"],
            TokenField::AccessTokenCamel => &["accessToken"],
            TokenField::DataToken => &["data", "token"],
            TokenField::PlainTextToken => &["token", "plainTextToken"],
        }
    }

    fn lookup(self, payload: &Value) -> Option<String> {
        text(lookup(payload, self.path()))
    }
}

/// Where a user object can live in a login or user response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    User,
    DataUser,
    Data,
}

impl UserField {
    pub const PRIORITY: [UserField; 3] = [UserField::User, UserField::DataUser, UserField::Data];

    pub fn path(self) -> &'static [&'static str] {
        match self {
            UserField::User => &["user"],
            UserField::DataUser => &["data", "user"],
            UserField::Data => &["data"],
        }
    }

    fn lookup(self, payload: &Value) -> Option<&Value> {
        lookup(payload, self.path()).filter(|v| v.is_object())
    }
}

/// Which known response variant a payload matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Login { token: TokenField, user: UserField },
    TokenOnly(TokenField),
    UserOnly(UserField),
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedAuth {
    pub token: Option<String>,
    pub user: Option<Value>,
    pub raw: Value,
    pub shape: PayloadShape,
}

impl ExtractedAuth {
    /// Runs the user through the normalizer and drops the shape tag.
    pub fn into_record(self) -> AuthRecord {
        AuthRecord {
            token: self.token,
            user: self.user.as_ref().and_then(normalize),
            raw: self.raw,
        }
    }
}

pub fn extract(payload: Value) -> ExtractedAuth {
    let token = TokenField::PRIORITY
        .into_iter()
        .find_map(|f| f.lookup(&payload).map(|t| (f, t)));
    let user = UserField::PRIORITY
        .into_iter()
        .find_map(|f| f.lookup(&payload).map(|u| (f, u.clone())));

    let shape = match (&token, &user) {
        (Some((t, _)), Some((u, _))) => PayloadShape::Login { token: *t, user: *u },
        (Some((t, _)), None) => PayloadShape::TokenOnly(*t),
        (None, Some((u, _))) => PayloadShape::UserOnly(*u),
        (None, None) => PayloadShape::Unrecognized,
    };

    ExtractedAuth {
        token: token.map(|(_, t)| t),
        user: user.map(|(_, u)| u),
        raw: payload,
        shape,
    }
}

/// User object inside a `GET`/`PATCH /api/users/{id}` response, falling back
/// to the whole payload when it is not wrapped.
pub fn unwrap_user_response(payload: &Value) -> &Value {
    UserField::PRIORITY
        .into_iter()
        .find_map(|f| f.lookup(payload))
        .unwrap_or(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_is_found_in_every_known_location() {
        let cases = [
            (json!({"token": "a"}), TokenField::Token),
            (json!({"access_token": "a"}), TokenField::AccessToken),
            (json!({"accessToken": "a"}), TokenField::AccessTokenCamel),
            (json!({"token": {"plainTextToken": "a"}}), TokenField::PlainTextToken),
        ];
        for (payload, field) in cases {
            let extracted = extract(payload);
            assert_eq!(extracted.token.as_deref(), Some("a"));
            assert_eq!(extracted.user, None);
            assert_eq!(extracted.shape, PayloadShape::TokenOnly(field));
        }
    }

    #[test]
    fn data_token_also_makes_data_the_user() {
        let extracted = extract(json!({"data": {"token": "a"}}));
        assert_eq!(extracted.token.as_deref(), Some("a"));
        assert_eq!(extracted.user, Some(json!({"token": "a"})));
        assert_eq!(
            extracted.shape,
            PayloadShape::Login {
                token: TokenField::DataToken,
                user: UserField::Data,
            }
        );
    }

    #[test]
    fn missing_token_yields_none() {
        let extracted = extract(json!({"message": "ok", "token": null, "data": {"token": ""}}));
        assert_eq!(extracted.token, None);
        assert_eq!(extracted.shape, PayloadShape::UserOnly(UserField::Data));

        let extracted = extract(json!("nope"));
        assert_eq!(extracted.token, None);
        assert_eq!(extracted.user, None);
        assert_eq!(extracted.shape, PayloadShape::Unrecognized);
    }

    #[test]
    fn earlier_locations_win() {
        let extracted = extract(json!({"access_token": "second", "token": "first"}));
        assert_eq!(extracted.token.as_deref(), Some("first"));

        let extracted = extract(json!({
            "data": {"token": "wrapped", "user": {"id": 2}},
            "accessToken": "camel"
        }));
        assert_eq!(extracted.token.as_deref(), Some("camel"));
        assert_eq!(extracted.user, Some(json!({"id": 2})));
    }

    #[test]
    fn user_falls_back_to_data() {
        let extracted = extract(json!({"data": {"id": 5, "role": "stylist"}}));
        assert_eq!(extracted.user, Some(json!({"id": 5, "role": "stylist"})));
        assert_eq!(extracted.shape, PayloadShape::UserOnly(UserField::Data));
    }

    #[test]
    fn raw_payload_is_kept_unchanged() {
        let payload = json!({"access_token": "t", "user": {"id": 1}, "expires_in": 3600});
        let extracted = extract(payload.clone());
        assert_eq!(extracted.raw, payload);
    }

    #[test]
    fn login_payload_normalizes_nested_client() {
        let record = extract(json!({
            "access_token": "t1",
            "user": {"id": 1, "role": "client", "client": {"telefono": "555"}}
        }))
        .into_record();

        assert_eq!(record.token.as_deref(), Some("t1"));
        let user = record.user.unwrap();
        assert_eq!(user.phone(), "555");
        assert_eq!(user.telefono(), "555");
    }

    #[test]
    fn user_response_unwraps_or_falls_back() {
        let wrapped = json!({"data": {"user": {"id": 1}}});
        assert_eq!(unwrap_user_response(&wrapped), &json!({"id": 1}));

        let bare = json!({"id": 4, "name": "x"});
        assert_eq!(unwrap_user_response(&bare), &bare);
    }
}
