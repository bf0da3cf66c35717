/*
 * Responsibility
 * - ProfileUpdate (form fields) -> PATCH body with the backend's field names
 * - The backend stores role data in separate relations, so the same form
 *   field maps differently per role (phone -> `telefono` for clients,
 *   `telefono_stylist` for stylists). Fields that do not belong to the
 *   role are dropped.
 */
use serde_json::{Map, Value};

use crate::dto::users::{ProfileUpdate, Role};

pub fn build_update_body(role: &Role, update: &ProfileUpdate) -> Map<String, Value> {
    let mut body = Map::new();
    let mut put = |key: &str, value: Option<&str>| {
        if let Some(v) = value {
            body.insert(key.to_string(), Value::String(v.to_string()));
        }
    };

    put("name", update.name.as_deref());
    put("email", update.email.as_deref());

    match role {
        Role::Client => {
            put("telefono", update.resolved_phone());
            put("direccion", update.direccion.as_deref());
            put("notas", update.notas.as_deref());
        }
        Role::Stylist => {
            put("telefono_stylist", update.resolved_phone());
            put("especialidad", update.especialidad.as_deref());
            put("status", update.status.as_deref());
        }
        Role::Other(_) => {}
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_never_sends_status() {
        let update = ProfileUpdate {
            status: Some("busy".into()),
            ..Default::default()
        };
        let body = build_update_body(&Role::Client, &update);
        assert!(body.is_empty());
    }

    #[test]
    fn client_fields_use_client_names() {
        let update = ProfileUpdate {
            name: Some("Ana".into()),
            phone: Some("555".into()),
            direccion: Some("Calle 1".into()),
            especialidad: Some("ignored".into()),
            ..Default::default()
        };
        let body = build_update_body(&Role::Client, &update);
        assert_eq!(
            Value::Object(body),
            json!({"name": "Ana", "telefono": "555", "direccion": "Calle 1"})
        );
    }

    #[test]
    fn stylist_phone_goes_to_stylist_relation() {
        let update = ProfileUpdate {
            telefono: Some("777".into()),
            status: Some("ocupado".into()),
            notas: Some("ignored".into()),
            ..Default::default()
        };
        let body = build_update_body(&Role::Stylist, &update);
        assert_eq!(
            Value::Object(body),
            json!({"telefono_stylist": "777", "status": "ocupado"})
        );
    }

    #[test]
    fn other_roles_only_send_account_fields() {
        let update = ProfileUpdate {
            email: Some("x@example.com".into()),
            phone: Some("1".into()),
            ..Default::default()
        };
        let body = build_update_body(&Role::Other("admin".into()), &update);
        assert_eq!(Value::Object(body), json!({"email": "x@example.com"}));
    }
}
