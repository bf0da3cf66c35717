/*
 * Responsibility
 * - Backend user JSON -> NormalizedUser
 * - Fresh fetches return role relations nested (`client: {...}` / `stylist: {...}`),
 *   update responses return them flat. Both shapes are accepted here so callers
 *   never need to know which one arrived.
 */
use serde_json::{Map, Value};

use crate::dto::users::{NormalizedUser, Role, UserId};
use crate::services::value::{first_text, object, text};

pub const DEFAULT_STYLIST_STATUS: &str = "disponible";

/// Returns `None` for null/missing or non-object input.
pub fn normalize(raw: &Value) -> Option<NormalizedUser> {
    let data = raw.as_object()?;

    let role = text(data.get("role"))
        .map(|r| Role::parse(&r))
        .unwrap_or_default();

    let mut user = NormalizedUser::new(
        data.get("id").and_then(UserId::from_value),
        first_text(data, &["name", "nombre"]).unwrap_or_default(),
        text(data.get("email")).unwrap_or_default(),
        role,
    );
    user.created_at = first_text(data, &["created_at", "createdAt"]);

    match user.role {
        Role::Client => apply_client_fields(&mut user, data),
        Role::Stylist => apply_stylist_fields(&mut user, data),
        Role::Other(_) => {}
    }

    Some(user)
}

fn apply_client_fields(user: &mut NormalizedUser, data: &Map<String, Value>) {
    if let Some(client) = object(data.get("client")) {
        user.set_phone(text(client.get("telefono")).unwrap_or_default());
        user.direccion = Some(text(client.get("direccion")).unwrap_or_default());
        user.notas = Some(text(client.get("notas")).unwrap_or_default());
    } else {
        user.set_phone(first_text(data, &["phone", "telefono"]).unwrap_or_default());
        user.direccion = Some(first_text(data, &["direccion", "address"]).unwrap_or_default());
        user.notas = Some(text(data.get("notas")).unwrap_or_default());
    }
}

fn apply_stylist_fields(user: &mut NormalizedUser, data: &Map<String, Value>) {
    let (source, phone) = match object(data.get("stylist")) {
        Some(stylist) => (stylist, text(stylist.get("telefono"))),
        None => (data, first_text(data, &["phone", "telefono"])),
    };

    user.set_phone(phone.unwrap_or_default());
    user.especialidad = Some(text(source.get("especialidad")).unwrap_or_default());
    user.status = Some(
        text(source.get("status")).unwrap_or_else(|| DEFAULT_STYLIST_STATUS.to_string()),
    );
}
