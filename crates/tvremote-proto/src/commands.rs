//! Command envelope builders.
//!
//! Builders are pure: they only construct envelopes. The caller supplies a
//! sequence discriminator that becomes part of the request id, so repeated
//! calls with different discriminators yield envelopes differing only in `id`.

use serde_json::{Map, Value, json};

use crate::OutboundEnvelope;

/// Application manager capability that starts an app.
pub const LAUNCH_URI: &str = "ssap://com.webos.applicationManager/launch";

/// App id of the factory (service) menu.
pub const FACTORY_APP_ID: &str = "com.webos.app.factorywin";

/// Id prefix of service-menu requests.
pub const SERVICE_MENU_ID_PREFIX: &str = "show_service_menu";

/// Build a request id from a prefix and a sequence discriminator.
pub fn request_id(prefix: &str, seq: u32) -> String {
    format!("{prefix}_{seq}")
}

/// Launch `app_id`, optionally passing launch `params`.
pub fn launch(id_prefix: &str, seq: u32, app_id: &str, params: Option<Value>) -> OutboundEnvelope {
    let mut payload = Map::new();
    payload.insert("id".to_string(), Value::from(app_id));
    if let Some(params) = params {
        payload.insert("params".to_string(), params);
    }

    OutboundEnvelope::request(request_id(id_prefix, seq), LAUNCH_URI, Value::Object(payload))
}

/// Open the factory service menu.
pub fn service_menu(seq: u32) -> OutboundEnvelope {
    launch(
        SERVICE_MENU_ID_PREFIX,
        seq,
        FACTORY_APP_ID,
        Some(json!({"id": "executeFactory", "irKey": "inStart"})),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_menu_wire_shape() {
        insta::assert_snapshot!(
            service_menu(0).encode().unwrap(),
            @r#"{"id":"show_service_menu_0","type":"request","uri":"ssap://com.webos.applicationManager/launch","payload":{"id":"com.webos.app.factorywin","params":{"id":"executeFactory","irKey":"inStart"}}}"#
        );
    }

    #[test]
    fn launch_without_params_omits_them() {
        let envelope = launch("netflix", 3, "netflix", None);

        assert_eq!(envelope.id(), "netflix_3");
        assert_eq!(envelope.uri(), Some(LAUNCH_URI));
        assert_eq!(envelope.payload(), &json!({"id": "netflix"}));
    }
}
