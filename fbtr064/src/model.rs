use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

pub const HOMEAUTO_EVENT_SUB_URL: &str = "/upnp/control/x_homeauto";
pub const HOMEAUTO_SERVICE_TYPE: &str = "urn:dslforum-org:service:X_AVM-DE_Homeauto:1";
pub const GENERIC_DEVICE_INFOS_ACTION: &str = "GetGenericDeviceInfos";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
}

impl ConnectionTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Username/password pair supplied for a single call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// SOAP action invoked on the device.
///
/// `arguments_xml` is inserted verbatim inside the action element, so it must
/// already be valid XML.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionSpec {
    pub event_sub_url: String,
    pub service_type: String,
    pub action_name: String,
    pub arguments_xml: String,
}

impl ActionSpec {
    pub fn new(
        event_sub_url: impl Into<String>,
        service_type: impl Into<String>,
        action_name: impl Into<String>,
        arguments_xml: impl Into<String>,
    ) -> Self {
        Self {
            event_sub_url: event_sub_url.into(),
            service_type: service_type.into(),
            action_name: action_name.into(),
            arguments_xml: arguments_xml.into(),
        }
    }

    /// `X_AVM-DE_Homeauto#GetGenericDeviceInfos` for the smart home device at `index`.
    pub fn generic_device_infos(index: u32) -> Self {
        Self::new(
            HOMEAUTO_EVENT_SUB_URL,
            HOMEAUTO_SERVICE_TYPE,
            GENERIC_DEVICE_INFOS_ACTION,
            format!("<u:NewIndex>{index}</u:NewIndex>"),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// Base-10 integer.
    Integer,
    /// `ON` is 1, anything else (`OFF`, `TOGGLE`, `UNDEFINED`...) is 0.
    OnOff,
    /// Raw text between the tags.
    Text,
}

impl FieldKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "integer" | "int" => Some(FieldKind::Integer),
            "onoff" | "on_off" | "switch" => Some(FieldKind::OnOff),
            "text" | "string" => Some(FieldKind::Text),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: String,
    pub tag: String,
    pub kind: FieldKind,
}

/// Ordered set of fields to pull out of an action response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagSpec {
    fields: Vec<FieldSpec>,
}

impl TagSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, field: &str, tag: &str, kind: FieldKind) -> Self {
        self.push(field, tag, kind);
        self
    }

    pub fn push(&mut self, field: &str, tag: &str, kind: FieldKind) {
        self.fields.push(FieldSpec {
            field: field.to_string(),
            tag: tag.to_string(),
            kind,
        });
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Telemetry of a FRITZ!DECT smart switch as returned by `GetGenericDeviceInfos`.
    pub fn smart_switch() -> Self {
        Self::new()
            // 1/100 W
            .with_field("power", "NewMultimeterPower", FieldKind::Integer)
            // Wh
            .with_field("energy", "NewMultimeterEnergy", FieldKind::Integer)
            // 1/10 °C
            .with_field("temperature", "NewTemperatureCelsius", FieldKind::Integer)
            .with_field("switchState", "NewSwitchState", FieldKind::OnOff)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl FieldValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Integer(_) => None,
        }
    }
}

/// Values extracted from one response, keyed by field name in tag spec order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DeviceData(IndexMap<String, FieldValue>);

impl DeviceData {
    pub(crate) fn insert(&mut self, field: String, value: FieldValue) {
        self.0.insert(field, value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(FieldValue::as_i64)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}
