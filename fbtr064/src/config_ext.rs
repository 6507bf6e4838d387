//! Extension pour intégrer la configuration TR-064 dans fbconfig
//!
//! Ce module fournit le trait `Tr064ConfigExt` qui construit les valeurs
//! attendues par [`Tr064Client`](crate::Tr064Client) à partir de
//! `fbconfig::Config`.

use std::time::Duration;

use anyhow::{Result, anyhow};
use fbconfig::Config;
use serde_yaml::Value;

use crate::model::{ActionSpec, ConnectionTarget, Credentials, FieldKind, TagSpec};

/// Trait d'extension pour ajouter la configuration TR-064 à fbconfig
///
/// # Exemple
///
/// ```rust,ignore
/// use fbconfig::get_config;
/// use fbtr064::Tr064ConfigExt;
///
/// let config = get_config();
/// let target = config.get_connection_target()?;
/// let action = config.get_action_spec()?;
/// ```
pub trait Tr064ConfigExt {
    fn get_connection_target(&self) -> Result<ConnectionTarget>;

    fn get_credentials(&self) -> Result<Credentials>;

    /// Action SOAP configurée sous `action` (défaut : GetGenericDeviceInfos, index 0)
    fn get_action_spec(&self) -> Result<ActionSpec>;

    /// Champs à extraire, lus depuis la séquence `action.tags`
    fn get_tag_spec(&self) -> Result<TagSpec>;

    fn get_request_timeout(&self) -> Result<Duration>;
}

impl Tr064ConfigExt for Config {
    fn get_connection_target(&self) -> Result<ConnectionTarget> {
        Ok(ConnectionTarget::new(
            self.get_device_host()?,
            self.get_device_port()?,
        ))
    }

    fn get_credentials(&self) -> Result<Credentials> {
        Ok(Credentials::new(
            self.get_device_username()?,
            self.get_device_password()?,
        ))
    }

    fn get_action_spec(&self) -> Result<ActionSpec> {
        let default = ActionSpec::generic_device_infos(0);
        Ok(ActionSpec::new(
            string_or(self, &["action", "event_sub_url"], &default.event_sub_url),
            string_or(self, &["action", "service_type"], &default.service_type),
            string_or(self, &["action", "action_name"], &default.action_name),
            string_or(self, &["action", "arguments"], &default.arguments_xml),
        ))
    }

    fn get_tag_spec(&self) -> Result<TagSpec> {
        let entries = match self.get_value(&["action", "tags"]) {
            Ok(Value::Sequence(entries)) => entries,
            Ok(Value::Null) | Err(_) => return Ok(TagSpec::smart_switch()),
            Ok(_) => return Err(anyhow!("action.tags must be a list")),
        };

        let mut tags = TagSpec::new();
        for (i, entry) in entries.iter().enumerate() {
            let field = entry_str(entry, "field")
                .ok_or_else(|| anyhow!("action.tags[{i}] has no field name"))?;
            let tag = entry_str(entry, "tag").unwrap_or(field);
            let kind = match entry_str(entry, "kind") {
                Some(name) => FieldKind::from_name(name)
                    .ok_or_else(|| anyhow!("action.tags[{i}]: unknown kind {name:?}"))?,
                None => FieldKind::Text,
            };
            tags.push(field, tag, kind);
        }

        if tags.is_empty() {
            return Err(anyhow!("action.tags is empty"));
        }
        Ok(tags)
    }

    fn get_request_timeout(&self) -> Result<Duration> {
        Ok(Duration::from_secs(self.get_timeout_secs()?))
    }
}

fn string_or(config: &Config, path: &[&str], default: &str) -> String {
    match config.get_value(path) {
        Ok(Value::String(s)) => s,
        Ok(Value::Number(n)) => n.to_string(),
        _ => default.to_string(),
    }
}

fn entry_str<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry.get(key).and_then(Value::as_str)
}
