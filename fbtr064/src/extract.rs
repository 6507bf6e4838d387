//! Best-effort flat tag extractor for TR-064 action responses.
//!
//! Values are located by literal substring search on the tag name. This only
//! works for the flat, non-repeating `New*` argument lists the device returns
//! and must not be used as a general XML reader.

use crate::errors::Tr064Error;
use crate::model::{DeviceData, FieldKind, FieldValue, TagSpec};

/// Extracts every field of `tags` from `body`.
///
/// Either all fields are found and converted, or an extraction error is
/// returned and nothing else.
pub fn extract(body: &str, tags: &TagSpec) -> Result<DeviceData, Tr064Error> {
    let mut data = DeviceData::default();

    for spec in tags.fields() {
        let raw = tag_text(body, &spec.tag).ok_or_else(|| {
            Tr064Error::extraction(format!("missing {} element in response body", spec.tag))
        })?;
        let value = coerce(&spec.tag, raw, spec.kind)?;
        data.insert(spec.field.clone(), value);
    }

    Ok(data)
}

/// Text between the `>` closing the first occurrence of `tag` and the `<`
/// opening the next occurrence of `tag`.
fn tag_text<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    if tag.is_empty() {
        return None;
    }
    let open = body.find(tag)? + tag.len();
    let start = open + body[open..].find('>')? + 1;
    let close = start + body[start..].find(tag)?;
    let end = body[..close].rfind('<')?;

    (end >= start).then(|| &body[start..end])
}

fn coerce(tag: &str, raw: &str, kind: FieldKind) -> Result<FieldValue, Tr064Error> {
    match kind {
        FieldKind::Integer => raw
            .trim()
            .parse::<i64>()
            .map(FieldValue::Integer)
            .map_err(|_| Tr064Error::extraction(format!("invalid {tag} value: {raw:?}"))),
        // TOGGLE and UNDEFINED collapse to 0 as well.
        FieldKind::OnOff => Ok(FieldValue::Integer(i64::from(raw == "ON"))),
        FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENERIC_DEVICE_INFOS_RESPONSE: &str = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
<s:Body>
<u:GetGenericDeviceInfosResponse xmlns:u="urn:dslforum-org:service:X_AVM-DE_Homeauto:1">
<NewAIN>11657 0240192</NewAIN>
<NewDeviceId>16</NewDeviceId>
<NewProductName>FRITZ!DECT 200</NewProductName>
<NewMultimeterIsEnabled>ENABLED</NewMultimeterIsEnabled>
<NewMultimeterPower>2315</NewMultimeterPower>
<NewMultimeterEnergy>107630</NewMultimeterEnergy>
<NewTemperatureCelsius>215</NewTemperatureCelsius>
<NewSwitchIsEnabled>ENABLED</NewSwitchIsEnabled>
<NewSwitchState>ON</NewSwitchState>
</u:GetGenericDeviceInfosResponse>
</s:Body>
</s:Envelope>"#;

    #[test]
    fn test_extract_smart_switch() {
        let data = extract(GENERIC_DEVICE_INFOS_RESPONSE, &TagSpec::smart_switch()).unwrap();
        assert_eq!(data.get_i64("power"), Some(2315));
        assert_eq!(data.get_i64("energy"), Some(107630));
        assert_eq!(data.get_i64("temperature"), Some(215));
        assert_eq!(data.get_i64("switchState"), Some(1));
        assert_eq!(data.len(), 4);
    }

    #[test]
    fn test_extract_minimal_body() {
        let body = "...<NewMultimeterPower>150</NewMultimeterPower><NewSwitchState>ON</NewSwitchState>...";
        let tags = TagSpec::new()
            .with_field("power", "NewMultimeterPower", FieldKind::Integer)
            .with_field("switchState", "NewSwitchState", FieldKind::OnOff);

        let data = extract(body, &tags).unwrap();
        assert_eq!(data.get_i64("power"), Some(150));
        assert_eq!(data.get_i64("switchState"), Some(1));
    }

    #[test]
    fn test_switch_state_is_two_valued() {
        let tags = TagSpec::new().with_field("switchState", "NewSwitchState", FieldKind::OnOff);
        for state in ["OFF", "TOGGLE", "UNDEFINED", "on", ""] {
            let body = format!("<NewSwitchState>{state}</NewSwitchState>");
            let data = extract(&body, &tags).unwrap();
            assert_eq!(data.get_i64("switchState"), Some(0), "state {state:?}");
        }
    }

    #[test]
    fn test_missing_tag_fails_without_partial_data() {
        let body = "<NewMultimeterPower>150</NewMultimeterPower>";
        let err = extract(body, &TagSpec::smart_switch()).unwrap_err();
        assert_eq!(err.kind(), "extraction");
        assert!(err.to_string().contains("NewMultimeterEnergy"));
    }

    #[test]
    fn test_unclosed_tag_fails() {
        let tags = TagSpec::new().with_field("power", "NewMultimeterPower", FieldKind::Integer);
        assert!(extract("<NewMultimeterPower>150", &tags).is_err());
    }

    #[test]
    fn test_non_numeric_integer_fails() {
        let tags = TagSpec::new().with_field("power", "NewMultimeterPower", FieldKind::Integer);
        let err = extract("<NewMultimeterPower>n/a</NewMultimeterPower>", &tags).unwrap_err();
        assert_eq!(err.kind(), "extraction");
    }

    #[test]
    fn test_negative_and_padded_integers() {
        let tags = TagSpec::new().with_field("temperature", "NewTemperatureCelsius", FieldKind::Integer);
        let data = extract("<NewTemperatureCelsius> -35 </NewTemperatureCelsius>", &tags).unwrap();
        assert_eq!(data.get_i64("temperature"), Some(-35));
    }

    #[test]
    fn test_text_field_and_empty_element() {
        let tags = TagSpec::new()
            .with_field("name", "NewProductName", FieldKind::Text)
            .with_field("firmware", "NewFirmwareVersion", FieldKind::Text);
        let body = "<NewProductName>FRITZ!DECT 200</NewProductName><NewFirmwareVersion></NewFirmwareVersion>";

        let data = extract(body, &tags).unwrap();
        assert_eq!(data.get("name").and_then(FieldValue::as_str), Some("FRITZ!DECT 200"));
        assert_eq!(data.get("firmware").and_then(FieldValue::as_str), Some(""));
    }

    #[test]
    fn test_prefixed_tags() {
        let tags = TagSpec::new().with_field("power", "NewMultimeterPower", FieldKind::Integer);
        let data = extract("<u:NewMultimeterPower>42</u:NewMultimeterPower>", &tags).unwrap();
        assert_eq!(data.get_i64("power"), Some(42));
    }
}
