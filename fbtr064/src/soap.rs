//! Construction des requêtes SOAP TR-064
//!
//! L'enveloppe est produite textuellement : les arguments de l'action sont
//! déjà un fragment XML et sont insérés tels quels, sans échappement.

use crate::model::ActionSpec;

pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP_ENCODING_STYLE: &str = "http://schemas.xmlsoap.org/soap/encoding/";

pub const CONTENT_TYPE: &str = r#"text/xml; charset="utf-8""#;

/// Construit le corps SOAP 1.1 d'une requête d'action
///
/// # Arguments
///
/// * `action` - Action à invoquer (nom, URN du service, arguments XML)
///
/// # Returns
///
/// L'enveloppe XML complète, identique octet pour octet pour une même action
pub fn build_soap_envelope(action: &ActionSpec) -> String {
    format!(
        "<?xml version='1.0' encoding='utf-8'?>\
         <s:Envelope s:encodingStyle='{encoding}' xmlns:s='{ns}'>\
         <s:Body>\
         <u:{name} xmlns:u='{service}'>{args}</u:{name}>\
         </s:Body>\
         </s:Envelope>",
        encoding = SOAP_ENCODING_STYLE,
        ns = SOAP_ENVELOPE_NS,
        name = action.action_name,
        service = action.service_type,
        args = action.arguments_xml,
    )
}

/// Valeur de l'en-tête `SoapAction` : "urn:service#Action", sans guillemets
pub fn soap_action_header(action: &ActionSpec) -> String {
    format!("{}#{}", action.service_type, action.action_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_envelope_layout() {
        let action = ActionSpec::generic_device_infos(0);
        let xml = build_soap_envelope(&action);

        assert_eq!(
            xml,
            "<?xml version='1.0' encoding='utf-8'?>\
             <s:Envelope s:encodingStyle='http://schemas.xmlsoap.org/soap/encoding/' \
             xmlns:s='http://schemas.xmlsoap.org/soap/envelope/'>\
             <s:Body>\
             <u:GetGenericDeviceInfos xmlns:u='urn:dslforum-org:service:X_AVM-DE_Homeauto:1'>\
             <u:NewIndex>0</u:NewIndex>\
             </u:GetGenericDeviceInfos>\
             </s:Body>\
             </s:Envelope>"
        );
    }

    #[test]
    fn test_build_envelope_is_deterministic() {
        let action = ActionSpec::generic_device_infos(2);
        assert_eq!(build_soap_envelope(&action), build_soap_envelope(&action));
    }

    #[test]
    fn test_arguments_are_not_escaped() {
        let action = ActionSpec::new(
            "/upnp/control/deviceinfo",
            "urn:dslforum-org:service:DeviceInfo:1",
            "GetInfo",
            "",
        );
        let xml = build_soap_envelope(&action);
        assert!(xml.contains("<u:GetInfo xmlns:u='urn:dslforum-org:service:DeviceInfo:1'></u:GetInfo>"));

        let raw = ActionSpec::new("/x", "urn:x", "Set", "<u:A>1</u:A><u:B>&amp;</u:B>");
        assert!(build_soap_envelope(&raw).contains("<u:A>1</u:A><u:B>&amp;</u:B>"));
    }

    #[test]
    fn test_soap_action_header() {
        let action = ActionSpec::generic_device_infos(0);
        assert_eq!(
            soap_action_header(&action),
            "urn:dslforum-org:service:X_AVM-DE_Homeauto:1#GetGenericDeviceInfos"
        );
    }
}
