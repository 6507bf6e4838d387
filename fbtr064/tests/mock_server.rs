use std::net::TcpListener;
use std::time::Duration;

use fbtr064::digest::{DigestAuthContext, authorization_header, compute_response};
use fbtr064::{
    ActionSpec, ConnectionTarget, Credentials, DigestChallenge, TagSpec, Tr064Client,
    Tr064Error, UreqTransport, build_soap_envelope,
};
use mockito::{Matcher, Server};

const CONTROL_PATH: &str = "/upnp/control/x_homeauto";
const SOAP_ACTION: &str = "urn:dslforum-org:service:X_AVM-DE_Homeauto:1#GetGenericDeviceInfos";
const CHALLENGE: &str =
    r#"Digest realm="HTTPS Access", nonce="F758BB3FD5A8B9E5", algorithm=MD5, qop="auth""#;

const SWITCH_RESPONSE: &str = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
<s:Body>
<u:GetGenericDeviceInfosResponse xmlns:u="urn:dslforum-org:service:X_AVM-DE_Homeauto:1">
<NewMultimeterPower>0</NewMultimeterPower>
<NewMultimeterEnergy>53</NewMultimeterEnergy>
<NewTemperatureCelsius>230</NewTemperatureCelsius>
<NewSwitchState>OFF</NewSwitchState>
</u:GetGenericDeviceInfosResponse>
</s:Body>
</s:Envelope>"#;

fn target_of(server: &Server) -> ConnectionTarget {
    let host_with_port = server.host_with_port();
    let (host, port) = host_with_port
        .rsplit_once(':')
        .expect("mock server address");
    ConnectionTarget::new(host, port.parse().expect("mock server port"))
}

fn expected_authorization(credentials: &Credentials, cnonce: &str) -> String {
    let challenge = DigestChallenge::parse(CHALLENGE).unwrap();
    let ctx = DigestAuthContext::with_client_nonce(cnonce);
    let response = compute_response(credentials, &challenge, "POST", CONTROL_PATH, &ctx);
    authorization_header(credentials, &challenge, CONTROL_PATH, &ctx, &response)
}

#[test]
fn digest_handshake_against_http_server() {
    let mut server = Server::new();
    let action = ActionSpec::generic_device_infos(0);
    let credentials = Credentials::new("smarthome", "secret");

    let challenge = server
        .mock("POST", CONTROL_PATH)
        .match_header("authorization", Matcher::Missing)
        .match_header("soapaction", SOAP_ACTION)
        .match_header("content-type", r#"text/xml; charset="utf-8""#)
        .with_status(401)
        .with_header("WWW-Authenticate", CHALLENGE)
        .with_body("<HTML><HEAD><TITLE>401 Unauthorized</TITLE></HEAD></HTML>")
        .expect(1)
        .create();

    let authorized = server
        .mock("POST", CONTROL_PATH)
        .match_header(
            "authorization",
            expected_authorization(&credentials, "7581f986").as_str(),
        )
        .match_body(Matcher::Exact(build_soap_envelope(&action)))
        .with_status(200)
        .with_header("Content-Type", r#"text/xml; charset="utf-8""#)
        .with_body(SWITCH_RESPONSE)
        .expect(1)
        .create();

    let client = Tr064Client::new(target_of(&server), UreqTransport::default())
        .with_client_nonce("7581f986");
    let data = client
        .call_action(&action, &TagSpec::smart_switch(), &credentials)
        .unwrap();

    challenge.assert();
    authorized.assert();

    assert_eq!(data.get_i64("power"), Some(0));
    assert_eq!(data.get_i64("energy"), Some(53));
    assert_eq!(data.get_i64("temperature"), Some(230));
    assert_eq!(data.get_i64("switchState"), Some(0));

    let json = serde_json::to_string(&data).unwrap();
    assert_eq!(
        json,
        r#"{"power":0,"energy":53,"temperature":230,"switchState":0}"#
    );
}

#[test]
fn authenticated_session_needs_a_single_request() {
    let mut server = Server::new();

    let direct = server
        .mock("POST", CONTROL_PATH)
        .with_status(200)
        .with_body(SWITCH_RESPONSE)
        .expect(1)
        .create();

    let client = Tr064Client::new(target_of(&server), UreqTransport::default());
    let data = client
        .call_action(
            &ActionSpec::generic_device_infos(0),
            &TagSpec::smart_switch(),
            &Credentials::new("smarthome", "secret"),
        )
        .unwrap();

    direct.assert();
    assert_eq!(data.get_i64("temperature"), Some(230));
}

#[test]
fn oversized_body_is_a_transport_error() {
    let mut server = Server::new();
    let _huge = server
        .mock("POST", CONTROL_PATH)
        .with_status(200)
        .with_body("x".repeat(4096))
        .create();

    let client = Tr064Client::new(
        target_of(&server),
        UreqTransport::new(Duration::from_secs(5), 1024),
    );
    let err = client
        .call_action(
            &ActionSpec::generic_device_infos(0),
            &TagSpec::smart_switch(),
            &Credentials::new("smarthome", "secret"),
        )
        .unwrap_err();

    assert!(matches!(err, Tr064Error::Transport(_)));
}

#[test]
fn non_utf8_body_is_an_extraction_error() {
    let mut server = Server::new();
    let _garbled = server
        .mock("POST", CONTROL_PATH)
        .with_status(200)
        .with_body(vec![0x3c, 0x61, 0xff, 0xfe, 0x3e])
        .create();

    let client = Tr064Client::new(target_of(&server), UreqTransport::default());
    let err = client
        .call_action(
            &ActionSpec::generic_device_infos(0),
            &TagSpec::smart_switch(),
            &Credentials::new("smarthome", "secret"),
        )
        .unwrap_err();

    assert!(matches!(err, Tr064Error::Extraction(_)));
}

#[test]
fn unreachable_device_is_a_transport_error() {
    // Bind then drop a listener so the port is known to be closed.
    let target = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        ConnectionTarget::new("127.0.0.1", listener.local_addr().unwrap().port())
    };

    let client = Tr064Client::new(
        target,
        UreqTransport::new(Duration::from_secs(2), 1024 * 1024),
    );
    let err = client
        .call_action(
            &ActionSpec::generic_device_infos(0),
            &TagSpec::smart_switch(),
            &Credentials::new("smarthome", "secret"),
        )
        .unwrap_err();

    assert!(matches!(err, Tr064Error::Transport(_)));
}
