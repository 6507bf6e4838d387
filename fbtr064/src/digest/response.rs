use super::{DigestAuthContext, DigestChallenge, md5_hex};
use crate::model::Credentials;

/// RFC 2617 `response` directive for `qop=auth`.
///
/// `uri` is the request path (the action's event sub URL), not the full URL.
pub fn compute_response(
    credentials: &Credentials,
    challenge: &DigestChallenge,
    method: &str,
    uri: &str,
    ctx: &DigestAuthContext,
) -> String {
    let ha1 = md5_hex(
        format!(
            "{}:{}:{}",
            credentials.username, challenge.realm, credentials.password
        )
        .as_bytes(),
    );
    let ha2 = md5_hex(format!("{method}:{uri}").as_bytes());

    md5_hex(
        format!(
            "{ha1}:{}:{}:{}:{}:{ha2}",
            challenge.nonce, ctx.nonce_count, ctx.client_nonce, challenge.qop
        )
        .as_bytes(),
    )
}

/// Value of the `Authorization` header sent with the second request.
pub fn authorization_header(
    credentials: &Credentials,
    challenge: &DigestChallenge,
    uri: &str,
    ctx: &DigestAuthContext,
    response: &str,
) -> String {
    format!(
        r#"Digest username="{}", realm="{}", nonce="{}", uri="{}", qop="{}", nc="{}", cnonce="{}", response="{}""#,
        credentials.username,
        challenge.realm,
        challenge.nonce,
        uri,
        challenge.qop,
        ctx.nonce_count,
        ctx.client_nonce,
        response,
    )
}
