//! Two-phase TR-064 action call.
//!
//! The first POST goes out without credentials. A FritzBox answers it either
//! with the action result (session already authenticated) or with a 401
//! carrying a `Digest realm=...` challenge; in the latter case a second POST
//! with the same envelope and an `Authorization` header is issued and its
//! body is extracted instead.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, bounded};
use tracing::{debug, warn};

use crate::digest::{
    DIGEST_REALM_KEY, DigestAuthContext, DigestChallenge, authorization_header, compute_response,
};
use crate::errors::{CallResult, Tr064Error};
use crate::extract::extract;
use crate::model::{ActionSpec, ConnectionTarget, Credentials, TagSpec};
use crate::soap::{CONTENT_TYPE, build_soap_envelope, soap_action_header};
use crate::transport::{HttpRequest, Transport};

pub const ACTION_METHOD: &str = "POST";

/// Unauthenticated request for `action`.
pub fn build_action_request(action: &ActionSpec) -> HttpRequest {
    let body = build_soap_envelope(action);
    HttpRequest {
        path: action.event_sub_url.clone(),
        headers: vec![
            ("Content-Type".to_string(), CONTENT_TYPE.to_string()),
            ("Content-Length".to_string(), body.len().to_string()),
            ("SoapAction".to_string(), soap_action_header(action)),
        ],
        body,
    }
}

/// Client bound to one device.
///
/// Every call owns its request values and digest context, so a client can be
/// shared between threads and reused with different credentials.
pub struct Tr064Client<T> {
    target: ConnectionTarget,
    transport: Arc<T>,
    client_nonce: Option<String>,
}

impl<T> Clone for Tr064Client<T> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            transport: Arc::clone(&self.transport),
            client_nonce: self.client_nonce.clone(),
        }
    }
}

impl<T: Transport> Tr064Client<T> {
    pub fn new(target: ConnectionTarget, transport: T) -> Self {
        Self {
            target,
            transport: Arc::new(transport),
            client_nonce: None,
        }
    }

    /// Uses `client_nonce` instead of a random one for every call.
    pub fn with_client_nonce(mut self, client_nonce: impl Into<String>) -> Self {
        self.client_nonce = Some(client_nonce.into());
        self
    }

    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Invokes `action` and extracts `tags` from the final response body.
    pub fn call_action(
        &self,
        action: &ActionSpec,
        tags: &TagSpec,
        credentials: &Credentials,
    ) -> CallResult {
        let result = self.handshake(action, tags, credentials);

        if let Err(err) = &result {
            warn!(
                kind = err.kind(),
                action = %action.action_name,
                host = %self.target.host,
                error = %err,
                "TR-064 action call failed"
            );
        }
        result
    }

    fn handshake(
        &self,
        action: &ActionSpec,
        tags: &TagSpec,
        credentials: &Credentials,
    ) -> CallResult {
        let request = build_action_request(action);

        debug!(path = %request.path, action = %action.action_name, "Sending unauthenticated request");
        let first = self.transport.send_post(&self.target, &request)?;

        let Some(challenge_value) = first.find_header_value(DIGEST_REALM_KEY) else {
            debug!(status = first.status, "No digest challenge, using first response");
            return extract(&first.body, tags);
        };

        let challenge = DigestChallenge::parse(challenge_value)?;
        let ctx = self.auth_context();
        let response = compute_response(
            credentials,
            &challenge,
            ACTION_METHOD,
            &action.event_sub_url,
            &ctx,
        );
        let authorized = request.with_header(
            "Authorization",
            authorization_header(credentials, &challenge, &action.event_sub_url, &ctx, &response),
        );

        debug!(realm = %challenge.realm, "Sending authenticated request");
        let second = self.transport.send_post(&self.target, &authorized)?;

        if !(200..300).contains(&second.status) {
            warn!(status = second.status, "Authenticated request not accepted");
        }
        extract(&second.body, tags)
    }

    fn auth_context(&self) -> DigestAuthContext {
        match &self.client_nonce {
            Some(cnonce) => DigestAuthContext::with_client_nonce(cnonce.clone()),
            None => DigestAuthContext::fresh(),
        }
    }
}

impl<T: Transport + Send + Sync + 'static> Tr064Client<T> {
    /// Runs [`Tr064Client::call_action`] on its own thread.
    ///
    /// The receiver gets exactly one result.
    pub fn spawn_call(
        &self,
        action: ActionSpec,
        tags: TagSpec,
        credentials: Credentials,
    ) -> Receiver<CallResult> {
        let (tx, rx) = bounded(1);
        let client = self.clone();
        let fallback = tx.clone();

        let spawned = thread::Builder::new()
            .name("fbtr064-call".to_string())
            .spawn(move || {
                let result = client.call_action(&action, &tags, &credentials);
                let _ = tx.send(result);
            });

        if let Err(e) = spawned {
            let _ = fallback.send(Err(Tr064Error::transport(format!(
                "cannot start call thread: {e}"
            ))));
        }
        rx
    }
}
