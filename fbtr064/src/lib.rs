//! # fbtr064 - TR-064 action client for AVM FritzBox devices
//!
//! Invokes a SOAP action over HTTP, answering the FritzBox digest challenge
//! when the device asks for one, and pulls a fixed set of values out of the
//! response.
//!
//! ## Example
//!
//! ```no_run
//! use fbtr064::{ActionSpec, ConnectionTarget, Credentials, TagSpec, Tr064Client, UreqTransport};
//!
//! let client = Tr064Client::new(
//!     ConnectionTarget::new("192.168.178.1", 49000),
//!     UreqTransport::default(),
//! );
//! let data = client.call_action(
//!     &ActionSpec::generic_device_infos(0),
//!     &TagSpec::smart_switch(),
//!     &Credentials::new("smarthome", "secret"),
//! )?;
//! println!("power: {:?}", data.get_i64("power"));
//! # Ok::<(), fbtr064::Tr064Error>(())
//! ```

pub mod client;
pub mod config_ext;
pub mod digest;
pub mod errors;
pub mod extract;
pub mod model;
pub mod soap;
pub mod transport;

pub use client::{Tr064Client, build_action_request};
pub use config_ext::Tr064ConfigExt;
pub use digest::{DigestAuthContext, DigestChallenge};
pub use errors::{CallResult, Tr064Error};
pub use extract::extract;
pub use model::{
    ActionSpec, ConnectionTarget, Credentials, DeviceData, FieldKind, FieldSpec, FieldValue,
    TagSpec,
};
pub use soap::build_soap_envelope;
pub use transport::{HttpRequest, HttpResponse, RawHeader, Transport, UreqTransport};
