/*!
# xmpp-stanzas — typed views over the XMPP stanza vocabulary

Schemas for the top-level stanza kinds of RFC 6120 (`<message/>`,
`<presence/>`, `<iq/>`), their error replies, and the machinery around
them: the closed stanza-error condition registry, the `<query/>`
request payload, and correlation of Iq replies with their requests.

Each stanza kind is a [`velement::Entity`]: decoding consumes a
[`minidom::Element`] and validates it against a static descriptor
table, encoding builds a fresh element from the typed fields. Strict
where the protocol is strict (Iq and error types), lenient where it is
advisory (message and presence types).
*/

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![forbid(unsafe_code)]

pub mod correlation;
pub mod iq;
pub mod message;
pub mod ns;
pub mod presence;
pub mod query;
pub mod stanza;
pub mod stanza_error;

pub use minidom::Element;

pub use jid::{BareJid, FullJid, Jid};

pub use velement::{Entity, Error, FromElementError};

pub use crate::correlation::{Correlated, ReplyToken, ReplyTracker};
pub use crate::iq::{Iq, IqType};
pub use crate::message::Message;
pub use crate::presence::Presence;
pub use crate::query::Query;
pub use crate::stanza::{make_id, ErrorStanza, Stanza};
pub use crate::stanza_error::{DefinedCondition, ErrorType, Fault, StanzaError};
