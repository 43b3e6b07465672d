//! Behaviour common to all stanza kinds: addressing, replies, and
//! error replies.

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::sync::atomic::{AtomicU64, Ordering};

use jid::Jid;
use minidom::Element;
use velement::fields::{Attr, Child};
use velement::{Entity, FromElementError};

use crate::ns;
use crate::stanza_error::StanzaError;

static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a stanza id unique for the lifetime of this process.
///
/// Uniqueness is what IQ correlation relies on, so this is a monotonic
/// counter rather than anything clever.
pub fn make_id() -> String {
    format!("rs-{}", ID_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Common behaviour of the top-level stanza kinds.
///
/// Every stanza can produce a reply addressed back at its sender, and
/// an error reply embedding a [`StanzaError`].
pub trait Stanza: Entity + Clone {
    /// The recipient of this stanza.
    fn to(&self) -> Option<&Jid>;

    /// The sender of this stanza.
    fn from(&self) -> Option<&Jid>;

    /// The identifier, unique on this stream, of this stanza.
    fn id(&self) -> Option<&str>;

    /// Build a reply to this stanza: `to`/`from` swapped, same id.
    ///
    /// The type is preserved unless the kind overrides it (an Iq reply
    /// is a `result`).
    fn reply(&self) -> Self;

    /// Build an error reply to this stanza.
    ///
    /// The reply is addressed back at the sender with `type="error"`
    /// and the same id, and carries this stanza's children followed by
    /// the `<error/>` element, so diagnostic context travels with the
    /// error.
    fn make_error(&self, error: StanzaError) -> ErrorStanza {
        let mut elem: Element = self.clone().into();
        ErrorStanza {
            name: Self::NAME.to_string(),
            to: self.from().cloned(),
            from: self.to().cloned(),
            id: self.id().map(String::from),
            lang: None,
            context: elem.take_contents_as_children().collect(),
            error,
        }
    }
}

/// An error reply for any stanza kind.
///
/// Unlike the concrete kinds this entity's element name is dynamic: it
/// mirrors the name of the stanza being answered.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorStanza {
    /// The element name of the stanza being answered.
    pub name: String,

    /// The recipient of this stanza.
    pub to: Option<Jid>,

    /// The sender of this stanza.
    pub from: Option<Jid>,

    /// The identifier of the stanza being answered.
    pub id: Option<String>,

    /// The language of this stanza.
    pub lang: Option<String>,

    /// The children of the stanza being answered, in their original
    /// order.
    pub context: Vec<Element>,

    /// The error itself.
    pub error: StanzaError,
}

impl ErrorStanza {
    const TO: Attr<Jid> = Attr::new("to");
    const FROM: Attr<Jid> = Attr::new("from");
    const ID: Attr<String> = Attr::new("id");
    const LANG: Attr<String> = Attr::new("xml:lang");
    const ERROR: Child<StanzaError> = Child::new();
}

impl TryFrom<Element> for ErrorStanza {
    type Error = FromElementError;

    fn try_from(mut elem: Element) -> Result<ErrorStanza, FromElementError> {
        if !ns::STREAM_NS.contains(&elem.ns().as_str()) || elem.attr("type") != Some("error") {
            return Err(FromElementError::Mismatch(elem));
        }
        let name = elem.name().to_string();
        let to = Self::TO.get(&elem)?;
        let from = Self::FROM.get(&elem)?;
        let id = Self::ID.get(&elem)?;
        let lang = Self::LANG.get(&elem)?;
        let error = Self::ERROR
            .get(&elem)?
            .ok_or(velement::Error::MissingChild("error"))?;
        let stream_ns = elem.ns();
        let context = elem
            .take_contents_as_children()
            .filter(|child| !child.is("error", stream_ns.as_str()))
            .collect();
        Ok(ErrorStanza {
            name,
            to,
            from,
            id,
            lang,
            context,
            error,
        })
    }
}

impl From<ErrorStanza> for Element {
    fn from(stanza: ErrorStanza) -> Element {
        let builder = Element::builder(stanza.name.as_str(), ns::DEFAULT_NS).attr("type", "error");
        let builder = ErrorStanza::TO.put(builder, stanza.to);
        let builder = ErrorStanza::FROM.put(builder, stanza.from);
        let builder = ErrorStanza::ID.put(builder, stanza.id);
        let builder = ErrorStanza::LANG.put(builder, stanza.lang);
        builder
            .append_all(stanza.context)
            .append(Element::from(stanza.error))
            .build()
    }
}
