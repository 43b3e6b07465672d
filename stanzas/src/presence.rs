// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::fmt;

use jid::Jid;
use minidom::{Element, IntoAttributeValue};
use velement::fields::{Attr, TextChild};
use velement::{Entity, FromElementError, FromXmlText, Namespaces};

use crate::ns;
use crate::stanza::Stanza;

/// Specifies the availability of an entity or resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Show {
    /// The entity or resource is temporarily away.
    Away,

    /// The entity or resource is actively interested in chatting.
    Chat,

    /// The entity or resource is busy (dnd = "Do Not Disturb").
    Dnd,

    /// The entity or resource is away for an extended period (xa =
    /// "eXtended Away").
    Xa,
}

impl Show {
    fn as_str(&self) -> &'static str {
        match self {
            Show::Away => "away",
            Show::Chat => "chat",
            Show::Dnd => "dnd",
            Show::Xa => "xa",
        }
    }
}

impl FromXmlText for Show {
    fn from_xml_text(s: String) -> Result<Show, velement::Error> {
        Ok(match s.as_str() {
            "away" => Show::Away,
            "chat" => Show::Chat,
            "dnd" => Show::Dnd,
            "xa" => Show::Xa,

            _ => return Err(velement::Error::Other("Invalid value for show.")),
        })
    }
}

impl fmt::Display for Show {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted values for the 'type' attribute of a presence.
///
/// Like message types, presence types are advisory: an
/// out-of-enumeration value degrades to the absence sentinel
/// [`Type::None`] instead of failing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum Type {
    /// This value is not an acceptable 'type' attribute, it is only
    /// used internally to signal the absence of 'type'. An absent type
    /// means the sender is available.
    #[default]
    None,

    /// An error has occurred regarding processing of a previously sent
    /// presence stanza.
    Error,

    /// A request for an entity's current presence.
    Probe,

    /// The sender wishes to subscribe to the recipient's presence.
    Subscribe,

    /// The sender has allowed the recipient to receive their presence.
    Subscribed,

    /// The sender is no longer available for communication.
    Unavailable,

    /// The sender is unsubscribing from the receiver's presence.
    Unsubscribe,

    /// The subscription request has been denied or a previously
    /// granted subscription has been canceled.
    Unsubscribed,
}

impl Type {
    /// The externally observed type of this presence.
    ///
    /// The absence sentinel is reported as `available`: that default
    /// is computed here, never stored or put on the wire.
    pub fn observed(&self) -> &'static str {
        match self {
            Type::None => "available",
            Type::Error => "error",
            Type::Probe => "probe",
            Type::Subscribe => "subscribe",
            Type::Subscribed => "subscribed",
            Type::Unavailable => "unavailable",
            Type::Unsubscribe => "unsubscribe",
            Type::Unsubscribed => "unsubscribed",
        }
    }
}

impl FromXmlText for Type {
    fn from_xml_text(s: String) -> Result<Type, velement::Error> {
        Ok(match s.as_str() {
            "error" => Type::Error,
            "probe" => Type::Probe,
            "subscribe" => Type::Subscribe,
            "subscribed" => Type::Subscribed,
            "unavailable" => Type::Unavailable,
            "unsubscribe" => Type::Unsubscribe,
            "unsubscribed" => Type::Unsubscribed,

            // "available" is how the absence of a type reads back, and
            // anything unknown degrades to the same sentinel.
            _ => Type::None,
        })
    }
}

impl IntoAttributeValue for Type {
    fn into_attribute_value(self) -> Option<String> {
        match self {
            Type::None => None,
            other => Some(String::from(other.observed())),
        }
    }
}

/// The main structure representing the `<presence/>` stanza.
#[derive(Debug, Clone, PartialEq)]
pub struct Presence {
    /// The sender of this presence.
    pub from: Option<Jid>,

    /// The recipient of this presence.
    pub to: Option<Jid>,

    /// The identifier, unique on this stream, of this presence.
    pub id: Option<String>,

    /// The type of this presence stanza.
    pub type_: Type,

    /// The language of this presence.
    pub lang: Option<String>,

    /// The availability of the sender of this presence.
    pub show: Option<Show>,

    /// A human-readable status set by the sender.
    pub status: Option<String>,

    /// The sender's resource priority; if negative it won't receive
    /// messages that haven't been directed to it.
    pub priority: Option<i8>,

    /// A list of extra payloads contained in this presence.
    pub payloads: Vec<Element>,
}

impl Presence {
    const FROM: Attr<Jid> = Attr::new("from");
    const TO: Attr<Jid> = Attr::new("to");
    const ID: Attr<String> = Attr::new("id");
    const TYPE: Attr<Type> = Attr::new("type");
    const LANG: Attr<String> = Attr::new("xml:lang");
    const SHOW: TextChild<Show> = TextChild::new("show");
    const STATUS: TextChild<String> = TextChild::new("status");
    const PRIORITY: TextChild<i8> = TextChild::new("priority");

    /// Create a new presence of this type.
    pub fn new(type_: Type) -> Presence {
        Presence {
            from: None,
            to: None,
            id: None,
            type_,
            lang: None,
            show: None,
            status: None,
            priority: None,
            payloads: vec![],
        }
    }

    /// Create a presence without a type, which means available.
    pub fn available() -> Presence {
        Self::new(Type::None)
    }

    /// Builds a presence of type Unavailable.
    pub fn unavailable() -> Presence {
        Self::new(Type::Unavailable)
    }

    /// Set the recipient of this presence, this is only useful for
    /// directed presences.
    pub fn with_to<J: Into<Jid>>(mut self, to: J) -> Presence {
        self.to = Some(to.into());
        self
    }

    /// Set the emitter of this presence.
    pub fn with_from<J: Into<Jid>>(mut self, from: J) -> Presence {
        self.from = Some(from.into());
        self
    }

    /// Set the identifier of this presence.
    pub fn with_id(mut self, id: String) -> Presence {
        self.id = Some(id);
        self
    }

    /// Set the availability information of this presence.
    pub fn with_show(mut self, show: Show) -> Presence {
        self.show = Some(show);
        self
    }

    /// Set the priority of this presence.
    pub fn with_priority(mut self, priority: i8) -> Presence {
        self.priority = Some(priority);
        self
    }
}

impl Entity for Presence {
    const NAME: &'static str = "presence";
    const NS: Namespaces = Namespaces::AnyOf(ns::STREAM_NS);
}

impl TryFrom<Element> for Presence {
    type Error = FromElementError;

    fn try_from(elem: Element) -> Result<Presence, FromElementError> {
        let mut elem = Presence::check(elem)?;
        let from = Self::FROM.get(&elem)?;
        let to = Self::TO.get(&elem)?;
        let id = Self::ID.get(&elem)?;
        let type_ = Self::TYPE.get_or_default(&elem)?;
        let lang = Self::LANG.get(&elem)?;
        let show = Self::SHOW.get(&elem)?;
        let status = Self::STATUS.get(&elem)?;
        let priority = Self::PRIORITY.get(&elem)?;
        let stream_ns = elem.ns();
        let payloads = elem
            .take_contents_as_children()
            .filter(|child| {
                !(Self::SHOW.matches(child, &stream_ns)
                    || Self::STATUS.matches(child, &stream_ns)
                    || Self::PRIORITY.matches(child, &stream_ns))
            })
            .collect();
        Ok(Presence {
            from,
            to,
            id,
            type_,
            lang,
            show,
            status,
            priority,
            payloads,
        })
    }
}

impl From<Presence> for Element {
    fn from(presence: Presence) -> Element {
        let builder = Element::builder("presence", ns::DEFAULT_NS);
        let builder = Presence::FROM.put(builder, presence.from);
        let builder = Presence::TO.put(builder, presence.to);
        let builder = Presence::ID.put(builder, presence.id);
        let builder = Presence::TYPE.put(builder, presence.type_);
        let builder = Presence::LANG.put(builder, presence.lang);
        let builder = Presence::SHOW.append(
            builder,
            ns::DEFAULT_NS,
            presence.show.map(|show| show.to_string()),
        );
        let builder = Presence::STATUS.append(builder, ns::DEFAULT_NS, presence.status);
        let builder = Presence::PRIORITY.append(
            builder,
            ns::DEFAULT_NS,
            presence.priority.map(|priority| priority.to_string()),
        );
        builder.append_all(presence.payloads).build()
    }
}

impl Stanza for Presence {
    fn to(&self) -> Option<&Jid> {
        self.to.as_ref()
    }

    fn from(&self) -> Option<&Jid> {
        self.from.as_ref()
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn reply(&self) -> Presence {
        let mut reply = Presence::new(self.type_.clone());
        reply.to = self.from.clone();
        reply.from = self.to.clone();
        reply.id = self.id.clone();
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple() {
        let elem: Element = "<presence xmlns='jabber:client'/>".parse().unwrap();
        let presence = Presence::try_from(elem).unwrap();
        assert_eq!(presence.from, None);
        assert_eq!(presence.to, None);
        assert_eq!(presence.id, None);
        assert_eq!(presence.type_, Type::None);
        assert_eq!(presence.type_.observed(), "available");
        assert!(presence.payloads.is_empty());
    }

    #[test]
    fn unknown_type_reads_back_as_available() {
        let elem: Element = "<presence xmlns='jabber:client' type='bogus'/>"
            .parse()
            .unwrap();
        let presence = Presence::try_from(elem).unwrap();
        assert_eq!(presence.type_, Type::None);
        assert_eq!(presence.type_.observed(), "available");

        // The derived default is never stored on the wire.
        let elem: Element = presence.into();
        assert_eq!(elem.attr("type"), None);
    }

    #[test]
    fn test_show() {
        let elem: Element = "<presence xmlns='jabber:client'><show>chat</show></presence>"
            .parse()
            .unwrap();
        let presence = Presence::try_from(elem).unwrap();
        assert_eq!(presence.payloads.len(), 0);
        assert_eq!(presence.show, Some(Show::Chat));
    }

    #[test]
    fn test_invalid_show() {
        // "online" used to be a pretty common mistake.
        let elem: Element = "<presence xmlns='jabber:client'><show>online</show></presence>"
            .parse()
            .unwrap();
        let error = Presence::try_from(elem).unwrap_err();
        let message = match error {
            FromElementError::Invalid(velement::Error::Other(string)) => string,
            _ => panic!(),
        };
        assert_eq!(message, "Invalid value for show.");
    }

    #[test]
    fn test_priority() {
        let elem: Element = "<presence xmlns='jabber:client'><priority>-1</priority></presence>"
            .parse()
            .unwrap();
        let presence = Presence::try_from(elem).unwrap();
        assert_eq!(presence.priority, Some(-1));
    }

    #[test]
    fn test_invalid_priority() {
        let elem: Element = "<presence xmlns='jabber:client'><priority>128</priority></presence>"
            .parse()
            .unwrap();
        let error = Presence::try_from(elem).unwrap_err();
        match error {
            FromElementError::Invalid(velement::Error::TextParseError(e))
                if e.is::<core::num::ParseIntError>() =>
            {
                ()
            }
            _ => panic!(),
        };
    }

    #[test]
    fn round_trip() {
        let presence = Presence::unavailable()
            .with_from(Jid::new("a@b/r").unwrap())
            .with_to(Jid::new("c@d").unwrap())
            .with_id(String::from("p1"))
            .with_priority(-1);
        let elem: Element = presence.clone().into();
        assert!(elem.is("presence", ns::DEFAULT_NS));
        assert_eq!(elem.attr("type"), Some("unavailable"));
        let again = Presence::try_from(elem).unwrap();
        assert_eq!(again, presence);
    }

    #[test]
    fn server_stream_namespace_is_accepted() {
        let elem: Element = "<presence xmlns='jabber:server' type='probe'/>"
            .parse()
            .unwrap();
        let presence = Presence::try_from(elem).unwrap();
        assert_eq!(presence.type_, Type::Probe);
    }
}
