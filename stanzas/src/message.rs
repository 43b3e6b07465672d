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

/// Accepted values for the 'type' attribute of a message.
///
/// Message types are advisory: an out-of-enumeration value degrades to
/// [`Type::Normal`] instead of failing, unlike the strict handling of
/// Iq types.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum Type {
    /// Standalone message.
    #[default]
    Normal,

    /// One-to-one chat message.
    Chat,

    /// Message sent in the context of a multi-user chat.
    Groupchat,

    /// Automated message, not expecting an answer.
    Headline,

    /// An error occurred processing a previously sent message.
    Error,
}

impl Type {
    fn as_str(&self) -> &'static str {
        match self {
            Type::Normal => "normal",
            Type::Chat => "chat",
            Type::Groupchat => "groupchat",
            Type::Headline => "headline",
            Type::Error => "error",
        }
    }
}

impl FromXmlText for Type {
    fn from_xml_text(s: String) -> Result<Type, velement::Error> {
        Ok(match s.as_str() {
            "chat" => Type::Chat,
            "groupchat" => Type::Groupchat,
            "headline" => Type::Headline,
            "error" => Type::Error,

            // Lenient degrade, including for "normal" itself.
            _ => Type::Normal,
        })
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IntoAttributeValue for Type {
    fn into_attribute_value(self) -> Option<String> {
        match self {
            Type::Normal => None,
            other => Some(String::from(other.as_str())),
        }
    }
}

/// The main structure representing the `<message/>` stanza.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// The sender of this message.
    pub from: Option<Jid>,

    /// The recipient of this message.
    pub to: Option<Jid>,

    /// The identifier, unique on this stream, of this message.
    pub id: Option<String>,

    /// The type of this message.
    pub type_: Type,

    /// The language of this message.
    pub lang: Option<String>,

    /// The text content of this message.
    pub body: Option<String>,

    /// The topic of this message.
    pub subject: Option<String>,

    /// The conversation thread this message belongs to.
    pub thread: Option<String>,

    /// A list of extra payloads contained in this message.
    pub payloads: Vec<Element>,
}

impl Message {
    const FROM: Attr<Jid> = Attr::new("from");
    const TO: Attr<Jid> = Attr::new("to");
    const ID: Attr<String> = Attr::new("id");
    const TYPE: Attr<Type> = Attr::new("type");
    const LANG: Attr<String> = Attr::new("xml:lang");
    const BODY: TextChild<String> = TextChild::new("body");
    const SUBJECT: TextChild<String> = TextChild::new("subject");
    const THREAD: TextChild<String> = TextChild::new("thread");

    /// Create a new message of this type.
    pub fn new(type_: Type) -> Message {
        Message {
            from: None,
            to: None,
            id: None,
            type_,
            lang: None,
            body: None,
            subject: None,
            thread: None,
            payloads: vec![],
        }
    }

    /// Create a new chat message addressed to `to`.
    pub fn chat<J: Into<Jid>>(to: J) -> Message {
        let mut message = Message::new(Type::Chat);
        message.to = Some(to.into());
        message
    }

    /// Set the recipient of this message.
    pub fn with_to<J: Into<Jid>>(mut self, to: J) -> Message {
        self.to = Some(to.into());
        self
    }

    /// Set the sender of this message.
    pub fn with_from<J: Into<Jid>>(mut self, from: J) -> Message {
        self.from = Some(from.into());
        self
    }

    /// Set the identifier of this message.
    pub fn with_id(mut self, id: String) -> Message {
        self.id = Some(id);
        self
    }

    /// Set the text content of this message.
    pub fn with_body<S: Into<String>>(mut self, body: S) -> Message {
        self.body = Some(body.into());
        self
    }

    /// Add an extra payload to this message.
    pub fn with_payload(mut self, payload: Element) -> Message {
        self.payloads.push(payload);
        self
    }
}

impl Entity for Message {
    const NAME: &'static str = "message";
    const NS: Namespaces = Namespaces::AnyOf(ns::STREAM_NS);
}

impl TryFrom<Element> for Message {
    type Error = FromElementError;

    fn try_from(elem: Element) -> Result<Message, FromElementError> {
        let mut elem = Message::check(elem)?;
        let from = Self::FROM.get(&elem)?;
        let to = Self::TO.get(&elem)?;
        let id = Self::ID.get(&elem)?;
        let type_ = Self::TYPE.get_or_default(&elem)?;
        let lang = Self::LANG.get(&elem)?;
        let body = Self::BODY.get(&elem)?;
        let subject = Self::SUBJECT.get(&elem)?;
        let thread = Self::THREAD.get(&elem)?;
        let stream_ns = elem.ns();
        let payloads = elem
            .take_contents_as_children()
            .filter(|child| {
                !(Self::BODY.matches(child, &stream_ns)
                    || Self::SUBJECT.matches(child, &stream_ns)
                    || Self::THREAD.matches(child, &stream_ns))
            })
            .collect();
        Ok(Message {
            from,
            to,
            id,
            type_,
            lang,
            body,
            subject,
            thread,
            payloads,
        })
    }
}

impl From<Message> for Element {
    fn from(message: Message) -> Element {
        let builder = Element::builder("message", ns::DEFAULT_NS);
        let builder = Message::FROM.put(builder, message.from);
        let builder = Message::TO.put(builder, message.to);
        let builder = Message::ID.put(builder, message.id);
        let builder = Message::TYPE.put(builder, message.type_);
        let builder = Message::LANG.put(builder, message.lang);
        let builder = Message::SUBJECT.append(builder, ns::DEFAULT_NS, message.subject);
        let builder = Message::BODY.append(builder, ns::DEFAULT_NS, message.body);
        let builder = Message::THREAD.append(builder, ns::DEFAULT_NS, message.thread);
        builder.append_all(message.payloads).build()
    }
}

impl Stanza for Message {
    fn to(&self) -> Option<&Jid> {
        self.to.as_ref()
    }

    fn from(&self) -> Option<&Jid> {
        self.from.as_ref()
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn reply(&self) -> Message {
        let mut reply = Message::new(self.type_.clone());
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
        let elem: Element = "<message xmlns='jabber:client'/>".parse().unwrap();
        let message = Message::try_from(elem).unwrap();
        assert_eq!(message.from, None);
        assert_eq!(message.to, None);
        assert_eq!(message.id, None);
        assert_eq!(message.type_, Type::Normal);
        assert!(message.payloads.is_empty());
    }

    #[test]
    fn unknown_type_degrades_to_normal() {
        let elem: Element = "<message xmlns='jabber:client' type='bogus'/>"
            .parse()
            .unwrap();
        let message = Message::try_from(elem).unwrap();
        assert_eq!(message.type_, Type::Normal);
    }

    #[test]
    fn test_body_and_subject() {
        let elem: Element =
            "<message xmlns='jabber:client' type='chat'><subject>hi</subject><body>Hello world!</body></message>"
                .parse()
                .unwrap();
        let message = Message::try_from(elem).unwrap();
        assert_eq!(message.type_, Type::Chat);
        assert_eq!(message.subject.as_deref(), Some("hi"));
        assert_eq!(message.body.as_deref(), Some("Hello world!"));
        assert!(message.payloads.is_empty());
    }

    #[test]
    fn unknown_child_goes_to_payloads() {
        let elem: Element = "<message xmlns='jabber:client'><test xmlns='invalid'/></message>"
            .parse()
            .unwrap();
        let message = Message::try_from(elem).unwrap();
        assert_eq!(message.payloads.len(), 1);
        assert!(message.payloads[0].is("test", "invalid"));
    }

    #[test]
    fn round_trip() {
        let message = Message::chat(Jid::new("test@localhost").unwrap())
            .with_from(Jid::new("sender@localhost/res").unwrap())
            .with_id(String::from("m1"))
            .with_body("Hello world!");
        let elem: Element = message.clone().into();
        assert!(elem.is("message", ns::DEFAULT_NS));
        assert_eq!(elem.attr("type"), Some("chat"));
        let again = Message::try_from(elem).unwrap();
        assert_eq!(again, message);
    }

    #[test]
    fn normal_type_is_omitted_on_the_wire() {
        let message = Message::new(Type::Normal);
        let elem: Element = message.into();
        assert_eq!(elem.attr("type"), None);
    }

    #[test]
    fn reply_swaps_addresses() {
        let elem: Element =
            "<message xmlns='jabber:client' from='a@b/r' to='c@d' id='m7' type='chat'/>"
                .parse()
                .unwrap();
        let message = Message::try_from(elem).unwrap();
        let reply = message.reply();
        assert_eq!(reply.to, message.from);
        assert_eq!(reply.from, message.to);
        assert_eq!(reply.id, message.id);
        assert_eq!(reply.type_, message.type_);
    }
}
