// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::Jid;
use minidom::Element;
use velement::fields::{Attr, Child};
use velement::{Entity, Error, FromElementError, Namespaces};

use crate::ns;
use crate::stanza::{make_id, Stanza};
use crate::stanza_error::StanzaError;

/// Should be implemented on every known payload of an `<iq type='get'/>`
/// or `<iq type='set'/>`.
pub trait IqPayload: Entity {}

/// The type of an Iq, together with the payload that type mandates.
///
/// Unlike message and presence types this enumeration is strict: an
/// out-of-enumeration value is a hard parse failure, because the
/// request/response semantics of Iq do not admit a safe degrade.
#[derive(Debug, Clone, PartialEq)]
pub enum IqType {
    /// Request for data.
    Get(Element),

    /// Transmission of data.
    Set(Element),

    /// Successful response to a Get or Set request.
    Result(Option<Element>),

    /// Failure response to a Get or Set request.
    Error(StanzaError),
}

impl IqType {
    /// The value of the 'type' attribute for this payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            IqType::Get(_) => "get",
            IqType::Set(_) => "set",
            IqType::Result(_) => "result",
            IqType::Error(_) => "error",
        }
    }
}

/// The main structure representing the `<iq/>` stanza.
#[derive(Debug, Clone, PartialEq)]
pub struct Iq {
    /// The sender of this stanza.
    pub from: Option<Jid>,

    /// The recipient of this stanza.
    pub to: Option<Jid>,

    /// The @id attribute of this stanza, used for correlating a reply
    /// with its request. Always present: one is generated on decode
    /// when the peer omitted it.
    pub id: String,

    /// The language of this stanza.
    pub lang: Option<String>,

    /// The payload content of this stanza.
    pub payload: IqType,
}

impl Iq {
    const FROM: Attr<Jid> = Attr::new("from");
    const TO: Attr<Jid> = Attr::new("to");
    const ID: Attr<String> = Attr::new("id");
    const LANG: Attr<String> = Attr::new("xml:lang");
    const ERROR: Child<StanzaError> = Child::new();

    /// Creates an `<iq/>` stanza containing a get request.
    pub fn from_get<P: IqPayload>(id: String, payload: P) -> Iq {
        Iq {
            from: None,
            to: None,
            id,
            lang: None,
            payload: IqType::Get(payload.into()),
        }
    }

    /// Creates an `<iq/>` stanza containing a set request.
    pub fn from_set<P: IqPayload>(id: String, payload: P) -> Iq {
        Iq {
            from: None,
            to: None,
            id,
            lang: None,
            payload: IqType::Set(payload.into()),
        }
    }

    /// Creates an empty `<iq type="result"/>` stanza.
    pub fn empty_result(id: String) -> Iq {
        Iq {
            from: None,
            to: None,
            id,
            lang: None,
            payload: IqType::Result(None),
        }
    }

    /// Creates an `<iq type="result"/>` stanza carrying a payload.
    pub fn from_result<P: IqPayload>(id: String, payload: Option<P>) -> Iq {
        Iq {
            from: None,
            to: None,
            id,
            lang: None,
            payload: IqType::Result(payload.map(Into::into)),
        }
    }

    /// Creates an `<iq type="error"/>` stanza.
    pub fn from_error(id: String, payload: StanzaError) -> Iq {
        Iq {
            from: None,
            to: None,
            id,
            lang: None,
            payload: IqType::Error(payload),
        }
    }

    /// Sets the recipient of this stanza.
    pub fn with_to(mut self, to: Jid) -> Iq {
        self.to = Some(to);
        self
    }

    /// Sets the sender of this stanza.
    pub fn with_from(mut self, from: Jid) -> Iq {
        self.from = Some(from);
        self
    }

    /// Sets the @id attribute of this stanza, for correlating with a
    /// later reply.
    pub fn with_id(mut self, id: String) -> Iq {
        self.id = id;
        self
    }
}

impl Entity for Iq {
    const NAME: &'static str = "iq";
    const NS: Namespaces = Namespaces::AnyOf(ns::STREAM_NS);
}

impl TryFrom<Element> for Iq {
    type Error = FromElementError;

    fn try_from(elem: Element) -> Result<Iq, FromElementError> {
        let mut elem = Iq::check(elem)?;
        let from = Self::FROM.get(&elem)?;
        let to = Self::TO.get(&elem)?;
        let id = match Self::ID.get(&elem)? {
            Some(id) => id,
            None => make_id(),
        };
        let lang = Self::LANG.get(&elem)?;
        let type_ = elem
            .attr("type")
            .ok_or(Error::MissingAttribute("type"))?
            .to_string();

        let payload = match type_.as_str() {
            "error" => {
                let error = Self::ERROR.get(&elem)?;
                IqType::Error(error.ok_or(Error::MissingChild("error"))?)
            }
            "get" | "set" | "result" => {
                let mut children = elem.take_contents_as_children();
                let payload = children.next();
                if children.next().is_some() {
                    return Err(Error::Other("Wrong number of children in iq element.").into());
                }
                match type_.as_str() {
                    "get" => IqType::Get(
                        payload.ok_or(Error::Other("Wrong number of children in iq element."))?,
                    ),
                    "set" => IqType::Set(
                        payload.ok_or(Error::Other("Wrong number of children in iq element."))?,
                    ),
                    _ => IqType::Result(payload),
                }
            }
            _ => return Err(Error::Other("Unknown value for 'type' attribute.").into()),
        };

        Ok(Iq {
            from,
            to,
            id,
            lang,
            payload,
        })
    }
}

impl From<Iq> for Element {
    fn from(iq: Iq) -> Element {
        let builder = Element::builder("iq", ns::DEFAULT_NS).attr("type", iq.payload.as_str());
        let builder = Iq::FROM.put(builder, iq.from);
        let builder = Iq::TO.put(builder, iq.to);
        let builder = Iq::ID.put(builder, Some(iq.id));
        let builder = Iq::LANG.put(builder, iq.lang);
        match iq.payload {
            IqType::Get(elem) | IqType::Set(elem) => builder.append(elem),
            IqType::Result(Some(elem)) => builder.append(elem),
            IqType::Result(None) => builder,
            IqType::Error(error) => builder.append(Element::from(error)),
        }
        .build()
    }
}

impl Stanza for Iq {
    fn to(&self) -> Option<&Jid> {
        self.to.as_ref()
    }

    fn from(&self) -> Option<&Jid> {
        self.from.as_ref()
    }

    fn id(&self) -> Option<&str> {
        Some(&self.id)
    }

    /// An Iq reply is always an empty result carrying the request's id,
    /// whatever the request's type was.
    fn reply(&self) -> Iq {
        let mut reply = Iq::empty_result(self.id.clone());
        reply.to = self.from.clone();
        reply.from = self.to.clone();
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stanza_error::{DefinedCondition, ErrorType};

    #[derive(Debug, Clone, PartialEq)]
    struct Ping;

    impl Entity for Ping {
        const NAME: &'static str = "ping";
        const NS: Namespaces = Namespaces::One("urn:xmpp:ping");
    }

    impl IqPayload for Ping {}

    impl TryFrom<Element> for Ping {
        type Error = FromElementError;

        fn try_from(elem: Element) -> Result<Ping, FromElementError> {
            let _ = Ping::check(elem)?;
            Ok(Ping)
        }
    }

    impl From<Ping> for Element {
        fn from(_: Ping) -> Element {
            Element::builder("ping", "urn:xmpp:ping").build()
        }
    }

    #[test]
    fn test_require_type() {
        let elem: Element = "<iq xmlns='jabber:client'/>".parse().unwrap();
        let error = Iq::try_from(elem).unwrap_err();
        let message = match error {
            FromElementError::Invalid(Error::MissingAttribute(name)) => name,
            _ => panic!(),
        };
        assert_eq!(message, "type");
    }

    #[test]
    fn unknown_type_is_a_hard_failure() {
        let elem: Element = "<iq xmlns='jabber:client' type='bogus' id='a'><ping xmlns='urn:xmpp:ping'/></iq>"
            .parse()
            .unwrap();
        let error = Iq::try_from(elem).unwrap_err();
        let message = match error {
            FromElementError::Invalid(Error::Other(string)) => string,
            _ => panic!(),
        };
        assert_eq!(message, "Unknown value for 'type' attribute.");
    }

    #[test]
    fn test_get() {
        let elem: Element =
            "<iq xmlns='jabber:client' type='get' id='foo'><ping xmlns='urn:xmpp:ping'/></iq>"
                .parse()
                .unwrap();
        let iq = Iq::try_from(elem).unwrap();
        assert_eq!(iq.id, "foo");
        match iq.payload {
            IqType::Get(ref payload) => assert!(payload.is("ping", "urn:xmpp:ping")),
            _ => panic!(),
        }
    }

    #[test]
    fn get_without_payload_fails() {
        let elem: Element = "<iq xmlns='jabber:client' type='get' id='foo'/>"
            .parse()
            .unwrap();
        let error = Iq::try_from(elem).unwrap_err();
        let message = match error {
            FromElementError::Invalid(Error::Other(string)) => string,
            _ => panic!(),
        };
        assert_eq!(message, "Wrong number of children in iq element.");
    }

    #[test]
    fn get_with_two_payloads_fails() {
        let elem: Element = "<iq xmlns='jabber:client' type='get' id='foo'><a/><b/></iq>"
            .parse()
            .unwrap();
        let error = Iq::try_from(elem).unwrap_err();
        let message = match error {
            FromElementError::Invalid(Error::Other(string)) => string,
            _ => panic!(),
        };
        assert_eq!(message, "Wrong number of children in iq element.");
    }

    #[test]
    fn test_result() {
        let elem: Element = "<iq xmlns='jabber:client' type='result' id='res'/>"
            .parse()
            .unwrap();
        let iq = Iq::try_from(elem).unwrap();
        assert_eq!(iq.payload, IqType::Result(None));

        let elem: Element =
            "<iq xmlns='jabber:client' type='result' id='res'><ping xmlns='urn:xmpp:ping'/></iq>"
                .parse()
                .unwrap();
        let iq = Iq::try_from(elem).unwrap();
        match iq.payload {
            IqType::Result(Some(ref payload)) => assert!(payload.is("ping", "urn:xmpp:ping")),
            _ => panic!(),
        }
    }

    #[test]
    fn test_error() {
        let elem: Element = "<iq xmlns='jabber:client' type='error' id='err1'><ping xmlns='urn:xmpp:ping'/><error type='cancel'><feature-not-implemented xmlns='urn:ietf:params:xml:ns:xmpp-stanzas'/></error></iq>"
            .parse()
            .unwrap();
        let iq = Iq::try_from(elem).unwrap();
        assert_eq!(iq.id, "err1");
        match iq.payload {
            IqType::Error(ref error) => {
                assert_eq!(error.type_, ErrorType::Cancel);
                assert_eq!(error.condition, DefinedCondition::FeatureNotImplemented);
            }
            _ => panic!(),
        }
    }

    #[test]
    fn error_iq_without_error_child_fails() {
        let elem: Element = "<iq xmlns='jabber:client' type='error' id='e1'/>"
            .parse()
            .unwrap();
        let error = Iq::try_from(elem).unwrap_err();
        let message = match error {
            FromElementError::Invalid(Error::MissingChild(name)) => name,
            _ => panic!(),
        };
        assert_eq!(message, "error");
    }

    #[test]
    fn missing_id_is_generated() {
        let elem: Element = "<iq xmlns='jabber:client' type='result'/>".parse().unwrap();
        let iq = Iq::try_from(elem).unwrap();
        assert!(iq.id.starts_with("rs-"));
    }

    #[test]
    fn round_trip() {
        let iq = Iq::from_get(String::from("q1"), Ping)
            .with_to(Jid::new("component.localhost").unwrap());
        let elem: Element = iq.clone().into();
        assert!(elem.is("iq", ns::DEFAULT_NS));
        assert_eq!(elem.attr("type"), Some("get"));
        let again = Iq::try_from(elem).unwrap();
        assert_eq!(again, iq);
    }

    #[test]
    fn reply_is_an_empty_result() {
        let elem: Element = "<iq xmlns='jabber:client' type='set' from='a@b/r' to='c@d' id='s1'><ping xmlns='urn:xmpp:ping'/></iq>"
            .parse()
            .unwrap();
        let iq = Iq::try_from(elem).unwrap();
        let reply = iq.reply();
        assert_eq!(reply.id, "s1");
        assert_eq!(reply.to, iq.from);
        assert_eq!(reply.from, iq.to);
        assert_eq!(reply.payload, IqType::Result(None));
    }

    #[test]
    fn jabber_server_is_accepted() {
        let elem: Element = "<iq xmlns='jabber:server' type='result' id='x'/>"
            .parse()
            .unwrap();
        assert!(Iq::try_from(elem).is_ok());
    }
}
