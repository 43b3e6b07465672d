// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::fmt;
use core::str::FromStr;

use jid::Jid;
use minidom::{Element, IntoAttributeValue};
use velement::fields::Attr;
use velement::{Entity, Error, FromElementError, FromXmlText, Namespaces};

use crate::ns;

/// The type of the error, i.e. how the sender should recover from it.
///
/// Unlike message and presence types this enumeration is strict: an
/// unknown value is a hard parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorType {
    /// Retry after providing credentials.
    Auth,

    /// Do not retry (the error cannot be remedied).
    Cancel,

    /// Proceed (the condition was only a warning).
    Continue,

    /// Retry after changing the data sent.
    Modify,

    /// Retry after waiting (the error is temporary).
    Wait,
}

impl ErrorType {
    fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Auth => "auth",
            ErrorType::Cancel => "cancel",
            ErrorType::Continue => "continue",
            ErrorType::Modify => "modify",
            ErrorType::Wait => "wait",
        }
    }
}

impl FromXmlText for ErrorType {
    fn from_xml_text(s: String) -> Result<ErrorType, Error> {
        Ok(match s.as_str() {
            "auth" => ErrorType::Auth,
            "cancel" => ErrorType::Cancel,
            "continue" => ErrorType::Continue,
            "modify" => ErrorType::Modify,
            "wait" => ErrorType::Wait,

            _ => return Err(Error::Other("Unknown value for 'type' attribute.")),
        })
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IntoAttributeValue for ErrorType {
    fn into_attribute_value(self) -> Option<String> {
        Some(String::from(self.as_str()))
    }
}

/// List of valid error conditions, as defined in RFC 6120 §8.3.3.
///
/// The registry is closed: every condition maps 1:1 to a variant here
/// and to a fixed human-readable reason, and nothing can be added at
/// runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinedCondition {
    /// The sender has sent a stanza containing XML that does not
    /// conform to the appropriate schema or that cannot be processed.
    BadRequest,

    /// Access cannot be granted because an existing resource exists
    /// with the same name or address.
    Conflict,

    /// The feature represented in the XML stanza is not implemented by
    /// the intended recipient or an intermediate server.
    FeatureNotImplemented,

    /// The requesting entity does not possess the necessary
    /// permissions to perform an action.
    Forbidden,

    /// The recipient or server can no longer be contacted at this
    /// address, typically on a permanent basis.
    Gone,

    /// The server has experienced a misconfiguration or other internal
    /// error that prevents it from processing the stanza.
    InternalServerError,

    /// The addressed JID or item requested cannot be found.
    ItemNotFound,

    /// The sending entity has provided or communicated an XMPP address
    /// that violates the address format rules.
    JidMalformed,

    /// The recipient or server understands the request but cannot
    /// process it because it does not meet criteria defined by the
    /// recipient or server.
    NotAcceptable,

    /// The recipient or server does not allow any entity to perform
    /// the action.
    NotAllowed,

    /// The sender needs to provide credentials before being allowed to
    /// perform the action, or has provided improper credentials.
    NotAuthorized,

    /// The entity has violated some local service policy.
    PolicyViolation,

    /// The intended recipient is temporarily unavailable.
    RecipientUnavailable,

    /// The recipient or server is redirecting requests for this
    /// information to another entity, typically in a temporary fashion.
    Redirect,

    /// The requesting entity is not authorized to access the requested
    /// service because prior registration is necessary.
    RegistrationRequired,

    /// A remote server or service specified as part or all of the JID
    /// of the intended recipient does not exist or cannot be resolved.
    RemoteServerNotFound,

    /// A remote server or service was resolved but communications
    /// could not be established within a reasonable amount of time.
    RemoteServerTimeout,

    /// The server or recipient is busy or lacks the system resources
    /// necessary to service the request.
    ResourceConstraint,

    /// The server or recipient does not currently provide the
    /// requested service.
    ServiceUnavailable,

    /// The requesting entity is not authorized to access the requested
    /// service because a prior subscription is necessary.
    SubscriptionRequired,

    /// The error condition is not one of those defined by the other
    /// conditions in this list.
    UndefinedCondition,

    /// The recipient or server understood the request but was not
    /// expecting it at this time.
    UnexpectedRequest,
}

impl DefinedCondition {
    /// Every condition in the registry.
    pub const ALL: &'static [DefinedCondition] = &[
        DefinedCondition::BadRequest,
        DefinedCondition::Conflict,
        DefinedCondition::FeatureNotImplemented,
        DefinedCondition::Forbidden,
        DefinedCondition::Gone,
        DefinedCondition::InternalServerError,
        DefinedCondition::ItemNotFound,
        DefinedCondition::JidMalformed,
        DefinedCondition::NotAcceptable,
        DefinedCondition::NotAllowed,
        DefinedCondition::NotAuthorized,
        DefinedCondition::PolicyViolation,
        DefinedCondition::RecipientUnavailable,
        DefinedCondition::Redirect,
        DefinedCondition::RegistrationRequired,
        DefinedCondition::RemoteServerNotFound,
        DefinedCondition::RemoteServerTimeout,
        DefinedCondition::ResourceConstraint,
        DefinedCondition::ServiceUnavailable,
        DefinedCondition::SubscriptionRequired,
        DefinedCondition::UndefinedCondition,
        DefinedCondition::UnexpectedRequest,
    ];

    /// The symbolic name of this condition on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            DefinedCondition::BadRequest => "bad-request",
            DefinedCondition::Conflict => "conflict",
            DefinedCondition::FeatureNotImplemented => "feature-not-implemented",
            DefinedCondition::Forbidden => "forbidden",
            DefinedCondition::Gone => "gone",
            DefinedCondition::InternalServerError => "internal-server-error",
            DefinedCondition::ItemNotFound => "item-not-found",
            DefinedCondition::JidMalformed => "jid-malformed",
            DefinedCondition::NotAcceptable => "not-acceptable",
            DefinedCondition::NotAllowed => "not-allowed",
            DefinedCondition::NotAuthorized => "not-authorized",
            DefinedCondition::PolicyViolation => "policy-violation",
            DefinedCondition::RecipientUnavailable => "recipient-unavailable",
            DefinedCondition::Redirect => "redirect",
            DefinedCondition::RegistrationRequired => "registration-required",
            DefinedCondition::RemoteServerNotFound => "remote-server-not-found",
            DefinedCondition::RemoteServerTimeout => "remote-server-timeout",
            DefinedCondition::ResourceConstraint => "resource-constraint",
            DefinedCondition::ServiceUnavailable => "service-unavailable",
            DefinedCondition::SubscriptionRequired => "subscription-required",
            DefinedCondition::UndefinedCondition => "undefined-condition",
            DefinedCondition::UnexpectedRequest => "unexpected-request",
        }
    }

    /// The fixed human-readable reason for this condition.
    pub fn reason(&self) -> &'static str {
        match self {
            DefinedCondition::BadRequest => "Bad request",
            DefinedCondition::Conflict => "Conflict",
            DefinedCondition::FeatureNotImplemented => "Feature not implemented",
            DefinedCondition::Forbidden => "Forbidden",
            DefinedCondition::Gone => "Gone",
            DefinedCondition::InternalServerError => "Internal server error",
            DefinedCondition::ItemNotFound => "Item not found",
            DefinedCondition::JidMalformed => "JID malformed",
            DefinedCondition::NotAcceptable => "Not acceptable",
            DefinedCondition::NotAllowed => "Not allowed",
            DefinedCondition::NotAuthorized => "Not authorized",
            DefinedCondition::PolicyViolation => "Policy violation",
            DefinedCondition::RecipientUnavailable => "Recipient unavailable",
            DefinedCondition::Redirect => "Redirect",
            DefinedCondition::RegistrationRequired => "Registration required",
            DefinedCondition::RemoteServerNotFound => "Remote server not found",
            DefinedCondition::RemoteServerTimeout => "Remote server timeout",
            DefinedCondition::ResourceConstraint => "Resource constraint",
            DefinedCondition::ServiceUnavailable => "Service unavailable",
            DefinedCondition::SubscriptionRequired => "Subscription required",
            DefinedCondition::UndefinedCondition => "Undefined condition",
            DefinedCondition::UnexpectedRequest => "Unexpected request",
        }
    }

    /// The error type RFC 6120 suggests for this condition.
    pub fn suggested_type(&self) -> ErrorType {
        match self {
            DefinedCondition::BadRequest
            | DefinedCondition::JidMalformed
            | DefinedCondition::NotAcceptable
            | DefinedCondition::PolicyViolation
            | DefinedCondition::Redirect
            | DefinedCondition::UnexpectedRequest => ErrorType::Modify,
            DefinedCondition::Forbidden
            | DefinedCondition::NotAuthorized
            | DefinedCondition::RegistrationRequired
            | DefinedCondition::SubscriptionRequired => ErrorType::Auth,
            DefinedCondition::RecipientUnavailable
            | DefinedCondition::RemoteServerTimeout
            | DefinedCondition::ResourceConstraint => ErrorType::Wait,
            _ => ErrorType::Cancel,
        }
    }
}

impl fmt::Display for DefinedCondition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A condition name was looked up that is not in the registry.
///
/// This is a programmer error, taxonomically distinct from the
/// structural [`velement::Error`]s raised when a peer sends malformed
/// data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCondition(pub String);

impl fmt::Display for UnknownCondition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown error condition '{}'", self.0)
    }
}

impl core::error::Error for UnknownCondition {}

impl FromStr for DefinedCondition {
    type Err = UnknownCondition;

    fn from_str(s: &str) -> Result<DefinedCondition, UnknownCondition> {
        DefinedCondition::ALL
            .iter()
            .find(|condition| condition.name() == s)
            .copied()
            .ok_or_else(|| UnknownCondition(s.to_string()))
    }
}

impl From<DefinedCondition> for Element {
    fn from(condition: DefinedCondition) -> Element {
        Element::builder(condition.name(), ns::XMPP_STANZAS).build()
    }
}

/// A protocol fault to be communicated to the remote peer.
///
/// Faults pair a registry condition with its fixed reason and optional
/// caller-supplied diagnostics. They implement
/// [`core::error::Error`], so application code can propagate one up
/// to the point where it is turned into an error reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    /// The registry condition of this fault.
    pub condition: DefinedCondition,

    /// A human-readable description, sent in the `<text/>` element.
    pub text: Option<String>,

    /// An application-specific diagnostic payload.
    pub content: Option<Element>,
}

impl Fault {
    /// Create a fault for this condition, without diagnostics.
    pub fn new(condition: DefinedCondition) -> Fault {
        Fault {
            condition,
            text: None,
            content: None,
        }
    }

    /// Look up a condition by its symbolic name and create a fault
    /// carrying `content`.
    ///
    /// Fails with [`UnknownCondition`] when the name is not in the
    /// registry; that failure means a bug in the caller, not bad data
    /// from the peer.
    pub fn for_name(name: &str, content: Option<Element>) -> Result<Fault, UnknownCondition> {
        Ok(Fault {
            condition: name.parse()?,
            text: None,
            content,
        })
    }

    /// Attach a human-readable description.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Fault {
        self.text = Some(text.into());
        self
    }

    /// The registry's fixed reason for this fault's condition.
    pub fn reason(&self) -> &'static str {
        self.condition.reason()
    }

    /// Build the `<error/>` entity for this fault, using the
    /// condition's suggested error type.
    pub fn into_stanza_error(self) -> StanzaError {
        StanzaError {
            type_: self.condition.suggested_type(),
            by: None,
            condition: self.condition,
            text: self.text,
            other: self.content,
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.text {
            Some(ref text) => write!(f, "{}: {}", self.reason(), text),
            None => f.write_str(self.reason()),
        }
    }
}

impl core::error::Error for Fault {}

/// Reconstruct the typed fault from a decoded error entity, for
/// raise-style signalling on the receiving side.
impl From<StanzaError> for Fault {
    fn from(error: StanzaError) -> Fault {
        Fault {
            condition: error.condition,
            text: error.text,
            content: error.other,
        }
    }
}

/// The representation of a stanza error, the `<error/>` child of an
/// error-type stanza.
#[derive(Debug, Clone, PartialEq)]
pub struct StanzaError {
    /// The type of this error.
    pub type_: ErrorType,

    /// The JID of the entity who set this error.
    pub by: Option<Jid>,

    /// One of the defined conditions for this error to happen.
    pub condition: DefinedCondition,

    /// Human-readable description of this error.
    pub text: Option<String>,

    /// A protocol-specific extension for this error.
    pub other: Option<Element>,
}

impl StanzaError {
    const TYPE: Attr<ErrorType> = Attr::required("type");
    const BY: Attr<Jid> = Attr::new("by");

    /// Create a new `<error/>` with the according content.
    pub fn new<T: Into<String>>(
        type_: ErrorType,
        condition: DefinedCondition,
        text: T,
    ) -> StanzaError {
        StanzaError {
            type_,
            by: None,
            condition,
            text: Some(text.into()),
            other: None,
        }
    }
}

impl Entity for StanzaError {
    const NAME: &'static str = "error";
    const NS: Namespaces = Namespaces::AnyOf(ns::STREAM_NS);
}

impl TryFrom<Element> for StanzaError {
    type Error = FromElementError;

    fn try_from(elem: Element) -> Result<StanzaError, FromElementError> {
        let elem = StanzaError::check(elem)?;
        let type_ = Self::TYPE.get_required(&elem)?;
        let by = Self::BY.get(&elem)?;

        let mut condition = None;
        let mut text = None;
        let mut other = None;
        for child in elem.children() {
            if child.is("text", ns::XMPP_STANZAS) {
                if text.replace(child.text()).is_some() {
                    return Err(Error::Other("Error must not have more than one text.").into());
                }
            } else if child.has_ns(ns::XMPP_STANZAS) {
                if condition.is_some() {
                    return Err(Error::Other(
                        "Error must not have more than one defined-condition.",
                    )
                    .into());
                }
                let parsed = child
                    .name()
                    .parse::<DefinedCondition>()
                    .map_err(Error::text_parse_error)?;
                condition = Some(parsed);
            } else {
                if other.replace(child.clone()).is_some() {
                    return Err(
                        Error::Other("Error must not have more than one other element.").into(),
                    );
                }
            }
        }
        let condition =
            condition.ok_or(Error::Other("Error must have a defined-condition."))?;

        Ok(StanzaError {
            type_,
            by,
            condition,
            text,
            other,
        })
    }
}

impl From<StanzaError> for Element {
    fn from(err: StanzaError) -> Element {
        let builder = Element::builder("error", ns::DEFAULT_NS);
        let builder = StanzaError::TYPE.put(builder, err.type_);
        let builder = StanzaError::BY.put(builder, err.by);
        let builder = builder.append(Element::from(err.condition));
        let builder = match err.text {
            Some(text) => builder.append(
                Element::builder("text", ns::XMPP_STANZAS)
                    .append(text)
                    .build(),
            ),
            None => builder,
        };
        match err.other {
            Some(other) => builder.append(other),
            None => builder,
        }
        .build()
    }
}
