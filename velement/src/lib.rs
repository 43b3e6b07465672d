/*!
# velement — declarative, validated views over minidom elements

This crate provides the generic machinery for mapping XML elements
([`minidom::Element`]) onto typed entities and back:

* [`fields`] — field descriptors binding one typed value to one part of
  an element (attribute, text child, or typed child element), with
  required/optional cardinality and per-field clean hooks;
* [`Entity`] — the schema contract an entity type implements: a fixed
  element name, a set of accepted namespaces, decoding via
  `TryFrom<Element>` and encoding via `Into<Element>`;
* [`error`] — the two-level error taxonomy separating "this element is
  not for this schema" ([`FromElementError::Mismatch`]) from "this
  element is for this schema but malformed"
  ([`FromElementError::Invalid`]).

An entity owns its element representation exclusively: decoding
consumes the `Element`, and the element handed out by `Into<Element>`
is built fresh from the typed fields, so validated invariants cannot be
bypassed by outside mutation of a shared tree.
*/

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#![forbid(unsafe_code)]

pub mod error;
pub mod fields;
pub mod text;

pub use error::{Error, FromElementError};
pub use text::FromXmlText;

use minidom::Element;

/// The set of namespaces an entity accepts on decode.
#[derive(Clone, Copy, Debug)]
pub enum Namespaces {
    /// Any namespace is acceptable.
    Any,

    /// Exactly one namespace is acceptable.
    One(&'static str),

    /// Any namespace out of a fixed set is acceptable.
    AnyOf(&'static [&'static str]),
}

impl Namespaces {
    /// Whether `ns` is in the accepted set.
    pub fn accepts(&self, ns: &str) -> bool {
        match self {
            Namespaces::Any => true,
            Namespaces::One(accepted) => *accepted == ns,
            Namespaces::AnyOf(accepted) => accepted.contains(&ns),
        }
    }
}

/// A typed entity bound 1:1 to an element.
///
/// Implementors declare their schema as associated constants (the
/// element name and accepted namespaces here, field descriptors as
/// associated constants on the type itself) and drive it from their
/// `TryFrom<Element>` implementation, which should start with
/// [`Entity::check`] and then decode fields in declaration order.
pub trait Entity: TryFrom<Element, Error = FromElementError> + Into<Element> {
    /// The element name of this entity.
    const NAME: &'static str;

    /// The namespaces this entity accepts on decode.
    const NS: Namespaces;

    /// Validate the element header against this entity's schema.
    ///
    /// Returns the element unharmed inside
    /// [`FromElementError::Mismatch`] when the name or namespace does
    /// not belong to this schema. This runs before any field decoding.
    fn check(elem: Element) -> Result<Element, FromElementError> {
        if elem.name() == Self::NAME && Self::NS.accepts(&elem.ns()) {
            Ok(elem)
        } else {
            Err(FromElementError::Mismatch(elem))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_acceptance() {
        assert!(Namespaces::Any.accepts("urn:whatever"));
        assert!(Namespaces::One("urn:a").accepts("urn:a"));
        assert!(!Namespaces::One("urn:a").accepts("urn:b"));
        let set = Namespaces::AnyOf(&["urn:a", "urn:b"]);
        assert!(set.accepts("urn:a"));
        assert!(set.accepts("urn:b"));
        assert!(!set.accepts("urn:c"));
    }

    #[derive(Debug)]
    struct Ping;

    impl Entity for Ping {
        const NAME: &'static str = "ping";
        const NS: Namespaces = Namespaces::One("urn:example:ping");
    }

    impl TryFrom<Element> for Ping {
        type Error = FromElementError;

        fn try_from(elem: Element) -> Result<Ping, FromElementError> {
            let _ = Ping::check(elem)?;
            Ok(Ping)
        }
    }

    impl From<Ping> for Element {
        fn from(_: Ping) -> Element {
            Element::builder("ping", "urn:example:ping").build()
        }
    }

    #[test]
    fn header_check_rejects_before_field_decoding() {
        let elem: Element = "<ping xmlns='urn:example:ping'/>".parse().unwrap();
        assert!(Ping::try_from(elem).is_ok());

        let elem: Element = "<pong xmlns='urn:example:ping'/>".parse().unwrap();
        let err = Ping::try_from(elem).unwrap_err();
        let elem = match err {
            FromElementError::Mismatch(elem) => elem,
            _ => panic!(),
        };
        assert!(elem.is("pong", "urn:example:ping"));

        let elem: Element = "<ping xmlns='urn:example:other'/>".parse().unwrap();
        assert!(matches!(
            Ping::try_from(elem),
            Err(FromElementError::Mismatch(_))
        ));
    }
}
