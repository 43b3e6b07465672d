// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use jid::Jid;
use minidom::Element;
use velement::fields::Attr;
use velement::FromElementError;

use crate::iq::{Iq, IqType};
use crate::stanza::make_id;

/// The `<query/>` payload of a request Iq, under a caller-supplied
/// namespace.
///
/// A `Query` is a view over a whole request: it holds its enclosing
/// [`Iq`] by value, so the addressing and id of the request are always
/// reachable from the payload without walking any tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// The optional node this query addresses.
    pub node: Option<String>,

    /// The namespace of the `<query/>` element.
    pub ns: String,

    /// The child payloads of the `<query/>` element.
    pub payloads: Vec<Element>,

    /// The enclosing request.
    pub iq: Iq,
}

impl Query {
    const NODE: Attr<String> = Attr::new("node");

    /// Create a get request with an empty `<query/>` payload in `ns`,
    /// with a fresh id.
    pub fn get<S: Into<String>>(ns: S) -> Query {
        Query::request(ns, IqType::Get)
    }

    /// Create a set request with an empty `<query/>` payload in `ns`,
    /// with a fresh id.
    pub fn set<S: Into<String>>(ns: S) -> Query {
        Query::request(ns, IqType::Set)
    }

    fn request<S: Into<String>>(ns: S, wrap: fn(Element) -> IqType) -> Query {
        let ns = ns.into();
        let payload = Element::builder("query", ns.as_str()).build();
        Query {
            node: None,
            ns,
            payloads: vec![],
            iq: Iq {
                from: None,
                to: None,
                id: make_id(),
                lang: None,
                payload: wrap(payload),
            },
        }
    }

    /// Set the node this query addresses.
    pub fn with_node<S: Into<String>>(mut self, node: S) -> Query {
        self.node = Some(node.into());
        self
    }

    /// Add a child payload to the `<query/>` element.
    pub fn with_payload(mut self, payload: Element) -> Query {
        self.payloads.push(payload);
        self
    }

    /// Set the recipient of the enclosing request.
    pub fn with_to(mut self, to: Jid) -> Query {
        self.iq.to = Some(to);
        self
    }

    /// Set the id of the enclosing request.
    pub fn with_id(mut self, id: String) -> Query {
        self.iq.id = id;
        self
    }

    /// Decode a query request from a raw top-level element.
    ///
    /// The element must decode as an [`Iq`] whose payload is a get or
    /// set carrying a `<query/>` in `ns`; any other well-formed Iq is
    /// handed back untouched as [`FromElementError::Mismatch`], so the
    /// caller can offer it to the next schema.
    pub fn from_element(elem: Element, ns: &str) -> Result<Query, FromElementError> {
        let iq = Iq::try_from(elem)?;
        let payload = match iq.payload {
            IqType::Get(ref payload) | IqType::Set(ref payload) if payload.is("query", ns) => {
                payload.clone()
            }
            _ => return Err(FromElementError::Mismatch(iq.into())),
        };
        let node = Self::NODE.get(&payload)?;
        let mut payload = payload;
        let payloads = payload.take_contents_as_children().collect();
        Ok(Query {
            node,
            ns: ns.to_string(),
            payloads,
            iq,
        })
    }
}

impl From<Query> for Element {
    fn from(query: Query) -> Element {
        let builder = Element::builder("query", query.ns.as_str());
        let builder = Query::NODE.put(builder, query.node);
        let payload = builder.append_all(query.payloads).build();
        let mut iq = query.iq;
        // A Query only ever wraps a request.
        iq.payload = match iq.payload {
            IqType::Set(_) => IqType::Set(payload),
            _ => IqType::Get(payload),
        };
        iq.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ns;
    use velement::Error;

    #[test]
    fn decodes_with_back_reference_to_the_request() {
        let elem: Element =
            "<iq xmlns='jabber:client' type='get' id='x1'><query xmlns='urn:example:ping'/></iq>"
                .parse()
                .unwrap();
        let outer = Iq::try_from(elem.clone()).unwrap();
        let query = Query::from_element(elem, "urn:example:ping").unwrap();
        assert_eq!(query.node, None);
        assert_eq!(query.ns, "urn:example:ping");
        assert!(query.payloads.is_empty());
        assert_eq!(query.iq, outer);
        assert_eq!(query.iq.id, "x1");
    }

    #[test]
    fn node_and_payloads_are_recovered() {
        let elem: Element = "<iq xmlns='jabber:client' type='set' id='x2'><query xmlns='urn:example:items' node='top'><item name='a'/></query></iq>"
            .parse()
            .unwrap();
        let query = Query::from_element(elem, "urn:example:items").unwrap();
        assert_eq!(query.node.as_deref(), Some("top"));
        assert_eq!(query.payloads.len(), 1);
        assert!(query.payloads[0].is("item", "urn:example:items"));
    }

    #[test]
    fn foreign_namespace_is_a_mismatch() {
        let elem: Element =
            "<iq xmlns='jabber:client' type='get' id='x3'><query xmlns='urn:example:other'/></iq>"
                .parse()
                .unwrap();
        let error = Query::from_element(elem, "urn:example:ping").unwrap_err();
        let elem = match error {
            FromElementError::Mismatch(elem) => elem,
            _ => panic!(),
        };
        // The whole request comes back, not just the payload.
        assert!(elem.is("iq", ns::DEFAULT_NS));
    }

    #[test]
    fn result_iq_is_a_mismatch() {
        let elem: Element = "<iq xmlns='jabber:client' type='result' id='x4'><query xmlns='urn:example:ping'/></iq>"
            .parse()
            .unwrap();
        assert!(matches!(
            Query::from_element(elem, "urn:example:ping"),
            Err(FromElementError::Mismatch(_))
        ));
    }

    #[test]
    fn malformed_iq_stays_invalid() {
        let elem: Element = "<iq xmlns='jabber:client' type='get' id='x5'/>"
            .parse()
            .unwrap();
        assert!(matches!(
            Query::from_element(elem, "urn:example:ping"),
            Err(FromElementError::Invalid(Error::Other(_)))
        ));
    }

    #[test]
    fn round_trip() {
        let query = Query::set("urn:example:items")
            .with_node("top")
            .with_id(String::from("q9"))
            .with_payload(
                Element::builder("item", "urn:example:items")
                    .attr("name", "a")
                    .build(),
            );
        let elem: Element = query.clone().into();
        assert_eq!(elem.attr("type"), Some("set"));
        let again = Query::from_element(elem, "urn:example:items").unwrap();
        assert_eq!(again.node, query.node);
        assert_eq!(again.ns, query.ns);
        assert_eq!(again.payloads, query.payloads);
        assert_eq!(again.iq.id, "q9");
    }
}
