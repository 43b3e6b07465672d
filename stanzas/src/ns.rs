//! Namespace constants used by the stanza schemas.

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/// RFC 6120: client-to-server streams.
pub const JABBER_CLIENT: &str = "jabber:client";

/// RFC 6120: server-to-server streams.
pub const JABBER_SERVER: &str = "jabber:server";

/// XEP-0114: component streams.
pub const COMPONENT_ACCEPT: &str = "jabber:component:accept";

/// The namespace stanzas are serialised under.
pub const DEFAULT_NS: &str = JABBER_CLIENT;

/// Every stream namespace a stanza is accepted from on decode.
pub const STREAM_NS: &[&str] = &[JABBER_CLIENT, JABBER_SERVER, COMPONENT_ACCEPT];

/// RFC 6120: the namespace of defined error conditions and error text.
pub const XMPP_STANZAS: &str = "urn:ietf:params:xml:ns:xmpp-stanzas";
