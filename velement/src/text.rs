//! Conversion between typed field values and XML text.

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::error::Error;

/// Trait for parsing a value from XML text.
///
/// This is implemented by field value types: attribute values and the
/// text contents of child elements. The descriptors in
/// [`fields`][`crate::fields`] invoke it after reading the raw string
/// from the element.
pub trait FromXmlText: Sized {
    /// Convert the given XML text to a value.
    fn from_xml_text(data: String) -> Result<Self, Error>;
}

impl FromXmlText for String {
    /// Return the string unchanged.
    fn from_xml_text(data: String) -> Result<Self, Error> {
        Ok(data)
    }
}

impl FromXmlText for jid::Jid {
    fn from_xml_text(data: String) -> Result<Self, Error> {
        data.parse().map_err(Error::text_parse_error)
    }
}

/// Implement [`FromXmlText`] via [`core::str::FromStr`].
macro_rules! convert_via_fromstr {
    ($($t:ty,)+) => {
        $(
            impl FromXmlText for $t {
                fn from_xml_text(s: String) -> Result<Self, Error> {
                    s.parse().map_err(Error::text_parse_error)
                }
            }
        )+
    }
}

convert_via_fromstr! {
    bool,
    u8, u16, u32, u64,
    i8, i16, i32, i64,
}
