/*!
# Error types for schema validation

Decoding an element against a schema can fail in two taxonomically
distinct ways, and callers are expected to tell them apart:

* [`FromElementError::Mismatch`] — the element header (name and
  namespace) does not belong to the schema at all. The element is
  returned unharmed so it can be offered to another schema.
* [`FromElementError::Invalid`] — the header matched, but the contents
  violate the schema: a required field is missing, a value failed to
  parse, or a clean hook rejected it. Details are in the inner
  [`Error`].
*/

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::fmt;

use minidom::Element;

/// Error variants generated while decoding or encoding field values.
#[derive(Debug)]
pub enum Error {
    /// Attempt to parse text data failed with the provided nested error.
    TextParseError(Box<dyn core::error::Error + Send + Sync + 'static>),

    /// A required attribute was absent from the element.
    MissingAttribute(&'static str),

    /// A required child element was absent from the element.
    MissingChild(&'static str),

    /// Generic, unspecified other error.
    Other(&'static str),

    /// An element header did not match an expected element.
    ///
    /// This is only generated when a [`FromElementError::Mismatch`] is
    /// flattened into an [`Error`]; the mismatch variant is generally
    /// more useful because it keeps the element.
    TypeMismatch,
}

impl Error {
    /// Convenience function to create a [`Self::TextParseError`] variant.
    ///
    /// This includes the `Box::new(.)` call, making it directly usable
    /// as argument to [`Result::map_err`].
    pub fn text_parse_error<T: core::error::Error + Send + Sync + 'static>(e: T) -> Self {
        Self::TextParseError(Box::new(e))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TextParseError(ref e) => write!(f, "text parse error: {}", e),
            Self::MissingAttribute(name) => {
                write!(f, "Required attribute '{}' missing.", name)
            }
            Self::MissingChild(name) => {
                write!(f, "Required child element '{}' missing.", name)
            }
            Self::Other(msg) => f.write_str(msg),
            Self::TypeMismatch => f.write_str("mismatch between expected and actual XML data"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::TextParseError(ref e) => Some(&**e),
            _ => None,
        }
    }
}

/// Error returned by the `TryFrom<Element>` implementations of schema
/// entities.
#[derive(Debug)]
pub enum FromElementError {
    /// The XML element header did not match the expectations of the
    /// entity.
    ///
    /// Contains the original `Element` unmodified.
    Mismatch(Element),

    /// During processing of the element, an (unrecoverable) error
    /// occurred.
    Invalid(Error),
}

impl fmt::Display for FromElementError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Mismatch(ref el) => write!(
                f,
                "expected different XML element (got {} in namespace {})",
                el.name(),
                el.ns()
            ),
            Self::Invalid(ref e) => fmt::Display::fmt(e, f),
        }
    }
}

impl core::error::Error for FromElementError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Mismatch(_) => None,
            Self::Invalid(ref e) => Some(e),
        }
    }
}

impl From<Error> for FromElementError {
    fn from(other: Error) -> Self {
        Self::Invalid(other)
    }
}

impl From<FromElementError> for Error {
    fn from(other: FromElementError) -> Self {
        match other {
            FromElementError::Invalid(e) => e,
            FromElementError::Mismatch(..) => Self::TypeMismatch,
        }
    }
}
