//! Field descriptors binding typed values to parts of an element.
//!
//! A descriptor knows where its value lives in the element (an
//! attribute, the text of a uniquely-named child, or a whole typed
//! child element), whether it is required, and how to convert between
//! the raw representation and the typed value. Entities declare their
//! descriptors as associated constants, which forms the static schema
//! table for that entity kind, and call them in declaration order from
//! their `TryFrom<Element>` implementation so that the first offending
//! field is reported deterministically.
//!
//! A descriptor may carry clean hooks: a `clean` hook runs on the
//! decode path after text conversion and may reject or rewrite the
//! value, and a `clean_set` hook runs on the encode path before the
//! value is written back.

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use core::marker::PhantomData;

use minidom::{Element, IntoAttributeValue};

use crate::error::{Error, FromElementError};
use crate::text::FromXmlText;
use crate::Entity;

/// A clean hook: validates or rewrites a decoded value.
pub type Clean<T> = fn(T) -> Result<T, Error>;

/// Descriptor for an attribute-valued field.
pub struct Attr<T> {
    name: &'static str,
    required: bool,
    clean: Option<Clean<T>>,
    clean_set: Option<Clean<T>>,
    _value: PhantomData<fn() -> T>,
}

impl<T> Attr<T> {
    /// Descriptor for an optional attribute.
    pub const fn new(name: &'static str) -> Attr<T> {
        Attr {
            name,
            required: false,
            clean: None,
            clean_set: None,
            _value: PhantomData,
        }
    }

    /// Descriptor for a required attribute.
    pub const fn required(name: &'static str) -> Attr<T> {
        Attr {
            name,
            required: true,
            clean: None,
            clean_set: None,
            _value: PhantomData,
        }
    }

    /// Attach a decode-side clean hook.
    pub const fn with_clean(mut self, clean: Clean<T>) -> Attr<T> {
        self.clean = Some(clean);
        self
    }

    /// Attach an encode-side clean hook.
    pub const fn with_clean_set(mut self, clean_set: Clean<T>) -> Attr<T> {
        self.clean_set = Some(clean_set);
        self
    }

    /// The attribute name this descriptor reads and writes.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: FromXmlText> Attr<T> {
    /// Decode the attribute from `elem`.
    ///
    /// A missing optional attribute yields `None`; a missing required
    /// one fails with [`Error::MissingAttribute`].
    pub fn get(&self, elem: &Element) -> Result<Option<T>, Error> {
        match elem.attr(self.name) {
            Some(raw) => {
                let value = T::from_xml_text(raw.to_string())?;
                match self.clean {
                    Some(clean) => clean(value).map(Some),
                    None => Ok(Some(value)),
                }
            }
            None if self.required => Err(Error::MissingAttribute(self.name)),
            None => Ok(None),
        }
    }

    /// Decode the attribute, failing if it is absent.
    pub fn get_required(&self, elem: &Element) -> Result<T, Error> {
        self.get(elem)?.ok_or(Error::MissingAttribute(self.name))
    }

    /// Decode the attribute, substituting the type's default when it
    /// is absent.
    pub fn get_or_default(&self, elem: &Element) -> Result<T, Error>
    where
        T: Default,
    {
        Ok(self.get(elem)?.unwrap_or_default())
    }
}

impl<T> Attr<T> {
    /// Write the value into `builder`, without invoking hooks.
    ///
    /// The value may be `T` itself or an `Option<T>`: anything
    /// encoding to `None` (e.g. `Option::None` or an enum's absence
    /// sentinel) leaves the attribute off the element.
    pub fn put<V: IntoAttributeValue>(
        &self,
        builder: minidom::ElementBuilder,
        value: V,
    ) -> minidom::ElementBuilder {
        builder.attr(self.name, value)
    }
}

impl<T: IntoAttributeValue> Attr<T> {
    /// Write the value into `builder`, passing it through the
    /// `clean_set` hook first.
    pub fn set(&self, builder: minidom::ElementBuilder, value: T) -> Result<minidom::ElementBuilder, Error> {
        let value = match self.clean_set {
            Some(clean_set) => clean_set(value)?,
            None => value,
        };
        Ok(builder.attr(self.name, value))
    }
}

/// Namespace placement of a child-element field.
#[derive(Clone, Copy, Debug)]
pub enum ChildNs {
    /// The child lives in the same namespace as its parent element.
    Inherit,

    /// The child lives in a fixed namespace of its own.
    Fixed(&'static str),
}

/// Descriptor for a field stored as the text of a uniquely-named child
/// element.
pub struct TextChild<T> {
    name: &'static str,
    ns: ChildNs,
    required: bool,
    clean: Option<Clean<T>>,
    _value: PhantomData<fn() -> T>,
}

impl<T> TextChild<T> {
    /// Descriptor for an optional text child in the parent's namespace.
    pub const fn new(name: &'static str) -> TextChild<T> {
        TextChild {
            name,
            ns: ChildNs::Inherit,
            required: false,
            clean: None,
            _value: PhantomData,
        }
    }

    /// Descriptor for a required text child in the parent's namespace.
    pub const fn required(name: &'static str) -> TextChild<T> {
        TextChild {
            name,
            ns: ChildNs::Inherit,
            required: true,
            clean: None,
            _value: PhantomData,
        }
    }

    /// Place the child in a fixed namespace instead of the parent's.
    pub const fn in_ns(mut self, ns: &'static str) -> TextChild<T> {
        self.ns = ChildNs::Fixed(ns);
        self
    }

    /// Attach a decode-side clean hook.
    pub const fn with_clean(mut self, clean: Clean<T>) -> TextChild<T> {
        self.clean = Some(clean);
        self
    }

    /// The element name this descriptor reads and writes.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    fn decode_ns(&self, parent: &Element) -> String {
        match self.ns {
            ChildNs::Inherit => parent.ns(),
            ChildNs::Fixed(ns) => ns.to_string(),
        }
    }

    /// Whether `child` is the element this descriptor is bound to,
    /// given that `child` is a child of an element in `parent_ns`.
    pub fn matches(&self, child: &Element, parent_ns: &str) -> bool {
        let ns = match self.ns {
            ChildNs::Inherit => parent_ns,
            ChildNs::Fixed(ns) => ns,
        };
        child.is(self.name, ns)
    }
}

impl<T: FromXmlText> TextChild<T> {
    /// Decode the text of the child from `elem`.
    pub fn get(&self, elem: &Element) -> Result<Option<T>, Error> {
        let ns = self.decode_ns(elem);
        match elem.get_child(self.name, ns.as_str()) {
            Some(child) => {
                let value = T::from_xml_text(child.text())?;
                match self.clean {
                    Some(clean) => clean(value).map(Some),
                    None => Ok(Some(value)),
                }
            }
            None if self.required => Err(Error::MissingChild(self.name)),
            None => Ok(None),
        }
    }

    /// Decode the text of the child, failing if the child is absent.
    pub fn get_required(&self, elem: &Element) -> Result<T, Error> {
        self.get(elem)?.ok_or(Error::MissingChild(self.name))
    }
}

impl<T> TextChild<T> {
    /// Append the child element carrying `text` to `builder`.
    ///
    /// `parent_ns` is the namespace the parent is being serialised
    /// under; it is used when the descriptor inherits its namespace.
    /// `None` appends nothing.
    pub fn append(
        &self,
        builder: minidom::ElementBuilder,
        parent_ns: &str,
        text: Option<String>,
    ) -> minidom::ElementBuilder {
        let ns = match self.ns {
            ChildNs::Inherit => parent_ns,
            ChildNs::Fixed(ns) => ns,
        };
        match text {
            Some(text) => builder.append(Element::builder(self.name, ns).append(text).build()),
            None => builder,
        }
    }
}

/// Descriptor for a field stored as a whole child element, decoded by
/// a nested entity.
pub struct Child<E> {
    required: bool,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Child<E> {
    /// Descriptor for an optional typed child.
    pub const fn new() -> Child<E> {
        Child {
            required: false,
            _entity: PhantomData,
        }
    }

    /// Descriptor for a required typed child.
    pub const fn required() -> Child<E> {
        Child {
            required: true,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Child<E> {
    /// Decode the first child of `elem` whose header matches `E`'s
    /// schema.
    ///
    /// Children that do not match are skipped; a matching child that
    /// fails to decode aborts with its error.
    pub fn get(&self, elem: &Element) -> Result<Option<E>, Error> {
        for child in elem.children() {
            match E::try_from(child.clone()) {
                Ok(value) => return Ok(Some(value)),
                Err(FromElementError::Mismatch(_)) => continue,
                Err(FromElementError::Invalid(e)) => return Err(e),
            }
        }
        if self.required {
            Err(Error::MissingChild(E::NAME))
        } else {
            Ok(None)
        }
    }

    /// Append the entity's element to `builder`. `None` appends
    /// nothing.
    pub fn append(&self, builder: minidom::ElementBuilder, value: Option<E>) -> minidom::ElementBuilder {
        match value {
            Some(value) => builder.append(Into::<Element>::into(value)),
            None => builder,
        }
    }
}
