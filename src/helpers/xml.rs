//! Event reading over the worksheet, relationship and drawing parts of a form.

use crate::error::FormError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// Malformed entities or attribute values met while reading a part.
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Parse entity '{0}' failed")]
    ParseEntityError(String),

    #[error("Parse attribute value '{0}' failed")]
    ParseAttributeValueError(String),
}

/// Pull reader that reuses one event buffer and reports self-closing tags
/// as a start/end pair, so `<mergeCell/>` and `<c/>` need no special arm.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        let buffer = Vec::with_capacity(1024);
        XmlReader { reader, buffer }
    }

    /// `None` at end of input.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, FormError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(FormError::XmlError(error)),
        }
    }
}

/// Unescaped and typed access to a single attribute.
pub(crate) trait XmlAttributeHelper<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, FormError>;

    /// Unparseable text surfaces as `ParseAttributeValueError` carrying the raw value.
    fn parse_value<T: FromStr>(&self) -> Result<T, FormError>;
}

impl<'a> XmlAttributeHelper<'a> for Attribute<'a> {
    fn get_value(&self) -> Result<Cow<'a, str>, FormError> {
        Ok(self.unescape_value()?)
    }

    fn parse_value<T: FromStr>(&self) -> Result<T, FormError> {
        self.get_value()?
            .parse()
            .map_err(|_| match std::str::from_utf8(&self.value) {
                Ok(value) => FormError::XmlHelperError(XmlError::ParseAttributeValueError(value.to_string())),
                Err(error) => FormError::StringEncodingError(error),
            })
    }
}

/// Attribute lookup on a start tag.
pub(crate) trait XmlNodeHelper<'a> {
    /// Lookup by the name exactly as written, prefix included.
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, FormError>;

    /// Lookup ignoring the prefix; DrawingML producers bind `r:embed` and
    /// `r:id` to whatever prefix they like.
    fn get_local_attribute_value(&'a self, local_name: &str) -> Result<Option<Cow<'a, str>>, FormError>;

    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, FormError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, FormError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.get_value())
            .transpose()
    }

    fn get_local_attribute_value(&'a self, local_name: &str) -> Result<Option<Cow<'a, str>>, FormError> {
        for result in self.attributes() {
            let attribute = result?;
            if attribute.key.local_name().as_ref() == local_name.as_bytes() {
                return Ok(Some(attribute.get_value()?));
            }
        }
        Ok(None)
    }

    fn parse_attribute_value<T: FromStr>(&self, name: &str) -> Result<Option<T>, FormError> {
        self.try_get_attribute(name)?
            .map(|attribute| attribute.parse_value())
            .transpose()
    }
}

/// Accumulates cell and shared-string text split across events.
pub(crate) trait XmlTextContextHelper {
    /// Appends a `&amp;`-style entity or a `&#233;` character reference.
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), FormError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), FormError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = if let Some(hex) = number.strip_prefix('x') {
                u32::from_str_radix(hex, 16)?
            } else {
                number.parse::<u32>()?
            };
            if let Some(character) = char::from_u32(code) {
                self.push(character);
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::ParseEntityError(raw.to_string()))?;
        }

        Ok(())
    }
}

#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}
