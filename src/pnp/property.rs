//! Walking twin documents property by property.

use super::{COMPONENT_PROPERTY_LABEL_NAME, TWIN_DESIRED_NAME, TWIN_REPORTED_NAME, TWIN_VERSION_NAME};
use crate::error::{Error, JsonError};
use crate::json::{JsonReader, JsonToken, TokenKind};

/// The shape of the document handed to [`TwinPropertyReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwinPayload {
    /// A full twin, `{"desired":{…},"reported":{…}}`, as returned by a GET.
    FullDocument,
    /// A desired-properties patch. The root object is the desired section.
    DesiredPatch,
}

/// Which section of a full twin document to walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TwinSection {
    /// Properties written by the service.
    #[default]
    Desired,
    /// Properties written by the device.
    Reported,
}

/// One property found in a twin section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwinProperty<'a, 'c> {
    /// The registered component the property belongs to, `None` at root level.
    pub component: Option<&'c str>,
    /// The property name token.
    pub name: JsonToken<'a>,
    /// The first token of the value. For objects and arrays this is the
    /// opening bracket; the full value is in [`Self::raw_value`].
    pub value: JsonToken<'a>,
    /// The complete JSON text of the value.
    pub raw_value: &'a [u8],
}

impl<'a> TwinProperty<'a, '_> {
    /// A reader over the value alone, for walking object and array values.
    pub fn value_reader(&self) -> JsonReader<'a> {
        JsonReader::new(self.raw_value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Walking,
    Done,
    Failed(Error),
}

/// Pull iterator over the properties of one twin section.
///
/// Top-level keys whose name is in the component list and whose value is an
/// object are treated as components: the reader steps into them and yields
/// their properties tagged with the component name. Everything else is a
/// root-level property. `$version` and the `__t` component marker are never
/// yielded.
///
/// ```
/// use libiot_pnp::pnp::{TwinPayload, TwinPropertyReader};
///
/// let patch = br#"{"thermostat1":{"__t":"c","targetTemperature":21},"$version":5}"#;
/// let mut reader = TwinPropertyReader::new(patch, TwinPayload::DesiredPatch, &["thermostat1"])?;
/// assert_eq!(reader.version(), Some(5));
///
/// let prop = reader.next_property()?.unwrap();
/// assert_eq!(prop.component, Some("thermostat1"));
/// assert!(prop.name.is_text_equal("targetTemperature"));
/// assert_eq!(prop.value.get_i32()?, 21);
/// assert!(reader.next_property()?.is_none());
/// # Ok::<(), libiot_pnp::error::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct TwinPropertyReader<'a, 'c> {
    json: &'a [u8],
    payload: TwinPayload,
    section: TwinSection,
    components: &'c [&'c str],
    reader: JsonReader<'a>,
    component: Option<&'c str>,
    version: Option<u32>,
    state: State,
}

impl<'a, 'c> TwinPropertyReader<'a, 'c> {
    /// Position a reader on the desired section of `json`.
    ///
    /// Fails with [`Error::ItemNotFound`] when a full document has no
    /// `desired` object, and with [`Error::Json`] when the document is
    /// malformed before the section starts or the section's `$version` is
    /// not an unsigned integer.
    pub fn new(
        json: &'a [u8],
        payload: TwinPayload,
        components: &'c [&'c str],
    ) -> Result<Self, Error> {
        let (reader, version) = open_section(json, payload, TwinSection::Desired)?;
        Ok(Self {
            json,
            payload,
            section: TwinSection::Desired,
            components,
            reader,
            component: None,
            version,
            state: State::Walking,
        })
    }

    /// Restart the walk on another section of a full document.
    ///
    /// A desired patch only has the desired section; asking it for
    /// [`TwinSection::Reported`] is an [`Error::InvalidArgument`].
    pub fn section(self, section: TwinSection) -> Result<Self, Error> {
        if self.payload == TwinPayload::DesiredPatch && section == TwinSection::Reported {
            return Err(Error::InvalidArgument);
        }
        let (reader, version) = open_section(self.json, self.payload, section)?;
        Ok(Self {
            section,
            reader,
            component: None,
            version,
            state: State::Walking,
            ..self
        })
    }

    /// `$version` of the section, if present.
    pub fn version(&self) -> Option<u32> {
        self.version
    }

    /// The section being walked.
    pub fn current_section(&self) -> TwinSection {
        self.section
    }

    /// The next property, or `Ok(None)` once the section has been read.
    ///
    /// After `Ok(None)` every call returns `Ok(None)`. After an error every
    /// call returns the same error.
    pub fn next_property(&mut self) -> Result<Option<TwinProperty<'a, 'c>>, Error> {
        match self.state {
            State::Done => return Ok(None),
            State::Failed(err) => return Err(err),
            State::Walking => {}
        }
        match self.walk() {
            Ok(None) => {
                self.state = State::Done;
                Ok(None)
            }
            Ok(Some(property)) => Ok(Some(property)),
            Err(err) => {
                debug!("twin walk failed: {}", err);
                self.state = State::Failed(err);
                Err(err)
            }
        }
    }

    fn walk(&mut self) -> Result<Option<TwinProperty<'a, 'c>>, Error> {
        loop {
            self.reader.next_token()?;
            let name = *self.reader.token();
            match name.kind {
                TokenKind::PropertyName => {}
                TokenKind::EndObject => {
                    if let Some(component) = self.component.take() {
                        trace!("leaving component {}", component);
                        continue;
                    }
                    if self.payload == TwinPayload::FullDocument {
                        skip_to_root_end(&mut self.reader)?;
                    }
                    self.reader.finish()?;
                    return Ok(None);
                }
                _ => return Err(JsonError::UnexpectedToken.into()),
            }

            let skip = match self.component {
                None => name.is_text_equal(TWIN_VERSION_NAME),
                Some(_) => name.is_text_equal(COMPONENT_PROPERTY_LABEL_NAME),
            };
            if skip {
                self.reader.skip_children()?;
                continue;
            }

            self.reader.next_token()?;
            let value = *self.reader.token();
            if self.component.is_none() && value.kind == TokenKind::BeginObject {
                if let Some(component) = self.find_component(&name) {
                    trace!("entering component {}", component);
                    self.component = Some(component);
                    continue;
                }
            }

            let start = self.reader.token_start();
            self.reader.skip_children()?;
            let raw_value = self.reader.input(start, self.reader.position());
            return Ok(Some(TwinProperty {
                component: self.component,
                name,
                value,
                raw_value,
            }));
        }
    }

    fn find_component(&self, name: &JsonToken<'_>) -> Option<&'c str> {
        self.components
            .iter()
            .copied()
            .find(|component| name.is_text_equal(component))
    }
}

/// Leave a reader on the opening brace of `section` and read its version.
fn open_section(
    json: &[u8],
    payload: TwinPayload,
    section: TwinSection,
) -> Result<(JsonReader<'_>, Option<u32>), Error> {
    let mut reader = JsonReader::new(json);
    reader.next_token()?;
    expect_object(&reader)?;

    if payload == TwinPayload::FullDocument {
        let wanted = match section {
            TwinSection::Desired => TWIN_DESIRED_NAME,
            TwinSection::Reported => TWIN_REPORTED_NAME,
        };
        loop {
            reader.next_token()?;
            let token = *reader.token();
            match token.kind {
                TokenKind::PropertyName if token.is_text_equal(wanted) => {
                    reader.next_token()?;
                    expect_object(&reader)?;
                    break;
                }
                TokenKind::PropertyName => reader.skip_children()?,
                TokenKind::EndObject => {
                    reader.finish()?;
                    debug!("twin document has no {} section", wanted);
                    return Err(Error::ItemNotFound);
                }
                _ => return Err(JsonError::UnexpectedToken.into()),
            }
        }
    }

    let version = scan_version(reader.clone())?;
    debug!("twin section version {}", version.unwrap_or_default());
    Ok((reader, version))
}

/// Read the members after a section up to the root's closing brace.
fn skip_to_root_end(reader: &mut JsonReader<'_>) -> Result<(), Error> {
    loop {
        reader.next_token()?;
        match reader.token().kind {
            TokenKind::PropertyName => reader.skip_children()?,
            TokenKind::EndObject => return Ok(()),
            _ => return Err(JsonError::UnexpectedToken.into()),
        }
    }
}

/// Look ahead through a section's top-level keys for `$version`.
fn scan_version(mut reader: JsonReader<'_>) -> Result<Option<u32>, Error> {
    loop {
        reader.next_token()?;
        let token = *reader.token();
        match token.kind {
            TokenKind::PropertyName if token.is_text_equal(TWIN_VERSION_NAME) => {
                reader.next_token()?;
                return reader.token().get_u32().map(Some);
            }
            TokenKind::PropertyName => reader.skip_children()?,
            TokenKind::EndObject => return Ok(None),
            _ => return Err(JsonError::UnexpectedToken.into()),
        }
    }
}

fn expect_object(reader: &JsonReader<'_>) -> Result<(), Error> {
    if reader.token().kind == TokenKind::BeginObject {
        Ok(())
    } else {
        Err(JsonError::UnexpectedToken.into())
    }
}
