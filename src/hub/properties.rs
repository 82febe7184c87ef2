use crate::buffer::BufWriter;
use crate::error::Error;

/// A `name=value&name=value` property list stored in a caller buffer.
///
/// Names and values are written as given; the caller is responsible for any
/// escaping the service expects.
pub struct MessageProperties<'b> {
    buf: &'b mut [u8],
    len: usize,
}

impl<'b> MessageProperties<'b> {
    /// Start an empty list in `buf`.
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, len: 0 }
    }

    /// Wrap the first `len` bytes of `buf`, which already hold an encoded list.
    pub fn from_encoded(buf: &'b mut [u8], len: usize) -> Result<Self, Error> {
        let encoded = buf.get(..len).ok_or(Error::InvalidArgument)?;
        if core::str::from_utf8(encoded).is_err() {
            return Err(Error::InvalidArgument);
        }
        Ok(Self { buf, len })
    }

    /// Append `name=value`.
    ///
    /// On [`Error::BufferTooSmall`] the list is left as it was.
    pub fn append(&mut self, name: &str, value: &str) -> Result<(), Error> {
        if name.is_empty() || value.is_empty() {
            return Err(Error::InvalidArgument);
        }
        let mut w = BufWriter::with_len(self.buf, self.len);
        if self.len > 0 {
            w.push_byte(b'&')?;
        }
        w.push_str(name)?;
        w.push_byte(b'=')?;
        w.push_str(value)?;
        self.len = w.len();
        Ok(())
    }

    /// Value of the first property called `name`.
    pub fn find(&self, name: &str) -> Option<&str> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> PropertyIter<'_> {
        PropertyIter {
            rest: self.as_str(),
        }
    }

    /// The encoded list.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the list has no properties.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl core::fmt::Debug for MessageProperties<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("MessageProperties")
            .field(&self.as_str())
            .finish()
    }
}

/// Iterator returned by [`MessageProperties::iter`].
#[derive(Debug, Clone)]
pub struct PropertyIter<'p> {
    rest: &'p str,
}

impl<'p> Iterator for PropertyIter<'p> {
    type Item = (&'p str, &'p str);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.rest.is_empty() {
                return None;
            }
            let (pair, rest) = self.rest.split_once('&').unwrap_or((self.rest, ""));
            self.rest = rest;
            // Pairs without `=` are skipped rather than ending the walk.
            if let Some(pair) = pair.split_once('=') {
                return Some(pair);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_find() {
        let mut buf = [0u8; 64];
        let mut props = MessageProperties::new(&mut buf);
        assert!(props.is_empty());
        props.append("key", "value").unwrap();
        props.append("$.ct", "application%2Fjson").unwrap();
        assert_eq!(props.as_str(), "key=value&$.ct=application%2Fjson");
        assert_eq!(props.find("$.ct"), Some("application%2Fjson"));
        assert_eq!(props.find("missing"), None);
    }

    #[test]
    fn test_append_overflow_leaves_list_unchanged() {
        let mut buf = [0u8; 12];
        let mut props = MessageProperties::new(&mut buf);
        props.append("a", "1").unwrap();
        assert_eq!(props.append("long", "value"), Err(Error::BufferTooSmall));
        assert_eq!(props.as_str(), "a=1");
        assert_eq!(props.len(), 3);
    }

    #[test]
    fn test_append_rejects_empty() {
        let mut buf = [0u8; 12];
        let mut props = MessageProperties::new(&mut buf);
        assert_eq!(props.append("", "v"), Err(Error::InvalidArgument));
        assert_eq!(props.append("k", ""), Err(Error::InvalidArgument));
    }

    #[test]
    fn test_from_encoded() {
        let mut buf = [0u8; 32];
        buf[..7].copy_from_slice(b"a=1&b=2");
        let mut props = MessageProperties::from_encoded(&mut buf, 7).unwrap();
        props.append("c", "3").unwrap();
        let pairs: heapless::Vec<(&str, &str), 4> = props.iter().collect();
        assert_eq!(pairs.as_slice(), &[("a", "1"), ("b", "2"), ("c", "3")]);
    }

    #[test]
    fn test_from_encoded_length_out_of_range() {
        let mut buf = [0u8; 4];
        assert!(matches!(
            MessageProperties::from_encoded(&mut buf, 5),
            Err(Error::InvalidArgument)
        ));
    }
}
