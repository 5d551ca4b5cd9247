use thiserror::Error;

/// Maximum length of a header name in bytes.
pub const HEADER_NAME_SIZE: usize = 48;
/// Maximum length of a header value in bytes.
pub const HEADER_VALUE_SIZE: usize = 1024;
/// Maximum number of headers a single request or response may carry.
pub const MAX_HEADER_COUNT: usize = 64;

/// Returned by [`FieldBuf::push`] when a field is already at capacity.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("field capacity of {0} bytes exceeded")]
pub struct CapacityExceeded(pub usize);

/// Returned by [`HeaderTable::try_push`] when the table already holds
/// [`MAX_HEADER_COUNT`] entries.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("header table full ({MAX_HEADER_COUNT} entries)")]
pub struct TableFull;

/// A byte accumulator with a fixed capacity.
///
/// Appends are checked: once `capacity` bytes are stored, further pushes
/// fail instead of growing the buffer. The parser keeps one of these per
/// request field and maps the overflow onto the field-specific error.
#[derive(Debug)]
pub struct FieldBuf {
    bytes: Vec<u8>,
    capacity: usize,
}

impl FieldBuf {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a single byte, failing when the buffer is full.
    pub fn push(&mut self, byte: u8) -> Result<(), CapacityExceeded> {
        if self.bytes.len() == self.capacity {
            return Err(CapacityExceeded(self.capacity));
        }
        self.bytes.push(byte);
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Converts the accumulated bytes to a string (lossily, for non-UTF-8
    /// input) and clears the buffer for reuse.
    pub fn take_string(&mut self) -> String {
        let s = String::from_utf8_lossy(&self.bytes).into_owned();
        self.bytes.clear();
        s
    }
}

/// A single `name: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// An ordered collection of headers, capped at [`MAX_HEADER_COUNT`].
///
/// Insertion order is preserved and duplicate names are kept as-is;
/// lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTable {
    entries: Vec<Header>,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(MAX_HEADER_COUNT),
        }
    }

    /// Appends an entry, failing when the table is at capacity.
    pub fn try_push(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), TableFull> {
        if self.is_full() {
            return Err(TableFull);
        }
        self.entries.push(Header {
            name: name.into(),
            value: value.into(),
        });
        Ok(())
    }

    /// Appends an entry.
    ///
    /// # Panics
    ///
    /// Panics when the table is full. Response construction adds a handful
    /// of fixed headers and stays far under the cap; parsing untrusted
    /// input goes through [`HeaderTable::try_push`].
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if self.try_push(name, value).is_err() {
            panic!("header table overflow");
        }
    }

    /// Looks up a header by exact name, returning the first match.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() == MAX_HEADER_COUNT
    }
}
