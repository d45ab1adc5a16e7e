use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::codec::{encode_field, Field, FIELD_TERMINATOR};
use crate::error::Result;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Builds a message one field at a time.
///
/// The encoder owns its buffer until [`finish`](Self::finish) hands back an
/// immutable [`Bytes`]. A field that fails to encode leaves the buffer exactly
/// as it was before the call, so a half-written field is never observable.
#[derive(Debug)]
pub struct MessageEncoder {
    buf: BytesMut,
    fields: usize,
}

impl MessageEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_BUFFER_CAPACITY)
    }

    /// Create an empty encoder with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
            fields: 0,
        }
    }

    /// Append a field.
    pub fn push(&mut self, field: &Field) -> Result<()> {
        let mark = self.buf.len();
        // Terminators go between fields, so the message never ends with one.
        if self.fields > 0 {
            self.buf.put_u8(FIELD_TERMINATOR);
        }

        if let Err(err) = encode_field(field, &mut self.buf) {
            self.buf.truncate(mark);
            debug!(name = %field.name, error = %err, "field rejected");
            return Err(err);
        }

        self.fields += 1;
        debug!(
            name = %field.name,
            field_type = %field.field_type,
            bytes = self.buf.len() - mark,
            "field encoded"
        );
        Ok(())
    }

    /// Number of fields encoded so far.
    pub fn field_count(&self) -> usize {
        self.fields
    }

    /// Bytes encoded so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True if nothing has been encoded yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish the message.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for MessageEncoder {
    fn default() -> Self {
        Self::new()
    }
}
