use std::io;

use bytes::Bytes;

use crate::errors::Result;
use crate::ser::Serialize;

/// User ID Packet
/// <https://www.rfc-editor.org/rfc/rfc4880.html#section-5.11>
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct UserId {
    id: Bytes,
}

impl UserId {
    /// Parses a `UserId` packet from the given buffer.
    pub fn from_bytes(input: Bytes) -> Self {
        UserId { id: input }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(input: &str) -> Self {
        UserId {
            id: Bytes::copy_from_slice(input.as_bytes()),
        }
    }

    /// The user id as text, invalid UTF-8 is replaced.
    pub fn id(&self) -> String {
        String::from_utf8_lossy(&self.id).into_owned()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.id
    }
}

impl Serialize for UserId {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.id)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        self.id.len()
    }
}
