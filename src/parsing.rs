//! Parsing functions to parse data using [Buf].

use bytes::{Buf, Bytes};
use snafu::Snafu;

/// Parsing errors
#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("reading {:?}: needed {}, remaining {}", typ, needed, remaining))]
    TooShort {
        typ: Typ,
        needed: usize,
        remaining: usize,
    },
}

impl Error {
    /// Returns true if the error indictates that the input was too short.
    pub fn is_incomplete(&self) -> bool {
        match self {
            Self::TooShort { .. } => true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Typ {
    U8,
    U16Be,
    U32Be,
    Array(usize),
    Take(usize),
}

pub trait BufParsing: Buf + Sized {
    fn read_u8(&mut self) -> Result<u8, Error> {
        self.ensure_remaining(Typ::U8, 1)?;
        Ok(self.get_u8())
    }

    fn read_be_u16(&mut self) -> Result<u16, Error> {
        self.ensure_remaining(Typ::U16Be, 2)?;
        Ok(self.get_u16())
    }

    fn read_be_u32(&mut self) -> Result<u32, Error> {
        self.ensure_remaining(Typ::U32Be, 4)?;
        Ok(self.get_u32())
    }

    fn read_array<const C: usize>(&mut self) -> Result<[u8; C], Error> {
        self.ensure_remaining(Typ::Array(C), C)?;
        let mut arr = [0u8; C];
        self.copy_to_slice(&mut arr);
        Ok(arr)
    }

    fn read_take(&mut self, size: usize) -> Result<Bytes, Error> {
        self.ensure_remaining(Typ::Take(size), size)?;
        Ok(self.copy_to_bytes(size))
    }

    fn rest(&mut self) -> Bytes {
        let len = self.remaining();
        self.copy_to_bytes(len)
    }

    fn ensure_remaining(&self, typ: Typ, size: usize) -> Result<(), Error> {
        if self.remaining() < size {
            return Err(Error::TooShort {
                typ,
                needed: size,
                remaining: self.remaining(),
            });
        }

        Ok(())
    }
}

impl<B: Buf> BufParsing for B {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_numbers() {
        let mut buf = Bytes::from_static(&[1, 0, 2, 0, 0, 0, 3, 4]);
        assert_eq!(buf.read_u8().unwrap(), 1);
        assert_eq!(buf.read_be_u16().unwrap(), 2);
        assert_eq!(buf.read_be_u32().unwrap(), 3);
        assert_eq!(buf.rest(), Bytes::from_static(&[4]));
    }

    #[test]
    fn test_too_short() {
        let mut buf = Bytes::from_static(&[1, 2]);
        let err = buf.read_be_u32().unwrap_err();
        assert!(err.is_incomplete());
        assert_eq!(buf.remaining(), 2, "failed reads must not consume");
        assert!(buf.read_take(3).is_err());
        assert_eq!(buf.read_array::<2>().unwrap(), [1, 2]);
    }
}
