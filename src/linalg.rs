mod matrix;
mod vector;

pub use matrix::Matrix;
pub use vector::Vector;

use std::io::{self, Read};

use crate::error::{NetworkError, Result};

fn check_same_len(expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(NetworkError::DimensionMismatch { expected, got });
    }
    Ok(())
}

pub(crate) fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => NetworkError::Decode(format!("truncated {}", what)),
        _ => NetworkError::Io(e),
    })
}

pub(crate) fn read_u64<R: Read>(reader: &mut R, what: &str) -> Result<usize> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf, what)?;
    usize::try_from(u64::from_le_bytes(buf))
        .map_err(|_| NetworkError::Decode(format!("{} does not fit in usize", what)))
}
