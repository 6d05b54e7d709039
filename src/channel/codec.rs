use crate::constants::MAX_MESSAGE_SIZE;
use crate::error::ChannelError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};

/// Read one length-prefixed JSON frame.
///
/// Frames are a 4-byte little-endian length followed by that many bytes of
/// UTF-8 JSON, the same framing Chrome native messaging uses.
pub fn read_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T, ChannelError> {
    let mut len_bytes = [0u8; 4];
    reader.read_exact(&mut len_bytes)?;
    let len = usize::try_from(u32::from_le_bytes(len_bytes)).unwrap_or(usize::MAX);

    if len > MAX_MESSAGE_SIZE {
        return Err(ChannelError::MessageTooLarge {
            len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;

    Ok(serde_json::from_slice(&buffer)?)
}

/// Write one length-prefixed JSON frame and flush.
pub fn write_frame<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<(), ChannelError> {
    let json = serde_json::to_vec(message)?;
    if json.len() > MAX_MESSAGE_SIZE {
        return Err(ChannelError::MessageTooLarge {
            len: json.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let len = u32::try_from(json.len()).map_err(|_| ChannelError::MessageTooLarge {
        len: json.len(),
        max: MAX_MESSAGE_SIZE,
    })?;

    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&json)?;
    writer.flush()?;

    Ok(())
}
