/// RouterOS API wire format.
///
/// A sentence is a sequence of words terminated by an empty word.
/// Every word is prefixed with its length, encoded in 1 to 5 bytes:
///
/// | length            | prefix                 |
/// |-------------------|------------------------|
/// | < 0x80            | 1 byte                 |
/// | < 0x4000          | 2 bytes, `0x8000` set  |
/// | < 0x200000        | 3 bytes, `0xC00000` set|
/// | < 0x10000000      | 4 bytes, `0xE0000000`  |
/// | otherwise         | `0xF0` + 4 bytes       |
///
/// Reply sentences start with `!re`, `!done`, `!trap` or `!fatal`;
/// attributes follow as `=key=value` words.
use tokio::io::{AsyncRead, AsyncReadExt};

use super::SessionError;
use crate::schema::Record;

/// Largest word accepted from a device.
pub const MAX_WORD_LEN: usize = 16 * 1024 * 1024;

/// Appends the length prefix of a word.
pub fn encode_length(len: usize, out: &mut Vec<u8>) {
    let len = len as u64;
    if len < 0x80 {
        out.push(len as u8);
    } else if len < 0x4000 {
        out.extend_from_slice(&((len | 0x8000) as u16).to_be_bytes());
    } else if len < 0x20_0000 {
        out.extend_from_slice(&((len | 0xC0_0000) as u32).to_be_bytes()[1..]);
    } else if len < 0x1000_0000 {
        out.extend_from_slice(&((len | 0xE000_0000) as u32).to_be_bytes());
    } else {
        out.push(0xF0);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
}

/// Encodes words plus the terminating empty word.
pub fn encode_sentence<S: AsRef<str>>(words: &[S]) -> Vec<u8> {
    let mut out = Vec::new();
    for word in words {
        let bytes = word.as_ref().as_bytes();
        encode_length(bytes.len(), &mut out);
        out.extend_from_slice(bytes);
    }
    out.push(0);
    out
}

async fn read_length<R: AsyncRead + Unpin>(r: &mut R) -> Result<usize, SessionError> {
    let first = read_byte(r).await?;

    let (extra, mut len) = if first & 0x80 == 0 {
        (0, first as u32)
    } else if first & 0xC0 == 0x80 {
        (1, (first & 0x3F) as u32)
    } else if first & 0xE0 == 0xC0 {
        (2, (first & 0x1F) as u32)
    } else if first & 0xF0 == 0xE0 {
        (3, (first & 0x0F) as u32)
    } else if first == 0xF0 {
        (4, 0)
    } else {
        return Err(SessionError::Protocol(format!(
            "unsupported control byte 0x{first:02x}"
        )));
    };

    for _ in 0..extra {
        len = (len << 8) | read_byte(r).await? as u32;
    }

    Ok(len as usize)
}

async fn read_byte<R: AsyncRead + Unpin>(r: &mut R) -> Result<u8, SessionError> {
    match r.read_u8().await {
        Ok(b) => Ok(b),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(SessionError::Closed),
        Err(e) => Err(e.into()),
    }
}

/// Reads one word; an empty string marks the end of a sentence.
///
/// Bytes that are not valid UTF-8 (legacy code pages in comments)
/// are replaced rather than rejected.
pub async fn read_word<R: AsyncRead + Unpin>(r: &mut R) -> Result<String, SessionError> {
    let len = read_length(r).await?;
    if len > MAX_WORD_LEN {
        return Err(SessionError::Protocol(format!(
            "word length {len} exceeds limit of {MAX_WORD_LEN} bytes"
        )));
    }

    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            SessionError::Closed
        } else {
            e.into()
        }
    })?;

    Ok(match String::from_utf8(buf) {
        Ok(word) => word,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}

/// One decoded reply sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    /// `!re`, `!done`, `!trap`, `!fatal`
    pub reply: String,

    /// `=key=value` attributes in arrival order
    pub attributes: Record,

    /// Words that are neither the reply word nor attributes
    /// (`.tag=`, or the bare reason text after `!fatal`)
    pub other: Vec<String>,
}

/// Reads words up to the terminating empty word.
pub async fn read_sentence<R: AsyncRead + Unpin>(r: &mut R) -> Result<Sentence, SessionError> {
    let mut words = Vec::new();
    loop {
        let word = read_word(r).await?;
        if word.is_empty() {
            // Empty sentences may show up between replies
            if words.is_empty() {
                continue;
            }
            break;
        }
        words.push(word);
    }

    Ok(parse_sentence(words))
}

/// Splits raw words into reply type, attributes and the rest.
pub fn parse_sentence(words: Vec<String>) -> Sentence {
    let mut words = words.into_iter();
    let reply = words.next().unwrap_or_default();
    let mut attributes = Record::new();
    let mut other = Vec::new();

    for word in words {
        match word.strip_prefix('=').and_then(|rest| rest.split_once('=')) {
            Some((key, value)) => attributes.insert(key, value),
            None => other.push(word),
        }
    }

    Sentence {
        reply,
        attributes,
        other,
    }
}
