use crate::utils::error::{LookupError, Result};
use encoding_rs::{EncoderResult, Encoding};
use std::borrow::Cow;
use std::str::FromStr;

/// Text encodings accepted for request URLs, response bodies and CSV output.
///
/// UTF-8, ISO-8859-1 and US-ASCII are handled directly so that ISO-8859-1
/// keeps its exact byte mapping (WHATWG treats that label as windows-1252).
/// Any other WHATWG label is served by `encoding_rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Ascii,
    Other(&'static Encoding),
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Latin1 => "ISO-8859-1",
            TextEncoding::Ascii => "US-ASCII",
            TextEncoding::Other(encoding) => encoding.name(),
        }
    }

    /// Encodes text, writing `?` for characters the encoding cannot represent.
    pub fn encode<'a>(&self, text: &'a str) -> Cow<'a, [u8]> {
        let limit = match self {
            TextEncoding::Utf8 => return Cow::Borrowed(text.as_bytes()),
            TextEncoding::Latin1 => 0xFF,
            TextEncoding::Ascii => 0x7F,
            TextEncoding::Other(encoding) => return Cow::Owned(encode_lossy(encoding, text)),
        };
        if text.is_ascii() {
            return Cow::Borrowed(text.as_bytes());
        }
        Cow::Owned(
            text.chars()
                .map(|c| if (c as u32) <= limit { c as u8 } else { b'?' })
                .collect(),
        )
    }

    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Result<Cow<'a, str>> {
        let undecodable = || LookupError::Undecodable {
            encoding: self.name(),
        };
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(Cow::Borrowed)
                .map_err(|_| undecodable()),
            TextEncoding::Ascii if !bytes.is_ascii() => Err(undecodable()),
            TextEncoding::Ascii => Ok(Cow::Owned(bytes.iter().map(|&b| b as char).collect())),
            TextEncoding::Latin1 => Ok(Cow::Owned(bytes.iter().map(|&b| b as char).collect())),
            TextEncoding::Other(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .ok_or_else(undecodable),
        }
    }
}

fn encode_lossy(encoding: &'static Encoding, text: &str) -> Vec<u8> {
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(text.len() + 16);
    let mut rest = text;
    loop {
        let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(rest, &mut out, true);
        rest = &rest[read..];
        match result {
            EncoderResult::InputEmpty => return out,
            EncoderResult::OutputFull => out.reserve(rest.len() + 16),
            EncoderResult::Unmappable(_) => out.push(b'?'),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = LookupError;

    fn from_str(name: &str) -> Result<Self> {
        let unsupported = || LookupError::UnsupportedEncoding {
            name: name.to_string(),
        };
        match name.trim().to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Ok(TextEncoding::Utf8),
            "ISO-8859-1" | "ISO8859-1" | "ISO8859_1" | "ISO_8859_1" | "LATIN1" => {
                Ok(TextEncoding::Latin1)
            }
            "US-ASCII" | "ASCII" => Ok(TextEncoding::Ascii),
            other => match Encoding::for_label(other.as_bytes()) {
                // UTF-16 and the replacement encoding cannot be written back out.
                Some(encoding) if encoding.output_encoding() == encoding => {
                    Ok(TextEncoding::Other(encoding))
                }
                _ => Err(unsupported()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_names() {
        assert_eq!("utf-8".parse::<TextEncoding>().unwrap(), TextEncoding::Utf8);
        assert_eq!("latin1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert_eq!("ISO8859_1".parse::<TextEncoding>().unwrap(), TextEncoding::Latin1);
        assert_eq!("US-ASCII".parse::<TextEncoding>().unwrap(), TextEncoding::Ascii);
        assert!(matches!(
            "jsonEncoding".parse::<TextEncoding>(),
            Err(LookupError::UnsupportedEncoding { .. })
        ));
    }

    #[test]
    fn test_parse_other_labels() {
        assert_eq!(
            "windows-1250".parse::<TextEncoding>().unwrap(),
            TextEncoding::Other(encoding_rs::WINDOWS_1250)
        );
        assert_eq!("Shift_JIS".parse::<TextEncoding>().unwrap().name(), "Shift_JIS");
        assert!("UTF-16LE".parse::<TextEncoding>().is_err());
        assert!("iso-2022-kr".parse::<TextEncoding>().is_err());
    }

    #[test]
    fn test_other_encoding_round_trip_and_placeholder() {
        let cp1250: TextEncoding = "windows-1250".parse().unwrap();

        assert_eq!(cp1250.encode("Łódź").as_ref(), b"\xa3\xf3d\x9f");
        assert_eq!(cp1250.decode(b"\xa3\xf3d\x9f").unwrap(), "Łódź");
        assert_eq!(cp1250.encode("Kraków €5 ☃").as_ref(), b"Krak\xf3w \x805 ?");
    }

    #[test]
    fn test_encode_replaces_unmappable() {
        assert_eq!(TextEncoding::Latin1.encode("Alcázar").as_ref(), b"Alc\xe1zar");
        assert_eq!(TextEncoding::Ascii.encode("Alcázar").as_ref(), b"Alc?zar");
        assert_eq!(TextEncoding::Latin1.encode("Kraków").as_ref(), b"Krak\xf3w");
        assert_eq!(TextEncoding::Latin1.encode("Łódź").as_ref(), b"?\xf3d?");
        assert_eq!(TextEncoding::Ascii.encode("Łódź").as_ref(), b"??d?");
    }

    #[test]
    fn test_decode() {
        assert_eq!(TextEncoding::Latin1.decode(b"M\xfcnchen").unwrap(), "München");
        assert!(TextEncoding::Utf8.decode(b"M\xfcnchen").is_err());
        assert!(TextEncoding::Ascii.decode(b"M\xfcnchen").is_err());
    }
}
