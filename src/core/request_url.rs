use crate::utils::encoding::TextEncoding;
use crate::utils::error::Result;
use std::borrow::Cow;
use url::form_urlencoded;

/// The base URL with exactly one trailing slash.
pub fn with_trailing_slash(base_url: &str) -> Cow<'_, str> {
    if base_url.ends_with('/') {
        Cow::Borrowed(base_url)
    } else {
        Cow::Owned(format!("{}/", base_url))
    }
}

/// Form-encodes `location` in the given encoding, then writes spaces as `%20`.
pub fn encode_location(location: &str, encoding: TextEncoding) -> String {
    form_urlencoded::byte_serialize(&encoding.encode(location))
        .collect::<String>()
        .replace('+', "%20")
}

/// `base_url` + `/` when missing + the percent-encoded location.
pub fn build_request_url(base_url: &str, location: &str, encoding_name: &str) -> Result<String> {
    let encoding: TextEncoding = encoding_name.parse()?;
    Ok(request_url(base_url, location, encoding))
}

pub(crate) fn request_url(base_url: &str, location: &str, encoding: TextEncoding) -> String {
    format!(
        "{}{}",
        with_trailing_slash(base_url),
        encode_location(location, encoding)
    )
}
