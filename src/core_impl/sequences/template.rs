use std::borrow::Cow;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::*;
use crate::engine::TemplateEncoding;

/// Decodes an adder's stored template into HTML.
pub(crate) fn decode_template(code: &str, encoding: TemplateEncoding) -> Result<String> {
    if code.trim().is_empty() {
        return Err(Error::Template("template value is empty".into()));
    }
    match encoding {
        TemplateEncoding::Uri => urlencoding::decode(code)
            .map(Cow::into_owned)
            .map_err(|err| Error::Template(format!("invalid URI-encoded template: {err}"))),
        TemplateEncoding::Base64 => {
            let compact = code
                .chars()
                .filter(|ch| !ch.is_ascii_whitespace())
                .collect::<String>();
            let bytes = STANDARD
                .decode(compact.as_bytes())
                .map_err(|err| Error::Template(format!("invalid base64 template: {err}")))?;
            String::from_utf8(bytes)
                .map_err(|err| Error::Template(format!("template is not UTF-8: {err}")))
        }
    }
}
