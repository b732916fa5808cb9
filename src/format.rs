//! Helpers for encoding/decoding the login token format.
//!
//! A token is `PREFIX + reverse(base64(json(record)) with '=' -> SENTINEL) + SUFFIX`.
//!
//! This is an obfuscation transform, not a cipher: anyone who knows the format can read a
//! token and mint a new one. Nothing here is keyed by a server secret.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::record::SessionRecord;

/// Marker prepended to every token.
pub const PREFIX: &str = "9c0Mk$%S9mD&Yu";

/// Marker appended to every token.
pub const SUFFIX: &str = "uIml&8k#pI92*Qr";

/// Stand-in for the base64 padding character.
pub const SENTINEL: &str = "@6CFB18E2#iLpYs8Tb";

const PAD: &str = "=";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The value is not framed by [`PREFIX`] and [`SUFFIX`].
    #[error("token is missing its prefix or suffix")]
    Format,

    #[error("token payload could not be decoded: {0}")]
    Decode(String),

    #[error("session record could not be encoded: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Encode a [`SessionRecord`] into a cookie value.
pub fn encode_record(record: &SessionRecord) -> Result<String> {
    let json = serde_json::to_vec(record).map_err(|err| Error::Encode(err.to_string()))?;
    let body = STANDARD.encode(json).replace(PAD, SENTINEL);

    let mut token = String::with_capacity(PREFIX.len() + body.len() + SUFFIX.len());
    token.push_str(PREFIX);
    token.extend(body.chars().rev());
    token.push_str(SUFFIX);
    Ok(token)
}

/// Decode a cookie value into a [`SessionRecord`].
pub fn decode_record(value: &str) -> Result<SessionRecord> {
    decode_payload(value)?.ok_or_else(|| Error::Decode("token payload is null".into()))
}

/// Like [`decode_record`], but reports a payload of JSON `null` as `Ok(None)` instead of an
/// error.
pub fn decode_payload(value: &str) -> Result<Option<SessionRecord>> {
    let body = value
        .strip_prefix(PREFIX)
        .and_then(|rest| rest.strip_suffix(SUFFIX))
        .ok_or(Error::Format)?;

    let reversed: String = body.chars().rev().collect();
    let padded = reversed.replace(SENTINEL, PAD);

    let bytes = STANDARD
        .decode(padded.as_bytes())
        .map_err(|err| Error::Decode(err.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|err| Error::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::UserId;

    fn record() -> SessionRecord {
        SessionRecord {
            user_id: UserId(1),
            username: "a@b.com".into(),
            ip: "10.0.0.1".into(),
            mac: "AABBCCDDEEFF".into(),
            last_login: 1_700_000_000_000,
        }
    }

    #[test]
    fn roundtrip() {
        let record = record();
        let token = encode_record(&record).expect("record encodes");

        assert!(token.starts_with(PREFIX));
        assert!(token.ends_with(SUFFIX));
        assert_eq!(decode_record(&token), Ok(record));
    }

    #[test]
    fn roundtrip_with_unicode_and_empty_fields() {
        let record = SessionRecord {
            user_id: UserId(-42),
            username: "用户@例子.中国".into(),
            ip: String::new(),
            mac: String::new(),
            last_login: 0,
        };
        let token = encode_record(&record).expect("record encodes");

        assert_eq!(decode_record(&token), Ok(record));
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = encode_record(&record()).expect("record encodes");
        let b = encode_record(&record()).expect("record encodes");
        assert_eq!(a, b);
    }

    #[test]
    fn padding_is_replaced_and_body_reversed() {
        let record = record();
        let json = serde_json::to_vec(&record).expect("record serializes");
        let plain = STANDARD.encode(json);
        let token = encode_record(&record).expect("record encodes");

        let body = &token[PREFIX.len()..token.len() - SUFFIX.len()];
        assert!(!body.contains(PAD));
        let expected: String = plain.replace(PAD, SENTINEL).chars().rev().collect();
        assert_eq!(body, expected);
    }

    #[test]
    fn missing_prefix_or_suffix_is_a_format_error() {
        let token = encode_record(&record()).expect("record encodes");

        assert_eq!(decode_record(&token[1..]), Err(Error::Format));
        assert_eq!(decode_record(&token[..token.len() - 1]), Err(Error::Format));
        assert_eq!(decode_record(""), Err(Error::Format));
        assert_eq!(decode_record("bogus"), Err(Error::Format));
        assert_eq!(decode_record(&format!("{PREFIX}{SUFFIX}")[1..]), Err(Error::Format));
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        let token = format!("{PREFIX}!!not base64!!{SUFFIX}");
        assert!(matches!(decode_record(&token), Err(Error::Decode(_))));
    }

    #[test]
    fn missing_fields_are_a_decode_error() {
        let body = STANDARD.encode(br#"{"userId":1,"username":"a@b.com"}"#);
        let token = format!(
            "{PREFIX}{}{SUFFIX}",
            body.replace(PAD, SENTINEL).chars().rev().collect::<String>()
        );
        assert!(matches!(decode_record(&token), Err(Error::Decode(_))));
    }

    #[test]
    fn null_payload_decodes_to_none() {
        let body = STANDARD.encode(b"null");
        let token = format!(
            "{PREFIX}{}{SUFFIX}",
            body.replace(PAD, SENTINEL).chars().rev().collect::<String>()
        );

        assert_eq!(decode_payload(&token), Ok(None));
        assert!(matches!(decode_record(&token), Err(Error::Decode(_))));
    }
}
