//! Request header assembly

use faultline_core::domain::{DeliveryParams, HEADER_INTEGRITY};
use reqwest::header::{HeaderName, HeaderValue};
use tracing::debug;

use crate::DeliveryError;

/// Builds the ordered header list for one request
///
/// The integrity header, when `integrity` is given, comes first. Caller
/// headers follow in insertion order; `None` values are skipped and a caller
/// header named like the integrity header is dropped in favor of the token.
pub fn assemble(
    params: &DeliveryParams,
    integrity: Option<&str>,
) -> Result<Vec<(HeaderName, HeaderValue)>, DeliveryError> {
    let mut headers = Vec::with_capacity(params.headers().len() + 1);

    if let Some(token) = integrity {
        headers.push(parse(HEADER_INTEGRITY, token)?);
    }

    for (name, value) in params.present_headers() {
        if integrity.is_some() && name.eq_ignore_ascii_case(HEADER_INTEGRITY) {
            debug!("Caller integrity header superseded by payload token");
            continue;
        }
        headers.push(parse(name, value)?);
    }

    Ok(headers)
}

fn parse(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), DeliveryError> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| DeliveryError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
    let header_value = HeaderValue::from_str(value).map_err(|e| DeliveryError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok((header_name, header_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(headers: &[(HeaderName, HeaderValue)]) -> Vec<&str> {
        headers.iter().map(|(n, _)| n.as_str()).collect()
    }

    #[test]
    fn test_integrity_header_first() {
        let params = DeliveryParams::new("http://localhost")
            .with_header("X-First", Some("1".into()))
            .with_header("X-Second", Some("2".into()));

        let headers = assemble(&params, Some("sha256 abc")).unwrap();

        // HeaderName normalizes to lowercase
        assert_eq!(
            names(&headers),
            vec!["faultline-integrity", "x-first", "x-second"]
        );
        assert_eq!(headers[0].1, "sha256 abc");
    }

    #[test]
    fn test_none_values_skipped() {
        let params = DeliveryParams::new("http://localhost")
            .with_header("X-Present", Some("yes".into()))
            .with_header("X-Absent", None);

        let headers = assemble(&params, None).unwrap();
        assert_eq!(names(&headers), vec!["x-present"]);
    }

    #[test]
    fn test_caller_integrity_superseded() {
        let params = DeliveryParams::new("http://localhost")
            .with_header(HEADER_INTEGRITY, Some("caller".into()));

        let headers = assemble(&params, Some("payload")).unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].1, "payload");

        let without_token = assemble(&params, None).unwrap();
        assert_eq!(without_token[0].1, "caller");
    }

    #[test]
    fn test_invalid_header_value() {
        let params =
            DeliveryParams::new("http://localhost").with_header("X-Bad", Some("a\nb".into()));

        let err = assemble(&params, None).unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidHeader { ref name, .. } if name == "X-Bad"));
    }

    #[test]
    fn test_invalid_header_name() {
        let params =
            DeliveryParams::new("http://localhost").with_header("bad name", Some("v".into()));
        assert!(assemble(&params, None).is_err());
    }
}
