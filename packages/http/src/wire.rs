//! Rendering a [`RequestDescriptor`] into a [`WireRequest`].

use apicache_codec::UrlEncoder;
use apicache_core::{EncodingError, Value};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::HeaderMap;

use crate::descriptor::RequestDescriptor;
use crate::error::Error;
use crate::types::{Method, WireRequest};

fn require_map(value: Option<&Value>, what: &str) -> Result<(), EncodingError> {
    match value {
        Some(v) if !v.is_map() => Err(EncodingError::NotAMap {
            what: what.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Merge GET parameters into one query map.
///
/// A key present in both keeps its position from `parameters` and takes its
/// value from `url_parameters`. `None` when neither is given.
pub(crate) fn merge_query(
    parameters: Option<&Value>,
    url_parameters: Option<&Value>,
) -> Result<Option<Value>, EncodingError> {
    require_map(parameters, "parameters")?;
    require_map(url_parameters, "url parameters")?;

    let merged = match (parameters, url_parameters) {
        (None, None) => return Ok(None),
        (Some(p), None) => p.clone(),
        (None, Some(u)) => u.clone(),
        (Some(p), Some(u)) => {
            let mut merged = p.clone();
            if let Some(extra) = u.as_map() {
                for (key, value) in extra {
                    merged.insert(key.clone(), value.clone());
                }
            }
            merged
        }
    };
    Ok(Some(merged))
}

fn append_query(url: &mut url::Url, query: &Value) -> Result<(), EncodingError> {
    let encoded = UrlEncoder::encode_query(query)?;
    if encoded.is_empty() {
        return Ok(());
    }
    let combined = match url.query() {
        Some(existing) if !existing.is_empty() => format!("{}&{}", existing, encoded),
        _ => encoded,
    };
    url.set_query(Some(&combined));
    Ok(())
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), Error> {
    let name = HeaderName::try_from(name)?;
    let value = HeaderValue::try_from(value)?;
    headers.insert(name, value);
    Ok(())
}

/// Build the request that goes on the wire.
///
/// Any encoding problem surfaces here, before anything is sent.
pub(crate) fn build(
    descriptor: &RequestDescriptor,
    default_headers: &[(String, String)],
) -> Result<WireRequest, Error> {
    let mut url = descriptor.url()?;
    let encoder = descriptor.encoding().encoder();

    let body = match descriptor.method() {
        Method::GET => {
            if let Some(query) =
                merge_query(descriptor.parameters(), descriptor.url_parameters())?
            {
                append_query(&mut url, &query)?;
            }
            None
        }
        _ => {
            require_map(descriptor.url_parameters(), "url parameters")?;
            if let Some(query) = descriptor.url_parameters() {
                append_query(&mut url, query)?;
            }
            descriptor
                .parameters()
                .map(|p| encoder.encode(p))
                .transpose()?
        }
    };

    let mut headers = HeaderMap::new();
    for (name, value) in default_headers {
        insert_header(&mut headers, name, value)?;
    }
    if body.is_some() {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(encoder.content_type()));
    }
    for (name, value) in descriptor.headers() {
        insert_header(&mut headers, name, value)?;
    }

    tracing::trace!(
        method = %descriptor.method(),
        %url,
        body_len = body.as_ref().map(|b| b.len()),
        "built wire request"
    );

    Ok(WireRequest {
        method: descriptor.method(),
        url,
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicache_codec::Encoding;

    const BASE: &str = "https://api.example.com/v1";

    #[test]
    fn merge_url_parameters_win_in_place() {
        let p = Value::map().with("a", 1).with("b", 2);
        let u = Value::map().with("b", 3).with("c", 4);

        let merged = merge_query(Some(&p), Some(&u)).unwrap().unwrap();
        let keys: Vec<_> = merged.as_map().unwrap().keys().cloned().collect();

        assert_eq!(keys, ["a", "b", "c"]);
        assert_eq!(merged.get("b"), Some(&Value::from(3)));
    }

    #[test]
    fn merge_of_nothing_is_none() {
        assert_eq!(merge_query(None, None).unwrap(), None);
    }

    #[test]
    fn merge_rejects_non_maps() {
        let err = merge_query(Some(&Value::from("x")), None).unwrap_err();
        assert_eq!(
            err,
            EncodingError::NotAMap {
                what: "parameters".to_string()
            }
        );
    }

    #[test]
    fn get_puts_everything_in_the_query() {
        let descriptor = RequestDescriptor::builder(Method::GET, BASE, "users")
            .parameters(Value::map().with("id", "123").with("age", 12))
            .url_parameters(Value::map().with("page", 2))
            .build()
            .unwrap();

        let wire = build(&descriptor, &[]).unwrap();
        assert_eq!(wire.query(), Some("id=123&age=12&page=2"));
        assert!(wire.body.is_none());
        assert!(wire.header("content-type").is_none());
    }

    #[test]
    fn get_without_parameters_has_no_query() {
        let descriptor = RequestDescriptor::builder(Method::GET, BASE, "users")
            .build()
            .unwrap();
        let wire = build(&descriptor, &[]).unwrap();
        assert_eq!(wire.query(), None);
        assert_eq!(wire.url.as_str(), "https://api.example.com/v1/users");
    }

    #[test]
    fn post_json_body_and_query() {
        let descriptor = RequestDescriptor::builder(Method::POST, BASE, "users")
            .parameters(Value::map().with("name", "Jo").with("age", 12))
            .url_parameters(Value::map().with("token", "t k"))
            .build()
            .unwrap();

        let wire = build(&descriptor, &[]).unwrap();
        assert_eq!(wire.query(), Some("token=t%20k"));
        assert_eq!(wire.body.as_deref(), Some(&br#"{"name":"Jo","age":12}"#[..]));
        assert_eq!(wire.header("content-type"), Some("application/json"));
    }

    #[test]
    fn post_url_encoded_body() {
        let descriptor = RequestDescriptor::builder(Method::POST, BASE, "users")
            .parameters(Value::map().with("id", "123").with("age", 12))
            .encoding(Encoding::UrlQuery)
            .build()
            .unwrap();

        let wire = build(&descriptor, &[]).unwrap();
        assert_eq!(wire.body.as_deref(), Some(&b"id=123&age=12"[..]));
        assert_eq!(
            wire.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn binary_in_json_body_fails() {
        let descriptor = RequestDescriptor::builder(Method::PUT, BASE, "avatar")
            .parameters(Value::map().with("image", vec![0u8, 1, 2]))
            .build()
            .unwrap();

        assert!(matches!(
            build(&descriptor, &[]),
            Err(Error::Encoding(EncodingError::BinaryNotRepresentable { .. }))
        ));
    }

    #[test]
    fn request_headers_override_defaults() {
        let descriptor = RequestDescriptor::builder(Method::GET, BASE, "users")
            .header("X-Client", "request")
            .build()
            .unwrap();
        let defaults = vec![
            ("X-Client".to_string(), "default".to_string()),
            ("X-Api-Key".to_string(), "k".to_string()),
        ];

        let wire = build(&descriptor, &defaults).unwrap();
        assert_eq!(wire.header("x-client"), Some("request"));
        assert_eq!(wire.header("x-api-key"), Some("k"));
    }

    #[test]
    fn invalid_header_name_fails() {
        let descriptor = RequestDescriptor::builder(Method::GET, BASE, "users")
            .header("bad header", "v")
            .build()
            .unwrap();
        assert!(matches!(
            build(&descriptor, &[]),
            Err(Error::InvalidHeaderName(_))
        ));
    }

    #[test]
    fn existing_query_in_path_is_kept() {
        let descriptor = RequestDescriptor::builder(Method::GET, BASE, "search?q=x")
            .parameters(Value::map().with("page", 1))
            .build()
            .unwrap();
        let wire = build(&descriptor, &[]).unwrap();
        assert_eq!(wire.query(), Some("q=x&page=1"));
    }
}
