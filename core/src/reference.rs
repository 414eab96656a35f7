//! # Reference Parsing
//!
//! Splits `$ref` strings into a document part and a fragment, and resolves the
//! document part against the current scope with RFC 3986 rules.

use crate::error::ResolveError;
use crate::pointer::JsonPointer;
use percent_encoding::percent_decode_str;
use url::Url;

/// Classification of a reference by its document part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// Fragment only (`#/definitions/User`).
    Local,
    /// Relative document part (`common.yaml#/User`).
    Relative,
    /// Absolute URI (`https://example.com/schemas/user.json`).
    Remote,
}

/// A `$ref` value split at the first `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference<'a> {
    /// Everything before `#`. Empty for local references.
    pub document: &'a str,
    /// Everything after `#`, if present.
    pub fragment: Option<&'a str>,
    /// Document part classification.
    pub kind: ReferenceKind,
}

impl<'a> Reference<'a> {
    /// Splits a raw reference string. Never fails; validation happens when
    /// the parts are interpreted.
    pub fn parse(raw: &'a str) -> Self {
        let (document, fragment) = match raw.split_once('#') {
            Some((document, fragment)) => (document, Some(fragment)),
            None => (raw, None),
        };
        let kind = if document.is_empty() {
            ReferenceKind::Local
        } else if Url::parse(document).is_ok() {
            ReferenceKind::Remote
        } else {
            ReferenceKind::Relative
        };
        Self {
            document,
            fragment,
            kind,
        }
    }

    /// Parses the fragment as a JSON Pointer. A missing fragment addresses
    /// the whole document.
    pub fn pointer(&self, raw: &str) -> Result<JsonPointer, ResolveError> {
        let fragment = self.fragment.unwrap_or("");
        let decoded = percent_decode_str(fragment).decode_utf8().map_err(|e| {
            ResolveError::MalformedPointer {
                reference: raw.to_string(),
                reason: format!("fragment is not valid UTF-8 after percent-decoding: {}", e),
            }
        })?;
        JsonPointer::parse(&decoded).map_err(|e| ResolveError::from_pointer(raw, e))
    }

    /// Resolves the document part against `base`. Local references resolve
    /// to `base` itself.
    pub fn document_uri(&self, raw: &str, base: &Url) -> Result<Url, ResolveError> {
        if self.document.is_empty() {
            return Ok(base.clone());
        }
        resolve_document_uri(self.document, Some(base)).map_err(|reason| {
            ResolveError::MalformedPointer {
                reference: raw.to_string(),
                reason,
            }
        })
    }
}

/// Resolves a document identifier to an absolute URI without fragment.
pub(crate) fn resolve_document_uri(document: &str, base: Option<&Url>) -> Result<Url, String> {
    let mut url = match Url::parse(document) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or_else(|| {
                format!("relative document `{}` has no base URI to resolve against", document)
            })?;
            base.join(document).map_err(|e| e.to_string())?
        }
        Err(e) => return Err(e.to_string()),
    };
    url.set_fragment(None);
    Ok(url)
}

/// Builds a local reference into a definitions container.
///
/// `%` is encoded so the fragment survives the percent-decoding applied by
/// [`Reference::pointer`].
pub(crate) fn local_reference(container: &str, name: &str) -> String {
    let pointer = JsonPointer::root().join(container).join(name).to_string();
    format!("#{}", pointer.replace('%', "%25"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/api/openapi.yaml").unwrap()
    }

    #[test]
    fn test_parse_local() {
        let reference = Reference::parse("#/components/schemas/User");
        assert_eq!(reference.kind, ReferenceKind::Local);
        assert_eq!(reference.document, "");
        assert_eq!(reference.fragment, Some("/components/schemas/User"));
    }

    #[test]
    fn test_parse_relative_without_fragment() {
        let reference = Reference::parse("common.yaml");
        assert_eq!(reference.kind, ReferenceKind::Relative);
        assert_eq!(reference.fragment, None);
        assert!(reference.pointer("common.yaml").unwrap().is_root());
    }

    #[test]
    fn test_document_uri_relative_join() {
        let raw = "../shared/user.json#/User";
        let reference = Reference::parse(raw);
        let uri = reference.document_uri(raw, &base()).unwrap();
        assert_eq!(uri.as_str(), "https://example.com/shared/user.json");
    }

    #[test]
    fn test_document_uri_local_is_base() {
        let raw = "#/a";
        let uri = Reference::parse(raw).document_uri(raw, &base()).unwrap();
        assert_eq!(uri, base());
    }

    #[test]
    fn test_document_uri_strips_fragment() {
        let uri = resolve_document_uri("https://example.com/a.json#frag", None).unwrap();
        assert_eq!(uri.as_str(), "https://example.com/a.json");
    }

    #[test]
    fn test_relative_without_base_fails() {
        assert!(resolve_document_uri("a.json", None).is_err());
    }

    #[test]
    fn test_percent_encoded_fragment() {
        let raw = "#/paths/~1users~1%7Bid%7D";
        let pointer = Reference::parse(raw).pointer(raw).unwrap();
        assert_eq!(pointer.tokens(), ["paths", "/users/{id}"]);
    }

    #[test]
    fn test_anchor_fragment_is_malformed() {
        let raw = "#Anchor";
        let err = Reference::parse(raw).pointer(raw).unwrap_err();
        assert!(matches!(err, ResolveError::MalformedPointer { .. }));
    }

    #[test]
    fn test_local_reference_escapes_name() {
        assert_eq!(local_reference("$defs", "User"), "#/$defs/User");
        assert_eq!(local_reference("$defs", "a/b"), "#/$defs/a~1b");
        let raw = local_reference("$defs", "100%");
        let pointer = Reference::parse(&raw).pointer(&raw).unwrap();
        assert_eq!(pointer.tokens(), ["$defs", "100%"]);
    }
}
