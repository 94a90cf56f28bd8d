//! `$ref` classification

use std::fmt;

/// A `$ref` target, classified by its shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// `./file.json` or `../dir/file.yaml`, resolved against the current directory
    RelativeFile(&'a str),
    /// `http://` or `https://` URL
    Http(&'a str),
    /// A named catalog definition, e.g. `aws-iam-role`
    Catalog(&'a str),
    /// `#/definitions/x`; never resolved
    Fragment(&'a str),
}

impl<'a> Reference<'a> {
    /// Classify a raw `$ref` string
    ///
    /// Returns `None` for strings that fit none of the forms (absolute
    /// paths, empty strings, leading punctuation).
    pub fn classify(raw: &'a str) -> Option<Self> {
        if raw.starts_with('#') {
            Some(Reference::Fragment(raw))
        } else if raw.starts_with("./") || raw.starts_with("../") {
            Some(Reference::RelativeFile(raw))
        } else if raw.starts_with("http://") || raw.starts_with("https://") {
            Some(Reference::Http(raw))
        } else if raw.starts_with(|c: char| c.is_ascii_alphanumeric()) {
            Some(Reference::Catalog(raw))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'a str {
        match self {
            Reference::RelativeFile(s)
            | Reference::Http(s)
            | Reference::Catalog(s)
            | Reference::Fragment(s) => s,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Reference::RelativeFile(_) => "file",
            Reference::Http(_) => "http",
            Reference::Catalog(_) => "catalog",
            Reference::Fragment(_) => "fragment",
        }
    }
}

impl fmt::Display for Reference<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            Reference::classify("./a.json"),
            Some(Reference::RelativeFile("./a.json"))
        );
        assert_eq!(
            Reference::classify("../shared/b.yaml"),
            Some(Reference::RelativeFile("../shared/b.yaml"))
        );
        assert_eq!(
            Reference::classify("https://example.com/s.json"),
            Some(Reference::Http("https://example.com/s.json"))
        );
        assert_eq!(
            Reference::classify("http://example.com/s.json"),
            Some(Reference::Http("http://example.com/s.json"))
        );
        assert_eq!(
            Reference::classify("aws-iam-role"),
            Some(Reference::Catalog("aws-iam-role"))
        );
        assert_eq!(
            Reference::classify("#/definitions/x"),
            Some(Reference::Fragment("#/definitions/x"))
        );
    }

    #[test]
    fn test_unclassifiable() {
        assert_eq!(Reference::classify(""), None);
        assert_eq!(Reference::classify("/etc/passwd"), None);
        assert_eq!(Reference::classify("-x"), None);
    }

    #[test]
    fn test_display() {
        let r = Reference::classify("./a.json").unwrap();
        assert_eq!(r.to_string(), "./a.json (file)");
    }
}
