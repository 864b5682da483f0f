//! Value patterns that identify PII inside free-form strings

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// A compiled detection pattern and the placeholder that replaces its matches.
pub struct ValuePattern {
    pub name: &'static str,
    pub regex: &'static LazyLock<Option<Regex>>,
    pub placeholder: &'static str,
}

macro_rules! value_pattern {
    ($name:ident, $regex_str:expr) => {
        pub static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($regex_str).ok());
    };
}

// Bearer headers and bare JWTs (session tokens leak into error messages)
value_pattern!(RE_BEARER, r"(?i)\bbearer\s+[A-Za-z0-9._~+/\-]+=*");
value_pattern!(
    RE_JWT,
    r"\beyJ[A-Za-z0-9_\-]+\.[A-Za-z0-9_\-]+\.[A-Za-z0-9_\-]+"
);

value_pattern!(
    RE_EMAIL,
    r"[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}"
);

// Visa, MC, Amex, Discover
value_pattern!(
    RE_CARD,
    r"\b(?:4\d{3}|5[1-5]\d{2}|3[47]\d{2}|6(?:011|5\d{2}))[-\s]?\d{4}[-\s]?\d{4}[-\s]?\d{3,4}\b"
);

value_pattern!(
    RE_PHONE,
    r"(?:\+\d{1,3}[-.\s]?)?\(?\b\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b"
);

value_pattern!(
    RE_IPV4,
    r"\b(?:(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\.){3}(?:25[0-5]|2[0-4]\d|[01]?\d\d?)\b"
);

/// All value patterns in application order. Tokens and emails go first:
/// they contain digit runs the broader patterns would otherwise split.
pub fn all_patterns() -> [ValuePattern; 6] {
    [
        ValuePattern {
            name: "bearer",
            regex: &RE_BEARER,
            placeholder: "[token]",
        },
        ValuePattern {
            name: "jwt",
            regex: &RE_JWT,
            placeholder: "[token]",
        },
        ValuePattern {
            name: "email",
            regex: &RE_EMAIL,
            placeholder: "[email]",
        },
        ValuePattern {
            name: "card",
            regex: &RE_CARD,
            placeholder: "[card]",
        },
        ValuePattern {
            name: "phone",
            regex: &RE_PHONE,
            placeholder: "[phone]",
        },
        ValuePattern {
            name: "ipv4",
            regex: &RE_IPV4,
            placeholder: "[ip]",
        },
    ]
}

/// Replace every pattern match in `text`. Borrows when nothing matched.
pub fn redact(text: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(text);
    for pat in all_patterns() {
        // A pattern that failed to compile matches nothing.
        let Some(re) = pat.regex.as_ref() else {
            continue;
        };
        if re.is_match(&out) {
            out = Cow::Owned(re.replace_all(&out, pat.placeholder).into_owned());
        }
    }
    out
}

/// Names of patterns that failed to compile.
pub fn unhealthy_patterns() -> Vec<&'static str> {
    all_patterns()
        .into_iter()
        .filter(|pat| pat.regex.is_none())
        .map(|pat| pat.name)
        .collect()
}
