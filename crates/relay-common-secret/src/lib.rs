//! Secret handling for credentials that travel through the request pipeline.
//!
//! Access tokens and API keys are wrapped in [`Secret`] so they never end up in
//! logs or serialized configuration by accident. [`Redactor`] scrubs the places
//! where credentials show up in request logs: sensitive headers and credential
//! query parameters.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::sync::OnceLock;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Placeholder written wherever a secret would have been printed.
pub const REDACTED: &str = "[REDACTED]";

/// A secret value that is redacted in logs and debug output.
///
/// # Example
///
/// ```rust
/// use relay_common_secret::Secret;
///
/// let token = Secret::new("eyJhbGciOi".to_string());
/// assert_eq!(format!("{}", token), "[REDACTED]");
/// assert_eq!(format!("{:?}", token), "Secret([REDACTED])");
/// assert_eq!(token.expose(), "eyJhbGciOi");
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Secret<T: Zeroize>(T);

impl<T: Zeroize> Secret<T> {
    /// Create a new secret.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the secret value.
    ///
    /// Call this only at the point where the value leaves the process,
    /// e.g. when writing an `Authorization` header.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// Whether the wrapped string is empty (or whitespace only).
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl<T: Zeroize> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T: Zeroize> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", REDACTED)
    }
}

impl<T: Zeroize + Default> Default for Secret<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Zeroize + PartialEq> PartialEq for Secret<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

// Deserialize normally so tokens can come from config files; serialize redacted.
impl<'de, T: Zeroize + Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Secret::new)
    }
}

impl<T: Zeroize + Serialize> Serialize for Secret<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        REDACTED.serialize(serializer)
    }
}

/// Type alias for a secret string.
pub type SecretString = Secret<String>;

/// Header names whose values are never logged.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
];

/// Scrubs credentials out of values that are about to be logged.
pub struct Redactor;

impl Redactor {
    /// Whether a header carries credentials.
    pub fn is_sensitive_header(name: &str) -> bool {
        SENSITIVE_HEADERS
            .iter()
            .any(|sensitive| sensitive.eq_ignore_ascii_case(name))
    }

    /// Value of a header as it may appear in logs.
    ///
    /// For `Authorization` the scheme is kept (`Bearer [REDACTED]`) so logs
    /// still show which kind of credential was sent.
    pub fn header_value<'a>(name: &str, value: &'a str) -> Cow<'a, str> {
        if !Self::is_sensitive_header(name) {
            return Cow::Borrowed(value);
        }

        match value.split_once(' ') {
            Some((scheme, _)) if name.eq_ignore_ascii_case("authorization") => {
                Cow::Owned(format!("{} {}", scheme, REDACTED))
            }
            _ => Cow::Borrowed(REDACTED),
        }
    }

    /// Redact credential query parameters (`api_key`, `access_token`, ...) in a URL.
    pub fn url(url: &str) -> Cow<'_, str> {
        credential_param().replace_all(url, |caps: &regex::Captures<'_>| {
            format!("{}{}={}", &caps[1], &caps[2], REDACTED)
        })
    }
}

fn credential_param() -> &'static regex::Regex {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        regex::Regex::new(r"(?i)([?&])(api_key|apikey|access_token|token|key)=[^&#]*")
            .expect("credential parameter pattern is valid")
    })
}
