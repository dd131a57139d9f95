//! Configuration for CORS (Cross-Origin Resource Sharing).

use std::time::Duration;

use duration_str::deserialize_option_duration;
use serde::{Deserialize, Deserializer, de::Error as _};
use url::Url;

/// Configuration for CORS (Cross-Origin Resource Sharing).
#[derive(Clone, Default, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// If false (or not defined), credentials are not allowed in requests.
    pub allow_credentials: bool,
    /// Origins from which we allow requests.
    pub allow_origins: Option<AllowedOrigins>,
    /// Maximum time between OPTIONS and the next request.
    #[serde(deserialize_with = "deserialize_option_duration")]
    pub max_age: Option<Duration>,
}

/// Either the wildcard `"*"` or an explicit list of origin URLs.
#[derive(Clone, Debug, PartialEq)]
pub enum AllowedOrigins {
    /// Any origin is allowed.
    Any,
    /// A specific, explicit list of allowed origins.
    Explicit(Vec<Url>),
}

impl<'de> Deserialize<'de> for AllowedOrigins {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }

        let parse = |s: String| s.parse::<Url>().map_err(D::Error::custom);

        match Raw::deserialize(deserializer)? {
            Raw::One(s) if s == "*" => Ok(AllowedOrigins::Any),
            Raw::One(s) => Ok(AllowedOrigins::Explicit(vec![parse(s)?])),
            Raw::Many(urls) => Ok(AllowedOrigins::Explicit(
                urls.into_iter().map(parse).collect::<Result<_, _>>()?,
            )),
        }
    }
}
