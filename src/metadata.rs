use std::collections::BTreeMap;
use std::fmt;
use url::form_urlencoded;

/// Caller-supplied query parameters attached to a logged report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Metadata {
    #[default]
    None,
    Single {
        key: String,
        value: String,
    },
    Object(BTreeMap<String, Vec<String>>),
}

impl Metadata {
    /// Parses the raw query string of the report request.
    ///
    /// With `as_object` unset only the first parameter is kept. Malformed
    /// percent-encoding is decoded lossily and parameters without a key are
    /// skipped.
    pub fn from_query(query: Option<&str>, as_object: bool) -> Metadata {
        let Some(query) = query else {
            return Metadata::None;
        };

        let mut pairs = form_urlencoded::parse(query.as_bytes()).filter(|(key, _)| !key.is_empty());

        if !as_object {
            return match pairs.next() {
                Some((key, value)) => Metadata::Single {
                    key: key.into_owned(),
                    value: value.into_owned(),
                },
                None => Metadata::None,
            };
        }

        let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in pairs {
            map.entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }

        if map.is_empty() {
            Metadata::None
        } else {
            Metadata::Object(map)
        }
    }
}

impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metadata::None => Ok(()),
            Metadata::Single { key, value } => write!(f, "{key}={value}"),
            Metadata::Object(map) => {
                f.write_str("{")?;
                for (i, (key, values)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match values.as_slice() {
                        [value] => write!(f, "{key}={value}")?,
                        _ => write!(f, "{key}=[{}]", values.join(", "))?,
                    }
                }
                f.write_str("}")
            }
        }
    }
}
