use std::collections::HashMap;

/// One row of the input sheet: the site to audit plus every other column
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputRecord {
    pub url: String,
    pub fields: HashMap<String, String>,
}

impl InputRecord {
    pub fn new(url: impl Into<String>) -> Self {
        InputRecord {
            url: url.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    pub fn field(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// Bare domains get an `https://` scheme, anything already on http(s) is kept.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    match url.starts_with("http://") || url.starts_with("https://") {
        true => url.to_string(),
        false => format!("https://{}", url),
    }
}
