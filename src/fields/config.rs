use crate::error::ConfigError;

/// Fields every index line carries unless replaced.
pub const DEFAULT_FIELDS: &[&str] = &[
    "warc-target-uri",
    "mime",
    "http:status",
    "warc-payload-digest",
    "length",
    "offset",
    "filename",
];

/// Prefix of fields read from the paired request's HTTP head.
pub const REQUEST_FIELD_PREFIX: &str = "req.http:";

/// Two-way mapping between source field names and index keys.
///
/// `warc-target-uri` is written as `url`, and `--fields url` means
/// `warc-target-uri`. Names outside the table map to themselves.
pub struct FieldAliases;

impl FieldAliases {
    const TABLE: &'static [(&'static str, &'static str)] = &[
        ("warc-target-uri", "url"),
        ("http:status", "status"),
        ("warc-payload-digest", "digest"),
        ("req.http:referer", "referrer"),
        ("req.http:method", "method"),
    ];

    /// Index key for a source field name.
    pub fn output_name(field: &str) -> &str {
        Self::TABLE
            .iter()
            .find(|(source, _)| *source == field)
            .map_or(field, |&(_, alias)| alias)
    }

    /// Source field name for a user-supplied name or alias.
    pub fn source_name(name: &str) -> &str {
        Self::TABLE
            .iter()
            .find(|(_, alias)| *alias == name)
            .map_or(name, |&(source, _)| source)
    }
}

/// Ordered list of source field names resolved for every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConfig {
    fields: Vec<String>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl FieldConfig {
    /// Build from the `--fields` (append to defaults) and `--replace-fields`
    /// (use instead of defaults) comma-separated lists.
    pub fn from_lists(fields: Option<&str>, replace: Option<&str>) -> Result<Self, ConfigError> {
        match (fields, replace) {
            (Some(_), Some(_)) => Err(ConfigError::Conflict {
                first: "--fields",
                second: "--replace-fields",
            }),
            (None, Some(list)) => Ok(Self {
                fields: parse_list(list)?,
            }),
            (Some(list), None) => {
                let mut config = Self::default();
                config.fields.extend(parse_list(list)?);
                Ok(config)
            }
            (None, None) => Ok(Self::default()),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.fields
    }

    /// Whether any field has to be read from a paired request.
    pub fn needs_request(&self) -> bool {
        self.fields
            .iter()
            .any(|f| f.starts_with(REQUEST_FIELD_PREFIX))
    }
}

fn parse_list(list: &str) -> Result<Vec<String>, ConfigError> {
    list.split(',')
        .map(|name| {
            let name = name.trim();
            if name.is_empty() {
                Err(ConfigError::EmptyField(list.to_string()))
            } else {
                Ok(FieldAliases::source_name(name).to_string())
            }
        })
        .collect()
}
