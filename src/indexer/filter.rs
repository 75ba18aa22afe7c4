use crate::archive::{ArchiveRecord, RecordType};
use crate::error::ConfigError;

/// Record types indexed when no list is given.
pub const DEFAULT_RECORDS: &[RecordType] = &[
    RecordType::Response,
    RecordType::Revisit,
    RecordType::Resource,
    RecordType::Metadata,
];

/// Content type of WARC field-list blocks (warcinfo-style metadata).
pub const WARC_FIELDS_TYPE: &str = "application/warc-fields";

/// Which records make it into the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    /// Every record is a candidate.
    All,
    /// Only records of these types.
    Only(Vec<RecordType>),
}

impl Default for RecordFilter {
    fn default() -> Self {
        RecordFilter::Only(DEFAULT_RECORDS.to_vec())
    }
}

impl RecordFilter {
    /// Parse `--records`: `None` for the default set, `all` to disable
    /// filtering, or a comma-separated list of record types.
    pub fn parse(list: Option<&str>) -> Result<Self, ConfigError> {
        let Some(list) = list else {
            return Ok(Self::default());
        };
        if list.trim().eq_ignore_ascii_case("all") {
            return Ok(RecordFilter::All);
        }

        let types = list
            .split(',')
            .map(|tag| {
                let tag = tag.trim();
                if tag.is_empty() {
                    Err(ConfigError::EmptyRecordType(list.to_string()))
                } else {
                    Ok(RecordType::from_tag(tag))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(RecordFilter::Only(types))
    }

    fn is_default_set(&self) -> bool {
        matches!(self, RecordFilter::Only(types) if types.as_slice() == DEFAULT_RECORDS)
    }

    /// Whether a record should be indexed.
    ///
    /// With the default set, `resource` and `metadata` records holding a WARC
    /// field list are left out as well.
    pub fn admits(&self, record: &ArchiveRecord) -> bool {
        let types = match self {
            RecordFilter::All => return true,
            RecordFilter::Only(types) => types,
        };
        if !types.contains(&record.rec_type) {
            return false;
        }

        let field_list = matches!(record.rec_type, RecordType::Resource | RecordType::Metadata)
            && record.rec_headers.get("Content-Type") == Some(WARC_FIELDS_TYPE);
        !(field_list && self.is_default_set())
    }
}
