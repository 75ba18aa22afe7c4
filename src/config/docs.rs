//! Options file documentation: single source of truth for descriptions.
//!
//! Used by `cargo xtask gen-docs` to generate `docs/Configuration.md`.

/// Documentation for one options-file key.
pub struct FieldDoc {
    /// Key as it appears in TOML
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Default value as a display string
    pub default_display: &'static str,
}

/// Options-file keys in display order.
pub const CONFIG_FIELDS: &[FieldDoc] = &[
    FieldDoc {
        name: "format",
        description: "Output encoding: \"cdxj\", \"cdx11\" or \"cdx09\"",
        default_display: "\"cdxj\"",
    },
    FieldDoc {
        name: "fields",
        description: "Comma-separated fields added to the default field list",
        default_display: "(none)",
    },
    FieldDoc {
        name: "replace_fields",
        description: "Comma-separated fields used instead of the default field list",
        default_display: "(none)",
    },
    FieldDoc {
        name: "records",
        description: "Comma-separated record types to index, or \"all\"",
        default_display: "\"response,revisit,resource,metadata\"",
    },
    FieldDoc {
        name: "post_append",
        description: "Append decoded POST/PUT request bodies to lookup keys",
        default_display: "false",
    },
    FieldDoc {
        name: "sort",
        description: "Sort index lines and drop duplicates",
        default_display: "false",
    },
    FieldDoc {
        name: "compress",
        description: "Path of the block-compressed index data file",
        default_display: "(none)",
    },
    FieldDoc {
        name: "lines",
        description: "Index lines per compressed block",
        default_display: "300",
    },
    FieldDoc {
        name: "filename",
        description: "Filename recorded in every entry instead of the input's name",
        default_display: "(none)",
    },
    FieldDoc {
        name: "dir_root",
        description: "Directory input filenames are recorded relative to",
        default_display: "(none)",
    },
];

/// Look up the documentation for a key.
pub fn field_doc(name: &str) -> Option<&'static FieldDoc> {
    CONFIG_FIELDS.iter().find(|f| f.name == name)
}
