//! Canonical field registry and column auto-detection
//!
//! Load files name the same metadata in wildly inconsistent ways
//! ("BEGBATES", "BatesBegin", "StartBates" are all the first Bates number
//! of a document). The registry maps each canonical field to the lowercase
//! column names it is known by; binding matches a table's header against it.

use crate::error::{Error, Result};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Canonical semantic fields a load-file column can map to
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum CanonicalField {
    // Identifiers
    BegDoc,
    EndDoc,
    // Attachment linkage
    BegAttach,
    EndAttach,
    AttachRange,
    ParentId,
    AttachIds,
    // Custodian and correspondence metadata
    Custodian,
    AllCustodians,
    Author,
    From,
    To,
    Cc,
    Bcc,
    Subject,
    MessageId,
    InReplyTo,
    ConversationIndex,
    EmailFolder,
    Importance,
    // Dates and times
    DateSent,
    TimeSent,
    DateReceived,
    TimeReceived,
    DateCreated,
    TimeCreated,
    DateModified,
    TimeModified,
    DateLastPrinted,
    TimeZone,
    // File metadata
    FileName,
    FileExt,
    FileSize,
    FilePath,
    PageCount,
    Title,
    DocType,
    RecordType,
    Confidentiality,
    Language,
    ProductionVolume,
    Redacted,
    // Hashes
    MD5Hash,
    SHA1Hash,
    SHA256Hash,
    // Link paths
    NativeLink,
    TextLink,
    ImageLink,
    OcrPath,
}

impl CanonicalField {
    /// Canonical name, as used in registry files and reports
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::BegDoc => "BegDoc",
            CanonicalField::EndDoc => "EndDoc",
            CanonicalField::BegAttach => "BegAttach",
            CanonicalField::EndAttach => "EndAttach",
            CanonicalField::AttachRange => "AttachRange",
            CanonicalField::ParentId => "ParentId",
            CanonicalField::AttachIds => "AttachIds",
            CanonicalField::Custodian => "Custodian",
            CanonicalField::AllCustodians => "AllCustodians",
            CanonicalField::Author => "Author",
            CanonicalField::From => "From",
            CanonicalField::To => "To",
            CanonicalField::Cc => "Cc",
            CanonicalField::Bcc => "Bcc",
            CanonicalField::Subject => "Subject",
            CanonicalField::MessageId => "MessageId",
            CanonicalField::InReplyTo => "InReplyTo",
            CanonicalField::ConversationIndex => "ConversationIndex",
            CanonicalField::EmailFolder => "EmailFolder",
            CanonicalField::Importance => "Importance",
            CanonicalField::DateSent => "DateSent",
            CanonicalField::TimeSent => "TimeSent",
            CanonicalField::DateReceived => "DateReceived",
            CanonicalField::TimeReceived => "TimeReceived",
            CanonicalField::DateCreated => "DateCreated",
            CanonicalField::TimeCreated => "TimeCreated",
            CanonicalField::DateModified => "DateModified",
            CanonicalField::TimeModified => "TimeModified",
            CanonicalField::DateLastPrinted => "DateLastPrinted",
            CanonicalField::TimeZone => "TimeZone",
            CanonicalField::FileName => "FileName",
            CanonicalField::FileExt => "FileExt",
            CanonicalField::FileSize => "FileSize",
            CanonicalField::FilePath => "FilePath",
            CanonicalField::PageCount => "PageCount",
            CanonicalField::Title => "Title",
            CanonicalField::DocType => "DocType",
            CanonicalField::RecordType => "RecordType",
            CanonicalField::Confidentiality => "Confidentiality",
            CanonicalField::Language => "Language",
            CanonicalField::ProductionVolume => "ProductionVolume",
            CanonicalField::Redacted => "Redacted",
            CanonicalField::MD5Hash => "MD5Hash",
            CanonicalField::SHA1Hash => "SHA1Hash",
            CanonicalField::SHA256Hash => "SHA256Hash",
            CanonicalField::NativeLink => "NativeLink",
            CanonicalField::TextLink => "TextLink",
            CanonicalField::ImageLink => "ImageLink",
            CanonicalField::OcrPath => "OcrPath",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Built-in synonym table. Entry order is the precedence order.
///
/// Edit this to update autodetection; synonyms must be lowercase.
const STANDARD_SYNONYMS: &[(CanonicalField, &[&str])] = &[
    (
        CanonicalField::BegDoc,
        &[
            "begdoc", "begbates", "beginbates", "batesbegin", "batestart", "startbates",
            "prodbeg", "begno", "begdoc#",
        ],
    ),
    (
        CanonicalField::EndDoc,
        &[
            "enddoc", "endbates", "batesend", "endingbates", "prodend", "endno", "enddoc#",
        ],
    ),
    (
        CanonicalField::BegAttach,
        &["begattach", "beginattach", "attachbeg", "prodbegattach"],
    ),
    (
        CanonicalField::EndAttach,
        &["endattach", "attachend", "prodendattach"],
    ),
    (
        CanonicalField::AttachRange,
        &["attachrange", "attach range", "attachmentrange"],
    ),
    (
        CanonicalField::ParentId,
        &["parentid", "parentdocid", "parentbates", "parentdoc"],
    ),
    (
        CanonicalField::AttachIds,
        &["attachids", "attachmentids", "attachdocids", "childbates"],
    ),
    (CanonicalField::Custodian, &["custodian"]),
    (
        CanonicalField::AllCustodians,
        &["allcustodians", "all custodians", "dupcustodians", "duplicatecustodians"],
    ),
    (CanonicalField::Author, &["author", "docauthor"]),
    (CanonicalField::From, &["from", "emailfrom", "email from", "sender"]),
    (CanonicalField::To, &["to", "emailto", "email to", "recipient", "recipients"]),
    (CanonicalField::Cc, &["cc", "emailcc", "email cc"]),
    (CanonicalField::Bcc, &["bcc", "emailbcc", "email bcc"]),
    (
        CanonicalField::Subject,
        &["subject", "emailsubject", "email subject", "docsubject"],
    ),
    (
        CanonicalField::MessageId,
        &["messageid", "message id", "msgid", "internetmessageid"],
    ),
    (CanonicalField::InReplyTo, &["inreplyto", "in reply to", "inreplytoid"]),
    (
        CanonicalField::ConversationIndex,
        &["conversationindex", "conversation index", "conversationid"],
    ),
    (
        CanonicalField::EmailFolder,
        &["emailfolder", "email folder", "mailfolder", "folder"],
    ),
    (CanonicalField::Importance, &["importance", "priority"]),
    (
        CanonicalField::DateSent,
        &["datesent", "date sent", "sentdate", "senton"],
    ),
    (CanonicalField::TimeSent, &["timesent", "time sent", "senttime"]),
    (
        CanonicalField::DateReceived,
        &["datereceived", "date received", "receiveddate"],
    ),
    (
        CanonicalField::TimeReceived,
        &["timereceived", "time received", "receivedtime"],
    ),
    (
        CanonicalField::DateCreated,
        &["datecreated", "date created", "createdate", "creationdate"],
    ),
    (CanonicalField::TimeCreated, &["timecreated", "time created", "createtime"]),
    (
        CanonicalField::DateModified,
        &["datemodified", "date modified", "moddate", "datelastmodified", "lastmodifieddate"],
    ),
    (CanonicalField::TimeModified, &["timemodified", "time modified", "modtime"]),
    (
        CanonicalField::DateLastPrinted,
        &["datelastprinted", "date last printed", "lastprinted", "printeddate"],
    ),
    (
        CanonicalField::TimeZone,
        &["timezone", "time zone", "tz", "timezoneprocessed"],
    ),
    (
        CanonicalField::FileName,
        &["filename", "file name", "origfilename", "originalfilename"],
    ),
    (
        CanonicalField::FileExt,
        &["fileext", "file ext", "fileextension", "extension"],
    ),
    (CanonicalField::FileSize, &["filesize", "file size", "size"]),
    (
        CanonicalField::FilePath,
        &["filepath", "file path", "origfilepath", "sourcefilepath"],
    ),
    (
        CanonicalField::PageCount,
        &["pagecount", "page count", "pages", "pgcount", "numpages"],
    ),
    (CanonicalField::Title, &["title", "doctitle"]),
    (CanonicalField::DocType, &["doctype", "doc type", "documenttype"]),
    (CanonicalField::RecordType, &["recordtype", "record type"]),
    (
        CanonicalField::Confidentiality,
        &["confidentiality", "confidential", "confidentialitydesignation"],
    ),
    (CanonicalField::Language, &["language", "languages", "doclanguage"]),
    (
        CanonicalField::ProductionVolume,
        &["productionvolume", "production volume", "prodvolume", "volume", "volumename"],
    ),
    (CanonicalField::Redacted, &["redacted", "redaction", "hasredactions"]),
    (CanonicalField::MD5Hash, &["md5hash", "md5 hash", "md5", "hash", "hashvalue"]),
    (CanonicalField::SHA1Hash, &["sha1hash", "sha1 hash", "sha1", "sha-1"]),
    (CanonicalField::SHA256Hash, &["sha256hash", "sha256 hash", "sha256", "sha-256"]),
    (
        CanonicalField::NativeLink,
        &["nativelink", "native link", "nativepath", "nativefile", "link"],
    ),
    (
        CanonicalField::TextLink,
        &["textlink", "text link", "textpath", "fulltext"],
    ),
    (
        CanonicalField::ImageLink,
        &["imagelink", "image link", "imagepath"],
    ),
    (CanonicalField::OcrPath, &["ocrpath", "ocr path", "ocrtext", "ocrfile"]),
];

/// A single registry entry: one canonical field and its known column names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// The canonical field this entry binds
    pub field: CanonicalField,
    /// Lowercase column names recognized for the field
    pub synonyms: Vec<String>,
}

/// Ordered synonym registry.
///
/// Entry order is the precedence contract: when one column name appears as
/// a synonym under two canonical fields, the earlier entry claims it. Each
/// field is still evaluated independently against the full column list, so
/// a single column can satisfy more than one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRegistry {
    entries: Vec<RegistryEntry>,
}

impl FieldRegistry {
    /// Build a registry from explicit entries (order is precedence)
    pub fn new(entries: Vec<RegistryEntry>) -> Self {
        Self { entries }
    }

    /// The built-in registry
    pub fn standard() -> Self {
        let entries = STANDARD_SYNONYMS
            .iter()
            .map(|(field, synonyms)| RegistryEntry {
                field: *field,
                synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        Self { entries }
    }

    /// Load a registry from JSON, lowercasing synonyms
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        let mut registry: Self = serde_json::from_str(&content).map_err(Error::Json)?;
        for entry in &mut registry.entries {
            for synonym in &mut entry.synonyms {
                *synonym = synonym.to_lowercase();
            }
        }
        Ok(registry)
    }

    /// Save the registry to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Registry entries in precedence order
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Bind a table's columns to canonical fields.
    ///
    /// For each entry in precedence order, table columns are scanned in
    /// header order and the first column whose lowercased name exactly
    /// matches a synonym wins. Unmatched fields stay unbound. The table is
    /// not modified.
    pub fn bind(&self, table: &Table) -> FieldBinding {
        let lowered: Vec<String> = table
            .columns
            .iter()
            .map(|c| c.name.to_lowercase())
            .collect();

        let mut bound = BTreeMap::new();
        for entry in &self.entries {
            if bound.contains_key(&entry.field) {
                continue;
            }
            for (idx, name) in lowered.iter().enumerate() {
                if entry.synonyms.iter().any(|s| s == name) {
                    bound.insert(entry.field, table.columns[idx].name.clone());
                    break;
                }
            }
        }

        FieldBinding { bound }
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Mapping from canonical field to the column name found in a table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinding {
    bound: BTreeMap<CanonicalField, String>,
}

impl FieldBinding {
    /// The column bound to a canonical field, if any
    pub fn column(&self, field: CanonicalField) -> Option<&str> {
        self.bound.get(&field).map(|s| s.as_str())
    }

    /// Whether a canonical field matched a column
    pub fn is_bound(&self, field: CanonicalField) -> bool {
        self.bound.contains_key(&field)
    }

    /// Number of bound fields
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    /// Whether nothing was bound
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    /// Iterate over (field, column) pairs
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        self.bound.iter().map(|(f, c)| (*f, c.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_load_file_str;
    use crate::table::Table;

    fn table_with_columns(names: &[&str]) -> Table {
        let header = names.join(&crate::parser::FIELD_DELIMITER.to_string());
        parse_load_file_str(&format!("{header}\n"), "test.dat").unwrap()
    }

    #[test]
    fn test_bind_case_insensitive() {
        let registry = FieldRegistry::standard();

        let upper = registry.bind(&table_with_columns(&["BEGBATES", "ENDBATES"]));
        let lower = registry.bind(&table_with_columns(&["begbates", "endbates"]));

        assert_eq!(upper.column(CanonicalField::BegDoc), Some("BEGBATES"));
        assert_eq!(lower.column(CanonicalField::BegDoc), Some("begbates"));
        assert_eq!(upper.column(CanonicalField::EndDoc), Some("ENDBATES"));
    }

    #[test]
    fn test_bind_first_column_in_header_order_wins() {
        let registry = FieldRegistry::standard();
        let table = table_with_columns(&["BatesBegin", "BegDoc"]);

        let binding = registry.bind(&table);
        assert_eq!(binding.column(CanonicalField::BegDoc), Some("BatesBegin"));
    }

    #[test]
    fn test_bind_unmatched_fields_stay_unbound() {
        let registry = FieldRegistry::standard();
        let table = table_with_columns(&["BEGBATES", "SomethingElse"]);

        let binding = registry.bind(&table);
        assert!(binding.is_bound(CanonicalField::BegDoc));
        assert!(!binding.is_bound(CanonicalField::EndDoc));
        assert!(!binding.is_bound(CanonicalField::Custodian));
    }

    #[test]
    fn test_bind_all_unrecognized_columns() {
        let registry = FieldRegistry::standard();
        let table = table_with_columns(&["Foo", "Bar", "Baz"]);

        let binding = registry.bind(&table);
        assert!(binding.is_empty());
    }

    #[test]
    fn test_bind_is_idempotent() {
        let registry = FieldRegistry::standard();
        let table = table_with_columns(&["BEGBATES", "ENDBATES", "Custodian", "MD5"]);

        let first = registry.bind(&table);
        let second = registry.bind(&table);
        assert_eq!(first, second);
    }

    #[test]
    fn test_precedence_earlier_entry_claims_shared_synonym() {
        let registry = FieldRegistry::new(vec![
            RegistryEntry {
                field: CanonicalField::BegDoc,
                synonyms: vec!["docno".to_string()],
            },
            RegistryEntry {
                field: CanonicalField::EndDoc,
                synonyms: vec!["docno".to_string(), "endno".to_string()],
            },
        ]);
        let table = table_with_columns(&["DocNo", "EndNo"]);

        let binding = registry.bind(&table);
        // Both fields bind; the shared synonym resolves to the earlier entry,
        // and EndDoc still matches independently via its other synonym.
        assert_eq!(binding.column(CanonicalField::BegDoc), Some("DocNo"));
        assert_eq!(binding.column(CanonicalField::EndDoc), Some("DocNo"));
    }

    #[test]
    fn test_standard_synonyms_are_lowercase() {
        for entry in FieldRegistry::standard().entries() {
            for synonym in &entry.synonyms {
                assert_eq!(synonym, &synonym.to_lowercase(), "field {}", entry.field);
            }
        }
    }

    #[test]
    fn test_standard_registers_begdoc_first() {
        let registry = FieldRegistry::standard();
        assert_eq!(registry.entries()[0].field, CanonicalField::BegDoc);
        assert_eq!(registry.entries()[1].field, CanonicalField::EndDoc);
    }

    #[test]
    fn test_registry_json_round_trip() {
        let registry = FieldRegistry::standard();
        let json = serde_json::to_string_pretty(&registry).unwrap();
        let loaded: FieldRegistry = serde_json::from_str(&json).unwrap();

        assert_eq!(registry, loaded);
    }
}
