/// Names (or fragments of names) to reprocess regardless of the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForceList {
    entries: Vec<String>,
}

impl ForceList {
    /// Parse a comma-separated list. Entries are trimmed and blanks dropped,
    /// so `""` and `" , "` both mean "nothing forced".
    pub fn parse(raw: &str) -> Self {
        let entries = raw
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect();
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `filename` equals or contains any entry.
    pub fn matches(&self, filename: &str) -> bool {
        self.entries.iter().any(|e| filename.contains(e.as_str()))
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}
