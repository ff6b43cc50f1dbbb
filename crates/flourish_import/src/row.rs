//! Row normalization and classification.
//!
//! The header check runs against every row in the stream, not just the
//! first: concatenated exports repeat their header line mid-file.

/// Column labels of a header row, compared trimmed and case-insensitive.
const HEADER_LABELS: [&str; 3] = ["section", "subsection", "question"];

/// Classification of one raw input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    /// The row is exactly the `Section, Subsection, Question` header.
    Header,
    /// No fields, or the section field is blank.
    Empty,
    Data(DataRow),
}

/// A trimmed data row. Missing trailing columns become empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRow {
    pub section: String,
    pub subsection: String,
    pub question: String,
}

/// Classify a raw CSV record.
pub fn classify(record: &csv::StringRecord) -> RowKind {
    if is_header(record) {
        return RowKind::Header;
    }

    let section = clean(record.get(0).unwrap_or(""));
    if section.is_empty() {
        return RowKind::Empty;
    }

    RowKind::Data(DataRow {
        section: section.to_string(),
        subsection: clean(record.get(1).unwrap_or("")).to_string(),
        question: clean(record.get(2).unwrap_or("")).to_string(),
    })
}

fn is_header(record: &csv::StringRecord) -> bool {
    record.len() == HEADER_LABELS.len()
        && record
            .iter()
            .zip(HEADER_LABELS)
            .all(|(field, label)| clean(field).eq_ignore_ascii_case(label))
}

/// Trim whitespace and any stray UTF-8 BOM character.
fn clean(field: &str) -> &str {
    field.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    #[test]
    fn header_is_detected_case_insensitively() {
        assert_eq!(
            classify(&record(&["Section", "Subsection", "Question"])),
            RowKind::Header
        );
        assert_eq!(
            classify(&record(&["SECTION", "subsection", "QuEsTiOn"])),
            RowKind::Header
        );
        assert_eq!(
            classify(&record(&["  section ", "\tsubsection", "question  "])),
            RowKind::Header
        );
    }

    #[test]
    fn header_with_bom_is_detected() {
        assert_eq!(
            classify(&record(&["\u{feff}Section", "Subsection", "Question"])),
            RowKind::Header
        );
    }

    #[test]
    fn four_column_row_is_not_a_header() {
        let kind = classify(&record(&["Section", "Subsection", "Question", "Extra"]));
        assert!(matches!(kind, RowKind::Data(_)));
    }

    #[test]
    fn section_named_like_a_label_is_data() {
        // Only the full normalized row matches the header shape.
        let kind = classify(&record(&["Section", "", "Is this a trick?"]));
        assert!(matches!(kind, RowKind::Data(_)));
    }

    #[test]
    fn blank_rows_are_empty() {
        assert_eq!(classify(&record(&[])), RowKind::Empty);
        assert_eq!(classify(&record(&[""])), RowKind::Empty);
        assert_eq!(classify(&record(&["   ", "Sub", "Q"])), RowKind::Empty);
    }

    #[test]
    fn data_fields_are_trimmed_and_padded() {
        let kind = classify(&record(&["  Mental Health  "]));
        assert_eq!(
            kind,
            RowKind::Data(DataRow {
                section: "Mental Health".to_string(),
                subsection: String::new(),
                question: String::new(),
            })
        );

        let kind = classify(&record(&["A", " Sub ", " Q? "]));
        assert_eq!(
            kind,
            RowKind::Data(DataRow {
                section: "A".to_string(),
                subsection: "Sub".to_string(),
                question: "Q?".to_string(),
            })
        );
    }
}
