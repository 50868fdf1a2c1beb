//! Spreadsheet normalizer: CSV exports to canonical diet-log rows.
//!
//! Diet-plan exports arrive with inconsistent encodings, delimiters and
//! column-name casing depending on the husbandry software that produced
//! them. This module auto-detects encoding and delimiter, resolves column
//! names through an alias table, and coerces every record into
//! [`DietLogRow`]. No aggregation logic lives here.

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::Path;

use crate::error::{NormalizeError, NormalizeResult, SheetError, SheetResult};
use crate::models::DietLogRow;

/// Result of normalizing a sheet, with detection metadata.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Normalized rows, in sheet order.
    pub rows: Vec<DietLogRow>,
    /// Detected encoding.
    pub encoding: String,
    /// Detected delimiter.
    pub delimiter: char,
    /// Canonicalized column headers, in sheet order.
    pub headers: Vec<String>,
}

// =============================================================================
// Encoding / delimiter detection
// =============================================================================

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> SheetResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8_lossy(bytes).to_string()),
        "iso-8859-1" | "latin-1" | "latin1" => {
            Ok(encoding_rs::ISO_8859_15.decode(bytes).0.to_string())
        }
        "windows-1252" | "cp1252" => Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.to_string()),
        // Fallback: UTF-8 with lossy conversion
        _ => Ok(String::from_utf8_lossy(bytes).to_string()),
    }
}

/// Detect the delimiter by counting occurrences in the first line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

// =============================================================================
// Header canonicalization
// =============================================================================

/// Canonicalize a header name: trim, lowercase, collapse non-alphanumeric
/// runs to a single underscore.
pub fn canonical_header(raw: &str) -> String {
    let mut canon = String::with_capacity(raw.len());
    let mut last_was_sep = true;
    for c in raw.trim().chars() {
        if c.is_alphanumeric() {
            canon.extend(c.to_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            canon.push('_');
            last_was_sep = true;
        }
    }
    while canon.ends_with('_') {
        canon.pop();
    }
    canon
}

/// Column aliases per canonical field, in resolution order.
const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    ("animal_id", &["animal_id", "animalid", "animal"]),
    ("site_name", &["site_name", "site"]),
    ("section_name", &["section_name", "section"]),
    (
        "enclosure_name",
        &["user_enclosure_name", "enclosure_name", "enclosure"],
    ),
    ("common_name", &["common_name", "species", "species_name"]),
    ("class_name", &["class_name", "class"]),
    ("ingredient_name", &["ingredient_name", "ingredient"]),
    ("type", &["type", "ingredient_type"]),
    ("type_name", &["type_name", "group_name"]),
    (
        "preparation_type_name",
        &["preparation_type_name", "preparation_type", "preparation"],
    ),
    ("cut_size_name", &["cut_size_name", "cut_size"]),
    ("ingredient_qty", &["ingredient_qty", "qty", "quantity"]),
    ("base_uom_name", &["base_uom_name", "uom", "unit", "unit_name"]),
    ("meal_time", &["meal_time", "mealtime", "feeding_time"]),
    ("date", &["date", "feeding_date", "plan_date"]),
];

/// Columns that must exist for the sheet to be usable at all.
const REQUIRED_COLUMNS: &[&str] = &["ingredient_name", "type", "ingredient_qty"];

/// Resolved column positions for the known fields.
#[derive(Debug, Default)]
struct ColumnMap {
    animal_id: Option<usize>,
    site_name: Option<usize>,
    section_name: Option<usize>,
    enclosure_name: Option<usize>,
    common_name: Option<usize>,
    class_name: Option<usize>,
    ingredient_name: Option<usize>,
    ingredient_type: Option<usize>,
    type_name: Option<usize>,
    preparation_type_name: Option<usize>,
    cut_size_name: Option<usize>,
    ingredient_qty: Option<usize>,
    base_uom_name: Option<usize>,
    meal_time: Option<usize>,
    date: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> NormalizeResult<Self> {
        let position = |aliases: &[&str]| -> Option<usize> {
            aliases
                .iter()
                .find_map(|alias| headers.iter().position(|h| h == alias))
        };

        let lookup = |field: &str| -> Option<usize> {
            COLUMN_ALIASES
                .iter()
                .find(|(name, _)| *name == field)
                .and_then(|(_, aliases)| position(aliases))
        };

        let map = Self {
            animal_id: lookup("animal_id"),
            site_name: lookup("site_name"),
            section_name: lookup("section_name"),
            enclosure_name: lookup("enclosure_name"),
            common_name: lookup("common_name"),
            class_name: lookup("class_name"),
            ingredient_name: lookup("ingredient_name"),
            ingredient_type: lookup("type"),
            type_name: lookup("type_name"),
            preparation_type_name: lookup("preparation_type_name"),
            cut_size_name: lookup("cut_size_name"),
            ingredient_qty: lookup("ingredient_qty"),
            base_uom_name: lookup("base_uom_name"),
            meal_time: lookup("meal_time"),
            date: lookup("date"),
        };

        let mut missing = Vec::new();
        for &required in REQUIRED_COLUMNS {
            let present = match required {
                "ingredient_name" => map.ingredient_name.is_some(),
                "type" => map.ingredient_type.is_some(),
                "ingredient_qty" => map.ingredient_qty.is_some(),
                _ => true,
            };
            if !present {
                missing.push(required.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(NormalizeError::MissingColumns(missing));
        }

        Ok(map)
    }
}

// =============================================================================
// Value coercion
// =============================================================================

/// Coerce a raw quantity cell to a non-negative number.
///
/// Thousands separators are stripped; parse failures coerce to 0 rather
/// than rejecting the row, and negatives clamp to 0.
pub fn coerce_qty(raw: &str) -> f64 {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse::<f64>().unwrap_or(0.0).max(0.0)
}

/// Date formats seen across husbandry-software exports, in trial order.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%d %b %Y",
];

/// Coerce a raw date cell to a calendar date, when possible.
///
/// Datetime cells are handled by trying the text before the first space or
/// `T`. Failures return `None`; the raw text is preserved on the row.
pub fn coerce_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidates = [
        trimmed,
        trimmed.split(|c| c == ' ' || c == 'T').next().unwrap_or(trimmed),
    ];

    for candidate in candidates {
        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(candidate, format) {
                return Some(date);
            }
        }
    }
    None
}

// =============================================================================
// Parsing entry points
// =============================================================================

/// Normalize a spreadsheet file with auto-detection of encoding and
/// delimiter.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> NormalizeResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref()).map_err(SheetError::IoError)?;
    parse_bytes_auto(&bytes)
}

/// Normalize spreadsheet bytes with auto-detection of encoding and
/// delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> NormalizeResult<ParseResult> {
    if bytes.is_empty() {
        return Err(SheetError::EmptyFile.into());
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    parse_content(&content, delimiter, encoding)
}

/// Normalize decoded spreadsheet text with an explicit delimiter.
pub fn parse_content(
    content: &str,
    delimiter: char,
    encoding: String,
) -> NormalizeResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(SheetError::EmptyFile.into());
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SheetError::ParseError(e.to_string()))?
        .iter()
        .map(canonical_header)
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(SheetError::NoHeaders.into());
    }

    let columns = ColumnMap::resolve(&headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SheetError::ParseError(e.to_string()))?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        rows.push(normalize_record(&record, &columns));
    }

    Ok(ParseResult {
        rows,
        encoding,
        delimiter,
        headers,
    })
}

/// Coerce one CSV record into a canonical row. Missing cells become empty
/// strings, never errors.
fn normalize_record(record: &StringRecord, columns: &ColumnMap) -> DietLogRow {
    let cell = |idx: Option<usize>| -> String {
        idx.and_then(|i| record.get(i))
            .unwrap_or("")
            .trim()
            .to_string()
    };

    let date_raw = cell(columns.date);

    DietLogRow {
        animal_id: cell(columns.animal_id),
        site_name: cell(columns.site_name),
        section_name: cell(columns.section_name),
        enclosure_name: cell(columns.enclosure_name),
        common_name: cell(columns.common_name),
        class_name: cell(columns.class_name),
        ingredient_name: cell(columns.ingredient_name),
        ingredient_type: cell(columns.ingredient_type),
        type_name: cell(columns.type_name),
        preparation_type_name: cell(columns.preparation_type_name),
        cut_size_name: cell(columns.cut_size_name),
        ingredient_qty: coerce_qty(&cell(columns.ingredient_qty)),
        base_uom_name: cell(columns.base_uom_name),
        meal_time: cell(columns.meal_time),
        date: coerce_date(&date_raw),
        date_raw,
    }
}
