use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt::Display;

/// How the raw text of an xlsx `<c>` element has to be interpreted.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values (1/0)
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// ISO 8601 date/time strings (`t="d"`)
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values
    Error,
}

impl CellType {
    fn date_time(is_1904: bool) -> Self {
        if is_1904 {
            Self::NumberDateTime1904
        } else {
            Self::NumberDateTime1900
        }
    }

    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "14" | "15" | "16" | "17" | "18" | "19" | "20" | "21" | "22" | "45" | "46" | "47" => {
                Some(Self::date_time(is_1904))
            }
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Analyzes format codes for date/time patterns.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date_or_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_escaped => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_literal && !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_color && !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' | 'H' | 'h' | 'S' | 's' => is_date_or_time = true,
                _ => (),
            }
        }

        if is_date_or_time {
            Self::date_time(is_1904)
        } else {
            Self::Number
        }
    }
}

/// Value held by one grid cell.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Boolean(bool),
    DateTime(NaiveDateTime),
    /// Excel error literal such as `#N/A`
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    /// The string content of a text cell. Other kinds never yield text here.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Builds a value from the raw `<v>`/`<is>` content of an xlsx cell.
    /// Numbers that fail to parse are kept as text rather than dropped.
    pub(crate) fn from_raw(kind: CellType, raw: String) -> CellValue {
        match kind {
            CellType::Empty => CellValue::Empty,
            CellType::Boolean => CellValue::Boolean(raw.trim() == "1" || raw.trim().eq_ignore_ascii_case("true")),
            CellType::Number => match raw.trim().parse::<f64>() {
                Ok(number) => CellValue::Number(number),
                Err(_) => CellValue::Text(raw),
            },
            CellType::NumberDateTime1900 | CellType::NumberDateTime1904 => {
                let is_1904 = kind == CellType::NumberDateTime1904;
                match raw.trim().parse::<f64>().ok().and_then(|serial| serial_to_datetime(serial, is_1904)) {
                    Some(datetime) => CellValue::DateTime(datetime),
                    None => CellValue::Text(raw),
                }
            }
            CellType::IsoDateTime => match parse_iso_datetime(raw.trim()) {
                Some(datetime) => CellValue::DateTime(datetime),
                None => CellValue::Text(raw),
            },
            CellType::InlineString | CellType::SharedString => CellValue::Text(raw),
            CellType::Error => CellValue::Error(raw),
        }
    }
}

impl From<&str> for CellValue {
    /// Blank strings become `Empty`, everything else `Text`.
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_owned())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => write!(f, "{}", text),
            // Integral numbers print without a fraction, as Excel shows them
            CellValue::Number(number) if number.fract() == 0.0 && number.abs() < 1e15 => {
                write!(f, "{}", *number as i64)
            }
            CellValue::Number(number) => write!(f, "{}", number),
            CellValue::Boolean(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(datetime) if datetime.time() == chrono::NaiveTime::MIN => {
                write!(f, "{}", datetime.format("%Y-%m-%d"))
            }
            CellValue::DateTime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Error(code) => write!(f, "{}", code),
        }
    }
}

/// Converts an Excel serial number to a timestamp.
/// Handles the Lotus 1-2-3 leap year bug of the 1900 epoch.
pub(crate) fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    let milliseconds = ((serial - serial.trunc()) * 86_400_000f64).round() as i64;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    epoch
        .checked_add_signed(Duration::days(days + offset))?
        .checked_add_signed(Duration::milliseconds(milliseconds))
}

fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    if value.contains('T') {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0)
    }
}
