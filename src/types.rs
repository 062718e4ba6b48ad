use serde::Serialize;
use serde_json::{Map, Value};

/// A stored plate, as read back from the plate table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateRecord {
    pub plate_number: String,
    pub owner_name: Option<String>,
    pub province: Option<String>,
}

/// Submitted form fields, in the order they arrived.
pub type Fields = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq)]
pub struct LookupRequest {
    pub plate_number: String,
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl LookupRequest {
    /// Returns None when `plate_number` is missing or empty.
    /// Missing or non-numeric coordinates become 0.
    pub fn from_fields(fields: &[(String, String)]) -> Option<LookupRequest> {
        let plate_number = field(fields, "plate_number").filter(|p| !p.is_empty())?;
        let coord = |name| field(fields, name).map_or(0, coerce_int);
        Some(LookupRequest {
            plate_number: plate_number.to_string(),
            x1: coord("x1"),
            y1: coord("y1"),
            x2: coord("x2"),
            y2: coord("y2"),
        })
    }
}

/// Last occurrence wins, like a form decoder filling a map.
fn field<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .rev()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

/// Integer value of the numeric prefix of `s`.
///
/// Leading whitespace is skipped. A prefix with a fraction or exponent is
/// truncated toward zero, anything without a numeric prefix is 0, and values
/// outside the i64 range saturate.
pub fn coerce_int(s: &str) -> i64 {
    let s = s.trim_start_matches(|c: char| matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'));
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = if bytes.first().map_or(false, |&b| b == b'+' || b == b'-') {
        1
    } else {
        0
    };
    let int_end = digits_from(end);
    let mut int_digits = int_end - end;
    end = int_end;

    let mut is_float = false;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        if int_digits > 0 || frac_end > end + 1 {
            int_digits += frac_end - end - 1;
            end = frac_end;
            is_float = true;
        }
    }
    if int_digits == 0 {
        return 0;
    }
    if matches!(bytes.get(end).copied(), Some(b'e') | Some(b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp).copied(), Some(b'+') | Some(b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
            is_float = true;
        }
    }

    let number = &s[..end];
    if is_float {
        // `as` truncates toward zero and saturates; NaN cannot occur here.
        return number.parse::<f64>().map_or(0, |f| f as i64);
    }
    number.parse::<i64>().unwrap_or_else(|_| {
        if number.starts_with('-') {
            i64::MIN
        } else {
            i64::MAX
        }
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupResponse {
    pub plate_number: String,
    pub found: bool,
    pub results: Vec<PlateRecord>,
}

impl LookupResponse {
    pub fn new(plate_number: String, results: Vec<PlateRecord>) -> LookupResponse {
        LookupResponse {
            plate_number,
            found: !results.is_empty(),
            results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<Map<String, Value>>,
}

pub const NO_PLATE_NUMBER: &str = "No plate number received.";
pub const CONNECTION_FAILED: &str = "Database connection failed.";

impl ErrorBody {
    pub fn connection_failed() -> ErrorBody {
        ErrorBody {
            error: CONNECTION_FAILED,
            debug: None,
        }
    }

    /// `echo` attaches every submitted field; only meant for development.
    pub fn no_plate_number(fields: &[(String, String)], echo: bool) -> ErrorBody {
        let debug = if echo {
            Some(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            )
        } else {
            None
        };
        ErrorBody {
            error: NO_PLATE_NUMBER,
            debug,
        }
    }
}
