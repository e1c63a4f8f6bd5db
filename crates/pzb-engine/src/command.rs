//! Single-argument command interpretation.
//!
//! A chat transport hands over exactly one free-text argument per call. The
//! argument is trimmed and matched case-insensitively:
//!
//! | argument          | command               |
//! |-------------------|-----------------------|
//! | `3`, `+3`, `-2`   | `Request(n)`          |
//! | `0`               | `Request(0)` (withdraw) |
//! | `reset`           | `Reset`               |
//! | `total`           | `Total`               |
//! | `$12.34`          | `Price(12.34)`        |
//! | anything else     | `Help`                |

use serde::{Deserialize, Serialize};

/// Marker that precedes a monetary amount unless configured otherwise.
pub const DEFAULT_CURRENCY_MARKER: &str = "$";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    /// Set the caller's request. Negative values are passed through so the
    /// ledger can reject them.
    Request { units: i64 },
    /// Integer argument that does not fit the unit type.
    Oversized { raw: String },
    Reset,
    Total,
    Price { total_cost: f64 },
    Help,
}

impl Command {
    /// Interpret `arg` using the default `$` currency marker.
    pub fn parse(arg: &str) -> Self {
        Self::parse_with_marker(arg, DEFAULT_CURRENCY_MARKER)
    }

    pub fn parse_with_marker(arg: &str, currency_marker: &str) -> Self {
        let arg = arg.trim();
        if arg.is_empty() {
            return Command::Help;
        }

        if is_integer_literal(arg) {
            return match arg.parse::<i64>() {
                Ok(units) => Command::Request { units },
                Err(_) => Command::Oversized {
                    raw: arg.to_string(),
                },
            };
        }

        match arg.to_ascii_uppercase().as_str() {
            "RESET" => return Command::Reset,
            "TOTAL" => return Command::Total,
            "HELP" => return Command::Help,
            _ => {}
        }

        if let Some(amount) = strip_marker(arg, currency_marker) {
            if let Some(total_cost) = parse_amount(amount) {
                return Command::Price { total_cost };
            }
        }

        Command::Help
    }

    /// `true` for commands that need exclusive access to the ledger.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::Request { .. } | Command::Oversized { .. } | Command::Reset
        )
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `true` if `arg` opens with `marker`, compared the way amounts are parsed.
pub fn has_currency_marker(arg: &str, marker: &str) -> bool {
    strip_marker(arg.trim_start(), marker).is_some()
}

fn strip_marker<'a>(arg: &'a str, marker: &str) -> Option<&'a str> {
    if marker.is_empty() {
        return None;
    }
    // Case-insensitive so alphabetic markers ("EUR") behave like keywords.
    let head = arg.get(..marker.len())?;
    if head.eq_ignore_ascii_case(marker) {
        arg.get(marker.len()..).map(str::trim_start)
    } else {
        None
    }
}

/// Decimal amount: optional sign, digits, optional fraction. Thousands
/// separators are tolerated. Rejects exponents, `inf`, and `nan`.
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let body = cleaned.strip_prefix(['+', '-']).unwrap_or(cleaned.as_str());
    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in body.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return None,
        }
    }
    if !seen_digit {
        return None;
    }
    cleaned.parse::<f64>().ok()
}
