use chrono::{DateTime, Utc};

const INVOICE_PREFIX: &str = "FS-";
const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Human-readable invoice identifier derived from the creation instant, e.g. `FS-MBX3K9Q2`.
pub fn invoice_number_at(created_at: DateTime<Utc>) -> String {
    let millis = u64::try_from(created_at.timestamp_millis()).unwrap_or(0);
    format!("{INVOICE_PREFIX}{}", to_base36(millis))
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    String::from_utf8(digits).unwrap_or_default()
}
