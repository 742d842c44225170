//! Contract-code parsing for dated futures codes.
//!
//! Recognises an alphabetic product prefix followed by a `YYMM` or `YYYYMM`
//! delivery suffix (`IF2109`, `cu2203`, `IF202109`). Three-digit `YMM` codes
//! are decade-ambiguous and are left to the caller.

use crate::domain::{ContractId, ContractSpec, DeliveryMonth};

const CENTURY: i32 = 2000;

fn split(code: &str) -> Option<(&str, &str)> {
    let code = code.trim();
    let split_at = code.find(|c: char| !c.is_ascii_alphabetic())?;
    let (prefix, digits) = code.split_at(split_at);
    if prefix.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((prefix, digits))
}

/// Product prefix of a contract code (`IF2109` → `IF`).
pub fn product_of(code: &str) -> Option<&str> {
    split(code).map(|(prefix, _)| prefix)
}

/// Delivery month encoded in a contract code.
pub fn delivery_of(code: &str) -> Option<DeliveryMonth> {
    let (_, digits) = split(code)?;
    let (year, month) = match digits.len() {
        4 => (CENTURY + digits[..2].parse::<i32>().ok()?, digits[2..].parse::<u32>().ok()?),
        6 => (digits[..4].parse::<i32>().ok()?, digits[4..].parse::<u32>().ok()?),
        _ => return None,
    };
    DeliveryMonth::new(year, month)
}

/// Spec for a parsed code, expiring on the last day of its delivery month.
pub fn spec_from_code(id: &ContractId) -> Option<ContractSpec> {
    let delivery = delivery_of(id.as_str())?;
    Some(ContractSpec::new(id.clone(), delivery.last_day()).with_delivery(delivery))
}
