//! Fuzzy account selection.
//!
//! Account lookups by humans usually start from a partial custodial number
//! ("the one ending 4417") and a rough name ("smith ira"). The number is
//! matched exactly on its trailing digits; the name only breaks ties.

use log::info;

use crate::error::{ApiError, Result};
use crate::types::AccountSummary;

/// Lower-cased ASCII alphanumerics only.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Decimal digits of `s`, in order.
pub fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Best similarity (0..=100) of the shorter string against any equally long
/// window of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let long: Vec<char> = long.chars().collect();
    let width = short.chars().count();
    let mut best = 0.0_f64;
    for start in 0..=(long.len() - width) {
        let window: String = long[start..start + width].iter().collect();
        let score = strsim::normalized_levenshtein(short, &window) * 100.0;
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

/// Pick one account from search results.
///
/// Keeps accounts whose number ends with the digits of `number_fragment`,
/// then returns the one whose normalized name best contains
/// `name_fragment`. Ties go to the earliest account.
pub fn best_account<'a>(
    accounts: &'a [AccountSummary],
    number_fragment: &str,
    name_fragment: &str,
) -> Result<&'a AccountSummary> {
    let wanted = digits(number_fragment);
    let name = normalize_name(name_fragment);

    let candidates: Vec<&AccountSummary> = accounts
        .iter()
        .filter(|a| a.account_number.ends_with(&wanted))
        .collect();

    if candidates.is_empty() {
        return Err(ApiError::NotFound(format!(
            "no accounts found for acct# {number_fragment}"
        )));
    }
    if candidates.len() > 1 {
        let listing: Vec<String> = candidates
            .iter()
            .map(|a| format!("{} {} ({})", a.id, a.name, a.account_number))
            .collect();
        info!(
            "Multiple accounts share trailing digits '{wanted}': {}",
            listing.join("; ")
        );
    }

    let mut best = candidates[0];
    let mut best_score = partial_ratio(&name, &normalize_name(&best.name));
    for account in &candidates[1..] {
        let score = partial_ratio(&name, &normalize_name(&account.name));
        if score > best_score {
            best = account;
            best_score = score;
        }
    }
    Ok(best)
}
