// Telegram login-widget assertion verification
//
// The widget posts an unordered field map plus a `hash` field. The hash is
// HMAC-SHA256 over a canonical check string built from every other field,
// keyed with SHA-256 of the bot token. Field order in the request must not
// matter: the check string sorts field names lexicographically.

use serde_json::{Map, Value};

use super::crypto;

// Maximum age of an assertion's `auth_date` before it is considered stale
pub const ASSERTION_MAX_AGE_SECS: i64 = 3600;

#[derive(Debug, PartialEq)]
pub enum AssertionError {
    // `hash` missing or not a string, or nothing else to sign
    Malformed,
    InvalidSignature,
    // `auth_date` missing or unparseable
    MissingAuthDate,
    // `auth_date` outside the freshness window
    Expired,
}

impl std::fmt::Display for AssertionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssertionError::Malformed => write!(f, "malformed login payload"),
            AssertionError::InvalidSignature => write!(f, "login payload signature mismatch"),
            AssertionError::MissingAuthDate => write!(f, "login payload missing auth_date"),
            AssertionError::Expired => write!(f, "login payload expired"),
        }
    }
}

// Renders a JSON field the way the login widget signed it: strings as-is,
// numbers and booleans in their literal form.
pub fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Builds the canonical check string: every field except `hash`, sorted by
// name, rendered `name=value`, joined with newlines.
fn check_string(fields: &Map<String, Value>) -> String {
    let mut names: Vec<&String> = fields.keys().filter(|k| k.as_str() != "hash").collect();
    names.sort();
    names
        .iter()
        .map(|name| format!("{}={}", name, field_text(&fields[name.as_str()])))
        .collect::<Vec<_>>()
        .join("\n")
}

// Verifies that `fields` legitimately originated from the identity
// provider. Pure function over its inputs; freshness is a separate check
// (`check_freshness`) so a stale assertion is distinguishable from a
// forged one.
pub fn verify_assertion(
    fields: &Map<String, Value>,
    bot_token: &str,
) -> Result<(), AssertionError> {
    let claimed_hash = fields
        .get("hash")
        .and_then(Value::as_str)
        .ok_or(AssertionError::Malformed)?;
    if fields.len() < 2 {
        // nothing besides the hash to verify
        return Err(AssertionError::Malformed);
    }

    let secret = crypto::sha256(bot_token.as_bytes());
    let signature = crypto::hmac_sha256(&secret, check_string(fields).as_bytes());
    let expected_hash = crypto::encode_hex(&signature);

    if crypto::verify_eq(expected_hash.as_bytes(), claimed_hash.as_bytes()) {
        Ok(())
    } else {
        Err(AssertionError::InvalidSignature)
    }
}

// Rejects assertions whose `auth_date` lies outside the freshness window.
// `now` is Unix seconds, injected for testability.
pub fn check_freshness(fields: &Map<String, Value>, now: u64) -> Result<(), AssertionError> {
    let auth_date = match fields.get("auth_date") {
        Some(Value::String(s)) => s.parse::<i64>().ok(),
        Some(Value::Number(n)) => n.as_i64(),
        _ => None,
    }
    .ok_or(AssertionError::MissingAuthDate)?;

    if now as i64 - auth_date > ASSERTION_MAX_AGE_SECS {
        return Err(AssertionError::Expired);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use serde_json::json;

    const SECRET: &str = "s3cr3t";

    // Builds a valid assertion by computing the hash the provider would
    fn signed_fields(pairs: &[(&str, Value)]) -> Map<String, Value> {
        let mut fields = Map::new();
        for (name, value) in pairs {
            fields.insert((*name).to_string(), value.clone());
        }
        let secret = crypto::sha256(SECRET.as_bytes());
        let signature = crypto::hmac_sha256(&secret, check_string(&fields).as_bytes());
        fields.insert("hash".to_string(), json!(crypto::encode_hex(&signature)));
        fields
    }

    #[test]
    fn accepts_valid_assertion() {
        let fields = signed_fields(&[
            ("id", json!("42")),
            ("first_name", json!("Ada")),
            ("auth_date", json!(1_700_000_000)),
        ]);
        assert_eq!(verify_assertion(&fields, SECRET), Ok(()));
    }

    #[test]
    fn tampered_field_is_rejected() {
        let mut fields = signed_fields(&[
            ("id", json!("42")),
            ("first_name", json!("Ada")),
            ("auth_date", json!(1_700_000_000)),
        ]);
        fields.insert("first_name".to_string(), json!("Eve"));
        assert_eq!(
            verify_assertion(&fields, SECRET),
            Err(AssertionError::InvalidSignature)
        );
    }

    #[test]
    fn tampered_hash_is_rejected() {
        let mut fields = signed_fields(&[("id", json!("42")), ("auth_date", json!(0))]);
        let mut hash = fields["hash"].as_str().unwrap().to_string();
        // flip the first hex digit
        let flipped = if hash.starts_with('0') { "1" } else { "0" };
        hash.replace_range(0..1, flipped);
        fields.insert("hash".to_string(), json!(hash));
        assert_eq!(
            verify_assertion(&fields, SECRET),
            Err(AssertionError::InvalidSignature)
        );
    }

    #[test]
    fn missing_hash_is_malformed() {
        let mut fields = Map::new();
        fields.insert("id".to_string(), json!("42"));
        assert_eq!(
            verify_assertion(&fields, SECRET),
            Err(AssertionError::Malformed)
        );
    }

    #[test]
    fn hash_alone_is_malformed() {
        let mut fields = Map::new();
        fields.insert("hash".to_string(), json!("abcd"));
        assert_eq!(
            verify_assertion(&fields, SECRET),
            Err(AssertionError::Malformed)
        );
    }

    #[quickcheck]
    fn insertion_order_is_irrelevant(seed: u64) -> bool {
        let pairs = [
            ("id", json!(42)),
            ("first_name", json!("Ada")),
            ("last_name", json!("Lovelace")),
            ("username", json!("ada")),
            ("auth_date", json!(1_700_000_000)),
        ];
        let signed = signed_fields(&pairs);

        // a cheap deterministic shuffle driven by the seed
        let mut order: Vec<usize> = (0..pairs.len()).collect();
        let mut state = seed;
        for i in (1..order.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            order.swap(i, (state % (i as u64 + 1)) as usize);
        }

        let mut shuffled = Map::new();
        for &i in &order {
            let (name, value) = &pairs[i];
            shuffled.insert((*name).to_string(), value.clone());
        }
        shuffled.insert("hash".to_string(), signed["hash"].clone());

        verify_assertion(&shuffled, SECRET) == Ok(())
    }

    #[test]
    fn freshness_window() {
        let now = 1_700_000_000u64;
        let fresh = signed_fields(&[("id", json!("42")), ("auth_date", json!(now - 10))]);
        assert_eq!(check_freshness(&fresh, now), Ok(()));

        let stale = signed_fields(&[("id", json!("42")), ("auth_date", json!(now - 3601))]);
        assert_eq!(check_freshness(&stale, now), Err(AssertionError::Expired));

        let boundary = signed_fields(&[("id", json!("42")), ("auth_date", json!(now - 3600))]);
        assert_eq!(check_freshness(&boundary, now), Ok(()));
    }

    #[test]
    fn missing_auth_date_is_rejected() {
        let fields = signed_fields(&[("id", json!("42"))]);
        assert_eq!(
            check_freshness(&fields, 1_700_000_000),
            Err(AssertionError::MissingAuthDate)
        );
    }

    #[test]
    fn numeric_and_string_auth_date_both_parse() {
        let now = 1_700_000_000u64;
        let as_number = signed_fields(&[("id", json!("42")), ("auth_date", json!(now))]);
        let as_string = signed_fields(&[("id", json!("42")), ("auth_date", json!(now.to_string()))]);
        assert_eq!(check_freshness(&as_number, now), Ok(()));
        assert_eq!(check_freshness(&as_string, now), Ok(()));
    }
}
