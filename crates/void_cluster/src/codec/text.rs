//! Bracketed text encoding for vectors
//!
//! A vector renders as `[v0 v1 v2]`, a vector of vectors as the plain
//! concatenation `[[...][...]]`. Nested values carry no separator between
//! elements, so decoding scans bracket by bracket.

use crate::error::{PhysicsError, Result};

/// Render a vector as `[v0 v1 ...]`
pub fn encode_vec(values: &[f64]) -> String {
    let body: Vec<String> = values.iter().map(|v| format!("{v:.6}")).collect();
    format!("[{}]", body.join(" "))
}

/// Render a vector of vectors as `[[...][...]]`
pub fn encode_nested(rows: &[Vec<f64>]) -> String {
    let mut out = String::from("[");
    for row in rows {
        out.push_str(&encode_vec(row));
    }
    out.push(']');
    out
}

/// Render integers with the vector encoding
pub fn encode_ints(values: &[i64]) -> String {
    let as_floats: Vec<f64> = values.iter().map(|v| *v as f64).collect();
    encode_vec(&as_floats)
}

/// Render a single value
pub fn encode_scalar(value: f64) -> String {
    format!("{value:.6}")
}

fn strip_brackets(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(|| PhysicsError::MalformedText(format!("expected [...], got {trimmed:?}")))
}

fn parse_number(token: &str) -> Result<f64> {
    token
        .parse::<f64>()
        .map_err(|_| PhysicsError::MalformedText(format!("not a number: {token:?}")))
}

fn parse_bare<const N: usize>(text: &str) -> Result<[f64; N]> {
    let values = text
        .split_whitespace()
        .map(parse_number)
        .collect::<Result<Vec<_>>>()?;
    <[f64; N]>::try_from(values.as_slice()).map_err(|_| {
        PhysicsError::MalformedText(format!("expected {N} values, got {}", values.len()))
    })
}

/// Decode `[v0 v1 ...]`
pub fn decode_vec(text: &str) -> Result<Vec<f64>> {
    strip_brackets(text)?.split_whitespace().map(parse_number).collect()
}

/// Decode `[[...][...]]`
pub fn decode_nested(text: &str) -> Result<Vec<Vec<f64>>> {
    let inner = strip_brackets(text)?;
    let mut rows = Vec::new();
    let mut rest = inner;
    while let Some(stop) = rest.find(']') {
        rows.push(decode_vec(&rest[..=stop])?);
        rest = &rest[stop + 1..];
    }
    if !rest.trim().is_empty() {
        return Err(PhysicsError::MalformedText(format!(
            "trailing characters {rest:?} after last element"
        )));
    }
    Ok(rows)
}

/// Decode integers from the vector encoding, truncating toward zero
pub fn decode_ints(text: &str) -> Result<Vec<i64>> {
    Ok(decode_vec(text)?.into_iter().map(|v| v as i64).collect())
}

/// Decode a single value
pub fn decode_scalar(text: &str) -> Result<f64> {
    parse_number(text.trim())
}

/// Decode a bare `x y z` triple
pub fn parse_vec3(text: &str) -> Result<[f64; 3]> {
    parse_bare(text)
}

/// Decode a bare `x y z w` quaternion
pub fn parse_quat(text: &str) -> Result<[f64; 4]> {
    parse_bare(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_vec() {
        assert_eq!(encode_vec(&[1.0, 2.0, 3.0]), "[1.000000 2.000000 3.000000]");
        assert_eq!(encode_vec(&[]), "[]");
        assert_eq!(encode_vec(&[-0.5]), "[-0.500000]");
    }

    #[test]
    fn test_decode_vec() {
        assert_eq!(decode_vec("[1.000000 2.000000 3.000000]").unwrap(), vec![1.0, 2.0, 3.0]);
        assert_eq!(decode_vec("[]").unwrap(), Vec::<f64>::new());
        assert_eq!(decode_vec("[  4   5 ]").unwrap(), vec![4.0, 5.0]);
    }

    #[test]
    fn test_decode_vec_rejects_garbage() {
        assert!(decode_vec("1 2 3").is_err());
        assert!(decode_vec("[1 2").is_err());
        assert!(decode_vec("[1 x 3]").is_err());
    }

    #[test]
    fn test_nested() {
        assert_eq!(encode_nested(&[vec![1.0], vec![2.0, 3.0]]), "[[1.000000][2.000000 3.000000]]");
        assert_eq!(decode_nested("[[1.0][2.0 3.0]]").unwrap(), vec![vec![1.0], vec![2.0, 3.0]]);
        assert_eq!(decode_nested("[]").unwrap(), Vec::<Vec<f64>>::new());
        assert_eq!(decode_nested("[[][7]]").unwrap(), vec![vec![], vec![7.0]]);
    }

    #[test]
    fn test_nested_round_trip() {
        let rows = vec![vec![0.5, -1.25], vec![], vec![3.0, 4.0, 5.0]];
        assert_eq!(decode_nested(&encode_nested(&rows)).unwrap(), rows);
    }

    #[test]
    fn test_nested_rejects_garbage() {
        assert!(decode_nested("[[1 2]3]").is_err());
        assert!(decode_nested("[[1 [2]]").is_err());
        assert!(decode_nested("[1 2]").is_err());
    }

    #[test]
    fn test_ints_and_scalars() {
        assert_eq!(encode_ints(&[1, -2]), "[1.000000 -2.000000]");
        assert_eq!(decode_ints("[1.000000 -2.000000 3.9]").unwrap(), vec![1, -2, 3]);
        assert_eq!(encode_scalar(0.25), "0.250000");
        assert_eq!(decode_scalar(" 0.25 ").unwrap(), 0.25);
    }

    #[test]
    fn test_bare_tuples() {
        assert_eq!(parse_vec3("1 2 3").unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(parse_quat("0 0 0 1").unwrap(), [0.0, 0.0, 0.0, 1.0]);
        assert!(parse_vec3("1 2").is_err());
    }
}
