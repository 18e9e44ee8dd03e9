//! Derivation path parsing.
//!
//! Accepts the usual bip32 notation (`m/44'/0'/0'/0/1`, `0/1`) plus labelled
//! segments of the form `name:index`, where the label documents the level of
//! the tree and plays no part in derivation:
//!
//! ```text
//! m/schema:1'/recovery:1'/external:1/0
//! ```

use bitcoin::bip32::{ChildNumber, DerivationPath};

use crate::KeyError;

/// Parse a derivation path, dropping any segment labels.
pub fn parse_derivation_path(path: &str) -> Result<DerivationPath, KeyError> {
    let trimmed = path.trim();
    let body = match trimmed {
        "m" | "" => return Ok(DerivationPath::master()),
        _ => trimmed.strip_prefix("m/").unwrap_or(trimmed),
    };

    let children = body
        .split('/')
        .map(|segment| parse_segment(segment, path))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DerivationPath::from(children))
}

fn parse_segment(segment: &str, path: &str) -> Result<ChildNumber, KeyError> {
    // Labels may themselves contain ':' only before the final index.
    let index_part = segment.rsplit(':').next().unwrap_or(segment);

    let (digits, hardened) = match index_part.strip_suffix(|c: char| matches!(c, '\'' | 'h' | 'H')) {
        Some(digits) => (digits, true),
        None => (index_part, false),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(KeyError::InvalidPath(format!(
            "bad segment '{}' in '{}'",
            segment, path
        )));
    }

    let index: u32 = digits
        .parse()
        .map_err(|_| KeyError::InvalidPath(format!("index out of range in '{}'", path)))?;

    let child = if hardened {
        ChildNumber::from_hardened_idx(index)
    } else {
        ChildNumber::from_normal_idx(index)
    };

    child.map_err(|e| KeyError::InvalidPath(format!("{} in '{}'", e, path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn children(path: &DerivationPath) -> Vec<ChildNumber> {
        path.as_ref().to_vec()
    }

    #[test]
    fn test_plain_path() {
        let path = parse_derivation_path("m/84'/0'/0'/0/5").unwrap();
        assert_eq!(
            children(&path),
            vec![
                ChildNumber::from_hardened_idx(84).unwrap(),
                ChildNumber::from_hardened_idx(0).unwrap(),
                ChildNumber::from_hardened_idx(0).unwrap(),
                ChildNumber::from_normal_idx(0).unwrap(),
                ChildNumber::from_normal_idx(5).unwrap(),
            ]
        );
    }

    #[test]
    fn test_labelled_path_matches_plain() {
        let labelled = parse_derivation_path("m/schema:1'/recovery:1'/external:1/0").unwrap();
        let plain = parse_derivation_path("m/1'/1'/1/0").unwrap();
        assert_eq!(labelled, plain);
    }

    #[test]
    fn test_relative_path_and_h_suffix() {
        let relative = parse_derivation_path("1h/2").unwrap();
        let absolute = parse_derivation_path("m/1'/2").unwrap();
        assert_eq!(relative, absolute);
    }

    #[test]
    fn test_master_path() {
        assert!(parse_derivation_path("m").unwrap().as_ref().is_empty());
        assert!(parse_derivation_path("").unwrap().as_ref().is_empty());
    }

    #[test]
    fn test_malformed_paths_rejected() {
        for bad in ["m//1", "m/x", "m/1/", "m/label:", "m/-1", "m/1''"] {
            assert!(
                matches!(parse_derivation_path(bad), Err(KeyError::InvalidPath(_))),
                "expected '{}' to be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        // 2^31 is the first hardened index and cannot be written as a normal index
        assert!(parse_derivation_path("m/2147483648").is_err());
        assert!(parse_derivation_path("m/99999999999").is_err());
        assert!(parse_derivation_path("m/2147483647").is_ok());
    }
}
