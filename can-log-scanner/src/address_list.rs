//! Comma-separated address list parsing
//!
//! Block and allow lists are entered as text like `"1a0, 2B4,0x3e9"`.
//! Every token is parsed as hexadecimal. A bad token is dropped with a
//! warning and parsing carries on with the rest.

use std::collections::HashSet;

/// Outcome of parsing an address list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressList {
    /// Successfully parsed addresses
    pub addresses: HashSet<u32>,
    /// Tokens that were not valid hex addresses (trimmed)
    pub rejected: Vec<String>,
}

impl AddressList {
    /// Parse a comma-separated list of hex addresses
    ///
    /// `label` names the list in diagnostics (e.g. "block list").
    pub fn parse(input: &str, label: &str) -> Self {
        let mut list = Self::default();

        for token in input.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }

            match parse_hex_address(token) {
                Some(address) => {
                    list.addresses.insert(address);
                }
                None => {
                    log::warn!("Invalid address in {}: {:?}", label, token);
                    list.rejected.push(token.to_string());
                }
            }
        }

        list
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn into_addresses(self) -> HashSet<u32> {
        self.addresses
    }
}

/// Parse one hex token, with or without a `0x` prefix
pub fn parse_hex_address(token: &str) -> Option<u32> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);

    // from_str_radix tolerates a leading '+', which is not an address
    if digits.is_empty() || digits.starts_with('+') {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_list() {
        let list = AddressList::parse("1a, , zz, 200", "allow list");

        assert_eq!(list.addresses, HashSet::from([0x1a, 0x200]));
        assert_eq!(list.rejected, vec!["zz".to_string()]);
    }

    #[test]
    fn test_empty_input() {
        assert!(AddressList::parse("", "block list").is_empty());
        assert!(AddressList::parse(" , ,,", "block list").rejected.is_empty());
    }

    #[test]
    fn test_prefixed_and_mixed_case() {
        let list = AddressList::parse("0x1A0,0X2b4, 3E9", "block list");
        assert_eq!(list.addresses, HashSet::from([0x1A0, 0x2B4, 0x3E9]));
    }

    #[test]
    fn test_rejects_out_of_range_and_signs() {
        assert_eq!(parse_hex_address("100000000"), None);
        assert_eq!(parse_hex_address("+10"), None);
        assert_eq!(parse_hex_address("-10"), None);
        assert_eq!(parse_hex_address("0x"), None);
        assert_eq!(parse_hex_address("ffffffff"), Some(u32::MAX));
    }
}
