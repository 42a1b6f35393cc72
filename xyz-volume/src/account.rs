use crate::error::AccountError;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Length of a `0x`-prefixed 20 byte hex address.
pub const ADDRESS_LEN: usize = 42;

const ADDRESS_PREFIX: &str = "0x";

/// Validated Hyperliquid account address.
///
/// Stored lowercase so the same wallet typed with different checksum casing
/// maps to one account.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Display, Serialize)]
pub struct Account(String);

impl Account {
    /// Validate `input` as a `0x`-prefixed, 42 character hexadecimal address.
    pub fn parse(input: &str) -> Result<Self, AccountError> {
        let input = input.trim();

        let valid = input.len() == ADDRESS_LEN
            && input.starts_with(ADDRESS_PREFIX)
            && input[ADDRESS_PREFIX.len()..]
                .chars()
                .all(|c| c.is_ascii_hexdigit());

        if valid {
            Ok(Self(input.to_ascii_lowercase()))
        } else {
            Err(AccountError::InvalidFormat {
                input: input.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Account {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for Account {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_parse() {
        struct TestCase {
            input: &'static str,
            expected: Result<&'static str, ()>,
        }

        let tests = vec![
            TestCase {
                // TC0: checksummed address is accepted and lowercased
                input: "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0",
                expected: Ok("0x742d35cc6634c0532925a3b844bc9e7595f0beb0"),
            },
            TestCase {
                // TC1: surrounding whitespace is ignored
                input: "  0x010461c14e146ac35fe42271bdc1134ee31c703a\n",
                expected: Ok("0x010461c14e146ac35fe42271bdc1134ee31c703a"),
            },
            TestCase {
                // TC2: free text is rejected
                input: "not-an-address",
                expected: Err(()),
            },
            TestCase {
                // TC3: 41 characters is rejected
                input: "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb",
                expected: Err(()),
            },
            TestCase {
                // TC4: missing prefix is rejected
                input: "00742d35Cc6634C0532925a3b844Bc9e7595f0bEb0",
                expected: Err(()),
            },
            TestCase {
                // TC5: non hex digit is rejected
                input: "0x742d35Cc6634C0532925a3b844Bc9e7595f0bEbZ",
                expected: Err(()),
            },
            TestCase {
                // TC6: uppercase prefix is rejected
                input: "0X742d35Cc6634C0532925a3b844Bc9e7595f0bEb0",
                expected: Err(()),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = Account::parse(test.input);
            match (actual, test.expected) {
                (Ok(actual), Ok(expected)) => {
                    assert_eq!(actual.as_str(), expected, "TC{} failed", index)
                }
                (Err(_), Err(())) => {
                    // Test passed
                }
                (actual, expected) => {
                    // Test failed
                    panic!(
                        "TC{index} failed because actual != expected. \nActual: {actual:?}\nExpected: {expected:?}\n"
                    );
                }
            }
        }
    }
}
