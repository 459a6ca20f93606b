//! Phone number normalisation for registry lookups.

use crate::CliError;

const NATIONAL_DIGITS: usize = 10;
const CODE_DIGITS: usize = 3;

/// A national number split into its numbering-plan code and subscriber part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PhoneNumber {
    pub(crate) code: i64,
    pub(crate) subscriber: i64,
}

impl PhoneNumber {
    /// Accept any formatting, keeping digits only. Eleven-digit numbers with
    /// a leading `7` or `8` lose that country or trunk prefix.
    pub(crate) fn parse(input: &str) -> Result<Self, CliError> {
        let invalid = || CliError::InvalidPhoneNumber {
            input: input.to_owned(),
        };
        let digits: String = input.chars().filter(char::is_ascii_digit).collect();
        let national = match digits.strip_prefix(['7', '8']) {
            Some(rest) if rest.len() == NATIONAL_DIGITS => rest,
            _ => digits.as_str(),
        };
        if national.len() != NATIONAL_DIGITS {
            return Err(invalid());
        }
        let (code, subscriber) = national.split_at_checked(CODE_DIGITS).ok_or_else(invalid)?;
        Ok(Self {
            code: code.parse().map_err(|_| invalid())?,
            subscriber: subscriber.parse().map_err(|_| invalid())?,
        })
    }
}
