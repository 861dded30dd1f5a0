use std::fmt;

/// Money is represented as whole currency units. Fractional amounts are not supported.
pub type Amount = i64;

/// Format an amount the way balances are displayed.
/// Example: 1000 -> "$1000.00"
pub fn format_amount(amount: Amount) -> String {
    format!("${}.00", amount)
}

/// Parse a request parameter into a positive amount.
/// Example: "1100" -> 1100, "0" -> NotPositive, "ten" -> InvalidFormat
pub fn parse_amount(input: &str) -> Result<Amount, ParseAmountError> {
    let amount: Amount = input
        .parse()
        .map_err(|_| ParseAmountError::InvalidFormat)?;
    if amount < 1 {
        return Err(ParseAmountError::NotPositive(amount));
    }
    Ok(amount)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    InvalidFormat,
    NotPositive(Amount),
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::InvalidFormat => write!(f, "amount is not a whole number"),
            ParseAmountError::NotPositive(amount) => {
                write!(f, "amount must be at least 1, got {}", amount)
            }
        }
    }
}

impl std::error::Error for ParseAmountError {}
