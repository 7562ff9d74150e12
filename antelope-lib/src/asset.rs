use crate::serialize::{Pack, Writer};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub const MAX_PRECISION: u8 = 18;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("malformed asset `{0}`")]
    Malformed(String),
    #[error("invalid symbol code `{0}`")]
    InvalidSymbol(String),
    #[error("asset amount out of range `{0}`")]
    OutOfRange(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol {
    precision: u8,
    code: String,
}

impl Symbol {
    pub fn new(precision: u8, code: &str) -> Result<Self, Error> {
        if precision > MAX_PRECISION
            || code.is_empty()
            || code.len() > 7
            || !code.bytes().all(|c| c.is_ascii_uppercase())
        {
            return Err(Error::InvalidSymbol(format!("{},{}", precision, code)));
        }
        Ok(Self {
            precision,
            code: code.to_string(),
        })
    }

    pub fn precision(&self) -> u8 {
        self.precision
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Packed form: precision in the low byte, code characters above it.
    pub fn to_u64(&self) -> u64 {
        self.code
            .bytes()
            .enumerate()
            .fold(self.precision as u64, |acc, (i, c)| {
                acc | (c as u64) << (8 * (i + 1))
            })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

/// Fixed-point quantity: `amount` counts units of `10^-precision`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    pub fn with_amount(&self, amount: i64) -> Self {
        Self {
            amount,
            symbol: self.symbol.clone(),
        }
    }
}

impl FromStr for Asset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || Error::Malformed(s.to_string());
        let (quantity, code) = s.trim().split_once(' ').ok_or_else(malformed)?;
        let code = code.trim();

        let (negative, digits) = match quantity.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, quantity),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty()
            || !int_part.bytes().all(|c| c.is_ascii_digit())
            || !frac_part.bytes().all(|c| c.is_ascii_digit())
            || (digits.contains('.') && frac_part.is_empty())
        {
            return Err(malformed());
        }

        let precision = u8::try_from(frac_part.len()).map_err(|_| malformed())?;
        let symbol = Symbol::new(precision, code)?;

        let amount = format!("{}{}", int_part, frac_part)
            .parse::<i64>()
            .map_err(|_| Error::OutOfRange(s.to_string()))?;
        let amount = if negative { -amount } else { amount };

        Ok(Self { amount, symbol })
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = self.symbol.precision as u32;
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        if precision == 0 {
            write!(f, "{}{} {}", sign, abs, self.symbol.code)
        } else {
            let scale = 10u64.pow(precision);
            write!(
                f,
                "{}{}.{:0width$} {}",
                sign,
                abs / scale,
                abs % scale,
                self.symbol.code,
                width = precision as usize
            )
        }
    }
}

impl Pack for Asset {
    fn pack(&self, writer: &mut Writer) {
        writer.write_i64(self.amount);
        writer.write_u64(self.symbol.to_u64());
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}
