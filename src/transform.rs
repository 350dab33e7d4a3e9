use std::str::FromStr;

use chrono::{Datelike, FixedOffset, Local, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::models::{
    Direction, Row, Transaction, COL_AMOUNT, COL_CATEGORY, COL_CURRENCY, COL_DATE, COL_MERCHANT,
    COL_TYPE,
};

// ---------------------------------------------------------------------------
// Date conventions of the exporting bank
// ---------------------------------------------------------------------------

const MIN_YEAR: i32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InputLocale {
    /// dd.MM.yy[yy] HH:mm[:ss]
    #[default]
    Ru,
    /// MM/dd/yyyy h:mm[:ss] AM/PM or 24-hour
    Us,
    /// yyyy-MM-dd[T| ]HH:mm[:ss]
    Iso,
}

impl InputLocale {
    fn datetime_formats(&self) -> &'static [&'static str] {
        match self {
            Self::Ru => &[
                "%d.%m.%Y %H:%M:%S",
                "%d.%m.%Y %H:%M",
                "%d.%m.%y %H:%M:%S",
                "%d.%m.%y %H:%M",
            ],
            Self::Us => &[
                "%m/%d/%Y %I:%M:%S %p",
                "%m/%d/%Y %I:%M %p",
                "%m/%d/%Y %H:%M:%S",
                "%m/%d/%Y %H:%M",
            ],
            Self::Iso => &[
                "%Y-%m-%d %H:%M:%S",
                "%Y-%m-%d %H:%M",
                "%Y-%m-%dT%H:%M:%S",
                "%Y-%m-%dT%H:%M",
            ],
        }
    }

    fn date_formats(&self) -> &'static [&'static str] {
        match self {
            Self::Ru => &["%d.%m.%Y", "%d.%m.%y"],
            Self::Us => &["%m/%d/%Y"],
            Self::Iso => &["%Y-%m-%d"],
        }
    }

    /// `%Y` also takes "24", so short years are refused there and left to
    /// the `%y` formats (24 -> 2024).
    pub fn parse_naive(&self, raw: &str) -> Option<NaiveDateTime> {
        let raw = raw.trim();
        self.datetime_formats()
            .iter()
            .find_map(|fmt| {
                NaiveDateTime::parse_from_str(raw, fmt)
                    .ok()
                    .filter(|dt| dt.year() >= MIN_YEAR)
            })
            .or_else(|| {
                self.date_formats()
                    .iter()
                    .find_map(|fmt| {
                        NaiveDate::parse_from_str(raw, fmt)
                            .ok()
                            .filter(|d| d.year() >= MIN_YEAR)
                    })
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }
}

/// Zone the export's wall-clock times are read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Local,
    Fixed(FixedOffset),
}

pub fn parse_timestamp(raw: &str, locale: InputLocale, zone: Zone) -> Result<String, TransformError> {
    match zone {
        Zone::Local => parse_timestamp_in(raw, locale, &Local),
        Zone::Fixed(offset) => parse_timestamp_in(raw, locale, &offset),
    }
}

/// Ambiguous wall-clock times take the earliest instant. Times skipped by a
/// DST jump are an error.
fn parse_timestamp_in<Tz: TimeZone>(
    raw: &str,
    locale: InputLocale,
    tz: &Tz,
) -> Result<String, TransformError> {
    let naive = locale
        .parse_naive(raw)
        .ok_or_else(|| TransformError::InvalidDate(raw.to_string()))?;
    let local = tz
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| TransformError::NonexistentLocalTime(raw.to_string()))?;
    Ok(local
        .fixed_offset()
        .to_rfc3339_opts(SecondsFormat::Secs, false))
}

/// Accepts a decimal comma and space-grouped thousands. The sign is dropped;
/// direction comes from the type field.
pub fn parse_amount(raw: &str) -> Result<Decimal, TransformError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    // Plain decimals only: no exponents or digit separators.
    if !cleaned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
    {
        return Err(TransformError::InvalidAmount(raw.to_string()));
    }
    let mut amount = Decimal::from_str(&cleaned)
        .map_err(|_| TransformError::InvalidAmount(raw.to_string()))?
        .abs();
    if amount.scale() < 2 {
        amount.rescale(2);
    }
    Ok(amount)
}

// ---------------------------------------------------------------------------
// Row -> outbound transaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Transformer {
    pub locale: InputLocale,
    pub zone: Zone,
    pub deposit_type: String,
    pub bank_account_id: String,
    pub cash_account_id: String,
}

impl Transformer {
    pub fn transform(&self, row: &Row) -> Result<Transaction, TransformError> {
        let date = parse_timestamp(row.get_or_empty(COL_DATE), self.locale, self.zone)?;
        let amount = parse_amount(row.get_or_empty(COL_AMOUNT))?;
        let direction = Direction::from_type(row.get_or_empty(COL_TYPE), &self.deposit_type);

        let (source_id, destination_id) = match direction {
            Direction::Withdrawal => (&self.bank_account_id, &self.cash_account_id),
            Direction::Deposit => (&self.cash_account_id, &self.bank_account_id),
        };

        Ok(Transaction {
            date,
            direction,
            description: row.get_or_empty(COL_MERCHANT).to_string(),
            amount,
            currency: row.get_or_empty(COL_CURRENCY).to_string(),
            source_id: source_id.clone(),
            destination_id: destination_id.clone(),
            category_name: row.get_or_empty(COL_CATEGORY).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn moscow() -> Zone {
        Zone::Fixed(FixedOffset::east_opt(3 * 3600).unwrap())
    }

    fn transformer() -> Transformer {
        Transformer {
            locale: InputLocale::Ru,
            zone: moscow(),
            deposit_type: "Пополнение".to_string(),
            bank_account_id: "1".to_string(),
            cash_account_id: "2".to_string(),
        }
    }

    fn row(fields: &[(&str, &str)]) -> Row {
        Row::new(
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_parse_amount_decimal_comma() {
        assert_eq!(parse_amount("1234,56").unwrap(), parse_amount("1234.56").unwrap());
        assert_eq!(parse_amount("1234,56").unwrap(), dec!(1234.56));
    }

    #[test]
    fn test_parse_amount_pads_to_cents() {
        assert_eq!(parse_amount("1500").unwrap().to_string(), "1500.00");
        assert_eq!(parse_amount("1500,5").unwrap().to_string(), "1500.50");
        assert_eq!(parse_amount("0,125").unwrap().to_string(), "0.125");
    }

    #[test]
    fn test_parse_amount_strips_grouping_and_sign() {
        assert_eq!(parse_amount("1 234,56").unwrap(), dec!(1234.56));
        assert_eq!(parse_amount("1\u{a0}234,56").unwrap(), dec!(1234.56));
        assert_eq!(parse_amount("-500,00").unwrap(), dec!(500.00));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount("").unwrap_err(), TransformError::InvalidAmount(String::new()));
        assert!(parse_amount("12,34,56").is_err());
        assert!(parse_amount("abc").is_err());
    }

    #[test]
    fn test_parse_amount_rejects_exponent() {
        assert_eq!(
            parse_amount("1e3").unwrap_err(),
            TransformError::InvalidAmount("1e3".to_string())
        );
        assert!(parse_amount("1,5E2").is_err());
        assert!(parse_amount("1_000").is_err());
    }

    #[test]
    fn test_parse_timestamp_ru_locale() {
        assert_eq!(
            parse_timestamp("01.01.2024 10:00", InputLocale::Ru, moscow()).unwrap(),
            "2024-01-01T10:00:00+03:00"
        );
        assert_eq!(
            parse_timestamp("31.12.2023 23:59:30", InputLocale::Ru, moscow()).unwrap(),
            "2023-12-31T23:59:30+03:00"
        );
        assert_eq!(
            parse_timestamp("15.02.2024", InputLocale::Ru, moscow()).unwrap(),
            "2024-02-15T00:00:00+03:00"
        );
    }

    #[test]
    fn test_parse_timestamp_ru_short_year() {
        assert_eq!(
            parse_timestamp("01.01.24 10:00", InputLocale::Ru, moscow()).unwrap(),
            "2024-01-01T10:00:00+03:00"
        );
        assert_eq!(
            parse_timestamp("31.12.23 23:59:30", InputLocale::Ru, moscow()).unwrap(),
            "2023-12-31T23:59:30+03:00"
        );
        assert_eq!(
            parse_timestamp("15.02.24", InputLocale::Ru, moscow()).unwrap(),
            "2024-02-15T00:00:00+03:00"
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_years_before_1000() {
        let utc = Zone::Fixed(FixedOffset::east_opt(0).unwrap());
        assert_eq!(
            parse_timestamp("0024-01-01 10:00", InputLocale::Iso, utc).unwrap_err(),
            TransformError::InvalidDate("0024-01-01 10:00".to_string())
        );
        assert!(parse_timestamp("01/01/24 10:00", InputLocale::Us, utc).is_err());
    }

    #[test]
    fn test_dst_gap_is_nonexistent_local_time() {
        let berlin = chrono_tz::Europe::Berlin;
        assert_eq!(
            parse_timestamp_in("31.03.2024 02:30", InputLocale::Ru, &berlin).unwrap_err(),
            TransformError::NonexistentLocalTime("31.03.2024 02:30".to_string())
        );
        assert_eq!(
            parse_timestamp_in("31.03.2024 03:30", InputLocale::Ru, &berlin).unwrap(),
            "2024-03-31T03:30:00+02:00"
        );
    }

    #[test]
    fn test_dst_fold_takes_earliest_instant() {
        let berlin = chrono_tz::Europe::Berlin;
        assert_eq!(
            parse_timestamp_in("27.10.2024 02:30", InputLocale::Ru, &berlin).unwrap(),
            "2024-10-27T02:30:00+02:00"
        );
        assert_eq!(
            parse_timestamp_in("27.10.2024 03:30", InputLocale::Ru, &berlin).unwrap(),
            "2024-10-27T03:30:00+01:00"
        );
    }

    #[test]
    fn test_parse_timestamp_other_locales() {
        let utc = Zone::Fixed(FixedOffset::east_opt(0).unwrap());
        assert_eq!(
            parse_timestamp("01/15/2025 02:30 PM", InputLocale::Us, utc).unwrap(),
            "2025-01-15T14:30:00+00:00"
        );
        assert_eq!(
            parse_timestamp("2025-01-15T08:05:00", InputLocale::Iso, utc).unwrap(),
            "2025-01-15T08:05:00+00:00"
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_wrong_locale() {
        let err = parse_timestamp("2024-01-01 10:00", InputLocale::Ru, moscow()).unwrap_err();
        assert_eq!(err, TransformError::InvalidDate("2024-01-01 10:00".to_string()));
        assert!(parse_timestamp("32.01.2024 10:00", InputLocale::Ru, moscow()).is_err());
    }

    #[test]
    fn test_parse_timestamp_local_zone_is_offset_qualified() {
        let ts = parse_timestamp("01.06.2024 12:00", InputLocale::Ru, Zone::Local).unwrap();
        assert!(ts.starts_with("2024-06-01T12:00:00"), "{ts}");
        assert_eq!(ts.len(), "2024-06-01T12:00:00+00:00".len());
    }

    #[test]
    fn test_withdrawal_routes_bank_to_cash() {
        let txn = transformer()
            .transform(&row(&[
                ("transactionDate", "02.01.2024 09:15"),
                ("amount", "250,40"),
                ("type", "Оплата"),
                ("merchant", "Coffee"),
                ("currency", "RUB"),
                ("category", "Food"),
            ]))
            .unwrap();
        assert_eq!(txn.direction, Direction::Withdrawal);
        assert_eq!(txn.source_id, "1");
        assert_eq!(txn.destination_id, "2");
        assert_eq!(txn.amount, dec!(250.40));
        assert_eq!(txn.description, "Coffee");
        assert_eq!(txn.category_name, "Food");
    }

    #[test]
    fn test_deposit_routes_cash_to_bank() {
        let txn = transformer()
            .transform(&row(&[
                ("transactionDate", "01.01.2024 10:00"),
                ("amount", "1500,00"),
                ("type", "Пополнение"),
            ]))
            .unwrap();
        assert_eq!(txn.direction, Direction::Deposit);
        assert_eq!(txn.source_id, "2");
        assert_eq!(txn.destination_id, "1");
        assert_eq!(txn.date, "2024-01-01T10:00:00+03:00");
    }

    #[test]
    fn test_optional_fields_default_to_empty() {
        let txn = transformer()
            .transform(&row(&[("transactionDate", "01.01.2024 10:00"), ("amount", "1")]))
            .unwrap();
        assert_eq!(txn.description, "");
        assert_eq!(txn.currency, "");
        assert_eq!(txn.category_name, "");
        assert_eq!(txn.direction, Direction::Withdrawal);
    }

    #[test]
    fn test_bad_fields_fail_transform() {
        let t = transformer();
        assert!(matches!(
            t.transform(&row(&[("transactionDate", "yesterday"), ("amount", "1")])),
            Err(TransformError::InvalidDate(_))
        ));
        assert!(matches!(
            t.transform(&row(&[("transactionDate", "01.01.2024 10:00"), ("amount", "n/a")])),
            Err(TransformError::InvalidAmount(_))
        ));
    }
}
