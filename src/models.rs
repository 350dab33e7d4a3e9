use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};

pub const COL_DATE: &str = "transactionDate";
pub const COL_AMOUNT: &str = "amount";
pub const COL_TYPE: &str = "type";
pub const COL_STATUS: &str = "status";
pub const COL_CURRENCY: &str = "currency";
pub const COL_MERCHANT: &str = "merchant";
pub const COL_CATEGORY: &str = "category";

/// Columns the header must name for a file to be importable at all.
pub const REQUIRED_COLUMNS: &[&str] = &[COL_DATE, COL_AMOUNT];

/// One input line keyed by the header's column names, in header order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Value of the first column with this name, if the line reached it.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn get_or_empty(&self, column: &str) -> &str {
        self.get(column).unwrap_or("")
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

// Serialized as a JSON object in header order; this is the ledger payload.
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Deposit,
    Withdrawal,
}

impl Direction {
    /// Deposit when the type field matches the sentinel, ignoring case.
    pub fn from_type(raw_type: &str, deposit_type: &str) -> Self {
        if raw_type.to_lowercase() == deposit_type.to_lowercase() {
            Self::Deposit
        } else {
            Self::Withdrawal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }
}

/// Outbound transaction; lives only as the payload of one create call.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: String,
    pub direction: Direction,
    pub description: String,
    pub amount: Decimal,
    pub currency: String,
    pub source_id: String,
    pub destination_id: String,
    pub category_name: String,
}
