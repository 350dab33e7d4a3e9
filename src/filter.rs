use crate::models::{Direction, Row, COL_DATE, COL_STATUS, COL_TYPE};

pub const DEFAULT_DEPOSIT_TYPE: &str = "Пополнение";
pub const DEFAULT_COMPLETED_STATUS: &str = "Выполнено";

/// Eligibility rule: a dated row that is either a deposit or explicitly completed.
/// Deposits are taken as settled; anything else must carry the completed status.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
    pub deposit_type: String,
    pub completed_status: String,
}

impl Default for RowFilter {
    fn default() -> Self {
        Self {
            deposit_type: DEFAULT_DEPOSIT_TYPE.to_string(),
            completed_status: DEFAULT_COMPLETED_STATUS.to_string(),
        }
    }
}

impl RowFilter {
    pub fn new(deposit_type: &str, completed_status: &str) -> Self {
        Self {
            deposit_type: deposit_type.to_string(),
            completed_status: completed_status.to_string(),
        }
    }

    pub fn is_deposit(&self, row: &Row) -> bool {
        Direction::from_type(row.get_or_empty(COL_TYPE), &self.deposit_type) == Direction::Deposit
    }

    pub fn is_eligible(&self, row: &Row) -> bool {
        if row.get_or_empty(COL_DATE).is_empty() {
            return false;
        }
        self.is_deposit(row) || row.get(COL_STATUS) == Some(self.completed_status.as_str())
    }
}
