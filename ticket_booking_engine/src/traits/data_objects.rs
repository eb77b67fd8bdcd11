#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertNotificationResult {
    Inserted(i64),
    AlreadyExists(i64),
}

impl InsertNotificationResult {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }
}
