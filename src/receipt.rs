//! Tagged call results in the shape hosts expect:
//! `{"type": "ok", "value": ...}` or `{"type": "err", "value": <code>}`.

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Receipt<T> {
    Ok(T),
    Err(u32),
}

impl<T> Receipt<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Receipt::Ok(_))
    }

    /// Error code, if this receipt records a failure.
    pub fn code(&self) -> Option<u32> {
        match self {
            Receipt::Ok(_) => None,
            Receipt::Err(code) => Some(*code),
        }
    }
}

impl<T> From<Result<T>> for Receipt<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Receipt::Ok(value),
            Err(err) => Receipt::Err(err.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallyError;

    #[test]
    fn test_ok_shape() {
        let receipt: Receipt<u64> = Ok(1).into();
        assert_eq!(
            serde_json::to_string(&receipt).unwrap(),
            r#"{"type":"ok","value":1}"#
        );
        assert!(receipt.is_ok());
        assert_eq!(receipt.code(), None);
    }

    #[test]
    fn test_err_shape_carries_code() {
        let receipt: Receipt<bool> = Err(TallyError::ScoreOutOfRange(101)).into();
        assert_eq!(
            serde_json::to_string(&receipt).unwrap(),
            r#"{"type":"err","value":504}"#
        );
        assert_eq!(receipt.code(), Some(504));
    }

    #[test]
    fn test_parses_host_shape() {
        let receipt: Receipt<bool> = serde_json::from_str(r#"{"type":"ok","value":true}"#).unwrap();
        assert_eq!(receipt, Receipt::Ok(true));
        let receipt: Receipt<bool> = serde_json::from_str(r#"{"type":"err","value":500}"#).unwrap();
        assert_eq!(receipt, Receipt::Err(500));
    }
}
