use serde::{Deserialize, Serialize};

const MIN_AGE: u16 = 1;
const MAX_AGE: u16 = 120;

/// Errors raised when user identity fields are malformed
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    #[error("Name must not be empty")]
    EmptyName,

    #[error("Age {0} is outside the accepted range 1-120")]
    AgeOutOfRange(u16),

    #[error("Gender must not be empty")]
    EmptyGender,
}

/// Identity of the traveller requesting recommendations
///
/// Validated once on construction; there are no setters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "RawUserInfo")]
pub struct UserInfo {
    name: String,
    age: u16,
    gender: String,
}

#[derive(Deserialize)]
struct RawUserInfo {
    name: String,
    age: u16,
    gender: String,
}

impl TryFrom<RawUserInfo> for UserInfo {
    type Error = ValidationError;

    fn try_from(raw: RawUserInfo) -> Result<Self, Self::Error> {
        UserInfo::new(raw.name, raw.age, raw.gender)
    }
}

impl UserInfo {
    /// Creates validated user info, trimming surrounding whitespace
    pub fn new(
        name: impl Into<String>,
        age: u16,
        gender: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_string();
        let gender = gender.into().trim().to_string();

        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !(MIN_AGE..=MAX_AGE).contains(&age) {
            return Err(ValidationError::AgeOutOfRange(age));
        }
        if gender.is_empty() {
            return Err(ValidationError::EmptyGender);
        }

        Ok(Self { name, age, gender })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u16 {
        self.age
    }

    pub fn gender(&self) -> &str {
        &self.gender
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_fields() {
        let user = UserInfo::new("  Anna ", 24, " female").unwrap();
        assert_eq!(user.name(), "Anna");
        assert_eq!(user.age(), 24);
        assert_eq!(user.gender(), "female");
    }

    #[test]
    fn test_rejects_blank_name() {
        assert_eq!(
            UserInfo::new("   ", 30, "male"),
            Err(ValidationError::EmptyName)
        );
    }

    #[test]
    fn test_rejects_implausible_age() {
        assert_eq!(
            UserInfo::new("Anna", 0, "female"),
            Err(ValidationError::AgeOutOfRange(0))
        );
        assert_eq!(
            UserInfo::new("Anna", 150, "female"),
            Err(ValidationError::AgeOutOfRange(150))
        );
    }

    #[test]
    fn test_rejects_blank_gender() {
        assert_eq!(
            UserInfo::new("Anna", 30, ""),
            Err(ValidationError::EmptyGender)
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: UserInfo =
            serde_json::from_str(r#"{"name": "Luca", "age": 41, "gender": "male"}"#).unwrap();
        assert_eq!(ok.name(), "Luca");

        let err = serde_json::from_str::<UserInfo>(r#"{"name": "", "age": 41, "gender": "male"}"#);
        assert!(err.is_err());

        let missing = serde_json::from_str::<UserInfo>(r#"{"name": "Luca", "age": 41}"#);
        assert!(missing.is_err());
    }
}
