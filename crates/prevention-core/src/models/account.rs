//! Account models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Biological sex recorded on the account profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Female,
    Male,
    Other,
}

impl Sex {
    pub const ALL: [Sex; 3] = [Sex::Female, Sex::Male, Sex::Other];

    /// Stable storage/wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "FEMALE",
            Sex::Male => "MALE",
            Sex::Other => "OTHER",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FEMALE" => Ok(Sex::Female),
            "MALE" => Ok(Sex::Male),
            "OTHER" => Ok(Sex::Other),
            other => Err(format!("Unknown sex: {}", other)),
        }
    }
}

/// A user account. Identity and sex are never changed by the scheduling core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    /// Opaque identity-provider uid
    pub uid: String,
    /// Preferred salutation
    pub salutation: Option<String>,
    /// Login email
    pub email: String,
    /// Address used for reminders (defaults to `email`)
    pub notification_email: String,
    /// Biological sex, drives examination eligibility
    pub sex: Sex,
    /// Date of birth
    pub birthdate: Option<NaiveDate>,
    /// Creation timestamp
    pub created_at: String,
}

impl Account {
    /// Create a new account; the notification email starts as the login email.
    pub fn new(uid: String, email: String, sex: Sex) -> Self {
        Self {
            uid,
            salutation: None,
            notification_email: email.clone(),
            email,
            sex,
            birthdate: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_defaults_notification_email() {
        let account = Account::new("101".into(), "jana@example.com".into(), Sex::Female);
        assert_eq!(account.notification_email, "jana@example.com");
        assert!(account.salutation.is_none());
    }

    #[test]
    fn test_sex_parse() {
        assert_eq!("female".parse::<Sex>().unwrap(), Sex::Female);
        assert_eq!(" MALE ".parse::<Sex>().unwrap(), Sex::Male);
        assert!("unknown".parse::<Sex>().is_err());
    }

    #[test]
    fn test_sex_serde_names() {
        let json = serde_json::to_string(&Sex::Female).unwrap();
        assert_eq!(json, "\"FEMALE\"");
        assert_eq!(Sex::Other.to_string(), "OTHER");
    }
}
