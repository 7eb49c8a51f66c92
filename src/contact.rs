use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Number of comma-separated fields in one stored record.
pub const FIELD_COUNT: usize = 5;

const SEPARATOR: char = ',';

/// One contact record. Fields are opaque strings; format rules live in
/// `validate` and are only enforced when a record is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub father_name: String,
    pub phone: String,
    pub dob: String,
}

impl Contact {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        father_name: impl Into<String>,
        phone: impl Into<String>,
        dob: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            father_name: father_name.into(),
            phone: phone.into(),
            dob: dob.into(),
        }
    }

    /// Fields in storage order, paired with their display labels.
    pub fn labelled_fields(&self) -> [(&'static str, &str); FIELD_COUNT] {
        [
            ("Name", self.name.as_str()),
            ("Email", self.email.as_str()),
            ("Father Name", self.father_name.as_str()),
            ("Phone", self.phone.as_str()),
            ("DOB", self.dob.as_str()),
        ]
    }

    /// Serialize as one backing-file line, without the trailing newline.
    ///
    /// Embedded separators are written as-is, so a field containing `,`
    /// will not survive a reload.
    pub fn to_line(&self) -> String {
        [
            self.name.as_str(),
            self.email.as_str(),
            self.father_name.as_str(),
            self.phone.as_str(),
            self.dob.as_str(),
        ]
        .join(",")
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_line())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected 5 fields, found {found}")]
pub struct ParseLineError {
    pub found: usize,
}

impl FromStr for Contact {
    type Err = ParseLineError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line
            .trim_end_matches(['\r', '\n'])
            .split(SEPARATOR)
            .collect();
        match parts.as_slice() {
            [name, email, father_name, phone, dob] => {
                Ok(Contact::new(*name, *email, *father_name, *phone, *dob))
            }
            _ => Err(ParseLineError { found: parts.len() }),
        }
    }
}
