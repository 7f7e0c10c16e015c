//! Employee records: upstream wire shape and domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Months per year used for the annualized compensation.
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Response envelope returned by the upstream.
///
/// A missing or null `data` is a valid outcome meaning "treat as miss".
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub status: Option<String>,

    pub data: Option<T>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Employee as served by the upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEmployee {
    pub id: i64,

    #[serde(rename = "employee_name", default)]
    pub name: Option<String>,

    #[serde(rename = "employee_age", default)]
    pub age: Option<u32>,

    #[serde(rename = "employee_salary", default)]
    pub salary: Option<f64>,

    #[serde(default)]
    pub profile_image: Option<String>,
}

/// Domain employee record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub age: Option<u32>,

    /// Monthly base compensation.
    #[serde(default)]
    pub salary: Option<f64>,

    #[serde(default)]
    pub profile_image: Option<String>,

    /// Always `salary * 12`; absent when `salary` is absent.
    #[serde(default)]
    pub annual_salary: Option<f64>,

    /// Set only when the record is (re)written from the upstream.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl Employee {
    /// Map an upstream record; derived fields are left for [`Employee::refreshed`].
    pub fn from_raw(raw: RawEmployee) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            age: raw.age,
            salary: raw.salary,
            profile_image: raw.profile_image,
            annual_salary: None,
            last_updated: None,
        }
    }

    /// Recompute the annualized compensation from the base salary.
    pub fn with_derived(mut self) -> Self {
        self.annual_salary = annualize(self.salary);
        self
    }

    /// Derive computed fields and stamp the refresh time.
    pub fn refreshed(self, now: DateTime<Utc>) -> Self {
        let mut employee = self.with_derived();
        employee.last_updated = Some(now);
        employee
    }
}

/// `salary * 12`, or `None` when there is no salary.
pub fn annualize(salary: Option<f64>) -> Option<f64> {
    salary.map(|monthly| monthly * MONTHS_PER_YEAR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_raw_wire_names() {
        let json = serde_json::json!({
            "id": 7,
            "employee_name": "Tiger Nixon",
            "employee_age": 61,
            "employee_salary": 320800.0,
            "profile_image": ""
        });
        let raw: RawEmployee = serde_json::from_value(json).unwrap();
        assert_eq!(raw.id, 7);
        assert_eq!(raw.name.as_deref(), Some("Tiger Nixon"));
        assert_eq!(raw.age, Some(61));
        assert_eq!(raw.salary, Some(320800.0));
    }

    #[test]
    fn test_raw_optional_fields_default() {
        let raw: RawEmployee = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert_eq!(raw.name, None);
        assert_eq!(raw.salary, None);
        assert_eq!(raw.profile_image, None);
    }

    #[test]
    fn test_envelope_null_data_is_miss() {
        let env: Envelope<Vec<RawEmployee>> =
            serde_json::from_str(r#"{"status":"success","data":null,"message":"ok"}"#).unwrap();
        assert!(env.data.is_none());

        let env: Envelope<RawEmployee> = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(env.data.is_none());
    }

    #[test]
    fn test_refreshed_stamps_and_derives() {
        let now = Utc::now();
        let employee = Employee::from_raw(RawEmployee {
            id: 1,
            name: Some("John Doe".into()),
            age: Some(30),
            salary: Some(5000.0),
            profile_image: None,
        })
        .refreshed(now);

        assert_eq!(employee.annual_salary, Some(60000.0));
        assert_eq!(employee.last_updated, Some(now));
    }

    #[test]
    fn test_missing_salary_leaves_annual_absent() {
        let employee = Employee::from_raw(RawEmployee {
            id: 2,
            name: None,
            age: None,
            salary: None,
            profile_image: None,
        })
        .refreshed(Utc::now());
        assert_eq!(employee.annual_salary, None);
    }

    proptest! {
        #[test]
        fn prop_annual_is_twelve_times_base(base in proptest::option::of(0.0f64..1.0e9)) {
            let annual = annualize(base);
            match base {
                Some(b) => prop_assert_eq!(annual, Some(b * 12.0)),
                None => prop_assert!(annual.is_none()),
            }
        }
    }
}
