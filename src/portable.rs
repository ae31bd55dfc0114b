//! Versioned import/export envelope for sharing loan projects.
//!
//! Exported projects carry only the borrower-facing fields and their part
//! payments. Identifiers and creation timestamps are dropped and regenerated
//! on import.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{LoanError, LoanResult};
use crate::loan::{LoanProject, PartPayment};

pub const EXPORT_VERSION: u32 = 1;

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ExportData {
    pub version: u32,
    pub projects: Vec<ExportProject>,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProject {
    pub name: String,
    pub principal: f64,
    pub annual_rate: f64,
    pub tenure_years: u32,
    pub start_month: u32,
    pub start_year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emi_override: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_emi_interest: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_emi_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pre_emi_year: Option<i32>,
    #[serde(default)]
    pub part_payments: Vec<ExportPartPayment>,
}

#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct ExportPartPayment {
    pub month: u32,
    pub year: i32,
    pub amount: f64,
}

impl ExportData {
    pub fn new(projects: Vec<ExportProject>) -> Self {
        Self {
            version: EXPORT_VERSION,
            projects,
        }
    }

    /// Parses an export document, rejecting anything that is not a version 1
    /// envelope with a `projects` array.
    pub fn from_json(json: &str) -> LoanResult<Self> {
        let mut raw: Value = serde_json::from_str(json)?;

        // 1 and 1.0 are the same version
        match raw.get("version") {
            Some(v) if v.as_f64() == Some(f64::from(EXPORT_VERSION)) => {}
            Some(v) => return Err(LoanError::InvalidImport(format!("unsupported version {}", v))),
            None => return Err(LoanError::InvalidImport("missing version".to_string())),
        }
        raw["version"] = Value::from(EXPORT_VERSION);
        if !raw.get("projects").is_some_and(Value::is_array) {
            return Err(LoanError::InvalidImport(
                "projects must be a list".to_string(),
            ));
        }

        serde_json::from_value(raw)
            .map_err(|e| LoanError::InvalidImport(format!("malformed project entry: {}", e)))
    }

    pub fn to_json(&self) -> LoanResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Re-checks the envelope for data built in memory rather than parsed.
    pub fn check_version(&self) -> LoanResult<()> {
        if self.version != EXPORT_VERSION {
            return Err(LoanError::InvalidImport(format!(
                "unsupported version {}",
                self.version
            )));
        }
        Ok(())
    }
}

impl From<&LoanProject> for ExportProject {
    fn from(project: &LoanProject) -> Self {
        Self {
            name: project.name.clone(),
            principal: project.principal,
            annual_rate: project.annual_rate,
            tenure_years: project.tenure_years,
            start_month: project.start_month,
            start_year: project.start_year,
            emi_override: project.emi_override,
            pre_emi_interest: project.pre_emi_interest,
            pre_emi_month: project.pre_emi_month,
            pre_emi_year: project.pre_emi_year,
            part_payments: project
                .part_payments
                .iter()
                .map(|pp| ExportPartPayment {
                    month: pp.month,
                    year: pp.year,
                    amount: pp.amount,
                })
                .collect(),
        }
    }
}

impl ExportProject {
    /// Builds a fresh project (new ids, current timestamp) from this entry.
    pub fn to_project(&self) -> LoanProject {
        let mut project = LoanProject::new(
            &self.name,
            self.principal,
            self.annual_rate,
            self.tenure_years,
            self.start_month,
            self.start_year,
        );
        project.emi_override = self.emi_override;
        project.pre_emi_interest = self.pre_emi_interest;
        project.pre_emi_month = self.pre_emi_month;
        project.pre_emi_year = self.pre_emi_year;
        project.part_payments = self
            .part_payments
            .iter()
            .map(|pp| PartPayment::new(pp.month, pp.year, pp.amount))
            .collect();
        project
    }
}

#[cfg(test)]
mod tests {
    use super::{ExportData, ExportProject};
    use crate::error::LoanError;
    use crate::loan::LoanProject;
    use test_log::test;

    #[test]
    fn test_export_omits_identity() {
        let project = LoanProject::new("home", 1000000., 10., 20, 1, 2024)
            .with_part_payment(12, 2024, 100000.);
        let data = ExportData::new(vec![ExportProject::from(&project)]);
        let json = data.to_json().unwrap();

        assert!(json.contains("\"version\": 1"));
        assert!(json.contains("\"annualRate\": 10.0"));
        assert!(json.contains("\"partPayments\""));
        assert!(!json.contains("\"id\""));
        assert!(!json.contains("createdAt"));
        assert!(!json.contains("emiOverride"));
    }

    #[test]
    fn test_parse_rejects_bad_envelopes() {
        let wrong_version = r#"{"version": 2, "projects": []}"#;
        assert!(matches!(
            ExportData::from_json(wrong_version),
            Err(LoanError::InvalidImport(_))
        ));

        let float_version = r#"{"version": 2.0, "projects": []}"#;
        match ExportData::from_json(float_version) {
            Err(LoanError::InvalidImport(reason)) => assert_eq!(reason, "unsupported version 2.0"),
            other => panic!("expected unsupported version, got {:?}", other),
        }

        let missing_version = r#"{"projects": []}"#;
        assert!(matches!(
            ExportData::from_json(missing_version),
            Err(LoanError::InvalidImport(_))
        ));

        let not_a_list = r#"{"version": 1, "projects": {"name": "home"}}"#;
        assert!(matches!(
            ExportData::from_json(not_a_list),
            Err(LoanError::InvalidImport(_))
        ));

        let bad_entry = r#"{"version": 1, "projects": [{"name": "home"}]}"#;
        assert!(matches!(
            ExportData::from_json(bad_entry),
            Err(LoanError::InvalidImport(_))
        ));

        assert!(matches!(
            ExportData::from_json("not json"),
            Err(LoanError::Serialization(_))
        ));
    }

    #[test]
    fn test_parse_accepts_float_version() {
        let data = ExportData::from_json(r#"{"version": 1.0, "projects": []}"#).unwrap();
        assert_eq!(data.version, 1);
        assert!(data.projects.is_empty());
    }

    #[test]
    fn test_parse_accepts_minimal_entry() {
        let json = r#"{
            "version": 1,
            "projects": [{
                "name": "car",
                "principal": 600000,
                "annualRate": 9.25,
                "tenureYears": 5,
                "startMonth": 8,
                "startYear": 2023,
                "emiOverride": 13000
            }]
        }"#;
        let data = ExportData::from_json(json).unwrap();
        let project = data.projects[0].to_project();

        assert_eq!(project.name, "car");
        assert_eq!(project.principal, 600000.);
        assert_eq!(project.emi_override, Some(13000.));
        assert!(project.part_payments.is_empty());
        assert!(project.validate().is_ok());
    }
}
