//! Persistence for the tracked loan projects.
//!
//! `ProjectStore` owns the in-memory project list and writes the whole list
//! back to its `Storage` slot after every successful mutation.

use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{LoanError, LoanResult};
use crate::loan::{LoanProject, PartPayment};
use crate::portable::{ExportData, ExportProject};

pub const STORAGE_KEY: &str = "loan-calculator-projects";

/// A durable key-value slot holding JSON text.
pub trait Storage {
    fn load(&self, key: &str) -> LoanResult<Option<String>>;
    fn save(&mut self, key: &str, value: &str) -> LoanResult<()>;
}

#[derive(Default, Debug)]
pub struct MemoryStorage {
    slots: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> LoanResult<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> LoanResult<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per slot inside `dir`.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> LoanResult<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> LoanResult<()> {
        fs::create_dir_all(&self.dir)?;
        // write-then-rename so a crash never leaves a truncated slot
        let tmp = self.path(&format!("{}.tmp", key));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.path(key))?;
        Ok(())
    }
}

/// Fields accepted when creating a project.
#[derive(Clone, Debug)]
pub struct NewProject {
    pub name: String,
    pub principal: f64,
    pub annual_rate: f64,
    pub tenure_years: u32,
    pub start_month: u32,
    pub start_year: i32,
    pub emi_override: Option<f64>,
}

/// Partial update; `None` leaves a field unchanged. `emi_override` uses a
/// nested option so an override can be cleared with `Some(None)`.
#[derive(Clone, Debug, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub principal: Option<f64>,
    pub annual_rate: Option<f64>,
    pub tenure_years: Option<u32>,
    pub start_month: Option<u32>,
    pub start_year: Option<i32>,
    pub emi_override: Option<Option<f64>>,
    pub pre_emi_interest: Option<Option<f64>>,
    pub pre_emi_month: Option<Option<u32>>,
    pub pre_emi_year: Option<Option<i32>>,
}

#[derive(Clone, Copy, Debug)]
pub struct NewPartPayment {
    pub month: u32,
    pub year: i32,
    pub amount: f64,
}

pub struct ProjectStore<S: Storage> {
    storage: S,
    projects: Vec<LoanProject>,
}

impl<S: Storage> ProjectStore<S> {
    /// Loads the project list from `storage`. An empty slot yields an empty
    /// store; a slot that does not parse is an error rather than data loss.
    pub fn init(storage: S) -> LoanResult<Self> {
        let projects: Vec<LoanProject> = match storage.load(STORAGE_KEY)? {
            Some(data) => serde_json::from_str(&data)?,
            None => Vec::new(),
        };
        debug!("loaded {} projects", projects.len());
        Ok(Self { storage, projects })
    }

    pub fn projects(&self) -> &[LoanProject] {
        &self.projects
    }

    pub fn project(&self, id: Uuid) -> Option<&LoanProject> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    pub fn add_project(&mut self, data: NewProject) -> LoanResult<Uuid> {
        let mut project = LoanProject::new(
            &data.name,
            data.principal,
            data.annual_rate,
            data.tenure_years,
            data.start_month,
            data.start_year,
        );
        project.emi_override = data.emi_override;
        project.validate()?;

        let id = project.id;
        info!("adding project '{}' ({})", project.name, id);
        self.projects.push(project);
        self.persist()?;
        Ok(id)
    }

    pub fn update_project(&mut self, id: Uuid, update: ProjectUpdate) -> LoanResult<()> {
        let idx = self.index_of(id)?;
        let mut project = self.projects[idx].clone();

        if let Some(name) = update.name {
            project.name = name;
        }
        if let Some(principal) = update.principal {
            project.principal = principal;
        }
        if let Some(rate) = update.annual_rate {
            project.annual_rate = rate;
        }
        if let Some(tenure) = update.tenure_years {
            project.tenure_years = tenure;
        }
        if let Some(month) = update.start_month {
            project.start_month = month;
        }
        if let Some(year) = update.start_year {
            project.start_year = year;
        }
        if let Some(emi) = update.emi_override {
            project.emi_override = emi;
        }
        if let Some(interest) = update.pre_emi_interest {
            project.pre_emi_interest = interest;
        }
        if let Some(month) = update.pre_emi_month {
            project.pre_emi_month = month;
        }
        if let Some(year) = update.pre_emi_year {
            project.pre_emi_year = year;
        }
        project.validate()?;

        debug!("updating project {}", id);
        self.projects[idx] = project;
        self.persist()
    }

    pub fn delete_project(&mut self, id: Uuid) -> LoanResult<()> {
        let idx = self.index_of(id)?;
        let removed = self.projects.remove(idx);
        info!("deleted project '{}' ({})", removed.name, id);
        self.persist()
    }

    pub fn add_part_payment(&mut self, project_id: Uuid, data: NewPartPayment) -> LoanResult<Uuid> {
        let pp = PartPayment::new(data.month, data.year, data.amount);
        pp.validate()?;

        let idx = self.index_of(project_id)?;
        let id = pp.id;
        debug!(
            "part payment {} of {} in {}/{} for project {}",
            id, pp.amount, pp.month, pp.year, project_id
        );
        self.projects[idx].part_payments.push(pp);
        self.persist()?;
        Ok(id)
    }

    pub fn remove_part_payment(&mut self, project_id: Uuid, pp_id: Uuid) -> LoanResult<()> {
        let idx = self.index_of(project_id)?;
        let pps = &mut self.projects[idx].part_payments;
        let pos = pps
            .iter()
            .position(|pp| pp.id == pp_id)
            .ok_or(LoanError::PartPaymentNotFound {
                project: project_id,
                part_payment: pp_id,
            })?;
        pps.remove(pos);
        self.persist()
    }

    pub fn update_part_payment(
        &mut self,
        project_id: Uuid,
        pp_id: Uuid,
        data: NewPartPayment,
    ) -> LoanResult<()> {
        let idx = self.index_of(project_id)?;
        let pp = self.projects[idx]
            .part_payments
            .iter_mut()
            .find(|pp| pp.id == pp_id)
            .ok_or(LoanError::PartPaymentNotFound {
                project: project_id,
                part_payment: pp_id,
            })?;

        let updated = PartPayment {
            id: pp_id,
            month: data.month,
            year: data.year,
            amount: data.amount,
        };
        updated.validate()?;
        *pp = updated;
        self.persist()
    }

    /// Exports the given projects, or all of them when `ids` is `None`.
    /// Unknown ids are skipped.
    pub fn export_projects(&self, ids: Option<&[Uuid]>) -> ExportData {
        let projects = self
            .projects
            .iter()
            .filter(|p| ids.map_or(true, |ids| ids.contains(&p.id)))
            .map(ExportProject::from)
            .collect();
        ExportData::new(projects)
    }

    /// Adds every project in `data` with fresh ids. All entries are validated
    /// first, so a failing import leaves the store untouched.
    pub fn import_projects(&mut self, data: &ExportData) -> LoanResult<usize> {
        data.check_version()?;
        let imported = data
            .projects
            .iter()
            .map(|entry| {
                let project = entry.to_project();
                project.validate()?;
                Ok(project)
            })
            .collect::<LoanResult<Vec<_>>>()?;

        let count = imported.len();
        self.projects.extend(imported);
        self.persist()?;
        info!("imported {} projects", count);
        Ok(count)
    }

    pub fn import_json(&mut self, json: &str) -> LoanResult<usize> {
        let data = ExportData::from_json(json)?;
        self.import_projects(&data)
    }

    fn index_of(&self, id: Uuid) -> LoanResult<usize> {
        self.projects
            .iter()
            .position(|p| p.id == id)
            .ok_or(LoanError::ProjectNotFound(id))
    }

    fn persist(&mut self) -> LoanResult<()> {
        let json = serde_json::to_string(&self.projects)?;
        self.storage.save(STORAGE_KEY, &json)
    }
}
