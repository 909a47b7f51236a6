//! In-memory fakes for the store and service traits.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use leadkit_shared::{
    EmailVerifier, GenderLookup, Lead, LeadId, LeadInput, LeadStore, LeadkitError, NewLead, Result,
};

pub fn input(first: &str, last: &str, email: &str) -> LeadInput {
    LeadInput {
        first_name: Some(first.into()),
        last_name: Some(last.into()),
        email: Some(email.into()),
        ..Default::default()
    }
}

#[derive(Default)]
pub struct FakeStore {
    leads: Mutex<Vec<Lead>>,
    lookups: AtomicUsize,
    fail_lookup: bool,
    fail_create_for: Option<String>,
    fail_update_for: Option<LeadId>,
}

impl FakeStore {
    pub fn with_leads(names: &[(&str, &str)]) -> Self {
        let store = Self::default();
        for (first, last) in names {
            let lead = NewLead::new(*first, *last, format!("{}@example.com", first.to_lowercase()));
            store.insert(&lead);
        }
        store
    }

    pub fn failing_lookup(mut self) -> Self {
        self.fail_lookup = true;
        self
    }

    /// Reject inserts whose first name is `first_name`.
    pub fn failing_create_for(mut self, first_name: &str) -> Self {
        self.fail_create_for = Some(first_name.into());
        self
    }

    /// Reject updates to lead `id`.
    pub fn failing_update_for(mut self, id: LeadId) -> Self {
        self.fail_update_for = Some(id);
        self
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn leads(&self) -> Vec<Lead> {
        self.leads.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.leads.lock().unwrap().len()
    }

    pub fn created_names(&self) -> Vec<String> {
        self.leads().into_iter().map(|l| l.first_name).collect()
    }

    pub fn get(&self, id: LeadId) -> Lead {
        self.leads().into_iter().find(|l| l.id == id).unwrap()
    }

    fn insert(&self, lead: &NewLead) -> Lead {
        let mut leads = self.leads.lock().unwrap();
        let now = Utc::now();
        let created = Lead {
            id: leads.len() as LeadId + 1,
            first_name: lead.first_name.clone(),
            last_name: lead.last_name.clone(),
            email: lead.email.clone(),
            job_title: lead.job_title.clone(),
            country_code: lead.country_code.clone(),
            company_name: lead.company_name.clone(),
            gender: lead.gender.clone(),
            message: None,
            email_verified: None,
            created_at: now,
            updated_at: now,
        };
        leads.push(created.clone());
        created
    }

    fn update(&self, id: LeadId, apply: impl FnOnce(&mut Lead)) -> Result<()> {
        if self.fail_update_for == Some(id) {
            return Err(LeadkitError::Storage("database is locked".into()));
        }
        let mut leads = self.leads.lock().unwrap();
        let lead = leads
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| LeadkitError::NotFound(format!("lead {id}")))?;
        apply(lead);
        Ok(())
    }
}

impl LeadStore for FakeStore {
    async fn find_by_name_pairs(&self, pairs: &[(String, String)]) -> Result<Vec<Lead>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookup {
            return Err(LeadkitError::Storage("connection refused".into()));
        }
        let wanted: Vec<(String, String)> = pairs
            .iter()
            .map(|(f, l)| (f.trim().to_lowercase(), l.trim().to_lowercase()))
            .collect();
        Ok(self
            .leads()
            .into_iter()
            .filter(|lead| {
                wanted.contains(&(lead.first_name.to_lowercase(), lead.last_name.to_lowercase()))
            })
            .collect())
    }

    async fn create(&self, lead: &NewLead) -> Result<Lead> {
        if self.fail_create_for.as_deref() == Some(lead.first_name.as_str()) {
            return Err(LeadkitError::Storage("UNIQUE constraint failed".into()));
        }
        Ok(self.insert(lead))
    }

    async fn find_by_ids(&self, ids: &[LeadId]) -> Result<Vec<Lead>> {
        Ok(self
            .leads()
            .into_iter()
            .filter(|l| ids.contains(&l.id))
            .collect())
    }

    async fn update_gender(&self, id: LeadId, gender: &str) -> Result<()> {
        self.update(id, |l| l.gender = Some(gender.to_string()))
    }

    async fn update_message(&self, id: LeadId, message: &str) -> Result<()> {
        self.update(id, |l| l.message = Some(message.to_string()))
    }

    async fn update_email_verified(&self, id: LeadId, verified: bool) -> Result<()> {
        self.update(id, |l| l.email_verified = Some(verified))
    }
}

/// Answers from a fixed first-name table; names mapped to `Err` fail.
#[derive(Default)]
pub struct FakeLookup {
    answers: HashMap<String, std::result::Result<Option<String>, String>>,
}

impl FakeLookup {
    pub fn answer(mut self, name: &str, gender: Option<&str>) -> Self {
        self.answers
            .insert(name.into(), Ok(gender.map(String::from)));
        self
    }

    pub fn fail(mut self, name: &str, message: &str) -> Self {
        self.answers.insert(name.into(), Err(message.into()));
        self
    }
}

impl GenderLookup for FakeLookup {
    async fn lookup(&self, first_name: &str) -> Result<Option<String>> {
        match self.answers.get(first_name) {
            Some(Ok(answer)) => Ok(answer.clone()),
            Some(Err(message)) => Err(LeadkitError::Lookup(message.clone())),
            None => Ok(None),
        }
    }
}

/// Verifies emails ending in `@valid.test`; fails for listed addresses.
#[derive(Default)]
pub struct FakeVerifier {
    failing: Vec<String>,
    calls: Mutex<Vec<(LeadId, String)>>,
}

impl FakeVerifier {
    pub fn failing_for(mut self, email: &str) -> Self {
        self.failing.push(email.into());
        self
    }

    pub fn calls(&self) -> Vec<(LeadId, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl EmailVerifier for FakeVerifier {
    async fn verify(&self, lead_id: LeadId, email: &str) -> Result<bool> {
        self.calls.lock().unwrap().push((lead_id, email.to_string()));
        if self.failing.iter().any(|e| e == email) {
            return Err(LeadkitError::Verification("workflow timed out".into()));
        }
        Ok(email.ends_with("@valid.test"))
    }
}
