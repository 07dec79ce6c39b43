//! In-memory backends for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Notify;

use hr_feedback_core::{AdminId, AdminIdentity, Email, ResourceId};

use crate::api::ApiError;
use crate::auth::AuthBackend;
use crate::resources::{Resource, ResourceBackend};

fn unreachable_backend() -> ApiError {
    ApiError::Network("connection refused".to_owned())
}

/// Fake `HRAdmin` endpoints.
#[derive(Default)]
pub struct FakeAuthBackend {
    accounts: Mutex<HashMap<String, (AdminId, String)>>,
    silent: AtomicBool,
    calls: AtomicUsize,
}

impl FakeAuthBackend {
    /// Fail every request without a backend message.
    pub fn fail_silently(&self) {
        self.silent.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.silent.load(Ordering::SeqCst) {
            return Err(unreachable_backend());
        }
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for FakeAuthBackend {
    async fn register(&self, email: &Email, password: &SecretString) -> Result<AdminId, ApiError> {
        self.begin()?;
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email.as_str()) {
            return Err(ApiError::Backend(
                "An account with this email already exists.".to_owned(),
            ));
        }
        let id = AdminId::new(format!("admin{}", accounts.len() + 1));
        accounts.insert(
            email.as_str().to_owned(),
            (id.clone(), password.expose_secret().to_owned()),
        );
        Ok(id)
    }

    async fn authenticate(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AdminId, ApiError> {
        self.begin()?;
        let accounts = self.accounts.lock().unwrap();
        match accounts.get(email.as_str()) {
            Some((id, stored)) if stored == password.expose_secret() => Ok(id.clone()),
            _ => Err(ApiError::Status {
                status: 401,
                message: Some("Incorrect password for this account.".to_owned()),
            }),
        }
    }

    async fn fetch_admin(&self, id: &AdminId) -> Result<AdminIdentity, ApiError> {
        self.begin()?;
        let accounts = self.accounts.lock().unwrap();
        accounts
            .iter()
            .find(|(_, (known, _))| known == id)
            .map(|(email, _)| AdminIdentity::new(id.clone(), Email::parse(email).unwrap()))
            .ok_or_else(|| ApiError::Backend("HR admin not found".to_owned()))
    }
}

/// Fake resource endpoints holding records per owner.
pub struct FakeBackend<R> {
    records: Mutex<HashMap<AdminId, Vec<R>>>,
    next_id: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    list_gate: Mutex<Option<Arc<Notify>>>,
    create_gate: Mutex<Option<Arc<Notify>>>,
    update_gate: Mutex<Option<Arc<Notify>>>,
    list_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

impl<R: Resource> FakeBackend<R> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            list_gate: Mutex::new(None),
            create_gate: Mutex::new(None),
            update_gate: Mutex::new(None),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_records(owner: &AdminId, records: Vec<R>) -> Self {
        let backend = Self::new();
        backend.records.lock().unwrap().insert(owner.clone(), records);
        backend
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Hold every following `list` call until the returned handle is notified.
    pub fn gate_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Hold every following `create` call until the returned handle is notified.
    pub fn gate_create(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.create_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Hold every following `update` call until the returned handle is notified.
    pub fn gate_update(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.update_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn records(&self, owner: &AdminId) -> Vec<R> {
        self.records
            .lock()
            .unwrap()
            .get(owner)
            .cloned()
            .unwrap_or_default()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn check_writes(&self) -> Result<(), ApiError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unreachable_backend());
        }
        Ok(())
    }
}

#[async_trait]
impl<R: Resource> ResourceBackend<R> for FakeBackend<R> {
    async fn list(&self, owner: &AdminId) -> Result<Vec<R>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.list_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unreachable_backend());
        }
        Ok(self.records(owner))
    }

    async fn create(&self, owner: &AdminId, record: &R) -> Result<ResourceId, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.create_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check_writes()?;
        let id = ResourceId::new(format!("id{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        let mut stored = record.clone();
        stored.set_id(id.clone());
        self.records
            .lock()
            .unwrap()
            .entry(owner.clone())
            .or_default()
            .push(stored);
        Ok(id)
    }

    async fn update(&self, record: &R) -> Result<(), ApiError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.update_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check_writes()?;
        let mut all = self.records.lock().unwrap();
        for slot in all.values_mut().flatten() {
            if slot.id() == record.id() {
                *slot = record.clone();
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &ResourceId) -> Result<(), ApiError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writes()?;
        let mut all = self.records.lock().unwrap();
        for records in all.values_mut() {
            records.retain(|r| r.id() != Some(id));
        }
        Ok(())
    }
}
