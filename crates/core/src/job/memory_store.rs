use std::collections::HashMap;
use std::sync::Mutex;

use super::store::{JobFilter, JobStore, JobStoreError};
use super::types::{Job, JobId};

/// Job store kept in a map. Used by tests and by runs without a database.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobStore for InMemoryJobStore {
    fn save(&self, job: &Job) -> Result<(), JobStoreError> {
        self.jobs.lock().unwrap().insert(job.id, job.clone());
        Ok(())
    }

    fn get(&self, id: &JobId) -> Result<Option<Job>, JobStoreError> {
        Ok(self.jobs.lock().unwrap().get(id).cloned())
    }

    fn list(&self, filter: &JobFilter) -> Result<Vec<Job>, JobStoreError> {
        let jobs = self.jobs.lock().unwrap();
        let mut matching: Vec<Job> = jobs.values().filter(|j| filter.matches(j)).cloned().collect();
        matching.sort_by_key(|j| j.created_at);
        matching.truncate(filter.limit.max(0) as usize);
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobRequest, JobStatus};

    #[test]
    fn test_save_is_upsert() {
        let store = InMemoryJobStore::new();
        let mut job = Job::new(JobRequest::new("a"));
        store.save(&job).unwrap();
        job.advance(JobStatus::Fetching).unwrap();
        store.save(&job).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&job.id).unwrap().unwrap().status, JobStatus::Fetching);
    }

    #[test]
    fn test_list_filters_unfinished() {
        let store = InMemoryJobStore::new();
        let queued = Job::new(JobRequest::new("a"));
        let mut cancelled = Job::new(JobRequest::new("b"));
        cancelled.cancel().unwrap();
        store.save(&queued).unwrap();
        store.save(&cancelled).unwrap();

        let unfinished = store.list(&JobFilter::new().unfinished()).unwrap();
        assert_eq!(unfinished.len(), 1);
        assert_eq!(unfinished[0].id, queued.id);
        assert_eq!(store.list(&JobFilter::new()).unwrap().len(), 2);
    }
}
