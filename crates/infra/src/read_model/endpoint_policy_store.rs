use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, SecondsFormat, Utc};

use authhub_auth::{EndpointPolicyList, EndpointPolicySpec, HttpMethod};

/// Per-service endpoint policy read model.
///
/// Every mutation of a service's list stamps a new version that is strictly
/// greater than the previous one for that service.
pub trait EndpointPolicyStore: Send + Sync {
    /// Current snapshot. Unknown or blank service names yield an empty list.
    fn list_for_service(&self, service_name: &str) -> EndpointPolicyList;
    /// Insert, or replace the entry with the same method and pattern. Returns the new version.
    fn upsert(&self, spec: EndpointPolicySpec) -> String;
    /// Remove one entry. Returns the new version, or `None` if nothing matched.
    fn remove(&self, service_name: &str, method: HttpMethod, path_pattern: &str) -> Option<String>;
    /// Replace a service's whole list (bulk sync). Returns the new version.
    fn replace_service(&self, service_name: &str, specs: Vec<EndpointPolicySpec>) -> String;
}

impl<S> EndpointPolicyStore for Arc<S>
where
    S: EndpointPolicyStore + ?Sized,
{
    fn list_for_service(&self, service_name: &str) -> EndpointPolicyList {
        (**self).list_for_service(service_name)
    }

    fn upsert(&self, spec: EndpointPolicySpec) -> String {
        (**self).upsert(spec)
    }

    fn remove(&self, service_name: &str, method: HttpMethod, path_pattern: &str) -> Option<String> {
        (**self).remove(service_name, method, path_pattern)
    }

    fn replace_service(&self, service_name: &str, specs: Vec<EndpointPolicySpec>) -> String {
        (**self).replace_service(service_name, specs)
    }
}

#[derive(Debug)]
struct ServiceEntry {
    version: DateTime<Utc>,
    endpoints: Vec<EndpointPolicySpec>,
}

/// In-memory store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryEndpointPolicyStore {
    inner: RwLock<HashMap<String, ServiceEntry>>,
}

impl InMemoryEndpointPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn mutate<R>(
        &self,
        service_name: &str,
        f: impl FnOnce(&mut Vec<EndpointPolicySpec>) -> Option<R>,
    ) -> Option<(R, String)> {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let entry = map.entry(service_name.to_string()).or_insert_with(|| ServiceEntry {
            version: DateTime::<Utc>::default(),
            endpoints: Vec::new(),
        });

        let result = f(&mut entry.endpoints)?;
        entry.version = next_version(entry.version, Utc::now());
        let version = format_version(entry.version);
        tracing::debug!(
            service = service_name,
            version = %version,
            endpoints = entry.endpoints.len(),
            "endpoint policies updated"
        );
        Some((result, version))
    }
}

fn next_version(last: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let floor = last + Duration::milliseconds(1);
    if now >= floor { now } else { floor }
}

fn format_version(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl EndpointPolicyStore for InMemoryEndpointPolicyStore {
    fn list_for_service(&self, service_name: &str) -> EndpointPolicyList {
        let service_name = service_name.trim();
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        match map.get(service_name) {
            Some(entry) if !service_name.is_empty() => EndpointPolicyList {
                service_name: service_name.to_string(),
                version: format_version(entry.version),
                endpoints: entry.endpoints.clone(),
            },
            _ => EndpointPolicyList::empty(service_name),
        }
    }

    fn upsert(&self, spec: EndpointPolicySpec) -> String {
        let service_name = spec.service_name.clone();
        let outcome = self.mutate(&service_name, |endpoints| {
            match endpoints.iter_mut().find(|e| e.same_endpoint(&spec)) {
                Some(existing) => *existing = spec,
                None => endpoints.push(spec),
            }
            Some(())
        });
        outcome.map(|(_, version)| version).unwrap_or_default()
    }

    fn remove(&self, service_name: &str, method: HttpMethod, path_pattern: &str) -> Option<String> {
        let service_name = service_name.trim();
        if service_name.is_empty() {
            return None;
        }
        {
            let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            map.get(service_name)?;
        }
        self.mutate(service_name, |endpoints| {
            let before = endpoints.len();
            endpoints.retain(|e| !(e.method == method && e.path_pattern.as_str() == path_pattern));
            (endpoints.len() != before).then_some(())
        })
        .map(|(_, version)| version)
    }

    fn replace_service(&self, service_name: &str, specs: Vec<EndpointPolicySpec>) -> String {
        let service_name = service_name.trim();
        let (specs, foreign): (Vec<EndpointPolicySpec>, Vec<EndpointPolicySpec>) = specs
            .into_iter()
            .partition(|s| s.service_name == service_name);
        for spec in &foreign {
            tracing::warn!(
                service = service_name,
                spec_service = %spec.service_name,
                method = %spec.method,
                path = %spec.path_pattern,
                "dropping endpoint policy addressed to another service"
            );
        }
        self.mutate(service_name, |endpoints| {
            *endpoints = specs;
            Some(())
        })
        .map(|(_, version)| version)
        .unwrap_or_default()
    }
}
