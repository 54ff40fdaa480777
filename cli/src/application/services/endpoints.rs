//! Application service: collect the public URLs of a deployment.

use anyhow::Result;
use serde::Serialize;

use crate::application::ports::PlatformInspector;
use crate::domain::{Manifest, ProjectHandle, ResourceKind};

/// A URL exposed by a service or load balancer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub kind: ResourceKind,
    pub name: String,
    pub url: String,
}

/// Re-read every declared service and load balancer and return those that
/// currently expose a URL, services first, in manifest order.
///
/// # Errors
///
/// Returns an error if a platform query fails or its output cannot be decoded.
pub async fn collect_endpoints(
    platform: &impl PlatformInspector,
    project: &ProjectHandle,
    manifest: &Manifest,
) -> Result<Vec<Endpoint>> {
    let mut endpoints = Vec::new();

    for spec in &manifest.services {
        if let Some(url) = platform
            .service(project, &spec.name)
            .await?
            .and_then(|s| s.url)
        {
            endpoints.push(Endpoint {
                kind: ResourceKind::Service,
                name: spec.name.clone(),
                url,
            });
        }
    }

    if !manifest.load_balancers.is_empty() {
        let observed = platform.load_balancers(project).await?;
        for spec in &manifest.load_balancers {
            if let Some(url) = observed
                .iter()
                .find(|lb| lb.name == spec.name)
                .and_then(|lb| lb.url.clone())
            {
                endpoints.push(Endpoint {
                    kind: ResourceKind::LoadBalancer,
                    name: spec.name.clone(),
                    url,
                });
            }
        }
    }

    Ok(endpoints)
}
