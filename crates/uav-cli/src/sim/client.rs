//! HTTP client for a running UAV policy server.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;

use uav_core::{FlightPlanPolicy, Position, RadioSnapshot, ServiceProfile, UavState};

use super::replay::DecisionSummary;

#[derive(Debug, Serialize)]
struct IndicationBody<'a> {
    uav_id: &'a str,
    position: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    path_position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    slice_id: Option<&'a str>,
    radio_snapshot: &'a RadioSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    service_profile: Option<&'a ServiceProfile>,
}

/// Blocking client for the indication and plan endpoints.
pub struct PolicyClient {
    client: Client,
    base_url: String,
}

impl PolicyClient {
    /// `base_url` without trailing slash, e.g. "http://localhost:5000".
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn health(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .context("Failed to reach policy server")?;
        Ok(response.status().is_success())
    }

    /// Store `plan` for its UAV, replacing any previous one.
    pub fn store_plan(&self, plan: &FlightPlanPolicy) -> Result<()> {
        let response = self
            .client
            .put(format!("{}/v1/plans/{}", self.base_url, plan.uav_id))
            .json(plan)
            .send()
            .context("Failed to store flight plan")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("Plan store rejected plan for {} ({}): {}", plan.uav_id, status, body);
        }
        Ok(())
    }

    /// Send one indication; the server uses its stored plan for the UAV.
    pub fn send_indication(
        &self,
        uav: &UavState,
        radio: &RadioSnapshot,
        service: Option<&ServiceProfile>,
    ) -> Result<DecisionSummary> {
        let body = IndicationBody {
            uav_id: &uav.uav_id,
            position: uav.position,
            path_position: uav.path_position,
            slice_id: uav.slice_id.as_deref(),
            radio_snapshot: radio,
            service_profile: service,
        };

        let response = self
            .client
            .post(format!("{}/e2/indication", self.base_url))
            .json(&body)
            .send()
            .context("Failed to send indication")?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            bail!("Indication for {} rejected ({}): {}", uav.uav_id, status, body);
        }
        response
            .json::<DecisionSummary>()
            .context("Failed to parse decision response")
    }
}
