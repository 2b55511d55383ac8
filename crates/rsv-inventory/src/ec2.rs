//! AWS EC2 inventory source.
//!
//! Uses the official aws-sdk-ec2 crate. Credentials and region follow the
//! standard SDK chain (env vars, shared config/credentials files, IMDS);
//! region and profile can be pinned explicitly.

use aws_config::{BehaviorVersion, Region};
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::Filter;
use chrono::Utc;
use rsv_reconcile::{
    RawInstance, RawInventory, RawReservation, ACTIVE_RESERVATION_STATE, RUNNING_INSTANCE_STATE,
};
use tracing::{debug, info};

use crate::{InventorySource, SourceError};

/// Inventory source backed by the EC2 DescribeInstances and
/// DescribeReservedInstances APIs.
#[derive(Debug, Clone)]
pub struct Ec2InventorySource {
    client: aws_sdk_ec2::Client,
    region: String,
}

impl Ec2InventorySource {
    /// Build a client from the SDK environment, overriding region/profile
    /// when given.
    ///
    /// Fails if no region can be resolved from either the override or the
    /// SDK chain.
    pub async fn connect(
        region: Option<&str>,
        profile: Option<&str>,
    ) -> Result<Self, SourceError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;

        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .ok_or_else(|| {
                SourceError::Config(
                    "no AWS region configured (set AWS_REGION, a profile region, or --region)"
                        .to_string(),
                )
            })?;

        info!(
            region = %region,
            profile = ?profile,
            "EC2 inventory source initialized"
        );

        Ok(Self {
            client: aws_sdk_ec2::Client::new(&sdk_config),
            region,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    async fn fetch_instances(&self) -> Result<Vec<RawInstance>, SourceError> {
        let mut out: Vec<RawInstance> = Vec::new();

        let mut pages = self
            .client
            .describe_instances()
            .filters(
                Filter::builder()
                    .name("instance-state-name")
                    .values(RUNNING_INSTANCE_STATE)
                    .build(),
            )
            .into_paginator()
            .send();

        let mut page_count = 0usize;
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| api_error("DescribeInstances", e))?;
            page_count += 1;

            for reservation in page.reservations() {
                for inst in reservation.instances() {
                    out.push(RawInstance {
                        instance_type: inst
                            .instance_type()
                            .map(|t| t.as_str().to_string())
                            .unwrap_or_default(),
                        availability_zone: inst
                            .placement()
                            .and_then(|p| p.availability_zone())
                            .unwrap_or_default()
                            .to_string(),
                        state: inst
                            .state()
                            .and_then(|s| s.name())
                            .map(|n| n.as_str().to_string()),
                    });
                }
            }
        }

        debug!(pages = page_count, instances = out.len(), "DescribeInstances done");
        Ok(out)
    }

    async fn fetch_reservations(&self) -> Result<Vec<RawReservation>, SourceError> {
        let resp = self
            .client
            .describe_reserved_instances()
            .filters(
                Filter::builder()
                    .name("state")
                    .values(ACTIVE_RESERVATION_STATE)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| api_error("DescribeReservedInstances", e))?;

        let out: Vec<RawReservation> = resp
            .reserved_instances()
            .iter()
            .map(|ri| RawReservation {
                scope: ri.scope().map(|s| s.as_str().to_string()).unwrap_or_default(),
                instance_type: ri
                    .instance_type()
                    .map(|t| t.as_str().to_string())
                    .unwrap_or_default(),
                availability_zone: ri.availability_zone().map(str::to_string),
                instance_count: i64::from(ri.instance_count().unwrap_or(0)),
                state: ri.state().map(|s| s.as_str().to_string()),
            })
            .collect();

        debug!(reservations = out.len(), "DescribeReservedInstances done");
        Ok(out)
    }
}

#[async_trait::async_trait]
impl InventorySource for Ec2InventorySource {
    fn source_name(&self) -> &'static str {
        "ec2"
    }

    async fn fetch(&self) -> Result<RawInventory, SourceError> {
        let (instances, reservations) =
            tokio::try_join!(self.fetch_instances(), self.fetch_reservations())?;

        info!(
            region = %self.region,
            instances = instances.len(),
            reservations = reservations.len(),
            "EC2 inventory fetched"
        );

        Ok(RawInventory {
            captured_at_utc: Some(Utc::now()),
            region: Some(self.region.clone()),
            instances,
            reservations,
        })
    }
}

fn api_error<E>(operation: &'static str, err: E) -> SourceError
where
    E: std::error::Error,
{
    SourceError::Api {
        operation,
        message: DisplayErrorContext(err).to_string(),
    }
}
