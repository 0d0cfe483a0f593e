use crate::cloud_provider::{ComputeLister, InventoryError};
use crate::util::continuation_token;
use log::{debug, info};
use rusoto_ec2::{DescribeInstancesRequest, DescribeInstancesResult, Filter, Instance};

// -----------------------------------------------------------------------------
// Models
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeInstance {
    pub instance_id: String,
    pub state: Option<String>,
    pub availability_zone: Option<String>,
    pub instance_type: Option<String>,
}

impl ComputeInstance {
    pub fn from_sdk(instance: Instance) -> Result<Self, InventoryError> {
        let instance_id = instance
            .instance_id
            .filter(|id| !id.is_empty())
            .ok_or(InventoryError::MissingField {
                record: "EC2 instance",
                field: "InstanceId",
            })?;

        Ok(ComputeInstance {
            instance_id,
            state: instance.state.and_then(|state| state.name),
            availability_zone: instance
                .placement
                .and_then(|placement| placement.availability_zone),
            instance_type: instance.instance_type,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputeFetchOptions {
    /// Instance-state names to keep, e.g. `running`. Empty means every state.
    pub instance_states: Vec<String>,
    pub page_size: Option<i64>,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

pub fn describe_instances_request(
    options: &ComputeFetchOptions,
    next_token: Option<String>,
) -> DescribeInstancesRequest {
    let filters = if options.instance_states.is_empty() {
        None
    } else {
        Some(vec![Filter {
            name: Some("instance-state-name".to_string()),
            values: Some(options.instance_states.clone()),
        }])
    };

    DescribeInstancesRequest {
        filters,
        max_results: options.page_size,
        next_token,
        ..Default::default()
    }
}

/// Flattens `Reservations[*].Instances[*]` of one page, keeping response order.
pub fn flatten_reservations(
    response: DescribeInstancesResult,
) -> Result<Vec<ComputeInstance>, InventoryError> {
    response
        .reservations
        .unwrap_or_default()
        .into_iter()
        .flat_map(|reservation| reservation.instances.unwrap_or_default())
        .map(ComputeInstance::from_sdk)
        .collect()
}

pub async fn fetch_all_compute_instances<L>(
    lister: &L,
    options: &ComputeFetchOptions,
) -> Result<Vec<ComputeInstance>, InventoryError>
where
    L: ComputeLister + ?Sized,
{
    info!("++ fetch_all_compute_instances");

    let mut instances = Vec::new();
    let mut next_token = None;
    let mut page = 0;

    loop {
        let request = describe_instances_request(options, next_token.take());
        let mut response = lister.list_instances_page(request).await?;
        page += 1;

        next_token = continuation_token(response.next_token.take());
        let batch = flatten_reservations(response)?;
        debug!("EC2 page {}: {} instances", page, batch.len());
        instances.extend(batch);

        if next_token.is_none() {
            break;
        }
    }

    info!(
        "-- fetch_all_compute_instances ({} instances over {} pages)",
        instances.len(),
        page
    );
    Ok(instances)
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
