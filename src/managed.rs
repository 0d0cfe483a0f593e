use crate::cloud_provider::{InventoryError, ManagedLister};
use crate::util::continuation_token;
use log::{debug, info, warn};
use rusoto_ssm::{
    DescribeInstanceInformationRequest, DescribeInstanceInformationResult, InstanceInformation,
};

const ONLINE: &str = "Online";

// -----------------------------------------------------------------------------
// Models
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedInstance {
    pub instance_id: String,
    pub ping_status: Option<String>,
    pub platform_type: Option<String>,
}

impl ManagedInstance {
    pub fn from_sdk(information: InstanceInformation) -> Result<Self, InventoryError> {
        let instance_id = information
            .instance_id
            .filter(|id| !id.is_empty())
            .ok_or(InventoryError::MissingField {
                record: "SSM instance information",
                field: "InstanceId",
            })?;

        Ok(ManagedInstance {
            instance_id,
            ping_status: information.ping_status,
            platform_type: information.platform_type,
        })
    }

    pub fn is_online(&self) -> bool {
        self.ping_status.as_deref() == Some(ONLINE)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagedFetchOptions {
    pub page_size: Option<i64>,
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

pub fn describe_instance_information_request(
    options: &ManagedFetchOptions,
    next_token: Option<String>,
) -> DescribeInstanceInformationRequest {
    DescribeInstanceInformationRequest {
        max_results: options.page_size,
        next_token,
        ..Default::default()
    }
}

pub fn extract_managed_instances(
    response: DescribeInstanceInformationResult,
) -> Result<Vec<ManagedInstance>, InventoryError> {
    response
        .instance_information_list
        .unwrap_or_default()
        .into_iter()
        .map(ManagedInstance::from_sdk)
        .collect()
}

pub async fn fetch_all_managed_instances<L>(
    lister: &L,
    options: &ManagedFetchOptions,
) -> Result<Vec<ManagedInstance>, InventoryError>
where
    L: ManagedLister + ?Sized,
{
    info!("++ fetch_all_managed_instances");

    let mut instances = Vec::new();
    let mut next_token = None;
    let mut page = 0;

    loop {
        let request = describe_instance_information_request(options, next_token.take());
        let mut response = lister.list_managed_page(request).await?;
        page += 1;

        next_token = continuation_token(response.next_token.take());
        let batch = extract_managed_instances(response)?;
        debug!("SSM page {}: {} instances", page, batch.len());
        instances.extend(batch);

        if next_token.is_none() {
            break;
        }
    }

    // Registered agents count as managed whatever their ping status.
    for instance in instances.iter().filter(|instance| !instance.is_online()) {
        warn!(
            "{} ({}) is registered with SSM but its agent is {}",
            instance.instance_id,
            instance.platform_type.as_deref().unwrap_or("unknown platform"),
            instance.ping_status.as_deref().unwrap_or("in an unknown state")
        );
    }

    info!(
        "-- fetch_all_managed_instances ({} instances over {} pages)",
        instances.len(),
        page
    );
    Ok(instances)
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{ssm_page, MockPages};

    fn instance_ids(instances: &[ManagedInstance]) -> Vec<&str> {
        instances.iter().map(|i| i.instance_id.as_str()).collect()
    }

    #[test]
    fn test_extract_keeps_order_and_ids() {
        let page = ssm_page(vec!["i-2", "mi-0a1", "i-7"]);

        let instances = extract_managed_instances(page).unwrap();

        assert_eq!(instance_ids(&instances), vec!["i-2", "mi-0a1", "i-7"]);
    }

    #[test]
    fn test_extract_empty_response() {
        let instances =
            extract_managed_instances(DescribeInstanceInformationResult::default()).unwrap();

        assert!(instances.is_empty());
    }

    #[test]
    fn test_missing_instance_id_fails_loudly() {
        let mut page = ssm_page(vec!["i-1"]);
        if let Some(list) = page.instance_information_list.as_mut() {
            list.push(InstanceInformation::default());
        }

        let err = extract_managed_instances(page).unwrap_err();
        assert!(matches!(
            err,
            InventoryError::MissingField {
                record: "SSM instance information",
                ..
            }
        ));
    }

    #[test]
    fn test_ping_status() {
        let online = ManagedInstance {
            instance_id: "i-1".to_string(),
            ping_status: Some("Online".to_string()),
            platform_type: Some("Linux".to_string()),
        };
        let lost = ManagedInstance {
            ping_status: Some("ConnectionLost".to_string()),
            ..online.clone()
        };

        assert!(online.is_online());
        assert!(!lost.is_online());
    }

    #[tokio::test]
    async fn test_fetch_follows_every_page() {
        let lister = MockPages::new(vec![
            ssm_page(vec!["i-1", "i-2"]),
            ssm_page(vec![]),
            ssm_page(vec!["i-3"]),
        ]);

        let instances = fetch_all_managed_instances(&lister, &ManagedFetchOptions::default())
            .await
            .unwrap();
        let ids = instance_ids(&instances);

        assert_eq!(ids, vec!["i-1", "i-2", "i-3"]);
        assert_eq!(lister.tokens_seen().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_sends_page_size() {
        let lister = MockPages::new(vec![ssm_page(vec!["i-1"])]);
        let options = ManagedFetchOptions {
            page_size: Some(50),
        };

        fetch_all_managed_instances(&lister, &options).await.unwrap();

        assert_eq!(lister.requests()[0].max_results, Some(50));
    }

    #[tokio::test]
    async fn test_fetch_error_aborts() {
        let lister = MockPages::new(vec![ssm_page(vec!["i-1"])]).failing_at(0);

        let result = fetch_all_managed_instances(&lister, &ManagedFetchOptions::default()).await;

        assert!(matches!(
            result,
            Err(InventoryError::DescribeInstanceInformation(_))
        ));
    }
}
