use async_trait::async_trait;
use rusoto_core::{HttpClient, RusotoError};
use rusoto_credential::ChainProvider;
use rusoto_ec2::{
    DescribeInstancesError, DescribeInstancesRequest, DescribeInstancesResult, Ec2, Ec2Client,
};
use rusoto_signature::Region;
use rusoto_ssm::{
    DescribeInstanceInformationError, DescribeInstanceInformationRequest,
    DescribeInstanceInformationResult, Ssm, SsmClient,
};
use std::error::Error;
use std::fmt;

// -----------------------------------------------------------------------------
// Errors
// -----------------------------------------------------------------------------

#[derive(Debug)]
pub enum InventoryError {
    HttpClient(String),
    DescribeInstances(RusotoError<DescribeInstancesError>),
    DescribeInstanceInformation(RusotoError<DescribeInstanceInformationError>),
    MissingField {
        record: &'static str,
        field: &'static str,
    },
    Config(String),
}

impl From<RusotoError<DescribeInstancesError>> for InventoryError {
    fn from(err: RusotoError<DescribeInstancesError>) -> Self {
        InventoryError::DescribeInstances(err)
    }
}

impl From<RusotoError<DescribeInstanceInformationError>> for InventoryError {
    fn from(err: RusotoError<DescribeInstanceInformationError>) -> Self {
        InventoryError::DescribeInstanceInformation(err)
    }
}

impl fmt::Display for InventoryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InventoryError::HttpClient(err) => write!(f, "Failed to create HTTP client: {}", err),
            InventoryError::DescribeInstances(err) => {
                write!(f, "Error describing EC2 instances: {}", err)
            }
            InventoryError::DescribeInstanceInformation(err) => {
                write!(f, "Error describing SSM instance information: {}", err)
            }
            InventoryError::MissingField { record, field } => {
                write!(f, "{} record is missing required field {}", record, field)
            }
            InventoryError::Config(err) => write!(f, "Invalid configuration: {}", err),
        }
    }
}

impl Error for InventoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InventoryError::DescribeInstances(err) => Some(err),
            InventoryError::DescribeInstanceInformation(err) => Some(err),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Listers
// -----------------------------------------------------------------------------

/// One page of the EC2 instance inventory.
#[async_trait]
pub trait ComputeLister: Send + Sync {
    async fn list_instances_page(
        &self,
        request: DescribeInstancesRequest,
    ) -> Result<DescribeInstancesResult, InventoryError>;
}

/// One page of the SSM managed-instance inventory.
#[async_trait]
pub trait ManagedLister: Send + Sync {
    async fn list_managed_page(
        &self,
        request: DescribeInstanceInformationRequest,
    ) -> Result<DescribeInstanceInformationResult, InventoryError>;
}

#[async_trait]
impl ComputeLister for Ec2Client {
    async fn list_instances_page(
        &self,
        request: DescribeInstancesRequest,
    ) -> Result<DescribeInstancesResult, InventoryError> {
        let response = Ec2::describe_instances(self, request).await?;
        Ok(response)
    }
}

#[async_trait]
impl ManagedLister for SsmClient {
    async fn list_managed_page(
        &self,
        request: DescribeInstanceInformationRequest,
    ) -> Result<DescribeInstanceInformationResult, InventoryError> {
        let response = Ssm::describe_instance_information(self, request).await?;
        Ok(response)
    }
}

// -----------------------------------------------------------------------------
// Clients
// -----------------------------------------------------------------------------

// Credentials come from the default chain: environment, profile, container,
// then instance metadata.
pub fn ec2_client(region: Region) -> Result<Ec2Client, InventoryError> {
    let http_client =
        HttpClient::new().map_err(|err| InventoryError::HttpClient(format!("{:?}", err)))?;
    Ok(Ec2Client::new_with(http_client, ChainProvider::new(), region))
}

pub fn ssm_client(region: Region) -> Result<SsmClient, InventoryError> {
    let http_client =
        HttpClient::new().map_err(|err| InventoryError::HttpClient(format!("{:?}", err)))?;
    Ok(SsmClient::new_with(http_client, ChainProvider::new(), region))
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
