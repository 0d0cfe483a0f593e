use crate::cloud_provider::InventoryError;
use crate::compute::ComputeFetchOptions;
use crate::managed::ManagedFetchOptions;
use rusoto_signature::Region;
use std::ops::RangeInclusive;

const REGION_KEYS: [&str; 3] = ["UNMANAGED_REGION", "AWS_DEFAULT_REGION", "AWS_REGION"];
const EC2_PAGE_SIZES: RangeInclusive<i64> = 5..=1000;
const SSM_PAGE_SIZES: RangeInclusive<i64> = 5..=50;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub region: Region,
    pub compute: ComputeFetchOptions,
    pub managed: ManagedFetchOptions,
}

impl Config {
    /// Reads the process environment, after `.env` has been loaded.
    pub fn from_env() -> Result<Self, InventoryError> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, InventoryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let region = match REGION_KEYS.iter().find_map(|key| value(*key)) {
            Some(name) => name.parse::<Region>().map_err(|err| {
                InventoryError::Config(format!("unknown region {:?}: {}", name, err))
            })?,
            None => Region::UsEast1,
        };

        let instance_states = value("INSTANCE_STATES")
            .map(|states| {
                states
                    .split(',')
                    .map(str::trim)
                    .filter(|state| !state.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let ec2_page_size =
            parse_page_size("EC2_PAGE_SIZE", value("EC2_PAGE_SIZE"), EC2_PAGE_SIZES)?;
        let ssm_page_size =
            parse_page_size("SSM_PAGE_SIZE", value("SSM_PAGE_SIZE"), SSM_PAGE_SIZES)?;

        Ok(Config {
            region,
            compute: ComputeFetchOptions {
                instance_states,
                page_size: ec2_page_size,
            },
            managed: ManagedFetchOptions {
                page_size: ssm_page_size,
            },
        })
    }
}

fn parse_page_size(
    key: &str,
    value: Option<String>,
    allowed: RangeInclusive<i64>,
) -> Result<Option<i64>, InventoryError> {
    let value = match value {
        Some(value) => value,
        None => return Ok(None),
    };

    let size = value.parse::<i64>().map_err(|_| {
        InventoryError::Config(format!("{} must be a number, got {:?}", key, value))
    })?;

    if !allowed.contains(&size) {
        return Err(InventoryError::Config(format!(
            "{} must be between {} and {}, got {}",
            key,
            allowed.start(),
            allowed.end(),
            size
        )));
    }

    Ok(Some(size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, InventoryError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.region, Region::UsEast1);
        assert!(config.compute.instance_states.is_empty());
        assert_eq!(config.compute.page_size, None);
        assert_eq!(config.managed.page_size, None);
    }

    #[test]
    fn test_region_precedence() {
        let config = config_from(&[("AWS_REGION", "eu-west-1")]).unwrap();
        assert_eq!(config.region, Region::EuWest1);

        let config = config_from(&[
            ("AWS_REGION", "eu-west-1"),
            ("AWS_DEFAULT_REGION", "us-west-2"),
        ])
        .unwrap();
        assert_eq!(config.region, Region::UsWest2);

        let config = config_from(&[
            ("AWS_DEFAULT_REGION", "us-west-2"),
            ("UNMANAGED_REGION", "ap-southeast-2"),
        ])
        .unwrap();
        assert_eq!(config.region, Region::ApSoutheast2);
    }

    #[test]
    fn test_unknown_region_is_rejected() {
        let err = config_from(&[("AWS_REGION", "moon-north-1")]).unwrap_err();

        assert!(matches!(err, InventoryError::Config(_)));
        assert!(err.to_string().contains("moon-north-1"));
    }

    #[test]
    fn test_instance_states_are_split_and_trimmed() {
        let config = config_from(&[("INSTANCE_STATES", " running, stopped ,,")]).unwrap();

        assert_eq!(config.compute.instance_states, vec!["running", "stopped"]);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = config_from(&[("INSTANCE_STATES", "  "), ("EC2_PAGE_SIZE", "")]).unwrap();

        assert!(config.compute.instance_states.is_empty());
        assert_eq!(config.compute.page_size, None);
    }

    #[test]
    fn test_page_sizes() {
        let config = config_from(&[("EC2_PAGE_SIZE", "1000"), ("SSM_PAGE_SIZE", "5")]).unwrap();

        assert_eq!(config.compute.page_size, Some(1000));
        assert_eq!(config.managed.page_size, Some(5));
    }

    #[test]
    fn test_page_size_out_of_range() {
        assert!(config_from(&[("EC2_PAGE_SIZE", "4")]).is_err());
        assert!(config_from(&[("SSM_PAGE_SIZE", "51")]).is_err());
        assert!(config_from(&[("SSM_PAGE_SIZE", "fifty")]).is_err());
    }
}
