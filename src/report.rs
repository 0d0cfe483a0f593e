use crate::cloud_provider::{ComputeLister, InventoryError, ManagedLister};
use crate::compute::{fetch_all_compute_instances, ComputeInstance};
use crate::config::Config;
use crate::managed::{fetch_all_managed_instances, ManagedInstance};
use crate::util::format_ids;
use log::info;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::{self, Write};

// -----------------------------------------------------------------------------
// Models
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct UnmanagedReport {
    pub compute: Vec<ComputeInstance>,
    pub managed: Vec<ManagedInstance>,
    /// One entry per unmanaged id, sorted by id.
    pub unmanaged: Vec<ComputeInstance>,
}

impl UnmanagedReport {
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for instance in &self.unmanaged {
            writeln!(
                out,
                "{}\t{}\t{}\t{}",
                instance.instance_id,
                instance.state.as_deref().unwrap_or("-"),
                instance.instance_type.as_deref().unwrap_or("-"),
                instance.availability_zone.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Functions
// -----------------------------------------------------------------------------

/// `compute - managed` over de-duplicated ids.
pub fn unmanaged_ids<'a, C, M>(compute_ids: C, managed_ids: M) -> BTreeSet<String>
where
    C: IntoIterator<Item = &'a str>,
    M: IntoIterator<Item = &'a str>,
{
    let managed: HashSet<&str> = managed_ids.into_iter().collect();
    compute_ids
        .into_iter()
        .filter(|id| !managed.contains(id))
        .map(str::to_string)
        .collect()
}

/// Keeps the first record seen for each unmanaged id.
pub fn unmanaged_instances(
    compute: &[ComputeInstance],
    managed: &[ManagedInstance],
) -> Vec<ComputeInstance> {
    let ids = unmanaged_ids(
        compute.iter().map(|instance| instance.instance_id.as_str()),
        managed.iter().map(|instance| instance.instance_id.as_str()),
    );

    let mut unmanaged = BTreeMap::new();
    for instance in compute.iter().filter(|i| ids.contains(&i.instance_id)) {
        unmanaged
            .entry(instance.instance_id.as_str())
            .or_insert(instance);
    }

    unmanaged.into_values().cloned().collect()
}

pub async fn find_unmanaged_instances<C, M>(
    ec2: &C,
    ssm: &M,
    config: &Config,
) -> Result<UnmanagedReport, InventoryError>
where
    C: ComputeLister + ?Sized,
    M: ManagedLister + ?Sized,
{
    let compute = fetch_all_compute_instances(ec2, &config.compute).await?;
    info!(
        "All instance ids: {}",
        format_ids(compute.iter().map(|i| i.instance_id.as_str()))
    );

    let managed = fetch_all_managed_instances(ssm, &config.managed).await?;
    info!(
        "SSM managed instances: {}",
        format_ids(managed.iter().map(|i| i.instance_id.as_str()))
    );

    let unmanaged = unmanaged_instances(&compute, &managed);
    info!(
        "Instances not managed by SSM: {}",
        format_ids(unmanaged.iter().map(|i| i.instance_id.as_str()))
    );

    Ok(UnmanagedReport {
        compute,
        managed,
        unmanaged,
    })
}

// -----------------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------------
