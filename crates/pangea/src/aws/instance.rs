//! EC2 instances.
use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;

use crate::{
    self as pangea,
    cost,
    schema::enumerated,
    validators::{in_range, matches, non_empty, Consistency},
    Attributes, Outputs, Resource, Result,
};

static AMI_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ami-[0-9a-f]{8,17}$").unwrap());
static INSTANCE_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*\.[a-z0-9]+$").unwrap());

enumerated! {
    pub enum VolumeType {
        Gp2 => "gp2",
        Gp3 => "gp3",
        Io1 => "io1",
        Io2 => "io2",
        St1 => "st1",
        Sc1 => "sc1",
    }
}

impl VolumeType {
    pub fn supports_iops(&self) -> bool {
        matches!(self, VolumeType::Gp3 | VolumeType::Io1 | VolumeType::Io2)
    }

    pub fn requires_iops(&self) -> bool {
        matches!(self, VolumeType::Io1 | VolumeType::Io2)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RootBlockDevice {
    pub volume_size: u32,
    pub volume_type: VolumeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iops: Option<u32>,
    pub encrypted: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Instance {
    pub ami: String,
    pub instance_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    pub associate_public_ip_address: bool,
    pub ebs_optimized: bool,
    pub monitoring: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_block_device: Option<RootBlockDevice>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Outputs)]
pub struct InstanceOutputs {
    pub id: String,
    pub arn: String,
    pub private_ip: String,
    pub public_ip: String,
    pub primary_network_interface_id: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct InstanceComputed {
    /// The part of the instance type before the dot, eg `t3`.
    pub instance_family: String,
    pub uses_encryption: bool,
    /// Instance hours plus root volume storage.
    pub estimated_monthly_cost: f64,
}

impl Resource for Instance {
    const TYPE: &'static str = "aws_instance";

    type Outputs = InstanceOutputs;
    type Computed = InstanceComputed;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(Instance {
            ami: attrs.required_with("ami", matches("an AMI id such as ami-0abcdef1", &AMI_ID))?,
            instance_type: attrs.required_with(
                "instance_type",
                matches("an instance type such as t3.micro", &INSTANCE_TYPE),
            )?,
            subnet_id: attrs.optional_with("subnet_id", non_empty())?,
            associate_public_ip_address: attrs.or_default("associate_public_ip_address", false)?,
            ebs_optimized: attrs.or_default("ebs_optimized", false)?,
            monitoring: attrs.or_default("monitoring", false)?,
            root_block_device: attrs.nested_with("root_block_device", |device| {
                Ok(RootBlockDevice {
                    volume_size: device.or_default_with("volume_size", 8, in_range(8, 16384))?,
                    volume_type: device.or_default("volume_type", VolumeType::Gp3)?,
                    iops: device.optional_with("iops", in_range(100, 256000))?,
                    encrypted: device.or_default("encrypted", false)?,
                })
            })?,
            tags: attrs.tags()?,
        })
    }

    fn validate(&self) -> Result<()> {
        let Some(device) = &self.root_block_device else {
            return Ok(());
        };
        let check = Consistency::of(Self::TYPE, self)?;
        let has_iops = device.iops.is_some();
        check.ensure(
            !has_iops || device.volume_type.supports_iops(),
            &["root_block_device.volume_type", "root_block_device.iops"],
            format!("{} volumes do not take iops", device.volume_type),
        )?;
        check.ensure(
            has_iops || !device.volume_type.requires_iops(),
            &["root_block_device.volume_type", "root_block_device.iops"],
            format!("{} volumes require iops", device.volume_type),
        )
    }

    fn computed(&self) -> InstanceComputed {
        let storage = self.root_block_device.as_ref().map_or(0.0, |device| {
            cost::ebs_gb_month(device.volume_type.as_str()) * f64::from(device.volume_size)
        });
        InstanceComputed {
            instance_family: self
                .instance_type
                .split_once('.')
                .map_or(self.instance_type.as_str(), |(family, _)| family)
                .to_owned(),
            uses_encryption: self
                .root_block_device
                .as_ref()
                .is_some_and(|device| device.encrypted),
            estimated_monthly_cost: cost::round_cents(
                cost::monthly(cost::instance_hourly(&self.instance_type), 1) + storage,
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn web_server() {
        let instance = Instance::from_input(&json!({
            "ami": "ami-0abcdef1234567890",
            "instance_type": "t3.micro",
            "root_block_device": { "volume_size": 20, "encrypted": true },
        }))
        .unwrap();
        assert_eq!(
            VolumeType::Gp3,
            instance.root_block_device.as_ref().unwrap().volume_type
        );
        let computed = instance.computed();
        assert_eq!("t3", computed.instance_family);
        assert!(computed.uses_encryption);
        // 0.0104 * 730 + 20 * 0.08
        assert_eq!(9.19, computed.estimated_monthly_cost);
    }

    #[test]
    fn bad_ami() {
        let err = Instance::from_input(&json!({ "ami": "ubuntu", "instance_type": "t3.micro" }))
            .unwrap_err();
        assert_eq!(vec!["ami"], err.fields());
    }

    #[test]
    fn provisioned_iops() {
        let err = Instance::from_input(&json!({
            "ami": "ami-0abcdef1",
            "instance_type": "m5.large",
            "root_block_device": { "volume_type": "io2" },
        }))
        .unwrap_err();
        assert_eq!(Some("io2 volumes require iops".to_owned()), err.rule());

        let err = Instance::from_input(&json!({
            "ami": "ami-0abcdef1",
            "instance_type": "m5.large",
            "root_block_device": { "volume_type": "gp2", "iops": 3000 },
        }))
        .unwrap_err();
        assert_eq!(Some("gp2 volumes do not take iops".to_owned()), err.rule());
    }
}
