//! Auto scaling groups.
use std::collections::BTreeMap;

use serde_json::{json, Value};
use snafu::prelude::*;

use crate::{
    self as pangea,
    schema::enumerated,
    validators::{arn, each, max_length, non_empty, Consistency},
    Attributes, Outputs, Resource, Result, SerializeSnafu,
};

enumerated! {
    pub enum HealthCheckType {
        Ec2 => "EC2",
        Elb => "ELB",
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LaunchTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AutoscalingGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
    pub min_size: u32,
    pub max_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_template: Option<LaunchTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_configuration: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vpc_zone_identifier: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub availability_zones: Vec<String>,
    pub health_check_type: HealthCheckType,
    pub health_check_grace_period: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_group_arns: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Outputs)]
pub struct AutoscalingGroupOutputs {
    pub id: String,
    pub arn: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AutoscalingGroupComputed {
    /// `desired_capacity`, or `min_size` when it is not set.
    pub effective_desired_capacity: u32,
    pub is_fixed_size: bool,
    pub uses_load_balancer: bool,
}

impl Resource for AutoscalingGroup {
    const TYPE: &'static str = "aws_autoscaling_group";

    type Outputs = AutoscalingGroupOutputs;
    type Computed = AutoscalingGroupComputed;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(AutoscalingGroup {
            name: attrs.optional_with("name", max_length(255))?,
            name_prefix: attrs.optional_with("name_prefix", max_length(229))?,
            min_size: attrs.required("min_size")?,
            max_size: attrs.required("max_size")?,
            desired_capacity: attrs.optional("desired_capacity")?,
            launch_template: attrs.nested_with("launch_template", |template| {
                Ok(LaunchTemplate {
                    id: template.optional_with("id", non_empty())?,
                    name: template.optional_with("name", non_empty())?,
                    version: template.or_default("version", "$Latest".to_owned())?,
                })
            })?,
            launch_configuration: attrs.optional_with("launch_configuration", non_empty())?,
            vpc_zone_identifier: attrs.or_default("vpc_zone_identifier", vec![])?,
            availability_zones: attrs.or_default("availability_zones", vec![])?,
            health_check_type: attrs.or_default("health_check_type", HealthCheckType::Ec2)?,
            health_check_grace_period: attrs.or_default("health_check_grace_period", 300)?,
            target_group_arns: attrs.or_default_with(
                "target_group_arns",
                vec![],
                each(arn("elasticloadbalancing")),
            )?,
            tags: attrs.tags()?,
        })
    }

    fn validate(&self) -> Result<()> {
        let check = Consistency::of(Self::TYPE, self)?;
        check.at_most_one_of(&[
            ("name", self.name.is_some()),
            ("name_prefix", self.name_prefix.is_some()),
        ])?;
        check.ordered(("min_size", self.min_size), ("max_size", self.max_size))?;
        if let Some(desired) = self.desired_capacity {
            check.ordered(("min_size", self.min_size), ("desired_capacity", desired))?;
            check.ordered(("desired_capacity", desired), ("max_size", self.max_size))?;
        }
        check.exactly_one_of(&[
            ("launch_template", self.launch_template.is_some()),
            ("launch_configuration", self.launch_configuration.is_some()),
        ])?;
        if let Some(template) = &self.launch_template {
            check.exactly_one_of(&[
                ("launch_template.id", template.id.is_some()),
                ("launch_template.name", template.name.is_some()),
            ])?;
        }
        check.ensure(
            !self.vpc_zone_identifier.is_empty() || !self.availability_zones.is_empty(),
            &["vpc_zone_identifier", "availability_zones"],
            "at least one of vpc_zone_identifier or availability_zones must be set",
        )?;
        check.ensure(
            self.health_check_type == HealthCheckType::Ec2 || !self.target_group_arns.is_empty(),
            &["health_check_type", "target_group_arns"],
            "ELB health checks require target_group_arns",
        )
    }

    fn computed(&self) -> AutoscalingGroupComputed {
        let effective_desired_capacity = self.desired_capacity.unwrap_or(self.min_size);
        AutoscalingGroupComputed {
            effective_desired_capacity,
            is_fixed_size: self.min_size == self.max_size,
            uses_load_balancer: !self.target_group_arns.is_empty(),
        }
    }

    /// Renders tags as the `tag` blocks Terraform expects for this type,
    /// propagated to launched instances.
    fn block(&self) -> Result<Value> {
        let mut block = serde_json::to_value(self).context(SerializeSnafu { name: Self::TYPE })?;
        if let Some(object) = block.as_object_mut() {
            if let Some(Value::Object(tags)) = object.remove("tags") {
                let tag: Vec<Value> = tags
                    .into_iter()
                    .map(|(key, value)| {
                        json!({ "key": key, "value": value, "propagate_at_launch": true })
                    })
                    .collect();
                object.insert("tag".to_owned(), Value::Array(tag));
            }
        }
        Ok(block)
    }
}
