//! ElastiCache replication groups (Redis and Valkey).
use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;

use crate::{
    self as pangea,
    cost,
    schema::enumerated,
    validators::{in_range, length, matches, non_empty, Consistency, Constraint},
    Attributes, Outputs, Resource, Result, Rule,
};

static NODE_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^cache\.[a-z0-9]+\.[a-z0-9]+$").unwrap());
static GROUP_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9-]*$").unwrap());

fn replication_group_id() -> impl Constraint<String> {
    |id: &String| {
        let valid = id.len() <= 40
            && GROUP_ID.is_match(id)
            && !id.contains("--")
            && !id.ends_with('-');
        if valid {
            Ok(())
        } else {
            Err(Rule::Pattern {
                description: "at most 40 lowercase letters, digits or hyphens, starting with a \
                              letter, without '--' or a trailing '-'"
                    .to_owned(),
            })
        }
    }
}

enumerated! {
    pub enum Engine {
        Redis => "redis",
        Valkey => "valkey",
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ElasticacheReplicationGroup {
    pub replication_group_id: String,
    pub description: String,
    pub node_type: String,
    pub engine: Engine,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_cache_clusters: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_node_groups: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas_per_node_group: Option<u32>,
    pub automatic_failover_enabled: bool,
    pub multi_az_enabled: bool,
    pub at_rest_encryption_enabled: bool,
    pub transit_encryption_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    pub port: u16,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Outputs)]
pub struct ElasticacheReplicationGroupOutputs {
    pub id: String,
    pub arn: String,
    pub primary_endpoint_address: String,
    pub reader_endpoint_address: String,
    pub configuration_endpoint_address: String,
    pub member_clusters: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ElasticacheReplicationGroupComputed {
    pub total_nodes: u32,
    pub is_cluster_mode: bool,
    pub uses_encryption: bool,
    pub estimated_monthly_cost: f64,
}

impl ElasticacheReplicationGroup {
    /// Node count across all shards and replicas.
    pub fn total_nodes(&self) -> u32 {
        match self.num_cache_clusters {
            Some(clusters) => clusters,
            None => {
                self.num_node_groups.unwrap_or(1)
                    * (1 + self.replicas_per_node_group.unwrap_or(0))
            }
        }
    }

    pub fn is_cluster_mode(&self) -> bool {
        self.num_node_groups.is_some_and(|groups| groups > 1)
    }
}

impl Resource for ElasticacheReplicationGroup {
    const TYPE: &'static str = "aws_elasticache_replication_group";

    type Outputs = ElasticacheReplicationGroupOutputs;
    type Computed = ElasticacheReplicationGroupComputed;

    fn parse(attrs: &mut Attributes<'_>) -> Result<Self> {
        Ok(ElasticacheReplicationGroup {
            replication_group_id: attrs
                .required_with("replication_group_id", replication_group_id())?,
            description: attrs.required_with("description", non_empty())?,
            node_type: attrs.required_with(
                "node_type",
                matches("a node type such as cache.t3.micro", &NODE_TYPE),
            )?,
            engine: attrs.or_default("engine", Engine::Redis)?,
            num_cache_clusters: attrs.optional_with("num_cache_clusters", in_range(1, 6))?,
            num_node_groups: attrs.optional_with("num_node_groups", in_range(1, 500))?,
            replicas_per_node_group: attrs
                .optional_with("replicas_per_node_group", in_range(0, 5))?,
            automatic_failover_enabled: attrs.or_default("automatic_failover_enabled", false)?,
            multi_az_enabled: attrs.or_default("multi_az_enabled", false)?,
            at_rest_encryption_enabled: attrs.or_default("at_rest_encryption_enabled", false)?,
            transit_encryption_enabled: attrs.or_default("transit_encryption_enabled", false)?,
            auth_token: attrs.optional_with("auth_token", length(16, 128))?,
            port: attrs.or_default("port", 6379)?,
            tags: attrs.tags()?,
        })
    }

    fn validate(&self) -> Result<()> {
        let check = Consistency::of(Self::TYPE, self)?;
        let uses_clusters = self.num_cache_clusters.is_some();
        check.forbids(
            ("num_cache_clusters", uses_clusters),
            ("num_node_groups", self.num_node_groups.is_some()),
        )?;
        check.forbids(
            ("num_cache_clusters", uses_clusters),
            (
                "replicas_per_node_group",
                self.replicas_per_node_group.is_some(),
            ),
        )?;
        check.ensure(
            !self.automatic_failover_enabled || self.total_nodes() >= 2,
            &[
                "automatic_failover_enabled",
                "num_cache_clusters",
                "num_node_groups",
                "replicas_per_node_group",
            ],
            "automatic failover requires at least two nodes",
        )?;
        check.requires(
            ("multi_az_enabled", self.multi_az_enabled),
            ("automatic_failover_enabled", self.automatic_failover_enabled),
        )?;
        check.requires(
            ("auth_token", self.auth_token.is_some()),
            ("transit_encryption_enabled", self.transit_encryption_enabled),
        )?;
        check.ensure(
            !self.is_cluster_mode() || self.automatic_failover_enabled,
            &["num_node_groups", "automatic_failover_enabled"],
            "cluster mode requires automatic_failover_enabled",
        )
    }

    fn computed(&self) -> ElasticacheReplicationGroupComputed {
        let total_nodes = self.total_nodes();
        ElasticacheReplicationGroupComputed {
            total_nodes,
            is_cluster_mode: self.is_cluster_mode(),
            uses_encryption: self.at_rest_encryption_enabled || self.transit_encryption_enabled,
            estimated_monthly_cost: cost::monthly(
                cost::cache_node_hourly(&self.node_type),
                total_nodes,
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn sessions() -> serde_json::Value {
        json!({
            "replication_group_id": "sessions",
            "description": "session store",
            "node_type": "cache.t3.micro",
            "num_cache_clusters": 2,
            "automatic_failover_enabled": true,
            "multi_az_enabled": true,
        })
    }

    #[test]
    fn replicated_group() {
        let group = ElasticacheReplicationGroup::from_input(&sessions()).unwrap();
        assert_eq!(6379, group.port);
        assert_eq!(
            ElasticacheReplicationGroupComputed {
                total_nodes: 2,
                is_cluster_mode: false,
                uses_encryption: false,
                estimated_monthly_cost: 24.82,
            },
            group.computed()
        );
    }

    #[test]
    fn cluster_mode_nodes() {
        let group = ElasticacheReplicationGroup::from_input(&json!({
            "replication_group_id": "cache",
            "description": "sharded",
            "node_type": "cache.r6g.large",
            "num_node_groups": 3,
            "replicas_per_node_group": 2,
            "automatic_failover_enabled": true,
        }))
        .unwrap();
        let computed = group.computed();
        assert_eq!(9, computed.total_nodes);
        assert!(computed.is_cluster_mode);
    }

    #[test]
    fn group_id_format() {
        for id in ["Sessions", "1cache", "a--b", "trailing-", "a".repeat(41).as_str()] {
            let mut input = sessions();
            input["replication_group_id"] = json!(id);
            let err = ElasticacheReplicationGroup::from_input(&input).unwrap_err();
            assert_eq!(vec!["replication_group_id"], err.fields(), "{id}");
        }
    }

    #[test]
    fn failover_needs_two_nodes() {
        let mut input = sessions();
        input["num_cache_clusters"] = json!(1);
        let err = ElasticacheReplicationGroup::from_input(&input).unwrap_err();
        assert_eq!(
            Some("automatic failover requires at least two nodes".to_owned()),
            err.rule()
        );
    }

    #[test]
    fn auth_token_needs_transit_encryption() {
        let mut input = sessions();
        input["auth_token"] = json!("0123456789abcdef");
        let err = ElasticacheReplicationGroup::from_input(&input).unwrap_err();
        assert_eq!(vec!["auth_token", "transit_encryption_enabled"], err.fields());
    }

    #[test]
    fn cache_clusters_exclude_node_groups() {
        let mut input = sessions();
        input["num_node_groups"] = json!(2);
        let err = ElasticacheReplicationGroup::from_input(&input).unwrap_err();
        assert_eq!(vec!["num_cache_clusters", "num_node_groups"], err.fields());
    }
}
