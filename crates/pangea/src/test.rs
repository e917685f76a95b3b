//! End to end tests, declaring resources against a synthesizer.
use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;

use crate::{
    self as pangea,
    aws::{
        autoscaling_group::AutoscalingGroup,
        budget::Budget,
        eip::Eip,
        elasticache_replication_group::ElasticacheReplicationGroup,
        instance::Instance,
        lambda_permission::LambdaPermission,
        lb_listener::LbListener,
        nat_gateway::{ConnectivityType, NatGateway},
        route::Route,
        security_group::SecurityGroup,
        subnet::Subnet,
        vpc::{Tenancy, Vpc},
    },
    components::{self, public_private_subnets::PublicPrivateSubnets},
    *,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn subnet(vpc_id: &str, cidr_block: &str, public: bool) -> Subnet {
    Subnet {
        vpc_id: vpc_id.to_owned(),
        cidr_block: cidr_block.to_owned(),
        availability_zone: Some("us-east-1a".to_owned()),
        map_public_ip_on_launch: public,
        assign_ipv6_address_on_creation: false,
        ipv6_cidr_block: None,
        tags: BTreeMap::new(),
    }
}

#[test]
fn wiring_a_network() {
    init_logging();

    let mut synth = TerraformSynthesizer::default();
    let vpc = declare_input::<Vpc, _>(
        &mut synth,
        "main",
        &json!({ "cidr_block": "10.0.0.0/16", "tags": { "Name": "main" } }),
    )
    .unwrap();
    assert_eq!(65536, vpc.computed().total_ip_addresses);

    let public = declare(
        &mut synth,
        "public",
        subnet(&vpc.outputs().id, "10.0.1.0/24", true),
    )
    .unwrap();
    assert_eq!("public", public.computed().subnet_type);
    assert_eq!(251, public.computed().available_ip_addresses);

    let eip = declare(&mut synth, "nat", Eip::default()).unwrap();
    let nat = declare(
        &mut synth,
        "nat",
        NatGateway {
            subnet_id: public.outputs().id.clone(),
            connectivity_type: ConnectivityType::Public,
            allocation_id: Some(eip.outputs().id.clone()),
            private_ip: None,
            tags: BTreeMap::new(),
        },
    )
    .unwrap();
    let route = declare_input::<Route, _>(
        &mut synth,
        "private_default",
        &json!({
            "route_table_id": vpc.outputs().main_route_table_id,
            "destination_cidr_block": "0.0.0.0/0",
            "nat_gateway_id": nat.outputs().id,
        }),
    )
    .unwrap();
    assert!(route.computed().is_default_route);

    assert_eq!(
        vec!["aws_eip.nat", "aws_subnet.public"],
        nat.dependencies().iter().collect::<Vec<_>>()
    );
    assert_eq!(
        vec![
            "aws_eip.nat",
            "aws_nat_gateway.nat",
            "aws_route.private_default",
            "aws_subnet.public",
            "aws_vpc.main",
        ],
        synth.addresses()
    );
    assert!(synth.unresolved().is_empty());

    let document = synth.synthesis();
    assert_eq!(
        json!("${aws_vpc.main.id}"),
        document["resource"]["aws_subnet"]["public"]["vpc_id"]
    );
    assert_eq!(
        json!("default"),
        document["resource"]["aws_vpc"]["main"]["instance_tenancy"]
    );
}

#[test]
fn missing_required_field() {
    let mut synth = TerraformSynthesizer::default();
    let err = declare_input::<Vpc, _>(&mut synth, "main", &json!({})).unwrap_err();
    assert!(err.is_schema_violation());
    assert_eq!(vec!["cidr_block"], err.fields());
    assert_eq!(Some(&serde_json::Value::Null), err.received());
    assert!(synth.is_empty());
}

#[test]
fn route_with_two_destinations() {
    let mut synth = TerraformSynthesizer::default();
    let err = declare_input::<Route, _>(
        &mut synth,
        "r",
        &json!({
            "route_table_id": "rtb-1",
            "destination_cidr_block": "0.0.0.0/0",
            "destination_prefix_list_id": "pl-12345678",
            "gateway_id": "igw-1",
        }),
    )
    .unwrap_err();
    assert!(err.is_consistency_violation());
    assert_eq!(
        vec!["destination_cidr_block", "destination_prefix_list_id"],
        err.fields()
    );
    assert!(synth.is_empty());
}

#[test]
fn duplicate_cidrs_across_tiers() {
    let mut synth = TerraformSynthesizer::default();
    let err = components::declare::<PublicPrivateSubnets, _>(
        &mut synth,
        "app",
        &json!({
            "vpc_id": "vpc-1",
            "availability_zones": ["us-east-1a", "us-east-1b"],
            "public_cidrs": ["10.0.1.0/24"],
            "private_cidrs": ["10.0.1.0/24"],
        }),
    )
    .unwrap_err();
    assert!(err.is_consistency_violation());
    assert_eq!(
        Some("duplicate CIDR blocks: 10.0.1.0/24".to_owned()),
        err.rule()
    );
    assert!(synth.is_empty());
}

#[test]
fn redeclaring_replaces_the_block() {
    let mut synth = TerraformSynthesizer::default();
    declare_input::<Vpc, _>(&mut synth, "main", &json!({ "cidr_block": "10.0.0.0/16" })).unwrap();
    let second = declare_input::<Vpc, _>(
        &mut synth,
        "main",
        &json!({ "cidr_block": "172.16.0.0/16", "instance_tenancy": "dedicated" }),
    )
    .unwrap();
    assert_eq!(Tenancy::Dedicated, second.instance_tenancy);
    assert_eq!(1, synth.len());
    assert_eq!(
        Some(&json!("172.16.0.0/16")),
        synth
            .get("aws_vpc", "main")
            .and_then(|block| block.get("cidr_block"))
    );
}

#[test]
fn bad_resource_name() {
    let mut synth = TerraformSynthesizer::default();
    let err = declare(&mut synth, "1st", Eip::default()).unwrap_err();
    assert!(err.is_schema_violation());
    assert_eq!(vec!["name"], err.fields());
    assert!(synth.is_empty());
}

#[test]
fn hand_built_records_are_validated() {
    let mut synth = TerraformSynthesizer::default();
    let mut vpc = declare_input::<Vpc, _>(
        &mut synth,
        "main",
        &json!({ "cidr_block": "10.0.0.0/16" }),
    )
    .unwrap()
    .record()
    .clone();
    vpc.enable_dns_support = false;
    let err = declare(&mut synth, "broken", vpc).unwrap_err();
    assert!(err.is_consistency_violation());
    assert_eq!(vec!["enable_dns_hostnames", "enable_dns_support"], err.fields());
    assert!(synth.get("aws_vpc", "broken").is_none());
}

#[test]
fn component_network() {
    init_logging();

    let mut synth = TerraformSynthesizer::default();
    let network = components::declare::<PublicPrivateSubnets, _>(
        &mut synth,
        "app",
        &json!({
            "vpc_id": "${aws_vpc.main.id}",
            "vpc_cidr": "10.0.0.0/16",
            "availability_zones": ["us-east-1a", "us-east-1b"],
            "public_cidrs": ["10.0.1.0/24", "10.0.2.0/24"],
            "private_cidrs": ["10.0.11.0/24", "10.0.12.0/24"],
            "nat_gateway": "per_az",
        }),
    )
    .unwrap();
    assert_eq!(2, network.nat_gateways.len());
    assert_eq!(
        Some("us-east-1b".to_owned()),
        network.private_subnets[1].availability_zone
    );
    assert_eq!(
        vec!["aws_vpc.main"],
        synth.unresolved().iter().collect::<Vec<_>>()
    );
    synth.output(
        "private_subnet_ids",
        network.private_subnets[0].outputs().id.clone(),
        Some("first private subnet"),
    );
    assert_eq!(
        json!({ "value": "${aws_subnet.app_private_0.id}", "description": "first private subnet" }),
        synth.synthesis()["output"]["private_subnet_ids"]
    );
}

#[test]
fn listener_from_references() {
    let mut synth = TerraformSynthesizer::default();
    let listener = declare_input::<LbListener, _>(
        &mut synth,
        "https",
        &json!({
            "load_balancer_arn": "${aws_lb.web.arn}",
            "port": 443,
            "protocol": "HTTPS",
            "certificate_arn": "${aws_acm_certificate.web.arn}",
            "default_action": {
                "type": "forward",
                "target_group_arn": "${aws_lb_target_group.web.arn}",
            },
        }),
    )
    .unwrap();
    assert!(listener.computed().is_secure);
    assert_eq!("application", listener.computed().load_balancer_kind);
    assert_eq!(
        vec![
            "aws_acm_certificate.web",
            "aws_lb.web",
            "aws_lb_target_group.web"
        ],
        synth.unresolved().iter().collect::<Vec<_>>()
    );
}

#[test]
fn permission_from_references() {
    let mut synth = TerraformSynthesizer::default();
    let permission = declare_input::<LambdaPermission, _>(
        &mut synth,
        "uploads",
        &json!({
            "function_name": "${aws_lambda_function.thumbnails.function_name}",
            "principal": "s3.amazonaws.com",
            "source_arn": "${aws_s3_bucket.uploads.arn}",
            "source_account": "123456789012",
        }),
    )
    .unwrap();
    assert_eq!(
        Some("s3".to_owned()),
        permission.computed().principal_service
    );
    assert!(permission
        .dependencies()
        .contains("aws_s3_bucket.uploads"));

    // Literal values are still checked.
    let err = declare_input::<LambdaPermission, _>(
        &mut synth,
        "broken",
        &json!({
            "function_name": "handler",
            "principal": "s3.amazonaws.com",
            "source_arn": "uploads",
        }),
    )
    .unwrap_err();
    assert_eq!(vec!["source_arn"], err.fields());
}

#[test]
fn subnet_inside_a_referenced_vpc() {
    let mut synth = TerraformSynthesizer::default();
    let subnet = declare_input::<Subnet, _>(
        &mut synth,
        "from_pool",
        &json!({
            "vpc_id": "${aws_vpc.main.id}",
            "cidr_block": "${aws_vpc_ipam_preview_next_cidr.next.cidr}",
        }),
    )
    .unwrap();
    assert_eq!(0, subnet.computed().available_ip_addresses);
}

/// Parses `input`, then checks the serialized record parses back to itself.
fn survives_the_schema<R: Resource>(input: serde_json::Value) {
    let record = R::from_input(&input).unwrap_or_else(|err| panic!("{err}"));
    let serialized = serde_json::to_value(&record).unwrap();
    let reparsed = R::from_input(&serialized).unwrap_or_else(|err| panic!("{err}"));
    assert_eq!(record, reparsed, "{} does not round trip", R::TYPE);
}

#[test]
fn every_resource_survives_the_schema() {
    survives_the_schema::<Vpc>(json!({
        "cidr_block": "10.0.0.0/16",
        "instance_tenancy": "dedicated",
        "tags": { "Name": "main" },
    }));
    survives_the_schema::<Subnet>(json!({
        "vpc_id": "${aws_vpc.main.id}",
        "cidr_block": "10.0.1.0/24",
        "availability_zone": "us-east-1a",
        "assign_ipv6_address_on_creation": true,
        "ipv6_cidr_block": "2600:1f18::/64",
    }));
    survives_the_schema::<Route>(json!({
        "route_table_id": "rtb-1",
        "destination_ipv6_cidr_block": "::/0",
        "egress_only_gateway_id": "eigw-1",
    }));
    survives_the_schema::<Eip>(json!({ "instance": "${aws_instance.web.id}" }));
    survives_the_schema::<NatGateway>(json!({
        "subnet_id": "subnet-1",
        "connectivity_type": "private",
        "private_ip": "10.0.1.10",
    }));
    survives_the_schema::<SecurityGroup>(json!({
        "name": "web",
        "vpc_id": "${aws_vpc.main.id}",
        "ingress": [
            { "from_port": 443, "to_port": 443, "protocol": "tcp", "cidr_blocks": ["0.0.0.0/0"] },
            { "from_port": 5432, "to_port": 5432, "protocol": "tcp", "self": true },
        ],
        "egress": [
            { "from_port": 0, "to_port": 0, "protocol": "-1", "cidr_blocks": ["0.0.0.0/0"] },
        ],
    }));
    survives_the_schema::<LbListener>(json!({
        "load_balancer_arn": "${aws_lb.web.arn}",
        "port": 80,
        "protocol": "HTTP",
        "default_action": {
            "type": "redirect",
            "redirect": { "protocol": "HTTPS", "port": "443", "status_code": "HTTP_301" },
        },
    }));
    survives_the_schema::<AutoscalingGroup>(json!({
        "name": "workers",
        "min_size": 2,
        "max_size": 6,
        "desired_capacity": 3,
        "launch_template": { "id": "${aws_launch_template.workers.id}" },
        "vpc_zone_identifier": ["${aws_subnet.private_0.id}"],
        "target_group_arns": ["${aws_lb_target_group.web.arn}"],
        "tags": { "Team": "platform" },
    }));
    survives_the_schema::<Instance>(json!({
        "ami": "ami-0abcdef1234567890",
        "instance_type": "t3.micro",
        "root_block_device": { "volume_size": 20, "encrypted": true, "iops": 3000 },
    }));
    survives_the_schema::<ElasticacheReplicationGroup>(json!({
        "replication_group_id": "sessions",
        "description": "session store",
        "node_type": "cache.t3.micro",
        "num_cache_clusters": 2,
        "automatic_failover_enabled": true,
        "multi_az_enabled": true,
        "transit_encryption_enabled": true,
        "auth_token": "a-long-enough-token",
    }));
    survives_the_schema::<LambdaPermission>(json!({
        "function_name": "handler",
        "principal": "events.amazonaws.com",
        "source_arn": "arn:aws:events:us-east-1:123456789012:rule/nightly",
        "source_account": "123456789012",
        "statement_id": "AllowNightly",
    }));
    survives_the_schema::<Budget>(json!({
        "name": "monthly-cost",
        "budget_type": "COST",
        "limit_amount": "1000.0",
        "time_unit": "MONTHLY",
        "time_period_start": "2024-01-01_00:00",
        "notification": [{
            "comparison_operator": "GREATER_THAN",
            "threshold": 80.5,
            "notification_type": "ACTUAL",
            "subscribers": [
                { "protocol": "EMAIL", "address": "ops@example.com" },
                { "protocol": "SNS", "address": "arn:aws:sns:us-east-1:123456789012:alerts" },
            ],
        }],
        "auto_adjust_data": { "auto_adjust_type": "HISTORICAL" },
    }));
}

#[derive(Debug, Clone, PartialEq, Outputs)]
struct QueueOutputs {
    url: String,
    #[output(rename = "arn")]
    queue_arn: String,
}

#[test]
fn derived_outputs() {
    let outputs = QueueOutputs::for_resource("aws_sqs_queue", "jobs");
    assert_eq!(&["url", "arn"], QueueOutputs::FIELDS);
    assert_eq!("${aws_sqs_queue.jobs.arn}", outputs.queue_arn);
    assert_eq!(
        Some(&"${aws_sqs_queue.jobs.url}".to_owned()),
        outputs.to_map().get("url")
    );
}

fn cache_group(clusters: u32) -> serde_json::Value {
    json!({
        "replication_group_id": "cache",
        "description": "cache",
        "node_type": "cache.t3.micro",
        "num_cache_clusters": clusters,
    })
}

proptest! {
    #[test]
    fn placeholders_follow_the_name(name in "[A-Za-z_][A-Za-z0-9_-]{0,30}") {
        let mut synth = TerraformSynthesizer::default();
        let eip = declare(&mut synth, &name, Eip::default()).unwrap();
        prop_assert_eq!(format!("${{aws_eip.{name}.public_ip}}"), eip.outputs().public_ip.clone());
        prop_assert_eq!(Some(eip.outputs().id.clone()), eip.output("id"));
        prop_assert!(eip.output("nope").is_none());

        let deps = reference::references_in(&json!({ "allocation_id": eip.outputs().id }));
        prop_assert_eq!(vec![format!("aws_eip.{name}")], deps.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn names_must_start_with_a_letter(name in "[0-9-][A-Za-z0-9_]{0,10}") {
        let mut synth = TerraformSynthesizer::default();
        let err = declare(&mut synth, &name, Eip::default()).unwrap_err();
        prop_assert!(err.is_schema_violation());
        prop_assert!(synth.is_empty());
    }

    #[test]
    fn subnets_survive_the_schema(a in 0u8..=255, b in 0u8..=255, public in any::<bool>()) {
        let record = subnet("vpc-1", &format!("10.{a}.{b}.0/24"), public);
        let input = serde_json::to_value(&record).unwrap();
        prop_assert_eq!(&record, &Subnet::from_input(&input).unwrap());

        let mut synth = TerraformSynthesizer::default();
        let reference = declare(&mut synth, "s", record.clone()).unwrap();
        prop_assert_eq!(&record, reference.record());
    }

    #[test]
    fn cache_cost_grows_with_nodes(clusters in 1u32..6) {
        let smaller = ElasticacheReplicationGroup::from_input(&cache_group(clusters)).unwrap();
        let larger = ElasticacheReplicationGroup::from_input(&cache_group(clusters + 1)).unwrap();
        prop_assert!(
            smaller.computed().estimated_monthly_cost < larger.computed().estimated_monthly_cost
        );
        prop_assert_eq!(clusters, smaller.computed().total_nodes);
    }

    #[test]
    fn one_nat_gateway_per_zone(zones in 1usize..=3) {
        let azs: Vec<String> = ["us-east-1a", "us-east-1b", "us-east-1c"][..zones]
            .iter()
            .map(|az| az.to_string())
            .collect();
        let public: Vec<String> = (0..zones).map(|i| format!("10.0.{i}.0/24")).collect();
        let private: Vec<String> = (0..zones).map(|i| format!("10.0.{}.0/24", 10 + i)).collect();
        let mut synth = TerraformSynthesizer::default();
        let network = components::declare::<PublicPrivateSubnets, _>(
            &mut synth,
            "net",
            &json!({
                "vpc_id": "vpc-1",
                "availability_zones": azs,
                "public_cidrs": public,
                "private_cidrs": private,
                "nat_gateway": "per_az",
            }),
        )
        .unwrap();
        prop_assert_eq!(zones as u32, network.computed.nat_gateway_count);
        prop_assert_eq!(zones, network.nat_gateways.len());
        prop_assert_eq!(4 * zones, synth.len());
        prop_assert!(
            (network.computed.estimated_monthly_cost - 36.5 * zones as f64).abs() < 1e-9
        );
    }
}
