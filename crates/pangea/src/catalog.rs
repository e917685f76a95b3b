//! Lookup of resource and component kinds by name.
use serde_json::Value;

use crate::{
    aws::{
        autoscaling_group::AutoscalingGroup, budget::Budget, eip::Eip,
        elasticache_replication_group::ElasticacheReplicationGroup, instance::Instance,
        lambda_permission::LambdaPermission, lb_listener::LbListener, nat_gateway::NatGateway,
        route::Route, security_group::SecurityGroup, subnet::Subnet, vpc::Vpc,
    },
    components::{self, public_private_subnets::PublicPrivateSubnets, Component},
    declare_input, ReferenceSummary, Resource, Result, Synthesizer, UnknownKindSnafu,
};

/// Every kind [`declare`] understands.
pub const KINDS: &[&str] = &[
    AutoscalingGroup::TYPE,
    Budget::TYPE,
    Eip::TYPE,
    ElasticacheReplicationGroup::TYPE,
    Instance::TYPE,
    LambdaPermission::TYPE,
    LbListener::TYPE,
    NatGateway::TYPE,
    Route::TYPE,
    SecurityGroup::TYPE,
    Subnet::TYPE,
    Vpc::TYPE,
    PublicPrivateSubnets::KIND,
];

/// Declares `kind` under `name` from a raw input mapping.
///
/// Returns one summary per declared resource, several for components.
pub fn declare<S: Synthesizer + ?Sized>(
    synth: &mut S,
    kind: &str,
    name: &str,
    input: &Value,
) -> Result<Vec<ReferenceSummary>> {
    macro_rules! go {
        ($ty:ty) => {
            Ok(vec![declare_input::<$ty, S>(synth, name, input)?.summary()?])
        };
    }

    match kind {
        "aws_autoscaling_group" => go!(AutoscalingGroup),
        "aws_budgets_budget" => go!(Budget),
        "aws_eip" => go!(Eip),
        "aws_elasticache_replication_group" => go!(ElasticacheReplicationGroup),
        "aws_instance" => go!(Instance),
        "aws_lambda_permission" => go!(LambdaPermission),
        "aws_lb_listener" => go!(LbListener),
        "aws_nat_gateway" => go!(NatGateway),
        "aws_route" => go!(Route),
        "aws_security_group" => go!(SecurityGroup),
        "aws_subnet" => go!(Subnet),
        "aws_vpc" => go!(Vpc),
        "public_private_subnets" => {
            components::declare::<PublicPrivateSubnets, S>(synth, name, input)?.summaries()
        }
        _ => UnknownKindSnafu { kind, name }.fail(),
    }
}
