//! Rough on-demand price tables used by the cost estimates.
//!
//! These are estimates in USD for `us-east-1`, good enough to compare
//! configurations against each other. They do not track real billing.

/// Hours in an average month.
pub const HOURS_PER_MONTH: f64 = 730.0;

/// Hourly rate assumed for EC2 instance types missing from the table.
pub const DEFAULT_INSTANCE_HOURLY: f64 = 0.10;

/// Hourly rate assumed for cache node types missing from the table.
pub const DEFAULT_CACHE_NODE_HOURLY: f64 = 0.10;

pub const NAT_GATEWAY_HOURLY: f64 = 0.045;

/// Public IPv4 addresses are billed whether attached or not.
pub const PUBLIC_IPV4_HOURLY: f64 = 0.005;

/// Per GB-month, for volume types missing from the table.
pub const DEFAULT_EBS_GB_MONTH: f64 = 0.10;

pub fn instance_hourly(instance_type: &str) -> f64 {
    match instance_type {
        "t3.nano" => 0.0052,
        "t3.micro" => 0.0104,
        "t3.small" => 0.0208,
        "t3.medium" => 0.0416,
        "t3.large" => 0.0832,
        "t3.xlarge" => 0.1664,
        "t3.2xlarge" => 0.3328,
        "t4g.micro" => 0.0084,
        "t4g.small" => 0.0168,
        "t4g.medium" => 0.0336,
        "m5.large" => 0.096,
        "m5.xlarge" => 0.192,
        "m5.2xlarge" => 0.384,
        "m6i.large" => 0.096,
        "m6i.xlarge" => 0.192,
        "c5.large" => 0.085,
        "c5.xlarge" => 0.17,
        "c6i.large" => 0.085,
        "r5.large" => 0.126,
        "r5.xlarge" => 0.252,
        _ => DEFAULT_INSTANCE_HOURLY,
    }
}

pub fn cache_node_hourly(node_type: &str) -> f64 {
    match node_type {
        "cache.t3.micro" => 0.017,
        "cache.t3.small" => 0.034,
        "cache.t3.medium" => 0.068,
        "cache.t4g.micro" => 0.016,
        "cache.t4g.small" => 0.032,
        "cache.t4g.medium" => 0.065,
        "cache.m5.large" => 0.156,
        "cache.m5.xlarge" => 0.311,
        "cache.m6g.large" => 0.149,
        "cache.r5.large" => 0.216,
        "cache.r5.xlarge" => 0.431,
        "cache.r6g.large" => 0.206,
        "cache.r6g.xlarge" => 0.411,
        _ => DEFAULT_CACHE_NODE_HOURLY,
    }
}

pub fn ebs_gb_month(volume_type: &str) -> f64 {
    match volume_type {
        "gp2" => 0.10,
        "gp3" => 0.08,
        "io1" | "io2" => 0.125,
        "st1" => 0.045,
        "sc1" => 0.015,
        _ => DEFAULT_EBS_GB_MONTH,
    }
}

/// Monthly cost of `count` units billed at `hourly`.
pub fn monthly(hourly: f64, count: u32) -> f64 {
    round_cents(hourly * HOURS_PER_MONTH * f64::from(count))
}

pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
