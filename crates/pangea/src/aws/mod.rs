//! Pangea for AWS.
//!
//! One module per Terraform resource type. Each exposes the validated record,
//! a `*Outputs` struct of placeholders and a `*Computed` struct of derived
//! properties.
pub mod autoscaling_group;
pub mod budget;
pub mod eip;
pub mod elasticache_replication_group;
pub mod instance;
pub mod lambda_permission;
pub mod lb_listener;
pub mod nat_gateway;
pub mod route;
pub mod security_group;
pub mod subnet;
pub mod vpc;
