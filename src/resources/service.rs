//! Inspection of the services the Crunchy operator creates for a cluster

use k8s_openapi::api::core::v1::Service;

/// First non-zero node port allocated on a service, in port order
pub fn allocated_node_port(service: &Service) -> Option<i32> {
    service
        .spec
        .as_ref()?
        .ports
        .as_ref()?
        .iter()
        .filter_map(|port| port.node_port)
        .find(|&node_port| node_port != 0)
}
