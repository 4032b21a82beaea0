//! Canned profile and policy specs used by the scenario helpers.
//!
//! These mirror the specs the service's own acceptance suites feed it. They
//! are plain JSON values so individual scenarios can tweak properties before
//! submission.

use serde_json::{Value, json};

/// Compute server profile.
pub fn server_profile() -> Value {
    json!({
        "type": "compute.server",
        "version": "1.0",
        "properties": {
            "flavor": "1",
            "name": "new-server-test",
            "image": "cirros-0.4.0-x86_64-disk",
            "networks": [
                {"network": "private"}
            ]
        }
    })
}

/// Orchestration stack profile.
pub fn stack_profile() -> Value {
    json!({
        "type": "orchestration.stack",
        "version": "1.0",
        "properties": {
            "template": {
                "template_version": "2014-10-16",
                "parameters": {
                    "str_length": {"type": "number", "default": 64}
                },
                "resources": {
                    "random": {
                        "type": "Random::String",
                        "properties": {
                            "length": {"get_param": "str_length"}
                        }
                    }
                },
                "outputs": {
                    "result": {"value": {"get_attr": ["random", "value"]}}
                }
            }
        }
    })
}

/// Scaling policy reacting to scale-in requests.
pub fn scaling_policy() -> Value {
    json!({
        "type": "cluster.policy.scaling",
        "version": "1.0",
        "properties": {
            "event": "CLUSTER_SCALE_IN",
            "adjustment": {
                "type": "CHANGE_IN_CAPACITY",
                "number": 1,
                "min_step": 1,
                "best_effort": true
            }
        }
    })
}

/// Load-balancing policy.
pub fn lb_policy() -> Value {
    json!({
        "type": "cluster.policy.loadbalance",
        "version": "1.1",
        "properties": {
            "pool": {
                "protocol": "HTTP",
                "protocol_port": 80,
                "subnet": "private-subnet",
                "lb_method": "ROUND_ROBIN",
                "session_persistence": {
                    "type": "SOURCE_IP",
                    "cookie_name": "test-cookie"
                }
            },
            "vip": {
                "subnet": "private-subnet",
                "connection_limit": 100,
                "protocol": "HTTP",
                "protocol_port": 80
            },
            "health_monitor": {
                "type": "HTTP",
                "delay": "1",
                "timeout": 1,
                "max_retries": 5,
                "admin_state_up": true,
                "http_method": "GET",
                "url_path": "/index.html",
                "expected_codes": "200,201,202"
            },
            "lb_status_timeout": 300
        }
    })
}

/// Batch policy bounding parallel updates.
pub fn batch_policy() -> Value {
    json!({
        "type": "cluster.policy.batch",
        "version": "1.0",
        "properties": {
            "min_in_service": 1,
            "max_batch_size": 1,
            "pause_time": 3
        }
    })
}

/// Deletion policy picking victims oldest-first.
pub fn deletion_policy() -> Value {
    json!({
        "type": "cluster.policy.deletion",
        "version": "1.1",
        "properties": {
            "criteria": "OLDEST_FIRST"
        }
    })
}

/// Deletion policy with a lifecycle hook posting to a message queue.
pub fn deletion_policy_with_hook(queue: &str) -> Value {
    json!({
        "type": "cluster.policy.deletion",
        "version": "1.1",
        "properties": {
            "hooks": {
                "type": "queue",
                "timeout": 300,
                "params": {"queue": queue}
            },
            "criteria": "OLDEST_FIRST"
        }
    })
}

/// Health policy polling node status and a URL, recreating dead nodes.
pub fn health_policy(poll_url: &str) -> Value {
    json!({
        "type": "cluster.policy.health",
        "version": "1.1",
        "description": "A policy for maintaining node health from a cluster.",
        "properties": {
            "detection": {
                "detection_modes": [
                    {"type": "NODE_STATUS_POLLING"},
                    {
                        "type": "NODE_STATUS_POLL_URL",
                        "options": {
                            "poll_url_retry_limit": 3,
                            "poll_url": poll_url,
                            "poll_url_retry_interval": 2
                        }
                    }
                ],
                "node_update_timeout": 10,
                "interval": 10
            },
            "recovery": {
                "node_delete_timeout": 90,
                "actions": [{"name": "RECREATE"}],
                "node_force_recreate": true
            }
        }
    })
}

/// Invalid health policy: the same detection mode listed twice. Used by
/// negative validation scenarios.
pub fn health_policy_duplicate_type() -> Value {
    json!({
        "type": "cluster.policy.health",
        "version": "1.1",
        "properties": {
            "detection": {
                "detection_modes": [
                    {"type": "NODE_STATUS_POLLING"},
                    {"type": "NODE_STATUS_POLLING"}
                ]
            },
            "recovery": {
                "actions": [{"name": "RECREATE"}]
            }
        }
    })
}

/// Invalid health policy: polling combined with lifecycle events.
pub fn health_policy_invalid_combo() -> Value {
    json!({
        "type": "cluster.policy.health",
        "version": "1.1",
        "properties": {
            "detection": {
                "detection_modes": [
                    {"type": "NODE_STATUS_POLLING"},
                    {"type": "LIFECYCLE_EVENTS"}
                ]
            },
            "recovery": {
                "actions": [{"name": "RECREATE"}]
            }
        }
    })
}
