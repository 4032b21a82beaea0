//! Scenario helpers composing CRUD calls, waits, and conflict retries.
//!
//! These are the building blocks test scenarios script against: create a
//! resource, follow the returned action handle to completion, and clean up
//! afterwards. Cluster deletion and policy detach race the cluster lock of
//! any action that just finished, so both run under the conflict retrier.

use std::time::Duration;

use rand::RngExt;
use rand::distr::Alphanumeric;
use serde_json::{Value, json};

use crate::client::ClusteringClient;
use crate::error::Result;
use crate::retry::{Attempt, retry_on_conflict};
use crate::specs;

/// Random lowercase resource name with the given prefix.
pub fn rand_name(prefix: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();
    format!("{prefix}-{}", suffix.to_lowercase())
}

/// Create a profile and return its id.
pub async fn create_profile(
    client: &ClusteringClient,
    spec: Option<Value>,
    name: Option<&str>,
    metadata: Option<Value>,
) -> Result<String> {
    let mut spec = spec.unwrap_or_else(specs::server_profile);
    if let Some(meta) = metadata {
        spec["properties"]["metadata"] = meta;
    }
    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| rand_name("corral-profile"));
    let res = client
        .create_obj("profiles", json!({"profile": {"name": name, "spec": spec}}))
        .await?;
    res.id()
}

/// Delete a profile, optionally tolerating one that is already gone.
pub async fn delete_profile(
    client: &ClusteringClient,
    profile_id: &str,
    ignore_missing: bool,
) -> Result<()> {
    match client.delete_obj("profiles", profile_id).await {
        Ok(_) => Ok(()),
        Err(e) if ignore_missing && e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Knobs for [`create_cluster`]. `max_size` of -1 means unbounded.
#[derive(Debug, Clone)]
pub struct CreateClusterParams {
    pub desired_capacity: u32,
    pub min_size: u32,
    pub max_size: i64,
    pub timeout: Option<u64>,
    pub metadata: Option<Value>,
    pub name: Option<String>,
    pub config: Option<Value>,
    pub wait_timeout: Option<Duration>,
}

impl Default for CreateClusterParams {
    fn default() -> Self {
        Self {
            desired_capacity: 0,
            min_size: 0,
            max_size: -1,
            timeout: None,
            metadata: None,
            name: None,
            config: None,
            wait_timeout: None,
        }
    }
}

/// Create a cluster and return its id once the creating action has succeeded.
pub async fn create_cluster(
    client: &ClusteringClient,
    profile_id: &str,
    params: CreateClusterParams,
) -> Result<String> {
    let name = params
        .name
        .clone()
        .unwrap_or_else(|| rand_name("corral-cluster"));
    let body = json!({
        "cluster": {
            "profile_id": profile_id,
            "desired_capacity": params.desired_capacity,
            "min_size": params.min_size,
            "max_size": params.max_size,
            "timeout": params.timeout,
            "metadata": params.metadata,
            "name": name,
            "config": params.config
        }
    });
    let res = client.create_obj("clusters", body).await?;
    let cluster_id = res.id()?;
    let action_id = res.action_id()?;
    client
        .wait_for_status("actions", &action_id, "SUCCEEDED", params.wait_timeout)
        .await?;
    Ok(cluster_id)
}

/// Fields updatable on an existing cluster.
#[derive(Debug, Clone, Default)]
pub struct UpdateClusterParams {
    pub profile_id: Option<String>,
    pub name: Option<String>,
    pub metadata: Option<Value>,
    pub timeout: Option<u64>,
    pub wait_timeout: Option<Duration>,
}

/// Update a cluster and wait until its action reaches `expected_status`.
/// Returns the body returned by the update call.
pub async fn update_cluster(
    client: &ClusteringClient,
    cluster_id: &str,
    params: UpdateClusterParams,
    expected_status: &str,
) -> Result<Option<Value>> {
    let body = json!({
        "cluster": {
            "profile_id": params.profile_id,
            "metadata": params.metadata,
            "name": params.name,
            "timeout": params.timeout
        }
    });
    let res = client.update_obj("clusters", cluster_id, body).await?;
    let action_id = res.action_id()?;
    client
        .wait_for_status("actions", &action_id, expected_status, params.wait_timeout)
        .await?;
    Ok(res.body)
}

/// Fetch a cluster, optionally waiting for it to reach a status first.
pub async fn get_cluster(
    client: &ClusteringClient,
    cluster_id: &str,
    expected_status: Option<&str>,
    wait_timeout: Option<Duration>,
) -> Result<Value> {
    if let Some(status) = expected_status {
        client
            .wait_for_status("clusters", cluster_id, status, wait_timeout)
            .await?;
    }
    let res = client.get_obj("clusters", cluster_id).await?;
    Ok(res.record().cloned().unwrap_or(Value::Null))
}

/// List all clusters.
pub async fn list_clusters(client: &ClusteringClient) -> Result<Value> {
    let res = client.list_objs("clusters").await?;
    Ok(res.record().cloned().unwrap_or(Value::Null))
}

/// Delete a cluster, retrying on lock conflicts.
///
/// The delete action ending `FAILED` is a soft failure: the whole sequence is
/// retried, and after the attempt budget the last `Failed` is returned for
/// the caller to assert on. On success the cluster is also confirmed gone.
pub async fn delete_cluster(
    client: &ClusteringClient,
    cluster_id: &str,
    wait_timeout: Option<Duration>,
) -> Result<Attempt<()>> {
    retry_on_conflict(client.retry_policy(), || async move {
        let res = client.delete_obj("clusters", cluster_id).await?;
        let action_id = res.action_id()?;
        let action = client
            .wait_for_status("actions", &action_id, ["SUCCEEDED", "FAILED"], wait_timeout)
            .await?;
        if action.status_field()? == "FAILED" {
            return Ok(Attempt::Failed(()));
        }
        client
            .wait_for_delete("clusters", cluster_id, wait_timeout)
            .await?;
        Ok(Attempt::Succeeded(()))
    })
    .await
}

/// Create a standalone or member node and return its id once active.
pub async fn create_node(
    client: &ClusteringClient,
    profile_id: &str,
    cluster_id: Option<&str>,
    name: Option<&str>,
    role: Option<&str>,
    wait_timeout: Option<Duration>,
) -> Result<String> {
    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| rand_name("corral-node"));
    let body = json!({
        "node": {
            "profile_id": profile_id,
            "cluster_id": cluster_id,
            "metadata": Value::Null,
            "role": role,
            "name": name
        }
    });
    let res = client.create_obj("nodes", body).await?;
    let node_id = res.id()?;
    let action_id = res.action_id()?;
    client
        .wait_for_status("actions", &action_id, "SUCCEEDED", wait_timeout)
        .await?;
    Ok(node_id)
}

/// Fetch a node, optionally asking the service for physical details.
pub async fn get_node(
    client: &ClusteringClient,
    node_id: &str,
    show_details: bool,
) -> Result<Value> {
    let res = if show_details {
        client
            .get_obj_with("nodes", node_id, &[("show_details", "True")])
            .await?
    } else {
        client.get_obj("nodes", node_id).await?
    };
    Ok(res.record().cloned().unwrap_or(Value::Null))
}

/// List all nodes.
pub async fn list_nodes(client: &ClusteringClient) -> Result<Value> {
    let res = client.list_objs("nodes").await?;
    Ok(res.record().cloned().unwrap_or(Value::Null))
}

/// Fields updatable on an existing node.
#[derive(Debug, Clone, Default)]
pub struct UpdateNodeParams {
    pub profile_id: Option<String>,
    pub name: Option<String>,
    pub metadata: Option<Value>,
    pub role: Option<String>,
    pub tainted: Option<bool>,
    pub wait_timeout: Option<Duration>,
}

/// Update a node, wait for the action to succeed, and return the reported
/// status reason.
pub async fn update_node(
    client: &ClusteringClient,
    node_id: &str,
    params: UpdateNodeParams,
) -> Result<String> {
    let mut node = json!({
        "profile_id": params.profile_id,
        "metadata": params.metadata,
        "name": params.name,
        "role": params.role
    });
    if let Some(tainted) = params.tainted {
        node["tainted"] = json!(tainted);
    }
    let res = client
        .update_obj("nodes", node_id, json!({"node": node}))
        .await?;
    let action_id = res.action_id()?;
    client
        .wait_for_status("actions", &action_id, "SUCCEEDED", params.wait_timeout)
        .await?;
    Ok(res.status_reason().unwrap_or_default().to_string())
}

/// Delete a node and wait for its teardown action to succeed.
pub async fn delete_node(
    client: &ClusteringClient,
    node_id: &str,
    wait_timeout: Option<Duration>,
) -> Result<()> {
    let res = client.delete_obj("nodes", node_id).await?;
    let action_id = res.action_id()?;
    client
        .wait_for_status("actions", &action_id, "SUCCEEDED", wait_timeout)
        .await?;
    Ok(())
}

/// Create a policy and return its id.
pub async fn create_policy(
    client: &ClusteringClient,
    spec: Option<Value>,
    name: Option<&str>,
) -> Result<String> {
    let body = json!({
        "policy": {
            "name": name.map(str::to_string).unwrap_or_else(|| rand_name("corral-policy")),
            "spec": spec.unwrap_or_else(specs::scaling_policy)
        }
    });
    let res = client.create_obj("policies", body).await?;
    res.id()
}

/// Fetch a policy.
pub async fn get_policy(client: &ClusteringClient, policy_id: &str) -> Result<Value> {
    let res = client.get_obj("policies", policy_id).await?;
    Ok(res.record().cloned().unwrap_or(Value::Null))
}

/// Delete a policy, optionally tolerating one that is already gone.
pub async fn delete_policy(
    client: &ClusteringClient,
    policy_id: &str,
    ignore_missing: bool,
) -> Result<()> {
    match client.delete_obj("policies", policy_id).await {
        Ok(_) => Ok(()),
        Err(e) if ignore_missing && e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Fetch an action.
pub async fn get_action(client: &ClusteringClient, action_id: &str) -> Result<Value> {
    let res = client.get_obj("actions", action_id).await?;
    Ok(res.record().cloned().unwrap_or(Value::Null))
}

/// Trigger a cluster action and wait for its terminal status. Returns the
/// action's status reason and id.
async fn run_cluster_action(
    client: &ClusteringClient,
    cluster_id: &str,
    body: Value,
    expected_status: &str,
    wait_timeout: Option<Duration>,
) -> Result<(String, String)> {
    let res = client.trigger_action("clusters", cluster_id, body).await?;
    let action_id = res.action_id()?;
    let action = client
        .wait_for_status("actions", &action_id, expected_status, wait_timeout)
        .await?;
    let reason = action.status_reason().unwrap_or_default().to_string();
    Ok((reason, action_id))
}

/// Attach a policy to a cluster, returning the action's status reason.
pub async fn attach_policy(
    client: &ClusteringClient,
    cluster_id: &str,
    policy_id: &str,
    expected_status: &str,
    wait_timeout: Option<Duration>,
) -> Result<String> {
    let body = json!({"policy_attach": {"enabled": true, "policy_id": policy_id}});
    let (reason, _) =
        run_cluster_action(client, cluster_id, body, expected_status, wait_timeout).await?;
    Ok(reason)
}

/// Detach a policy from a cluster, retrying on lock conflicts.
///
/// Detach typically runs right after an attach or scaling action released the
/// cluster lock; a transient 409 or a `FAILED` terminal state both warrant
/// another attempt.
pub async fn detach_policy(
    client: &ClusteringClient,
    cluster_id: &str,
    policy_id: &str,
    wait_timeout: Option<Duration>,
) -> Result<Attempt<String>> {
    retry_on_conflict(client.retry_policy(), || async move {
        let body = json!({"policy_detach": {"policy_id": policy_id}});
        let res = client.trigger_action("clusters", cluster_id, body).await?;
        let action_id = res.action_id()?;
        let action = client
            .wait_for_status("actions", &action_id, ["SUCCEEDED", "FAILED"], wait_timeout)
            .await?;
        let reason = action.status_reason().unwrap_or_default().to_string();
        if action.status_field()? == "FAILED" {
            return Ok(Attempt::Failed(reason));
        }
        Ok(Attempt::Succeeded(reason))
    })
    .await
}

/// Add existing standalone nodes to a cluster.
pub async fn add_nodes(
    client: &ClusteringClient,
    cluster_id: &str,
    nodes: &[&str],
    expected_status: &str,
    wait_timeout: Option<Duration>,
) -> Result<String> {
    let body = json!({"add_nodes": {"nodes": nodes}});
    let (reason, _) =
        run_cluster_action(client, cluster_id, body, expected_status, wait_timeout).await?;
    Ok(reason)
}

/// Remove member nodes from a cluster.
pub async fn del_nodes(
    client: &ClusteringClient,
    cluster_id: &str,
    nodes: &[&str],
    expected_status: &str,
    wait_timeout: Option<Duration>,
) -> Result<String> {
    let body = json!({"del_nodes": {"nodes": nodes}});
    let (reason, _) =
        run_cluster_action(client, cluster_id, body, expected_status, wait_timeout).await?;
    Ok(reason)
}

/// Replace member nodes of a cluster (`{old_id: new_id}` pairs).
pub async fn replace_nodes(
    client: &ClusteringClient,
    cluster_id: &str,
    nodes: Value,
    expected_status: &str,
    wait_timeout: Option<Duration>,
) -> Result<String> {
    let body = json!({"replace_nodes": {"nodes": nodes}});
    let (reason, _) =
        run_cluster_action(client, cluster_id, body, expected_status, wait_timeout).await?;
    Ok(reason)
}

/// Scale a cluster out by `count` nodes (service default when `None`).
pub async fn scale_out(
    client: &ClusteringClient,
    cluster_id: &str,
    count: Option<u32>,
    expected_status: &str,
    wait_timeout: Option<Duration>,
) -> Result<String> {
    let body = json!({"scale_out": {"count": count}});
    let (reason, _) =
        run_cluster_action(client, cluster_id, body, expected_status, wait_timeout).await?;
    Ok(reason)
}

/// Scale a cluster in by `count` nodes. Also returns the action id so
/// scenarios can inspect the action afterwards.
pub async fn scale_in(
    client: &ClusteringClient,
    cluster_id: &str,
    count: Option<u32>,
    expected_status: &str,
    wait_timeout: Option<Duration>,
) -> Result<(String, String)> {
    let body = json!({"scale_in": {"count": count}});
    run_cluster_action(client, cluster_id, body, expected_status, wait_timeout).await
}

/// Knobs for [`resize`].
#[derive(Debug, Clone)]
pub struct ResizeParams {
    pub adjustment_type: Option<String>,
    pub number: Option<i64>,
    pub min_size: Option<u32>,
    pub max_size: Option<i64>,
    pub min_step: Option<u32>,
    pub strict: bool,
    pub wait_timeout: Option<Duration>,
}

impl Default for ResizeParams {
    fn default() -> Self {
        Self {
            adjustment_type: None,
            number: None,
            min_size: None,
            max_size: None,
            min_step: None,
            strict: true,
            wait_timeout: None,
        }
    }
}

/// Resize a cluster.
pub async fn resize(
    client: &ClusteringClient,
    cluster_id: &str,
    params: ResizeParams,
    expected_status: &str,
) -> Result<String> {
    let body = json!({
        "resize": {
            "adjustment_type": params.adjustment_type,
            "number": params.number,
            "min_size": params.min_size,
            "max_size": params.max_size,
            "min_step": params.min_step,
            "strict": params.strict
        }
    });
    let (reason, _) =
        run_cluster_action(client, cluster_id, body, expected_status, params.wait_timeout).await?;
    Ok(reason)
}

/// Complete a lifecycle hook that is holding up a deletion.
pub async fn complete_lifecycle(
    client: &ClusteringClient,
    cluster_id: &str,
    lifecycle_action_token: &str,
    expected_status: &str,
    wait_timeout: Option<Duration>,
) -> Result<String> {
    let body = json!({"complete_lifecycle": {"lifecycle_action_token": lifecycle_action_token}});
    let (reason, _) =
        run_cluster_action(client, cluster_id, body, expected_status, wait_timeout).await?;
    Ok(reason)
}

/// Create a receiver for a cluster action and return its id.
pub async fn create_receiver(
    client: &ClusteringClient,
    cluster_id: &str,
    action: Option<&str>,
    r_type: Option<&str>,
    name: Option<&str>,
    params: Option<Value>,
) -> Result<String> {
    let mut receiver = json!({
        "name": name.map(str::to_string).unwrap_or_else(|| rand_name("corral-receiver")),
        "cluster_id": cluster_id,
        "type": r_type.unwrap_or("webhook"),
        "params": params.unwrap_or_else(|| json!({}))
    });
    if let Some(action) = action {
        receiver["action"] = json!(action);
    }
    let res = client
        .create_obj("receivers", json!({"receiver": receiver}))
        .await?;
    res.id()
}

/// Fetch a receiver.
pub async fn get_receiver(client: &ClusteringClient, receiver_id: &str) -> Result<Value> {
    let res = client.get_obj("receivers", receiver_id).await?;
    Ok(res.record().cloned().unwrap_or(Value::Null))
}

/// Delete a receiver, optionally tolerating one that is already gone.
pub async fn delete_receiver(
    client: &ClusteringClient,
    receiver_id: &str,
    ignore_missing: bool,
) -> Result<()> {
    match client.delete_obj("receivers", receiver_id).await {
        Ok(_) => Ok(()),
        Err(e) if ignore_missing && e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}
