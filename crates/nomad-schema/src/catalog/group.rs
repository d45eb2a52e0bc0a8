// Dweve Nomad LS - Nomad job specification language server
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The `group` block and group-level configuration.

use super::job::{affinity, constraint, meta, migrate, reschedule, spread, update};
use super::{any, block, boolean, connect, flag, int, named, number, string, string_list, task, text};
use crate::model::{AttributeSchema, BlockSchema, SchemaNode, ValueType};

pub(super) fn group() -> SchemaNode {
    SchemaNode::new()
        .attribute(
            "count",
            number("Specifies the number of instances that should be running under for this group. This value must be non-negative. This defaults to the `min` value specified in the `scaling` block, if present; otherwise, this defaults to `1`.")
                .with_default(int(1)),
        )
        .attribute(
            "shutdown_delay",
            string("Specifies the duration to wait when stopping a group's tasks. The delay occurs between Consul or Nomad service deregistration and sending each task a shutdown signal.")
                .with_default(text("0s")),
        )
        .attribute(
            "prevent_reschedule_on_lost",
            boolean("Defines the reschedule behaviour of an allocation when the node it is running on misses heartbeats. When enabled, if the node it is running on becomes disconnected or goes down, this allocation won't be rescheduled and will show up as `unknown` until the node comes back up or it is manually restarted.")
                .with_default(flag(false)),
        )
        .block("affinity", affinity())
        .block("constraint", constraint())
        .block(
            "consul",
            block(
                "Specifies Consul configuration options specific to a group.",
                consul(),
            ),
        )
        .block("disconnect", disconnect())
        .block("ephemeral_disk", ephemeral_disk())
        .block("meta", meta())
        .block("migrate", migrate())
        .block("network", network())
        .block("reschedule", reschedule())
        .block("restart", restart())
        .block("scaling", scaling())
        .block("service", service())
        .block("spread", spread())
        .block(
            "task",
            named(
                "The `task` block creates an individual unit of work, such as a Docker container, web application, or batch processing.",
                "name",
                task::task(),
            ),
        )
        .block("update", update())
        .block("volume", volume())
}

pub(super) fn consul() -> SchemaNode {
    SchemaNode::new()
        .attribute(
            "cluster",
            string("Specifies the Consul cluster to use.").with_default(text("default")),
        )
        .attribute(
            "namespace",
            string("The Consul namespace in which group and task-level services within the group will be registered. Use of `template` to access Consul KV will read from the specified Consul namespace."),
        )
        .attribute(
            "partition",
            string("When this field is set, a constraint will be added to the group or task to ensure that the allocation is placed on a Nomad client that has access to the specified Consul admin partition."),
        )
}

fn disconnect() -> BlockSchema {
    block(
        "Describes the system's behavior in case of a network partition. By default, without a `disconnect` block, if an allocation is on a node that misses heartbeats, the allocation will be marked `lost` and will be rescheduled.",
        SchemaNode::new()
            .attribute(
                "lost_after",
                string("Specifies a duration during which a Nomad client will attempt to reconnect allocations after it fails to heartbeat in the [`heartbeat_grace`](https://developer.hashicorp.com/nomad/docs/configuration/server#heartbeat_grace) window. It defaults to \"\", which is equivalent to having the disconnect block be nil.\n\nYou cannot use `lost_after` and `stop_on_client_after` in the same `disconnect` block.")
                    .with_default(text("")),
            )
            .attribute(
                "replace",
                boolean("Specifies if Nomad should replace the disconnected allocation with a new one rescheduled on a different node. Nomad considers the replacement allocation a reschedule and obeys the job's [`reschedule`](https://developer.hashicorp.com/nomad/docs/job-specification/reschedule) block. If false and the node the allocation is running on disconnects or goes down, Nomad does not replace this allocation and reports `unknown` until the node reconnects, or until you manually stop the allocation.")
                    .with_default(flag(false)),
            )
            .attribute(
                "stop_on_client_after",
                string("Specifies a duration after which a disconnected Nomad client will stop its allocations. Setting `stop_on_client_after` shorter than `lost_after` and `replace = false` at the same time is not permitted and will cause a validation error, because this would lead to a state where no allocations can be scheduled.\n\nThe Nomad client process must be running for this to occur.")
                    .with_default(text("")),
            )
            .attribute(
                "reconcile",
                string("Specifies which allocation to keep once the previously disconnected node regains connectivity. It has four possible values which are described below:\n\n* `keep_original`: Always keep the original allocation. Bear in mind when choosing this option, it can have crashed while the client was disconnected.\n* `keep_replacement`: Always keep the allocation that was replaced to replace the disconnected one.\n* `best_score`: Keep the allocation running on the node with the best score.\n* `longest_running`: Keep the allocation that has been up and running continuously for the longest time.")
                    .with_default(text("best_score")),
            ),
    )
}

fn ephemeral_disk() -> BlockSchema {
    block(
        "Describes the ephemeral disk requirements of the group. Ephemeral disks can be marked as sticky and support live data migrations.",
        SchemaNode::new()
            .attribute(
                "migrate",
                boolean("This specifies that the Nomad client should make a best-effort attempt to migrate the data from the previous allocation, even if the previous allocation was on another client. Enabling `migrate` automatically enables `sticky` as well. During data migration, the task will block starting until the data migration has completed.")
                    .with_default(flag(false)),
            )
            .attribute(
                "size",
                number("Specifies the size of the ephemeral disk in MB. The current Nomad ephemeral storage implementation does not enforce this limit; however, it is used during job placement.")
                    .with_default(int(300)),
            )
            .attribute(
                "sticky",
                boolean("Specifies that Nomad should make a best-effort attempt to place the updated allocation on the same machine. This will move the `local/` and `alloc/data` directories to the new allocation.")
                    .with_default(flag(false)),
            ),
    )
}

fn network() -> BlockSchema {
    block(
        "Specifies the networking requirements for the task group, including the network mode and port allocations.",
        SchemaNode::new()
            .attribute(
                "mode",
                string("Mode of the network. Valid values are `none`, `bridge`, `host`, `cni/<cni network name>`.")
                    .with_default(text("host")),
            )
            .attribute(
                "hostname",
                string("The hostname assigned to the network namespace. This is currently only supported using the Docker driver and when the mode is set to `bridge`."),
            )
            .block(
                "port",
                named(
                    "Specifies a TCP/UDP port allocation and can be used to specify both dynamic ports and reserved ports. The label is used to reference the port from services and task configuration.",
                    "label",
                    SchemaNode::new()
                        .attribute(
                            "static",
                            number("Specifies the static TCP/UDP port to allocate. If omitted, a dynamic port is chosen."),
                        )
                        .attribute(
                            "to",
                            number("Applicable when using `bridge` mode to configure port to map to inside the task's network namespace. Omitting this field or setting it to `-1` sets the mapped port equal to the dynamic port allocated by the scheduler."),
                        )
                        .attribute(
                            "host_network",
                            string("Designates the host network name to use when allocating the port. When port mapping the host port will only forward traffic to the matched host network address.")
                                .with_default(text("default")),
                        )
                        .attribute(
                            "ignore_collision",
                            boolean("Allows the group to be placed on a node where the port may already be reserved.")
                                .with_default(flag(false)),
                        ),
                ),
            )
            .block(
                "dns",
                block(
                    "Sets the DNS configuration for the allocations. By default all task drivers will inherit DNS configuration from the client host.",
                    SchemaNode::new()
                        .attribute("servers", string_list("Sets the DNS nameservers the allocation uses for name resolution."))
                        .attribute("searches", string_list("Sets the search list for hostname lookup."))
                        .attribute("options", string_list("Sets internal resolver variables.")),
                ),
            ),
    )
}

pub(super) fn restart() -> BlockSchema {
    block(
        "Configures a task's behavior on task failure. Restarts happen on the client that is running the task.",
        SchemaNode::new()
            .attribute(
                "attempts",
                number("Specifies the number of restarts allowed in the configured interval. Defaults vary by job type."),
            )
            .attribute(
                "delay",
                string("Specifies the duration to wait before restarting a task. This is specified using a label suffix like \"30s\" or \"1h\". A random jitter of up to 25% is added to the delay.")
                    .with_default(text("15s")),
            )
            .attribute(
                "interval",
                string("Specifies the duration which begins when the first task starts and ensures that only `attempts` number of restarts happens within it. Defaults vary by job type."),
            )
            .attribute(
                "mode",
                string("Controls the behavior when the task fails more than `attempts` times in an interval. Possible values are `fail` and `delay`.")
                    .with_default(text("fail")),
            )
            .attribute(
                "render_templates",
                boolean("Specifies whether to re-render all templates when a task is restarted. If set to `true`, all templates will be re-rendered when the task restarts.")
                    .with_default(flag(false)),
            ),
    )
}

fn scaling() -> BlockSchema {
    block(
        "Specifies the scaling policy for the task group. The policy is consumed by autoscalers such as the Nomad Autoscaler.",
        SchemaNode::new()
            .attribute(
                "enabled",
                boolean("Whether the scaling policy is enabled. This is intended to allow temporarily disabling an autoscaling policy, and should be honored by the configured autoscaler.")
                    .with_default(flag(true)),
            )
            .attribute(
                "min",
                number("The minimum acceptable count for the task group. This should be honored by the external autoscaler. It will also be honored by Nomad during job updates and scaling operations. Defaults to the specified task group `count`."),
            )
            .attribute(
                "max",
                number("The maximum acceptable count for the task group. This should be honored by the external autoscaler. It will also be honored by Nomad during job updates and scaling operations.")
                    .required(),
            )
            .attribute(
                "policy",
                any("The autoscaling policy. This is opaque to Nomad, consumed and parsed only by the external autoscaler."),
            ),
    )
}

pub(super) fn service() -> BlockSchema {
    block(
        "Instructs Nomad to register a service with the specified provider. Services can be registered at the group or task level.",
        SchemaNode::new()
            .attribute(
                "name",
                string("Specifies the name this service will be advertised as in the service provider. If no name is given, the name is automatically constructed from the job, group and task names."),
            )
            .attribute(
                "port",
                string("Specifies the port to advertise for this service. The value of `port` depends on which `address_mode` is being used; usually it is the label of a `port` block in the group's `network`."),
            )
            .attribute(
                "provider",
                string("Specifies the service registration provider to use for service registrations. Valid options are either `consul` or `nomad`. All services within a single task group must utilise the same provider value.")
                    .with_default(text("consul")),
            )
            .attribute(
                "tags",
                string_list("Specifies the list of tags to associate with this service. If this is not supplied, no tags will be assigned to the service when it is registered."),
            )
            .attribute(
                "canary_tags",
                string_list("Specifies the list of tags to associate with this service when the service is part of an allocation that is currently a canary. Once the canary is promoted, the registered tags will be updated to those specified in the `tags` parameter."),
            )
            .attribute(
                "enable_tag_override",
                boolean("Enables users of Consul's Catalog API to make changes to the tags of a service without having those changes be overwritten by Consul's anti-entropy mechanism.")
                    .with_default(flag(false)),
            )
            .attribute(
                "address",
                string("Specifies a custom address to advertise in Consul or Nomad service registration. If set, `address_mode` must be in `auto` mode."),
            )
            .attribute(
                "address_mode",
                string("Specifies which address (host, alloc or driver-specific) this service should advertise. Possible values are `alloc`, `auto`, `driver` and `host`.")
                    .with_default(text("auto")),
            )
            .attribute(
                "task",
                string("Specifies the name of the Nomad task associated with this service definition. Only available on group services. Must be set if this service definition represents a Consul service mesh native service and there is more than one task in the task group."),
            )
            .attribute(
                "on_update",
                string("Specifies how checks should be evaluated when determining deployment health (including a job's initial deployment). Valid options are `require_healthy`, `ignore_warnings` and `ignore`.")
                    .with_default(text("require_healthy")),
            )
            .block("check", check())
            .block("check_restart", check_restart())
            .block("connect", connect::connect())
            .block("meta", meta())
            .block(
                "canary_meta",
                block(
                    "Specifies a key-value map that annotates the service with user-defined metadata while the allocation is a canary.",
                    SchemaNode::open(),
                ),
            ),
    )
}

fn check() -> BlockSchema {
    block(
        "Specifies a health check associated with the service. This can be specified multiple times to define multiple checks for the service.",
        SchemaNode::new()
            .attribute(
                "name",
                string("Specifies the name of the health check. If the name is not specified Nomad generates one based on the service name."),
            )
            .attribute(
                "type",
                string("This indicates the check types supported by Nomad. Valid options are `grpc`, `http`, `script`, and `tcp`.")
                    .required(),
            )
            .attribute(
                "interval",
                string("Specifies the frequency of the health checks that Consul or Nomad service provider will perform. This is specified using a label suffix like \"30s\" or \"1h\".")
                    .required(),
            )
            .attribute(
                "timeout",
                string("Specifies how long to wait for a health check query to succeed. This is specified using a label suffix like \"30s\" or \"1h\".")
                    .required(),
            )
            .attribute(
                "path",
                string("Specifies the path of the HTTP endpoint which will be queried to observe the health of a service. Nomad will automatically add the IP of the service and the port, so this is just the relative URL to the health check endpoint. This is required for http-based health checks."),
            )
            .attribute(
                "port",
                string("Specifies the label of the port on which the check will be performed. Note this is the label of the port and not the port number unless `address_mode = driver`."),
            )
            .attribute(
                "method",
                string("Specifies the HTTP method to use for HTTP checks.").with_default(text("GET")),
            )
            .attribute(
                "protocol",
                string("Specifies the protocol for the http-based health checks. Valid options are `http` and `https`.")
                    .with_default(text("http")),
            )
            .attribute(
                "command",
                string("Specifies the command to run for performing the health check. The script must exit: 0 for passing, 1 for warning, or any other value for a failing health check. This is required for script-based health checks."),
            )
            .attribute(
                "args",
                string_list("Specifies additional arguments to the `command`. This only applies to script-based health checks."),
            )
            .attribute(
                "address_mode",
                string("Same as `address_mode` on `service`. Unlike services, checks do not have an `auto` address mode as there's no way for Nomad to know which is the best address to use for checks.")
                    .with_default(text("host")),
            )
            .attribute(
                "task",
                string("Specifies the task associated with this check. Scripts are executed within the task's environment, and `check_restart` blocks will apply to the specified task."),
            )
            .attribute(
                "initial_status",
                string("Specifies the starting status of the service. Valid options are `passing`, `warning`, and `critical`."),
            )
            .attribute(
                "expose",
                boolean("Specifies whether an Expose Path should be automatically generated for this check. Only compatible with Connect-enabled task-group services using the default Connect proxy.")
                    .with_default(flag(false)),
            )
            .attribute(
                "grpc_service",
                string("What service, if any, to specify in the gRPC health check. gRPC health checks require Consul 1.0.5 or later."),
            )
            .attribute(
                "grpc_use_tls",
                boolean("Use TLS to perform a gRPC health check. May be used with `tls_skip_verify` to use TLS but skip certificate verification.")
                    .with_default(flag(false)),
            )
            .attribute(
                "tls_skip_verify",
                boolean("Skip verifying TLS certificates for HTTPS checks.").with_default(flag(false)),
            )
            .attribute(
                "on_update",
                string("Specifies how checks should be evaluated when determining deployment health. Valid options are `require_healthy`, `ignore_warnings` and `ignore`.")
                    .with_default(text("require_healthy")),
            )
            .attribute(
                "header",
                AttributeSchema::new("Specifies a set of HTTP headers that should be set during the health check, as a map of header name to a list of values.")
                    .with_constraint(ValueType::map_of(ValueType::list_of(ValueType::String))),
            )
            .block("check_restart", check_restart()),
    )
}

fn check_restart() -> BlockSchema {
    block(
        "Instructs Nomad when to restart tasks with unhealthy service checks. When a health check in Consul has been unhealthy for the `limit` specified in a `check_restart` block, it is restarted according to the task group's `restart` policy.",
        SchemaNode::new()
            .attribute(
                "limit",
                number("Restart task when a health check has failed `limit` times. For example 1 causes a restart on the first failure. The default, 0, disables health check based restarts.")
                    .with_default(int(0)),
            )
            .attribute(
                "grace",
                string("Duration to wait after a task starts or restarts before checking its health.")
                    .with_default(text("1s")),
            )
            .attribute(
                "ignore_warnings",
                boolean("By default checks with both `critical` and `warning` statuses are considered unhealthy. Setting `ignore_warnings = true` treats a `warning` status like `passing` and will not trigger a restart.")
                    .with_default(flag(false)),
            ),
    )
}

fn volume() -> BlockSchema {
    named(
        "Allows the group to specify that it requires a given volume from the cluster. The label is the name the volume is referred to by in `volume_mount` blocks.",
        "name",
        SchemaNode::new()
            .attribute(
                "type",
                string("Specifies the type of a given volume. The valid volume types are `\"host\"` and `\"csi\"`.")
                    .required(),
            )
            .attribute(
                "source",
                string("The name of the volume to request. When using `host_volume`'s this should match the published name of the host volume. When using `csi` volumes, this should match the ID of the registered volume.")
                    .required(),
            )
            .attribute(
                "read_only",
                boolean("Specifies that the group only requires read only access to a volume and is used as the default value for the `volume_mount -> read_only` configuration.")
                    .with_default(flag(false)),
            )
            .attribute(
                "sticky",
                boolean("Specifies that this volume sticks to the allocation that uses it. Sticky volumes are only supported for dynamic host volumes and CSI volumes.")
                    .with_default(flag(false)),
            )
            .attribute(
                "access_mode",
                string("Defines whether a volume should be available concurrently. The `access_mode` and `attachment_mode` together are used to determine which nodes can use a given volume."),
            )
            .attribute(
                "attachment_mode",
                string("The storage API that will be used by the volume. Most storage providers will support `\"file-system\"`, to mount volumes using the CSI filesystem API. Some storage providers will support `\"block-device\"`."),
            )
            .attribute(
                "per_alloc",
                boolean("Specifies that the `source` of the volume should have the suffix `[n]`, where `n` is the allocation index. This allows mounting a unique volume per allocation, so long as the volume's source is named appropriately.")
                    .with_default(flag(false)),
            )
            .block(
                "mount_options",
                block(
                    "Options for mounting CSI volumes that have the `file-system` attachment mode. These options override the `mount_options` field from volume registration.",
                    SchemaNode::new()
                        .attribute("fs_type", string("File system type (ex. `\"ext4\"`)."))
                        .attribute("mount_flags", string_list("The flags passed to `mount` (ex. `[\"ro\", \"noatime\"]`).")),
                ),
            ),
    )
}
