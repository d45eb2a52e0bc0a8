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

//! Top level of a job file, the `job` block and placement blocks shared by
//! jobs, groups and tasks.

use super::{any, block, boolean, flag, group, int, named, number, string, string_list, text};
use crate::model::{BlockSchema, DefaultValue, SchemaNode};

pub(super) fn root() -> SchemaNode {
    SchemaNode::new()
        .block(
            "job",
            named(
                "The `job` block is the top-most configuration option in the job specification. A job is a declarative specification of tasks that Nomad should run. Jobs have one or more task groups, which are themselves collections of one or more tasks.\n\nThere can only be a single job definition per file.",
                "name",
                job(),
            ),
        )
        .block(
            "variable",
            named(
                "Declares an input variable. Input variables serve as parameters for a job, allowing aspects of the job to be customized without altering the job's own source. Values are referenced as `var.<name>`.",
                "name",
                variable(),
            ),
        )
        .block(
            "locals",
            block(
                "Assigns names to expressions so they can be used multiple times within a job file without repeating them. Values are referenced as `local.<name>`.",
                SchemaNode::open(),
            ),
        )
}

fn variable() -> SchemaNode {
    SchemaNode::new()
        .attribute(
            "type",
            any("Specifies what value types are accepted for the variable, such as `string`, `number`, `bool`, `list(string)` or `map(string)`."),
        )
        .attribute(
            "default",
            any("The default value used when no value for this variable is provided."),
        )
        .attribute(
            "description",
            string("Documents the purpose of the variable and what kind of value is expected."),
        )
        .attribute(
            "sensitive",
            boolean("Marks the variable as sensitive so its value is hidden from the job submission output.")
                .with_default(flag(false)),
        )
        .block(
            "validation",
            block(
                "Specifies a custom validation rule for the variable.",
                SchemaNode::new()
                    .attribute(
                        "condition",
                        any("An expression that must evaluate to `true` when the value is valid. It may refer only to the variable itself, as `var.<name>`.")
                            .required(),
                    )
                    .attribute(
                        "error_message",
                        string("The message shown when `condition` is `false`.").required(),
                    ),
            ),
        )
}

fn job() -> SchemaNode {
    SchemaNode::new()
        .attribute(
            "all_at_once",
            boolean("Controls whether the scheduler can make partial placements if optimistic scheduling resulted in an oversubscribed node. This does not control whether all allocations for the job, where all would be the desired count for each task group, must be placed atomically.")
                .with_default(flag(false)),
        )
        .attribute(
            "datacenters",
            string_list("A list of datacenters in the region which are eligible for task placement. Supports wildcards with `*`, for example `[\"us-east-*\"]`.")
                .with_default(DefaultValue::List(vec![text("*")])),
        )
        .attribute(
            "node_pool",
            string("Specifies the node pool to place the job in. The node pool must exist when the job is registered.")
                .with_default(text("default")),
        )
        .attribute(
            "name",
            string("Specifies a name for the job, which otherwise defaults to the job's label."),
        )
        .attribute(
            "namespace",
            string("The namespace in which to execute the job. Values other than `default` are not allowed in non-Enterprise versions of Nomad.")
                .with_default(text("default")),
        )
        .attribute(
            "priority",
            number("Specifies the job priority which is used to prioritize scheduling and access to resources. Must be between 1 and `job_max_priority` inclusively, with a larger value corresponding to a higher priority.")
                .with_default(int(50)),
        )
        .attribute(
            "region",
            string("The region in which to execute the job.").with_default(text("global")),
        )
        .attribute(
            "type",
            string("Specifies the Nomad scheduler to use. Nomad provides the `service`, `system`, `batch`, and `sysbatch` schedulers.")
                .with_default(text("service")),
        )
        .attribute(
            "vault_token",
            string("Specifies the Vault token that proves the submitter of the job has access to the specified policies. Deprecated in favor of workload identities."),
        )
        .attribute(
            "consul_token",
            string("Specifies the Consul token that proves the submitter of the job has access to the Service Identity policies associated with the job's Consul service mesh enabled services."),
        )
        .attribute(
            "ui",
            any("Specifies a description and links to display in the Nomad web UI for this job."),
        )
        .block("affinity", affinity())
        .block("constraint", constraint())
        .block(
            "group",
            named(
                "The `group` block defines a series of tasks that should be co-located on the same Nomad client. Any task within a group will be placed on the same client.",
                "name",
                group::group(),
            ),
        )
        .block("meta", meta())
        .block("migrate", migrate())
        .block(
            "multiregion",
            block(
                "Specifies that a job will be deployed to multiple federated regions.",
                SchemaNode::new()
                    .block(
                        "strategy",
                        block(
                            "Controls the order in which regions are deployed.",
                            SchemaNode::new()
                                .attribute(
                                    "max_parallel",
                                    number("Specifies the maximum number of region deployments that a multiregion will have in a running state at a time."),
                                )
                                .attribute(
                                    "on_failure",
                                    string("Specifies the behavior when a region deployment fails. Available options are `\"fail_all\"`, `\"fail_local\"`, or the default (empty `\"\"`)."),
                                ),
                        ),
                    )
                    .block(
                        "region",
                        named(
                            "Lists the regions that this job will be deployed to, and their per-region configuration.",
                            "name",
                            SchemaNode::new()
                                .attribute("count", number("The number of allocations per task group in this region."))
                                .attribute("datacenters", string_list("The datacenters in this region to place allocations in."))
                                .attribute("node_pool", string("The node pool in this region to place allocations in."))
                                .block("meta", meta()),
                        ),
                    ),
            ),
        )
        .block("parameterized", parameterized())
        .block("periodic", periodic())
        .block("reschedule", reschedule())
        .block("spread", spread())
        .block("update", update())
}

pub(super) fn meta() -> BlockSchema {
    block(
        "Specifies a key-value map that annotates with user-defined metadata. Metadata is merged from the job, group and task levels and is available to tasks as `NOMAD_META_<key>` environment variables.",
        SchemaNode::open(),
    )
}

pub(super) fn constraint() -> BlockSchema {
    block(
        "Allows restricting the set of eligible nodes. Constraints may filter on attributes or client metadata.",
        SchemaNode::new()
            .attribute(
                "attribute",
                string("Specifies the name or reference of the attribute to examine for the constraint. This can be any of the Nomad interpolated values.")
                    .with_default(text("")),
            )
            .attribute(
                "operator",
                string("Specifies the comparison operator. If the operator is one of `>`, `>=`, `<`, `<=`, the ordering is compared numerically if the operands are both integers or both floats, and lexically otherwise. Possible values include `=`, `!=`, `>`, `>=`, `<`, `<=`, `distinct_hosts`, `distinct_property`, `regexp`, `set_contains`, `set_contains_any`, `version`, `semver`, `is_set`, `is_not_set`.")
                    .with_default(text("=")),
            )
            .attribute(
                "value",
                string("Specifies the value to compare the attribute against using the specified operation. This can be a literal value, another attribute, or any Nomad interpolated values.")
                    .with_default(text("")),
            ),
    )
}

pub(super) fn affinity() -> BlockSchema {
    block(
        "Allows operators to express placement preference for a set of nodes. Affinities may be expressed on attributes or client metadata. Additionally affinities may be specified at the job, group, or task levels for ultimate flexibility.",
        SchemaNode::new()
            .attribute(
                "attribute",
                string("Specifies the name or reference of the attribute to examine for the affinity. This can be any of the [Nomad interpolated values](/nomad/docs/reference/runtime-variable-interpolation#interpreted_node_vars).")
                    .with_default(text("")),
            )
            .attribute(
                "operator",
                string("Specifies the comparison operator. The ordering is compared lexically.")
                    .with_default(text("=")),
            )
            .attribute(
                "value",
                string("Specifies the value to compare the attribute against using the specified operation. This can be a literal value, another attribute, or any [Nomad interpolated values](/nomad/docs/reference/runtime-variable-interpolation#interpreted_node_vars). The `value` field is required.")
                    .with_default(text(""))
                    .required(),
            )
            .attribute(
                "weight",
                number("Specifies a weight for the affinity. The weight is used during scoring and must be an integer between -100 to 100. Negative weights act as anti affinities, causing nodes that match them to be scored lower. Weights can be used when there is more than one affinity to express relative preference across them.")
                    .with_default(int(50)),
            ),
    )
}

pub(super) fn spread() -> BlockSchema {
    block(
        "Allows operators to increase the failure tolerance of their applications by specifying a node attribute that allocations should be spread over.",
        SchemaNode::new()
            .attribute(
                "attribute",
                string("Specifies the name or reference of the attribute to use. This can be any of the Nomad interpolated values.")
                    .required(),
            )
            .attribute(
                "weight",
                number("Specifies a weight for the spread block. The weight is used during scoring and must be an integer between 0 to 100. Weights can be used when there is more than one spread or affinity block to express relative preference across them.")
                    .with_default(int(0)),
            )
            .block(
                "target",
                named(
                    "Specifies one or more target percentages for each value of the `attribute` in the spread block. If this is omitted, Nomad will spread allocations evenly across all values of the attribute.",
                    "value",
                    SchemaNode::new().attribute(
                        "percent",
                        number("Specifies the percentage associated with the target value.").with_default(int(0)),
                    ),
                ),
            ),
    )
}

pub(super) fn update() -> BlockSchema {
    block(
        "Specifies the group's update strategy. The update strategy is used to control things like rolling upgrades and canary deployments. If omitted, a default update strategy is applied.",
        SchemaNode::new()
            .attribute(
                "max_parallel",
                number("Specifies the number of allocations within a task group that can be destructively updated at the same time. Setting 0 forces updates instead of deployments.")
                    .with_default(int(1)),
            )
            .attribute(
                "health_check",
                string("Specifies the mechanism in which allocations health is determined. The potential values are `checks`, `task_states` and `manual`.")
                    .with_default(text("checks")),
            )
            .attribute(
                "min_healthy_time",
                string("Specifies the minimum time the allocation must be in the healthy state before it is marked as healthy and unblocks further allocations from being updated.")
                    .with_default(text("10s")),
            )
            .attribute(
                "healthy_deadline",
                string("Specifies the deadline in which the allocation must be marked as healthy after which the allocation is automatically transitioned to unhealthy.")
                    .with_default(text("5m")),
            )
            .attribute(
                "progress_deadline",
                string("Specifies the deadline in which an allocation must be marked as healthy. The deadline begins when the first allocation for the deployment is created and is reset whenever an allocation as part of the deployment transitions to a healthy state.")
                    .with_default(text("10m")),
            )
            .attribute(
                "auto_revert",
                boolean("Specifies if the job should auto-revert to the last stable job on deployment failure.")
                    .with_default(flag(false)),
            )
            .attribute(
                "auto_promote",
                boolean("Specifies if the job should auto-promote to the canary version when all canaries become healthy during a deployment.")
                    .with_default(flag(false)),
            )
            .attribute(
                "canary",
                number("Specifies that changes to the job that would result in destructive updates should create the specified number of canaries without stopping any previous allocations.")
                    .with_default(int(0)),
            )
            .attribute(
                "stagger",
                string("Specifies the delay between each set of `max_parallel` updates when updating system jobs.")
                    .with_default(text("30s")),
            ),
    )
}

pub(super) fn migrate() -> BlockSchema {
    block(
        "Specifies the group's strategy for migrating off of draining nodes. Only service jobs support it.",
        SchemaNode::new()
            .attribute(
                "max_parallel",
                number("Specifies the number of allocations that can be migrated at the same time.")
                    .with_default(int(1)),
            )
            .attribute(
                "health_check",
                string("Specifies the mechanism in which allocations health is determined. The potential values are `checks` and `task_states`.")
                    .with_default(text("checks")),
            )
            .attribute(
                "min_healthy_time",
                string("Specifies the minimum time the allocation must be in the healthy state before it is marked as healthy and unblocks further allocations from being migrated.")
                    .with_default(text("10s")),
            )
            .attribute(
                "healthy_deadline",
                string("Specifies the deadline in which the allocation must be marked as healthy after which the allocation is automatically transitioned to unhealthy.")
                    .with_default(text("5m")),
            ),
    )
}

pub(super) fn reschedule() -> BlockSchema {
    block(
        "Specifies the group's rescheduling strategy. If specified at the job level, the configuration will apply to all groups within the job.",
        SchemaNode::new()
            .attribute(
                "attempts",
                number("Specifies the number of reschedule attempts allowed in the configured interval. Defaults vary by job type."),
            )
            .attribute(
                "interval",
                string("Specifies the sliding window which begins when the first reschedule attempt starts and ensures that only `attempts` number of reschedule happen within it."),
            )
            .attribute(
                "delay",
                string("Specifies the duration to wait before attempting to reschedule a failed task. This is specified using a label suffix like \"30s\" or \"1h\".")
                    .with_default(text("30s")),
            )
            .attribute(
                "delay_function",
                string("Specifies the function that is used to calculate subsequent reschedule delays. The initial delay is specified by the delay parameter. Valid values are `constant`, `exponential` and `fibonacci`.")
                    .with_default(text("exponential")),
            )
            .attribute(
                "max_delay",
                string("An upper bound on delay beyond which it will not increase. This parameter is used when `delay_function` is `exponential` or `fibonacci`, and is ignored when `constant` delay is used.")
                    .with_default(text("1h")),
            )
            .attribute(
                "unlimited",
                boolean("Enables unlimited reschedule attempts. If this is set to `true` the `attempts` and `interval` fields are not used."),
            ),
    )
}

fn periodic() -> BlockSchema {
    block(
        "Allows the job to be scheduled at fixed times, dates or intervals. The periodic expression is always evaluated in the UTC timezone to ensure consistent evaluation when Nomad spans multiple time zones.",
        SchemaNode::new()
            .attribute(
                "cron",
                string("Specifies a cron expression configuring the interval to launch the job. Deprecated in favor of `crons`."),
            )
            .attribute(
                "crons",
                string_list("A list of cron expressions configuring the intervals the job is launched at. The job runs at the next earliest time that matches any of the expressions."),
            )
            .attribute(
                "prohibit_overlap",
                boolean("Specifies if this job should wait until previous instances of this job have completed. This only applies to this job; it does not prevent other periodic jobs from running at the same time.")
                    .with_default(flag(false)),
            )
            .attribute(
                "time_zone",
                string("Specifies the time zone to evaluate the next launch interval against. Daylight saving time affects scheduling, so please ensure the periodic expression and time zone are chosen appropriately.")
                    .with_default(text("UTC")),
            )
            .attribute(
                "enabled",
                boolean("Determines whether the periodic job will spawn child jobs.")
                    .with_default(flag(true)),
            ),
    )
}

fn parameterized() -> BlockSchema {
    block(
        "Configures a job to be dispatchable. A parameterized job is similar to a function in that it encapsulates a set of work that can be carried out on various inputs.",
        SchemaNode::new()
            .attribute(
                "meta_optional",
                string_list("Specifies the set of metadata keys that may be provided when dispatching against the job.")
                    .with_default(DefaultValue::List(vec![text("")])),
            )
            .attribute(
                "meta_required",
                string_list("Specifies the set of metadata keys that must be provided when dispatching against the job.")
                    .with_default(DefaultValue::List(vec![text("")])),
            )
            .attribute(
                "payload",
                string("Specifies the requirement of providing a payload when dispatching against the parameterized job. The maximum size of a `payload` is 16 KiB. The options for this field are:\n- `optional` - A payload is optional when dispatching against the job.\n- `required` - A payload must be provided when dispatching against the job.\n- `forbidden` - A payload is forbidden when dispatching against the job.")
                    .with_default(text("optional")),
            ),
    )
}
