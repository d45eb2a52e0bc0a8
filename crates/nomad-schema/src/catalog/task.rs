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

//! The `task` block and everything that can appear inside it.

use super::group::{consul, restart, service};
use super::job::{affinity, constraint, meta};
use super::{block, boolean, drivers, flag, int, named, number, string, string_list, string_map, text};
use crate::model::{BlockSchema, DefaultValue, SchemaNode};

pub(super) fn task() -> SchemaNode {
    SchemaNode::new()
        .attribute(
            "driver",
            string("Specifies the task driver that should be used to run the task. See the driver documentation for what is available. Examples include `docker`, `exec`, `raw_exec`, `java` and `podman`.")
                .required(),
        )
        .attribute(
            "user",
            string("Specifies the user that will run the task. Defaults to `nobody` for the `exec` and `java` drivers. The Docker driver uses the user specified in the image by default."),
        )
        .attribute(
            "kill_timeout",
            string("Specifies the duration to wait for an application to gracefully quit before force-killing. Nomad first sends a `kill_signal`. If the task does not exit before the configured timeout, `SIGKILL` is sent to the task.")
                .with_default(text("5s")),
        )
        .attribute(
            "kill_signal",
            string("Specifies a configurable kill signal for a task, where the default is SIGINT (or SIGTERM for `docker`, or CTRL_BREAK_EVENT for `raw_exec` on Windows).")
                .with_default(text("SIGINT")),
        )
        .attribute(
            "leader",
            boolean("Specifies whether the task is the leader task of the task group. If set to true, when the leader task completes, all other tasks within the task group will be gracefully shutdown.")
                .with_default(flag(false)),
        )
        .attribute(
            "shutdown_delay",
            string("Specifies the duration to wait when killing a task between removing its service registrations and sending it a shutdown signal. Ideal for tasks that handle in-flight requests.")
                .with_default(text("0s")),
        )
        .attribute(
            "kind",
            string("Used internally to manage tasks according to the value of this field. Initial use case is for Consul service mesh."),
        )
        .block("affinity", affinity())
        .block("artifact", artifact())
        .block("config", drivers::config())
        .block("constraint", constraint())
        .block(
            "consul",
            block("Specifies Consul configuration options specific to the task.", consul()),
        )
        .block("dispatch_payload", dispatch_payload())
        .block(
            "env",
            block(
                "Configures a list of environment variables to populate the task's environment before starting. Values support Nomad runtime variable interpolation.",
                SchemaNode::open(),
            ),
        )
        .block("identity", identity())
        .block("lifecycle", lifecycle())
        .block("logs", logs())
        .block("meta", meta())
        .block("resources", resources())
        .block("restart", restart())
        .block("service", service())
        .block("template", template())
        .block("vault", vault())
        .block("volume_mount", volume_mount())
}

fn artifact() -> BlockSchema {
    block(
        "Instructs Nomad to fetch and unpack a remote resource, such as a file, tarball, or binary. Nomad downloads artifacts using the popular `go-getter` library.",
        SchemaNode::new()
            .attribute(
                "destination",
                string("Specifies the directory path to download the artifact, relative to the root of the task's working directory. If omitted, the default value is to place the artifact in local/. The destination is treated as a directory unless mode is set to file. Source files will be downloaded into that directory path. For more details on how the destination interacts with task drivers, see the Filesystem internals documentation.")
                    .with_default(text("local/")),
            )
            .attribute(
                "mode",
                string("One of `any`, `file`, or `dir`. If set to `file` the destination must be a file, not a directory. By default the `destination` will be `local/<filename>`.")
                    .with_default(text("any")),
            )
            .attribute(
                "options",
                string_map("Specifies configuration parameters to fetch the artifact. The key-value pairs map directly to parameters appended to the supplied `source` URL. Please see the [`go-getter` documentation](https://github.com/hashicorp/go-getter) for a complete list of options and examples.")
                    .with_default(DefaultValue::EmptyMap),
            )
            .attribute(
                "headers",
                string_map("Specifies HTTP headers to set when fetching the artifact using `http` or `https` protocol. Please see the [`go-getter` headers documentation](https://github.com/hashicorp/go-getter#headers) for more information.")
                    .with_default(DefaultValue::EmptyMap),
            )
            .attribute(
                "source",
                string("Specifies the URL of the artifact to download. See [`go-getter`](https://github.com/hashicorp/go-getter) for details.")
                    .with_default(text(""))
                    .required(),
            )
            .attribute(
                "chown",
                boolean("Specifies whether Nomad should recursively `chown` the downloaded artifact to be owned by the [`task.user`](https://developer.hashicorp.com/nomad/docs/job-specification/task#user) uid and gid.")
                    .with_default(flag(false)),
            ),
    )
}

fn dispatch_payload() -> BlockSchema {
    block(
        "Configures the task to have access to dispatch payloads.",
        SchemaNode::new().attribute(
            "file",
            string("Specifies the file name to write the content of dispatch payload to. The file is written relative to the [task's local directory](https://developer.hashicorp.com/nomad/docs/reference/runtime-environment-settings#local).")
                .with_default(text("")),
        ),
    )
}

fn identity() -> BlockSchema {
    block(
        "Exposes a workload identity to the task. Tasks may have multiple identities; at most one of them may omit the `name`.",
        SchemaNode::new()
            .attribute(
                "name",
                string("The name of the workload identity, which must be unique per task. Only one `identity` block in a task can omit the `name` field.")
                    .with_default(text("default")),
            )
            .attribute(
                "aud",
                string_list("The audience field for the workload identity. This should always be set for non-default identities."),
            )
            .attribute(
                "change_mode",
                string("Specifies the behavior Nomad should take when the token changes. One of `noop`, `restart` or `signal`.")
                    .with_default(text("noop")),
            )
            .attribute(
                "change_signal",
                string("Specifies the signal to send to the task as a string like \"SIGHUP\" or \"SIGUSR1\". This option is required if the `change_mode` is `signal`.")
                    .with_default(text("")),
            )
            .attribute(
                "env",
                boolean("If true the workload identity will be available in the task's NOMAD_TOKEN environment variable.")
                    .with_default(flag(false)),
            )
            .attribute(
                "file",
                boolean("If true the workload identity will be available in the task's filesystem via the path `secrets/nomad_token`. If the `task.user` parameter is set, the token file will only be readable by that user. Otherwise the file is readable by everyone but is protected by parent directory permissions.")
                    .with_default(flag(false)),
            )
            .attribute(
                "filepath",
                string("If not empty and file is `true`, the workload identity is available at the specified location relative to the [task working directory](https://developer.hashicorp.com/nomad/docs/reference/runtime-environment-settings#task-directories) instead of the `NOMAD_SECRETS_DIR`.")
                    .with_default(text("")),
            )
            .attribute(
                "ttl",
                string("The lifetime of the identity before it expires. The client will renew the identity at roughly half the TTL. This is specified using a label suffix like \"30s\" or \"1h\". You may not set a TTL on the default identity. You should always set a TTL for non-default identities.")
                    .with_default(text("")),
            ),
    )
}

fn lifecycle() -> BlockSchema {
    block(
        "Configures when a task is run within the lifecycle of a task group, such as prestart or poststart hooks and sidecars.",
        SchemaNode::new()
            .attribute(
                "hook",
                string("Specifies when a task should be run within the lifecycle of a group. The following hooks are available:\n- `prestart` - Will be started immediately. The main tasks will not start until all prestart tasks with sidecar = false have completed successfully.\n- `poststart` - Will be started once all main tasks are running.\n- `poststop` - Will be started once all main tasks have stopped successfully or exhausted their failure retries.")
                    .required(),
            )
            .attribute(
                "sidecar",
                boolean("Controls whether a task is ephemeral or long-lived within the task group. If a lifecycle task is ephemeral (`sidecar = false`), the task will not be restarted after it completes successfully. If a lifecycle task is long-lived (`sidecar = true`) and terminates, it will be restarted as long as the allocation is running.")
                    .with_default(flag(false)),
            ),
    )
}

fn logs() -> BlockSchema {
    block(
        "Configures the log rotation policy for a task's `stdout` and `stderr`. Logging is enabled by default with reasonable defaults.",
        SchemaNode::new()
            .attribute(
                "max_files",
                number("Specifies the maximum number of rotated files Nomad will retain for `stdout` and `stderr`. Each stream is tracked individually, so specifying a value of 2 will create 4 files - 2 for stdout and 2 for stderr")
                    .with_default(int(10)),
            )
            .attribute(
                "max_file_size",
                number("Specifies the maximum size of each rotated file in `MB`. If the amount of disk resource requested for the task is less than the total amount of disk space needed to retain the rotated set of files, Nomad will return a validation error when a job is submitted.")
                    .with_default(int(10)),
            )
            .attribute(
                "disabled",
                boolean("Specifies that log collection should be enabled for this task. If set to `true`, the task driver will attach stdout/stderr of the task to `/dev/null` (or `NUL` on Windows). You should only disable log collection if your application has some other way of emitting logs, such as writing to a remote syslog server. Note that the `nomad alloc logs` command and related APIs will return errors (404 \"not found\") if logging is disabled.")
                    .with_default(flag(false)),
            ),
    )
}

fn resources() -> BlockSchema {
    block(
        "Describes the requirements a task needs to execute. Resource requirements include memory, CPU, and more.",
        SchemaNode::new()
            .attribute(
                "cpu",
                number("Specifies the CPU required to run this task in MHz.").with_default(int(100)),
            )
            .attribute(
                "cores",
                number("Specifies the number of CPU cores to reserve specifically for the task. This may not be used with `cpu`. The behavior of setting `cores` is specific to each task driver (e.g. [docker](https://developer.hashicorp.com/nomad/docs/deploy/task-driver/docker#cpu), [exec](https://developer.hashicorp.com/nomad/docs/deploy/task-driver/exec#cpu)).")
                    .with_default(int(0)),
            )
            .attribute(
                "memory",
                number("Specifies the memory required in MB.").with_default(int(300)),
            )
            .attribute(
                "memory_max",
                number("Optionally, specifies the maximum memory the task may use, if the client has excess memory capacity, in MB. See [Memory Oversubscription](https://developer.hashicorp.com/nomad/docs/job-specification/resources#memory-oversubscription) for more details.")
                    .with_default(int(300)),
            )
            .attribute(
                "secrets",
                number("Specifies the size of the `secrets/` directory in MB, on platforms where the directory is a tmpfs.")
                    .with_default(int(1)),
            )
            .block(
                "device",
                named(
                    "Requests a device, such as a GPU, be made available to the task. The label is the device name, optionally qualified as `<vendor>/<type>/<name>`.",
                    "name",
                    SchemaNode::new()
                        .attribute(
                            "count",
                            number("Specifies the number of instances of the given device that are required.")
                                .with_default(int(1)),
                        )
                        .block("constraint", constraint())
                        .block("affinity", affinity()),
                ),
            ),
    )
}

fn template() -> BlockSchema {
    block(
        "Instantiates an instance of a template renderer. This creates a convenient way to ship configuration files that are populated from environment variables, Consul data, Vault secrets, or just general configurations within a Nomad task.",
        SchemaNode::new()
            .attribute(
                "change_mode",
                string("Specifies the behavior Nomad should take if the rendered template changes. Nomad will always write the new contents of the template to the specified destination. The possible values are `noop`, `restart`, `signal` and `script`.")
                    .with_default(text("restart")),
            )
            .attribute(
                "change_signal",
                string("Specifies the signal to send to the task as a string like `\"SIGUSR1\"` or `\"SIGINT\"`. This option is required if the `change_mode` is `signal`."),
            )
            .attribute(
                "data",
                string("Specifies the raw template to execute. One of `source` or `data` must be specified, but not both. This is useful for smaller templates, but we recommend using `source` for larger templates."),
            )
            .attribute(
                "destination",
                string("Specifies the location where the resulting template should be rendered, relative to the task working directory.")
                    .required(),
            )
            .attribute(
                "env",
                boolean("Specifies the template should be read back in as environment variables for the task.")
                    .with_default(flag(false)),
            )
            .attribute(
                "error_on_missing_key",
                boolean("Specifies how the template behaves when attempting to index a map key that does not exist in the map.")
                    .with_default(flag(false)),
            )
            .attribute(
                "left_delimiter",
                string("Specifies the left delimiter to use in the template. The default is \"{{\" for some templates, it may be easier to use a different delimiter that does not conflict with the output file itself.")
                    .with_default(text("{{")),
            )
            .attribute(
                "right_delimiter",
                string("Specifies the right delimiter to use in the template. The default is \"}}\" for some templates, it may be easier to use a different delimiter that does not conflict with the output file itself.")
                    .with_default(text("}}")),
            )
            .attribute(
                "perms",
                string("Specifies the rendered template's permissions. File permissions are given as octal of the Unix file permissions `rwxrwxrwx`.")
                    .with_default(text("644")),
            )
            .attribute(
                "uid",
                number("Specifies the rendered template owner's user ID. If negative or not specified, the user ID of the Nomad agent user will be used."),
            )
            .attribute(
                "gid",
                number("Specifies the rendered template owner's group ID. If negative or not specified, the group ID of the Nomad agent user will be used."),
            )
            .attribute(
                "source",
                string("Specifies the path to the template to be rendered. One of `source` or `data` must be specified, but not both. This source can optionally be fetched using an `artifact` resource."),
            )
            .attribute(
                "splay",
                string("Specifies a random amount of time to wait between 0 ms and the given splay value before invoking the change mode. This is specified using a label suffix like \"30s\" or \"1h\".")
                    .with_default(text("5s")),
            )
            .block(
                "change_script",
                block(
                    "Configures a script that will be executed on template change. This block is required when `change_mode = \"script\"`.",
                    SchemaNode::new()
                        .attribute(
                            "command",
                            string("Specifies the full path to a script or executable that is to be executed on template change. The command must return exit code 0 to be considered successful.")
                                .required(),
                        )
                        .attribute("args", string_list("List of arguments that are passed to the script that is to be executed on template change."))
                        .attribute(
                            "timeout",
                            string("Timeout for script execution specified using a label suffix like `\"30s\"` or `\"1h\"`.")
                                .with_default(text("5s")),
                        )
                        .attribute(
                            "fail_on_error",
                            boolean("If `true`, Nomad will kill the task if the script execution fails. If `false`, script failure will be logged but the task will continue uninterrupted.")
                                .with_default(flag(false)),
                        ),
                ),
            )
            .block(
                "wait",
                block(
                    "Defines the minimum and maximum amount of time to wait for the Consul cluster to reach a consistent state before rendering a template.",
                    SchemaNode::new()
                        .attribute("min", string("Specifies the minimum amount of time to wait.").with_default(text("5s")))
                        .attribute("max", string("Specifies the maximum amount of time to wait.").with_default(text("4m"))),
                ),
            ),
    )
}

fn vault() -> BlockSchema {
    block(
        "Allows the task to specify that it requires a token from a HashiCorp Vault server. Nomad derives the token using the task's workload identity.",
        SchemaNode::new()
            .attribute(
                "change_mode",
                string("Specifies the behavior Nomad should take if the Vault token changes. The possible values are `noop`, `restart` and `signal`.")
                    .with_default(text("restart")),
            )
            .attribute(
                "change_signal",
                string("Specifies the signal to send to the task as a string like `\"SIGUSR1\"` or `\"SIGINT\"`. This option is required if the `change_mode` is `signal`."),
            )
            .attribute(
                "cluster",
                string("Specifies the Vault cluster to use.").with_default(text("default")),
            )
            .attribute(
                "env",
                boolean("Specifies if the `VAULT_TOKEN` and `VAULT_NAMESPACE` environment variables should be set when starting the task.")
                    .with_default(flag(true)),
            )
            .attribute(
                "disable_file",
                boolean("Specifies if the Vault token should be written to `secrets/vault_token`.")
                    .with_default(flag(false)),
            )
            .attribute(
                "namespace",
                string("Specifies the Vault Namespace to use for the task. The Nomad client will retrieve a Vault token that is scoped to this particular namespace."),
            )
            .attribute(
                "role",
                string("Specifies the Vault role used when retrieving a token from Vault using JWT and workload identity."),
            )
            .attribute(
                "allow_token_expiration",
                boolean("Specifies if the Vault token is allowed to expire. Only applies to tokens that are not renewable.")
                    .with_default(flag(false)),
            )
            .attribute(
                "policies",
                string_list("Specifies the set of Vault policies that the task requires. Deprecated in favor of workload identity roles."),
            ),
    )
}

fn volume_mount() -> BlockSchema {
    block(
        "Specifies where a group `volume` should be mounted inside the task's allocation.",
        SchemaNode::new()
            .attribute(
                "volume",
                string("Specifies the group volume that the mount is going to access.")
                    .required(),
            )
            .attribute(
                "destination",
                string("Specifies where the volume should be mounted inside the task's allocation.")
                    .required(),
            )
            .attribute(
                "read_only",
                boolean("When a group volume is writeable, you may specify that it is `read_only` on a per mount level using the `read_only` option here."),
            )
            .attribute(
                "propagation_mode",
                string("Specifies the mount propagation mode for nested volumes. Possible values are `private`, `host-to-task` and `bidirectional`.")
                    .with_default(text("private")),
            )
            .attribute(
                "selinux_label",
                string("If the client is configured with SELinux enabled, specifies the SELinux label to apply to the mount. Possible values are `Z` and `z`."),
            ),
    )
}
