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

//! Task driver `config` bodies, selected by the task's `driver` attribute.

use super::{any, block, boolean, flag, int, number, string, string_list, string_map, text};
use crate::model::{BlockSchema, SchemaNode};

pub(super) fn config() -> BlockSchema {
    BlockSchema::dependent(
        "Specifies the driver configuration, which is passed directly to the driver to start the task. The details of configurations are specific to each driver, so please see specific driver documentation for more information.",
        "driver",
    )
    .with_variant("docker", docker())
    .with_variant("exec", exec())
    .with_variant("raw_exec", raw_exec())
    .with_variant("java", java())
    .with_variant("podman", podman())
}

fn command_args(node: SchemaNode) -> SchemaNode {
    node.attribute(
        "args",
        string_list("A list of arguments to the `command`. References to environment variables or any interpretable Nomad variables will be interpreted before launching the task."),
    )
}

fn isolation(node: SchemaNode) -> SchemaNode {
    node.attribute(
        "pid_mode",
        string("Set to `\"private\"` to enable PID namespace isolation for this task, or `\"host\"` to disable isolation."),
    )
    .attribute(
        "ipc_mode",
        string("Set to `\"private\"` to enable IPC namespace isolation for this task, or `\"host\"` to disable isolation."),
    )
    .attribute(
        "cap_add",
        string_list("A list of Linux capabilities to enable for the task. Effective capabilities (computed from `cap_add` and `cap_drop`) must be a subset of the allowed capabilities configured with `allow_caps`."),
    )
    .attribute(
        "cap_drop",
        string_list("A list of Linux capabilities to disable for the task. Effective capabilities (computed from `cap_add` and `cap_drop`) must be a subset of the allowed capabilities configured with `allow_caps`."),
    )
}

fn registry_auth(description: &str) -> BlockSchema {
    block(
        description,
        SchemaNode::new()
            .attribute("username", string("The account username."))
            .attribute("password", string("The account password."))
            .attribute("email", string("The account email."))
            .attribute("server_address", string("The server domain/IP without the protocol.")),
    )
}

fn docker() -> SchemaNode {
    let node = SchemaNode::new()
        .attribute(
            "image",
            string("The Docker image to run. The image may include a tag or custom URL and should include `https://` if required. By default it will be fetched from Docker Hub.")
                .required(),
        )
        .attribute(
            "command",
            string("The command to run when starting the container."),
        )
        .attribute(
            "entrypoint",
            string_list("A string list overriding the image's entrypoint."),
        )
        .attribute(
            "ports",
            string_list("A list of port labels to map into the container (see `network` block)."),
        )
        .attribute(
            "network_mode",
            string("The network mode to be used for the container. Valid options are `default`, `bridge`, `host`, `none`, or `container:<name>`."),
        )
        .attribute(
            "hostname",
            string("The hostname to assign to the container. When launching more than one of a task (using `count`) with this option set, every container the task starts will have the same hostname."),
        )
        .attribute(
            "privileged",
            boolean("`true` or `false` (default). Privileged mode gives the container access to devices on the host. Note that this also requires the nomad agent and docker daemon to be configured to allow privileged containers.")
                .with_default(flag(false)),
        )
        .attribute(
            "force_pull",
            boolean("`true` or `false` (default). Always pull most recent image instead of using existing local image. Should be set to `true` if repository tags are mutable.")
                .with_default(flag(false)),
        )
        .attribute(
            "image_pull_timeout",
            string("A time duration that controls how long Nomad will wait before cancelling an in-progress pull of the Docker image as specified in `image`.")
                .with_default(text("5m")),
        )
        .attribute(
            "volumes",
            string_list("A list of `host_path:container_path` strings to bind host paths to container paths. Mounting host paths outside of the alloc directory can be disabled on clients by setting the `volumes.enabled` option to `false`."),
        )
        .attribute(
            "work_dir",
            string("The working directory inside the container."),
        )
        .attribute(
            "labels",
            string_map("A key-value map of labels to set to the containers on start."),
        )
        .attribute(
            "dns_servers",
            string_list("A list of DNS servers for the container to use (e.g. [\"8.8.8.8\", \"8.8.4.4\"]). Requires Docker v1.10 or greater."),
        )
        .attribute(
            "extra_hosts",
            string_list("A list of hosts, given as host:IP, to be added to `/etc/hosts`."),
        )
        .attribute(
            "init",
            boolean("`true` or `false` (default). Enable init (tini) system when launching your container.")
                .with_default(flag(false)),
        )
        .attribute(
            "interactive",
            boolean("`true` or `false` (default). Keep STDIN open on the container.")
                .with_default(flag(false)),
        )
        .attribute(
            "shm_size",
            number("The size (bytes) of /dev/shm for the container."),
        )
        .attribute(
            "sysctl",
            string_map("A key-value map of sysctl configurations to set to the containers on start."),
        )
        .attribute(
            "ulimit",
            string_map("A key-value map of ulimit configurations to set to the containers on start."),
        )
        .attribute(
            "auth_soft_fail",
            boolean("Don't fail the task on an auth failure. Attempt to continue without auth. If the Nomad client configuration has an `auth.helper` block, the helper will be tried for all images, including public images.")
                .with_default(flag(false)),
        )
        .block(
            "auth",
            registry_auth("Provide authentication for a private registry."),
        )
        .block(
            "logging",
            block(
                "A key-value map of Docker logging options. Defaults to `json-file` with log rotation (`max-file=2` and `max-size=2m`).",
                SchemaNode::new()
                    .attribute("type", string("The logging driver to use. Defaults to `json-file`."))
                    .block("config", block("Logging driver options.", SchemaNode::open())),
            ),
        )
        .block(
            "mount",
            block(
                "Specify a mount to be mounted into the container. Volume, bind, and tmpfs type mounts are supported. May be specified multiple times.",
                SchemaNode::new()
                    .attribute(
                        "type",
                        string("The mount type: `volume`, `bind` or `tmpfs`.").with_default(text("volume")),
                    )
                    .attribute("target", string("The path in the container to mount to."))
                    .attribute("source", string("The source of the mount. For `bind` mounts this is a path on the host."))
                    .attribute(
                        "readonly",
                        boolean("Whether the mount is read-only.").with_default(flag(false)),
                    )
                    .attribute("volume_options", any("Options for `volume` mounts."))
                    .attribute("bind_options", any("Options for `bind` mounts."))
                    .attribute("tmpfs_options", any("Options for `tmpfs` mounts.")),
            ),
        );
    isolation(command_args(node))
}

fn exec() -> SchemaNode {
    let node = SchemaNode::new()
        .attribute(
            "command",
            string("The command to execute. Must be provided. If executing a binary that exists on the host, the path must be absolute and within the task's chroot or in a host volume mounted with a `volume_mount` block.")
                .required(),
        )
        .attribute(
            "work_dir",
            string("Sets a custom working directory for the task. This path must be absolute and within the task's chroot."),
        );
    isolation(command_args(node))
}

fn raw_exec() -> SchemaNode {
    let node = SchemaNode::new()
        .attribute(
            "command",
            string("The command to execute. Must be provided. If executing a binary that exists on the host, the path must be absolute. If executing a binary that is downloaded from an `artifact`, the path can be relative from the allocation's root directory.")
                .required(),
        )
        .attribute(
            "cgroup_v2_override",
            string("Adds the Nomad task to the specified cgroup instead of the default cgroup managed by Nomad. Applies only to Linux hosts using cgroups v2."),
        )
        .attribute(
            "cgroup_v1_override",
            string_map("A map of controller names to paths. The task will be added to these cgroups. Applies only to Linux hosts using cgroups v1."),
        )
        .attribute(
            "oom_score_adj",
            number("A positive integer to indicate the likelihood of the task being OOM killed. Applies only to Linux hosts.")
                .with_default(int(0)),
        )
        .attribute(
            "work_dir",
            string("Sets a custom working directory for the task. This must be an absolute path."),
        )
        .attribute(
            "denied_envvars",
            string_list("Passes a list of environment variables that the driver should scrub from the task environment."),
        );
    command_args(node)
}

fn java() -> SchemaNode {
    let node = SchemaNode::new()
        .attribute(
            "class",
            string("The name of the class to run. If `jar_path` is specified and the manifest specifies a main class, this is optional. If shipping classes rather than a Jar, please specify the class to run and the `class_path`."),
        )
        .attribute(
            "class_path",
            string("The `class_path` specifies the class path used by Java to lookup classes and Jars."),
        )
        .attribute(
            "jar_path",
            string("The path to the downloaded Jar. In most cases this will just be the name of the Jar. However, if the supplied artifact is an archive that contains the Jar in a subfolder, the path will need to be the relative path (`subdir/from_archive/my.jar`)."),
        )
        .attribute(
            "jvm_options",
            string_list("A list of JVM options to be passed while invoking java. These options are passed without being validated in any way by Nomad."),
        )
        .attribute(
            "work_dir",
            string("Sets a custom working directory for the task. This path must be absolute and within the task's chroot."),
        );
    isolation(command_args(node))
}

fn podman() -> SchemaNode {
    let node = SchemaNode::new()
        .attribute(
            "image",
            string("The image to run. Accepted transports are `docker` (default if missing), `oci-archive` and `docker-archive`. Images reference as short-names will be treated according to user-configured preferences.")
                .required(),
        )
        .attribute(
            "command",
            string("The command to run when starting the container."),
        )
        .attribute(
            "entrypoint",
            string_list("A string list overriding the image's entrypoint."),
        )
        .attribute(
            "ports",
            string_list("Forward and expose ports. Refer to the port labels of the group `network` block."),
        )
        .attribute(
            "network_mode",
            string("Set the network mode for the container. By default the task uses the network stack defined in the task group `network` block."),
        )
        .attribute(
            "hostname",
            string("The hostname to assign to the container. When launching more than one of a task (using `count`) with this option set, every container the task starts will have the same hostname."),
        )
        .attribute(
            "privileged",
            boolean("Give extended privileges to this container.").with_default(flag(false)),
        )
        .attribute(
            "force_pull",
            boolean("`true` or `false` (default). Always pull the latest image on container start.")
                .with_default(flag(false)),
        )
        .attribute(
            "volumes",
            string_list("A list of `host_path:container_path:options` strings to bind host paths to container paths."),
        )
        .attribute(
            "working_dir",
            string("The working directory for the container. Defaults to the default set in the image."),
        )
        .attribute(
            "labels",
            string_map("Set labels on the container."),
        )
        .block(
            "auth",
            registry_auth("Authenticate to the image registry using a static credential."),
        );
    command_args(node)
}
