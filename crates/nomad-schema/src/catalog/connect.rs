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

//! Consul service mesh: the `connect` block and its gateways.

use super::job::meta;
use super::{any, block, boolean, flag, number, string, string_list, string_map, text};
use crate::model::{BlockSchema, SchemaNode};

pub(super) fn connect() -> BlockSchema {
    block(
        "Configures various options for Consul service mesh. It is valid only within the context of a service definition at the task group level.",
        SchemaNode::new()
            .attribute(
                "native",
                boolean("This is used to configure the service as supporting Consul service mesh natively.")
                    .with_default(flag(false)),
            )
            .block("gateway", gateway())
            .block("sidecar_service", sidecar_service())
            .block(
                "sidecar_task",
                block(
                    "Allows configuring various aspects of the sidecar proxy task that Nomad injects. If not specified, a default Envoy task is used.",
                    SchemaNode::new()
                        .attribute("name", string("Name of the task. Defaults to including the name of the service the proxy is providing."))
                        .attribute("driver", string("Driver used for the sidecar task.").with_default(text("docker")))
                        .attribute("user", string("Determines which user the sidecar task will run as."))
                        .attribute("kill_timeout", string("Time between signalling a task that will be killed and killing it.").with_default(text("5s")))
                        .attribute("shutdown_delay", string("Delay between deregistering the task from Consul and sending it a signal to shutdown.").with_default(text("5s")))
                        .attribute("kill_signal", string("Kill signal to use for the task, defaults to SIGINT."))
                        .block("config", block("Configuration provided to the driver for initialization.", SchemaNode::open()))
                        .block("env", block("Map of environment variables used by the driver.", SchemaNode::open()))
                        .block("meta", meta()),
                ),
            ),
    )
}

fn sidecar_service() -> BlockSchema {
    block(
        "Allows configuring various options specific to the Consul service mesh sidecar service. If not specified, defaults are used.",
        SchemaNode::new()
            .attribute("port", string("Port label for sidecar service."))
            .attribute("tags", string_list("Custom Consul service tags for the sidecar service."))
            .attribute(
                "disable_default_tcp_check",
                boolean("Disable the default TCP health check.").with_default(flag(false)),
            )
            .block("meta", meta())
            .block(
                "proxy",
                block(
                    "Configures the sidecar proxy. Upstreams and exposed paths are declared here.",
                    SchemaNode::new()
                        .attribute("local_service_address", string("The address the local service binds to. Useful to customize in clusters with mixed Connect and non-Connect services.").with_default(text("127.0.0.1")))
                        .attribute("local_service_port", number("The port the local service binds to. Usually the same as the parent service's port, it is useful to customize in clusters with mixed Connect and non-Connect services."))
                        .attribute("config", any("Proxy configuration that is opaque to Nomad and passed directly to Consul."))
                        .block(
                            "upstreams",
                            block(
                                "Used to configure details of each upstream service that this sidecar proxy communicates with.",
                                SchemaNode::new()
                                    .attribute("destination_name", string("Name of the upstream service.").required())
                                    .attribute("destination_namespace", string("Name of the upstream Consul namespace."))
                                    .attribute("local_bind_port", number("The port the proxy will receive connections for the upstream on.").required())
                                    .attribute("local_bind_address", string("The address the proxy will receive connections for the upstream on."))
                                    .attribute("datacenter", string("The Consul datacenter in which to issue the discovery query. Defaults to the empty string, which Consul interprets as the local Consul datacenter."))
                                    .block(
                                        "mesh_gateway",
                                        block(
                                            "Configures the mesh gateway behavior for connecting to this upstream.",
                                            SchemaNode::new().attribute(
                                                "mode",
                                                string("The mode of operation in which to use Mesh Gateways. One of `local`, `remote` or `none`."),
                                            ),
                                        ),
                                    ),
                            ),
                        )
                        .block(
                            "expose",
                            block(
                                "Used to configure expose path configuration for Envoy.",
                                SchemaNode::new().block(
                                    "path",
                                    block(
                                        "A path to expose through Envoy.",
                                        SchemaNode::new()
                                            .attribute("path", string("The HTTP or gRPC path to expose. The path must be prefixed with a slash.").required())
                                            .attribute("protocol", string("Sets the protocol of the listener. Must be `http` or `http2`.").required())
                                            .attribute("local_path_port", number("The port the service is listening to for connections to the configured path.").required())
                                            .attribute("listener_port", string("The name of the port to use for the exposed listener.").required()),
                                    ),
                                ),
                            ),
                        ),
                ),
            ),
    )
}

fn gateway() -> BlockSchema {
    block(
        "Configures a Consul gateway for the service. Exactly one of `ingress`, `terminating` or `mesh` must be configured.",
        SchemaNode::new()
            .block(
                "proxy",
                block(
                    "Configuration of the Envoy proxy that will be injected into the task group.",
                    gateway_proxy(),
                ),
            )
            .block(
                "ingress",
                block(
                    "Configuration Entry of type `ingress-gateway` that will be associated with the service.",
                    ingress(),
                ),
            )
            .block(
                "terminating",
                block(
                    "Configuration Entry of type `terminating-gateway` that will be associated with the service.",
                    terminating(),
                ),
            )
            .block(
                "mesh",
                block(
                    "Indicates a mesh gateway will be associated with the service.",
                    SchemaNode::new(),
                ),
            ),
    )
}

fn gateway_proxy() -> SchemaNode {
    SchemaNode::new()
        .attribute(
            "connect_timeout",
            string("The amount of time to allow when making upstream connections before timing out. Defaults to 5 seconds. If the upstream service has the configuration option `[connect_timeout_ms](https://developer.hashicorp.com/consul/docs/connect/config-entries/service-resolver#connecttimeout)` set for the `service-resolver`, that timeout value will take precedence over this gateway proxy option.")
                .with_default(text("5s")),
        )
        .attribute(
            "envoy_gateway_bind_tagged_addresses",
            boolean("Indicates that the gateway services tagged addresses should be bound to listeners in addition to the default listener address.")
                .with_default(flag(false)),
        )
        .attribute(
            "envoy_gateway_bind_addresses",
            string_map("A map of additional addresses to be bound. The keys to this map are the same of the listeners to be created and the values are a map with two keys - address and port, that combined make the address to bind the listener to. These are bound in addition to the default address. If `bridge` networking is in use, this map is automatically populated with additional listeners enabling the Envoy proxy to work from inside the network namespace."),
        )
        .attribute(
            "envoy_gateway_no_default_bind",
            boolean("Prevents binding to the default address of the gateway service. This should be used with one of the other options to configure the gateway's bind addresses. If `bridge` networking is in use, this value will default to `true` since the Envoy proxy does not need to bind to the service address from inside the network namespace.")
                .with_default(flag(false)),
        )
        .attribute(
            "envoy_dns_discovery_type",
            string("Determines how Envoy will resolve hostnames. Defaults to `LOGICAL_DNS`. Must be one of `STRICT_DNS` or `LOGICAL_DNS`. Details for each type are available in the [Envoy Documentation](https://www.envoyproxy.io/docs/envoy/v1.16.1/intro/arch_overview/upstream/service_discovery). This option applies to terminating gateways that route to services addressed by a hostname."),
        )
        .attribute(
            "config",
            string_list("Escape hatch for [Advanced Configuration](https://developer.hashicorp.com/consul/docs/connect/proxies/envoy#advanced-configuration) of Envoy. Keys and values support [runtime variable interpolation](https://developer.hashicorp.com/nomad/docs/reference/runtime-variable-interpolation)."),
        )
}

fn ingress() -> SchemaNode {
    SchemaNode::new()
        .block(
            "listener",
            block(
                "One or more listeners that the ingress gateway should setup, uniquely identified by their port number.",
                listener(),
            ),
        )
        .block("tls", block("TLS configuration for this gateway.", tls()))
}

fn listener() -> SchemaNode {
    SchemaNode::new()
        .attribute(
            "port",
            number("The port that the listener should receive traffic on.").required(),
        )
        .attribute(
            "protocol",
            string("The protocol associated with the listener. One of `tcp`, `http`, `http2`, or `grpc`.")
                .with_default(text("tcp")),
        )
        .block(
            "service",
            block(
                "One or more services to be exposed via this listener. For `tcp` listeners, only a single service is allowed.",
                listener_service(),
            ),
        )
}

fn tls() -> SchemaNode {
    SchemaNode::new()
        .attribute(
            "enabled",
            boolean("Set this configuration to enable TLS for every listener on the gateway. If TLS is enabled, then each `host` defined in the host field will be added as a DNSSAN to the gateway's x509 certificate.")
                .with_default(flag(false)),
        )
        .attribute(
            "cipher_suites",
            string_list("Set the default list of TLS cipher suites for the gateway's listeners. Refer to [`CipherSuites`](https://developer.hashicorp.com/consul/docs/connect/config-entries/ingress-gateway#ciphersuites) in the Consul documentation for the supported cipher suites."),
        )
        .attribute(
            "tls_max_version",
            string("Set the default maximum TLS version supported by the gateway. Refer to [`TLSMaxVersion`](https://developer.hashicorp.com/consul/docs/connect/config-entries/ingress-gateway#tlsmaxversion) in the Consul documentation for supported versions."),
        )
        .attribute(
            "tls_min_version",
            string("Set the default minimum TLS version supported by the gateway. Refer to [`TLSMinVersion`](https://developer.hashicorp.com/consul/docs/connect/config-entries/ingress-gateway#tlsminversion) in the Consul documentation for supported versions."),
        )
        .block(
            "sds",
            block(
                "Defines a set of parameters that configures the listener to load TLS certificates from an external Secret Discovery Service ([SDS](https://developer.hashicorp.com/consul/docs/connect/config-entries/ingress-gateway#listeners-services-tls-sds)).",
                SchemaNode::new()
                    .attribute(
                        "cluster_name",
                        string("The SDS cluster name to connect to to retrieve certificates."),
                    )
                    .attribute(
                        "cert_resource",
                        string_list("The SDS resource name to request when fetching the certificate from the SDS service."),
                    ),
            ),
        )
}

fn listener_service() -> SchemaNode {
    SchemaNode::new()
        .attribute(
            "name",
            string("The name of the service that should be exposed through this listener. This can be either a service registered in the catalog, or a service defined by other config entries, or a service that is going to be configured by Nomad. If the wildcard specifier `*` is provided, then ALL services will be exposed through this listener. This is not supported for a listener with protocol `tcp`.")
                .required(),
        )
        .attribute(
            "hosts",
            string_list("A list of hosts that specify what requests will match this service. This cannot be used with a `tcp` listener, and cannot be specified alongside a wildcard (`*`) service name. If not specified, the default domain `<service-name>.ingress.*` will be used to match services. Requests _must_ send the correct host to be routed to the defined service."),
        )
        .attribute(
            "max_concurrent_requests",
            number("Specifies the maximum number of concurrent HTTP/2 traffic requests that are allowed at a single point in time. If unset, will default to the Envoy proxy's default."),
        )
        .attribute(
            "max_connections",
            number("Specifies the maximum number of HTTP/1.1 connections a service instance is allowed to establish against the upstream. If unset, will default to the Envoy proxy's default."),
        )
        .attribute(
            "max_pending_requests",
            number("Specifies the maximum number of requests that are allowed to queue while waiting to establish a connection. If unset, will default to the Envoy proxy's default."),
        )
        .block(
            "request_headers",
            block(
                "A set of HTTP-specific header modification rules that will be applied to requests routed to this service. This cannot be used with a tcp listener.",
                header_modifier(),
            ),
        )
        .block(
            "response_headers",
            block(
                "A set of HTTP-specific header modification rules that will be applied to responses from this service. This cannot be used with a tcp listener.",
                header_modifier(),
            ),
        )
        .block("tls", block("TLS configuration for this service.", tls()))
}

fn header_modifier() -> SchemaNode {
    SchemaNode::new()
        .attribute(
            "add",
            string_map("A set of key-value pairs to add to the headers, where header names are keys and header values are the values. Header names are not case-sensitive. If header values with the same name already exist, the value is appended and Consul applies both headers."),
        )
        .attribute(
            "set",
            string_map("A set of key-value pairs to add to the response header or to replace existing header values with. Use header names as the keys. Header names are not case-sensitive. If header values with the same names already exist, Consul replaces the header values."),
        )
        .attribute(
            "remove",
            string_list("Defines a list of headers to remove. Consul removes only headers containing exact matches. Header names are not case-sensitive."),
        )
}

fn terminating() -> SchemaNode {
    SchemaNode::new().block(
        "service",
        block(
            "One or more services to be linked with the gateway. The gateway will proxy traffic to these services. These linked services must be registered with Consul for the gateway to discover their addresses. They must also be registered in the same Consul datacenter as the terminating gateway.",
            SchemaNode::new()
                .attribute(
                    "name",
                    string("The name of the service to link with the gateway. If the wildcard specifier `*` is provided, then ALL services within the Consul namespace will be linked with the gateway.")
                        .required(),
                )
                .attribute(
                    "ca_file",
                    string("A file path to a PEM-encoded certificate authority. The file must be accessible by the gateway task. The certificate authority is used to verify the authenticity of the service linked with the gateway. It can be provided along with a `cert_file` and `key_file` for mutual TLS authentication, or on its own for one-way TLS authentication. If none is provided the gateway **will not** encrypt traffic to the destination."),
                )
                .attribute(
                    "cert_file",
                    string("A file path to a PEM-encoded certificate. The file must be accessible by the gateway task. The certificate is provided to servers to verify the gateway's authenticity. It must be provided if a `key_file` is provided."),
                )
                .attribute(
                    "key_file",
                    string("A file path to a PEM-encoded private key. The file must be accessible by the gateway task. The key is used with the certificate to verify the gateway's authenticity. It must be provided if a `cert_file` is provided."),
                )
                .attribute(
                    "sni",
                    string("An optional hostname or domain name to specify during the TLS handshake."),
                ),
        ),
    )
}
