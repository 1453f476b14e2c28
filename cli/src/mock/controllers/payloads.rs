//! # Response Payload Shapes
//!
//! File: cli/src/mock/controllers/payloads.rs
//! Author: Christi Mahu
//!
//! Inspect responses are mostly static: a captured daemon payload with the
//! live identity and state fields written over it. Summaries for the list
//! endpoints are rendered in full here too, so the controllers only decide
//! *what* to return.
//!
use crate::mock::images::Image;
use crate::mock::lifecycle::Container;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

/// What the daemon reports for a timestamp that was never set.
pub const ZERO_TIME: &str = "0001-01-01T00:00:00Z";

const CONTAINER_IMAGE_ID: &str =
    "sha256:3476c857e7c05a7950b3a8a684ffbc82f5cbeffe1b523ea1a92bdefc4539dc57";
const IMAGE_CREATED_UNIX: i64 = 1747579856;
const IMAGE_SIZE: i64 = 746947017;
const IMAGE_INSPECT_SIZE: i64 = 43424417;

fn timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ZERO_TIME.to_string())
}

/// One entry of `GET /containers/json`.
pub fn container_summary(container: &Container, now: DateTime<Utc>) -> Value {
    json!({
        "Id": container.id,
        "Names": [container.name],
        "Image": container.image,
        "ImageID": "",
        "Command": "",
        "Created": container.created.timestamp(),
        "State": container.status().as_str(),
        "Status": container.status_text(now),
        "Ports": [],
        "Labels": {},
        "Mounts": []
    })
}

/// `GET /containers/:id/json`.
pub fn container_inspect(container: &Container) -> Value {
    let state = &container.state;
    let mut payload = container_template();
    payload["Id"] = json!(container.id);
    payload["Name"] = json!(container.name);
    payload["Created"] = json!(timestamp(Some(container.created)));
    payload["State"] = json!({
        "Status": state.status.as_str(),
        "Running": state.running,
        "Paused": state.paused,
        "Restarting": false,
        "OOMKilled": false,
        "Dead": state.dead,
        "Pid": 0,
        "ExitCode": 0,
        "Error": state.error,
        "StartedAt": timestamp(state.started_at),
        "FinishedAt": timestamp(state.finished_at)
    });
    payload["HostConfig"]["ConsoleSize"] = json!(container.console_size);
    payload["Config"]["Image"] = json!(container.image);
    payload
}

/// One entry of `GET /images/json`.
pub fn image_summary(image: &Image) -> Value {
    json!({
        "Containers": -1,
        "Created": IMAGE_CREATED_UNIX,
        "Id": image.id,
        "Labels": image.labels,
        "ParentId": image.parent_id,
        "Descriptor": {
            "mediaType": "application/vnd.oci.image.manifest.v1+json",
            "digest": "sha256:72e58c97811826c57ab14f700f6a7cbb5147e4c8a60e84c53e5c07981bd62498",
            "size": 6461
        },
        "RepoDigests": [],
        "RepoTags": image.repo_tags,
        "SharedSize": -1,
        "Size": IMAGE_SIZE
    })
}

/// `GET /images/:tag/json`.
pub fn image_inspect(image: &Image) -> Value {
    let mut payload = image_template();
    payload["Id"] = json!(image.id);
    payload["RepoTags"] = json!(image.repo_tags);
    payload["Parent"] = json!(image.parent_id);
    if !image.labels.is_empty() {
        payload["Config"]["Labels"] = json!(image.labels);
    }
    payload
}

fn container_template() -> Value {
    json!({
        "Path": "/usr/local/bin/docker-entrypoint.sh",
        "Args": ["/usr/local/bin/bun"],
        "Image": CONTAINER_IMAGE_ID,
        "ResolvConfPath": "",
        "HostnamePath": "",
        "HostsPath": "",
        "LogPath": "",
        "RestartCount": 0,
        "Driver": "overlayfs",
        "Platform": "linux",
        "MountLabel": "",
        "ProcessLabel": "",
        "AppArmorProfile": "",
        "ExecIDs": null,
        "HostConfig": {
            "Binds": null,
            "ContainerIDFile": "",
            "LogConfig": { "Type": "json-file", "Config": {} },
            "NetworkMode": "bridge",
            "PortBindings": {},
            "RestartPolicy": { "Name": "no", "MaximumRetryCount": 0 },
            "AutoRemove": false,
            "VolumeDriver": "",
            "VolumesFrom": null,
            "ConsoleSize": [0, 0],
            "CgroupnsMode": "host",
            "IpcMode": "private",
            "Cgroup": "",
            "OomScoreAdj": 0,
            "PidMode": "",
            "Privileged": false,
            "PublishAllPorts": false,
            "ReadonlyRootfs": false,
            "UTSMode": "",
            "UsernsMode": "",
            "ShmSize": 67108864,
            "Runtime": "runc",
            "CpuShares": 0,
            "Memory": 0,
            "NanoCpus": 0,
            "CgroupParent": "",
            "BlkioWeight": 0,
            "CpuPeriod": 0,
            "CpuQuota": 0,
            "CpuRealtimePeriod": 0,
            "CpuRealtimeRuntime": 0,
            "CpusetCpus": "",
            "CpusetMems": "",
            "MemoryReservation": 0,
            "MemorySwap": 0,
            "OomKillDisable": false,
            "CpuCount": 0,
            "CpuPercent": 0,
            "IOMaximumIOps": 0,
            "IOMaximumBandwidth": 0,
            "MaskedPaths": [
                "/proc/asound", "/proc/acpi", "/proc/kcore", "/proc/keys",
                "/proc/latency_stats", "/proc/timer_list", "/proc/timer_stats",
                "/proc/sched_debug", "/proc/scsi", "/sys/firmware",
                "/sys/devices/virtual/powercap"
            ],
            "ReadonlyPaths": [
                "/proc/bus", "/proc/fs", "/proc/irq", "/proc/sys", "/proc/sysrq-trigger"
            ]
        },
        "GraphDriver": { "Data": {}, "Name": "overlayfs" },
        "Mounts": [],
        "Config": {
            "Hostname": "36a07d831a95",
            "Domainname": "",
            "User": "",
            "AttachStdin": false,
            "AttachStdout": false,
            "AttachStderr": false,
            "Tty": false,
            "OpenStdin": false,
            "StdinOnce": false,
            "Env": [
                "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin",
                "BUN_RUNTIME_TRANSPILER_CACHE_PATH=0",
                "BUN_INSTALL_BIN=/usr/local/bin"
            ],
            "Cmd": ["/usr/local/bin/bun"],
            "Image": "oven/bun:alpine",
            "WorkingDir": "/home/bun/app",
            "Entrypoint": ["/usr/local/bin/docker-entrypoint.sh"],
            "Labels": {
                "org.opencontainers.image.source": "https://github.com/oven-sh/bun",
                "org.opencontainers.image.title": "bun",
                "org.opencontainers.image.version": "1.2.13-alpine"
            }
        },
        "NetworkSettings": {
            "Bridge": "",
            "SandboxID": "",
            "SandboxKey": "",
            "Ports": {},
            "HairpinMode": false,
            "LinkLocalIPv6Address": "",
            "LinkLocalIPv6PrefixLen": 0,
            "EndpointID": "",
            "Gateway": "",
            "GlobalIPv6Address": "",
            "GlobalIPv6PrefixLen": 0,
            "IPAddress": "",
            "IPPrefixLen": 0,
            "IPv6Gateway": "",
            "MacAddress": "",
            "Networks": {
                "bridge": {
                    "IPAMConfig": null,
                    "Links": null,
                    "Aliases": null,
                    "MacAddress": "",
                    "DriverOpts": null,
                    "GwPriority": 0,
                    "NetworkID": "",
                    "EndpointID": "",
                    "Gateway": "",
                    "IPAddress": "",
                    "IPPrefixLen": 0,
                    "IPv6Gateway": "",
                    "GlobalIPv6Address": "",
                    "GlobalIPv6PrefixLen": 0,
                    "DNSNames": null
                }
            }
        },
        "ImageManifestDescriptor": {
            "mediaType": "application/vnd.oci.image.manifest.v1+json",
            "digest": "sha256:2cdc992a4322a4f82e07435700d22687a5f2101cbbbe2e4f9956eb490b07675b",
            "size": 1430,
            "platform": { "architecture": "amd64", "os": "linux" }
        }
    })
}

fn image_template() -> Value {
    json!({
        "RepoDigests": [],
        "Parent": "",
        "Comment": "buildkit.dockerfile.v0",
        "Created": "2025-05-10T14:05:18.376365783Z",
        "DockerVersion": "",
        "Author": "",
        "Config": {
            "Hostname": "",
            "Domainname": "",
            "User": "",
            "AttachStdin": false,
            "AttachStdout": false,
            "AttachStderr": false,
            "Tty": false,
            "OpenStdin": false,
            "StdinOnce": false,
            "Env": [
                "PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"
            ],
            "Cmd": ["/usr/local/bin/bun"],
            "ArgsEscaped": true,
            "Image": "",
            "WorkingDir": "/home/bun/app",
            "Entrypoint": ["/usr/local/bin/docker-entrypoint.sh"],
            "Labels": {}
        },
        "Architecture": "amd64",
        "Os": "linux",
        "Size": IMAGE_INSPECT_SIZE,
        "GraphDriver": { "Data": {}, "Name": "overlayfs" },
        "RootFS": {
            "Type": "layers",
            "Layers": [
                "sha256:994456c4fd7b2b87346a81961efb4ce945a39592d32e0762b38768bca7c7d085",
                "sha256:ef70d6692b1e80a64fc0b2e711743f8c48f3e6ee466627c41e8b20860e7f2585",
                "sha256:d58e9e6425c6cae4632955cdfd38a4999dd9388c6634d715313daaac9597f75a"
            ]
        },
        "Metadata": { "LastTagTime": "2025-05-10T20:18:24.410728378Z" },
        "Descriptor": {
            "mediaType": "application/vnd.oci.image.index.v1+json",
            "digest": "sha256:3476c857e7c05a7950b3a8a684ffbc82f5cbeffe1b523ea1a92bdefc4539dc57",
            "size": 1609
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_container_inspect_overlays_live_state() {
        let mut container = Container::new("abc", "web", "node:23");
        container.resize(40, 80);
        let payload = container_inspect(&container);
        assert_eq!(payload["Id"], "abc");
        assert_eq!(payload["Name"], "web");
        assert_eq!(payload["State"]["Status"], "created");
        assert_eq!(payload["State"]["StartedAt"], ZERO_TIME);
        assert_eq!(payload["HostConfig"]["ConsoleSize"], json!([40, 80]));
        assert_eq!(payload["Config"]["Image"], "node:23");
        assert_eq!(payload["Path"], "/usr/local/bin/docker-entrypoint.sh");
    }

    #[test]
    fn test_container_summary() {
        let mut container = Container::new("abc", "web", "node:23");
        let now = container.created;
        container.start(now).unwrap();
        let summary = container_summary(&container, now + Duration::seconds(2));
        assert_eq!(summary["Names"], json!(["web"]));
        assert_eq!(summary["State"], "running");
        assert_eq!(summary["Status"], "Up 2 seconds");
        assert_eq!(summary["Created"], json!(now.timestamp()));
    }

    #[test]
    fn test_image_payloads() {
        let image = Image::new("sha256:n", ["node:23"]);
        let summary = image_summary(&image);
        assert_eq!(summary["RepoTags"], json!(["node:23"]));
        assert_eq!(summary["Containers"], -1);
        let inspect = image_inspect(&image);
        assert_eq!(inspect["Id"], "sha256:n");
        assert_eq!(inspect["Os"], "linux");
        assert_eq!(inspect["Architecture"], "amd64");
    }
}
