//! Default configuration values

/// Default package revision suffix
pub const DEFAULT_REVISION: &str = "0";

/// Default template directory, relative to the working directory
pub const DEFAULT_TEMPLATE_DIR: &str = "templates/latest";

/// Default output directory for rendered trees and built packages
pub const DEFAULT_OUTPUT_DIR: &str = "bin";

/// Sentinel asking for the newest version a channel offers
pub const LATEST: &str = "latest";

/// Channels built when none are requested
pub const DEFAULT_CHANNELS: &[&str] = &["stable", "unstable", "nightly"];

/// Architectures built when none are requested
pub const DEFAULT_ARCHITECTURES: &[&str] = &["amd64", "arm", "arm64", "ppc64le", "s390x"];

/// Packages built when none are requested
pub const DEFAULT_PACKAGES: &[&str] = &[
    "kubelet",
    "kubectl",
    "kubeadm",
    "kubernetes-cni",
    "cri-tools",
];

/// Oldest Kubernetes release we still package
pub const MINIMUM_KUBERNETES_VERSION: &str = "1.13.0";

/// CNI plugins shipped with current Kubernetes releases
pub const CURRENT_CNI_VERSION: &str = "0.8.7";

/// Oldest CNI plugins release the kubelet package may depend on
pub const MINIMUM_CNI_VERSION: &str = "0.8.6";

/// CNI plugins shipped with Kubernetes releases before 1.17
pub const PRE_117_CNI_VERSION: &str = "0.7.5";

/// Maximum number of release marker fetch attempts
pub const MAX_RESOLVE_RETRIES: u32 = 3;

/// Upper bound on total time spent retrying a release marker (seconds)
pub const RESOLVE_MAX_ELAPSED_SECS: u64 = 30;

/// Bytes of builder stderr kept in error messages
pub const STDERR_TAIL_BYTES: usize = 2048;
