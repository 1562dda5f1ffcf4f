//! Release and download URLs

/// Kubernetes release bucket, home of the release markers and binaries
pub const KUBERNETES_RELEASE: &str = "https://dl.k8s.io";

/// CNI plugins release downloads
pub const CNI_DOWNLOAD: &str = "https://github.com/containernetworking/plugins/releases/download";

/// cri-tools release downloads
pub const CRI_TOOLS_DOWNLOAD: &str =
    "https://github.com/kubernetes-sigs/cri-tools/releases/download";
