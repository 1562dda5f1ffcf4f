//! Test utilities for property-based testing
//!
//! This module provides generators and helpers for proptest.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    use crate::core::channel::Channel;
    use crate::core::kind::Architecture;
    use crate::core::package::Package;

    /// A non-empty package selection, possibly with repeats, in any order
    pub fn package_selection() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(prop::sample::select(Package::ALL.to_vec()), 1..8)
            .prop_map(|packages| packages.iter().map(|p| p.as_str().to_string()).collect())
    }

    /// A non-empty channel selection mixing canonical names and aliases
    pub fn channel_selection() -> impl Strategy<Value = Vec<String>> {
        let names = vec![
            "stable", "release", "unstable", "testing", "nightly", "ci",
        ];
        prop::collection::vec(prop::sample::select(names), 1..6)
            .prop_map(|names| names.into_iter().map(str::to_string).collect())
    }

    /// A non-empty architecture list, possibly with repeats
    pub fn architecture_list() -> impl Strategy<Value = Vec<Architecture>> {
        prop::collection::vec(prop::sample::select(Architecture::ALL.to_vec()), 1..6)
    }

    /// A plausible Kubernetes release version
    pub fn kubernetes_version() -> impl Strategy<Value = String> {
        (13u64..30, 0u64..20).prop_map(|(minor, patch)| format!("1.{minor}.{patch}"))
    }

    /// Any channel
    pub fn channel() -> impl Strategy<Value = Channel> {
        prop::sample::select(Channel::ALL.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use crate::core::kind::ArchitectureSet;
    use crate::core::resolver;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_package_selection_parses(names in package_selection()) {
            prop_assert!(!names.is_empty());
            for name in &names {
                prop_assert!(name.parse::<crate::core::package::Package>().is_ok());
            }
        }

        #[test]
        fn test_channel_selection_parses(names in channel_selection()) {
            for name in &names {
                prop_assert!(name.parse::<crate::core::channel::Channel>().is_ok());
            }
        }

        #[test]
        fn test_architecture_set_never_repeats(archs in architecture_list()) {
            let set = ArchitectureSet::new(archs.clone());
            let mut seen = Vec::new();
            for arch in set.iter() {
                prop_assert!(!seen.contains(&arch));
                seen.push(arch);
            }
            prop_assert_eq!(seen.first(), archs.first());
        }

        #[test]
        fn test_kubernetes_version_is_supported(version in kubernetes_version()) {
            prop_assert!(resolver::parse_kubernetes(&version).is_ok());
        }

        #[test]
        fn test_channel_marker_is_relative(channel in channel()) {
            prop_assert!(!channel.release_marker().starts_with('/'));
        }
    }
}
