use crate::target::classify::ClassifyTarget;
use crate::target::{Family, Target};
use crate::{ClassifyError, Result};
use serde::Serialize;
use tracing::debug;

/// Target descriptors known to the host, keyed by name and family
#[derive(Default)]
pub struct TargetRegistry {
    targets: Vec<Box<dyn Target>>,
}

/// Serializable view of a registered descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetSummary {
    pub name: String,
    pub family: Family,
    /// `AF_INET` / `AF_INET6`
    pub af: u8,
    pub version: String,
    pub size: usize,
    pub userspace_size: usize,
    pub options: Vec<String>,
}

impl TargetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every target this crate ships
    pub fn with_builtin() -> Result<Self> {
        let mut registry = Self::new();
        register_classify(&mut registry)?;
        Ok(registry)
    }

    pub fn register(&mut self, target: Box<dyn Target>) -> Result<()> {
        if self.find(target.name(), target.family()).is_ok() {
            return Err(ClassifyError::DuplicateTarget {
                name: target.name().to_string(),
                family: target.family(),
            });
        }

        debug!(
            "Registered target {} ({}, {} bytes)",
            target.name(),
            target.family(),
            target.size()
        );
        self.targets.push(target);
        Ok(())
    }

    pub fn find(&self, name: &str, family: Family) -> Result<&dyn Target> {
        self.targets
            .iter()
            .find(|t| t.name() == name && t.family() == family)
            .map(|t| &**t)
            .ok_or_else(|| ClassifyError::TargetNotFound {
                name: name.to_string(),
                family,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Target> {
        self.targets.iter().map(|t| &**t)
    }

    pub fn summaries(&self) -> Vec<TargetSummary> {
        self.iter().map(TargetSummary::from_target).collect()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl TargetSummary {
    pub fn from_target(target: &dyn Target) -> Self {
        Self {
            name: target.name().to_string(),
            family: target.family(),
            af: target.family().af(),
            version: target.version().to_string(),
            size: target.size(),
            userspace_size: target.userspace_size(),
            options: target
                .options()
                .iter()
                .map(|o| format!("--{}", o.name))
                .collect(),
        }
    }
}

/// Load hook: one CLASSIFY descriptor per family
pub fn register_classify(registry: &mut TargetRegistry) -> Result<()> {
    registry.register(Box::new(ClassifyTarget::new(Family::Ipv4)))?;
    registry.register(Box::new(ClassifyTarget::new(Family::Ipv6)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::classify::NAME;

    #[test]
    fn test_builtin_registers_both_families() {
        let registry = TargetRegistry::with_builtin().expect("builtin registration");
        assert_eq!(registry.len(), 2);

        for family in [Family::Ipv4, Family::Ipv6] {
            let target = registry.find(NAME, family).expect("registered");
            assert_eq!(target.family(), family);
            assert_eq!(target.size(), 8);
            assert_eq!(target.userspace_size(), 8);
        }
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = TargetRegistry::with_builtin().unwrap();
        let err = registry
            .register(Box::new(ClassifyTarget::new(Family::Ipv6)))
            .unwrap_err();

        assert!(matches!(
            err,
            ClassifyError::DuplicateTarget { family: Family::Ipv6, .. }
        ));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = TargetRegistry::with_builtin().unwrap();
        assert!(matches!(
            registry.find("classify", Family::Ipv4),
            Err(ClassifyError::TargetNotFound { .. })
        ));
        assert!(TargetRegistry::new().is_empty());
    }

    #[test]
    fn test_summaries() {
        let registry = TargetRegistry::with_builtin().unwrap();
        let summaries = registry.summaries();

        assert_eq!(summaries[0].family, Family::Ipv4);
        assert_eq!(summaries[1].family, Family::Ipv6);
        assert_eq!((summaries[0].af, summaries[1].af), (2, 10));
        assert_eq!(summaries[0].options, vec!["--set-class".to_string()]);
        assert_eq!(summaries[0].version, crate::VERSION);
    }
}
