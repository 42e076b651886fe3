//! Catalog discovery - what motions and expressions the puppet offers
//!
//! Discovery order, independently for motions and expressions:
//! the puppet's own settings, then a parsed model manifest, then the
//! configured fallback table. The fallback is a degraded mode and is
//! logged as such.

use std::fmt;

use marionette_core::{ExpressionList, ModelManifest, MotionGroupTable};
use marionette_puppet::CapabilityAdapter;
use tracing::{debug, warn};

use crate::DirectorConfig;

/// Where a catalog part came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOrigin {
    Puppet,
    Manifest,
    Fallback,
    /// Nothing anywhere; the part is empty
    Empty,
}

impl fmt::Display for CatalogOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CatalogOrigin::Puppet => "puppet",
            CatalogOrigin::Manifest => "manifest",
            CatalogOrigin::Fallback => "fallback",
            CatalogOrigin::Empty => "empty",
        })
    }
}

/// Motions and expressions available to the director
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub motions: MotionGroupTable,
    pub expressions: ExpressionList,
    pub motion_origin: CatalogOrigin,
    pub expression_origin: CatalogOrigin,
}

impl Catalog {
    /// Catalog given explicitly by the caller
    pub fn new(motions: MotionGroupTable, expressions: ExpressionList) -> Self {
        Catalog {
            motions,
            expressions,
            motion_origin: CatalogOrigin::Manifest,
            expression_origin: CatalogOrigin::Manifest,
        }
    }

    /// Discover the catalog for a live puppet
    pub fn discover(
        adapter: &CapabilityAdapter,
        manifest: Option<&ModelManifest>,
        config: &DirectorConfig,
    ) -> Self {
        let (motions, motion_origin) = pick(
            adapter.list_motion_groups().filter(|m| !m.is_empty()),
            manifest.map(|m| m.motions.clone()).filter(|m| !m.is_empty()),
            &config.fallback_motions,
            MotionGroupTable::is_empty,
        );
        let (expressions, expression_origin) = pick(
            adapter.list_expressions().filter(|e| !e.is_empty()),
            manifest
                .map(|m| m.expressions.clone())
                .filter(|e| !e.is_empty()),
            &config.fallback_expressions,
            ExpressionList::is_empty,
        );

        if motion_origin == CatalogOrigin::Fallback {
            warn!(groups = motions.len(), "motion metadata unavailable, using fallback motion table");
        }
        if expression_origin == CatalogOrigin::Fallback {
            warn!(expressions = expressions.len(), "expression metadata unavailable, using fallback expressions");
        }
        debug!(
            motions = %motion_origin,
            expressions = %expression_origin,
            groups = motions.len(),
            "catalog discovered"
        );

        Catalog {
            motions,
            expressions,
            motion_origin,
            expression_origin,
        }
    }
}

fn pick<T: Clone + Default>(
    from_puppet: Option<T>,
    from_manifest: Option<T>,
    fallback: &T,
    is_empty: impl Fn(&T) -> bool,
) -> (T, CatalogOrigin) {
    if let Some(value) = from_puppet {
        (value, CatalogOrigin::Puppet)
    } else if let Some(value) = from_manifest {
        (value, CatalogOrigin::Manifest)
    } else if !is_empty(fallback) {
        (fallback.clone(), CatalogOrigin::Fallback)
    } else {
        (T::default(), CatalogOrigin::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marionette_core::ExpressionDef;
    use marionette_puppet::testing::RecordingPuppet;

    const MANIFEST: &str = r#"{
        "Version": 3,
        "FileReferences": {
            "Moc": "youyou.moc3",
            "Expressions": [{"Name": "smile", "File": "smile.exp3.json"}],
            "Motions": {
                "Idle": [{"File": "jichudonghua.motion3.json"}],
                "TapBody": [{"File": "huishou.motion3.json"}]
            }
        }
    }"#;

    fn adapter(puppet: RecordingPuppet) -> CapabilityAdapter {
        CapabilityAdapter::new(Box::new(puppet))
    }

    #[test]
    fn test_puppet_listing_wins() {
        let puppet = RecordingPuppet::new()
            .with_motions(MotionGroupTable::new().with_group("Talk", ["t.motion3.json"]));
        let manifest = ModelManifest::from_json_str(MANIFEST, "youyou.model3.json").unwrap();

        let catalog = Catalog::discover(&adapter(puppet), Some(&manifest), &DirectorConfig::default());
        assert_eq!(catalog.motion_origin, CatalogOrigin::Puppet);
        assert_eq!(catalog.motions.first_group(), Some("Talk"));
        // Expressions fall through to the manifest independently
        assert_eq!(catalog.expression_origin, CatalogOrigin::Manifest);
        assert_eq!(catalog.expressions.len(), 1);
    }

    #[test]
    fn test_fallback_is_last_resort() {
        let config = DirectorConfig::default()
            .with_fallback_motions(MotionGroupTable::new().with_group("Idle", ["a.motion3.json"]))
            .with_fallback_expressions(
                vec![ExpressionDef::new("smile", "smile.exp3.json")]
                    .into_iter()
                    .collect(),
            );

        let catalog = Catalog::discover(&adapter(RecordingPuppet::new()), None, &config);
        assert_eq!(catalog.motion_origin, CatalogOrigin::Fallback);
        assert_eq!(catalog.expression_origin, CatalogOrigin::Fallback);

        let catalog = Catalog::discover(
            &adapter(RecordingPuppet::new()),
            None,
            &DirectorConfig::default(),
        );
        assert_eq!(catalog.motion_origin, CatalogOrigin::Empty);
        assert!(catalog.motions.is_empty());
    }
}
